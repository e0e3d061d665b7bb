/// Per-frame state handed to every traversal of one logical frame.
///
/// The same scene may be walked several times in a frame (main pass,
/// shadow receivers). Only the first main-camera traversal rebuilds the
/// depth buffer; the others see `occlusion_processed` and reuse it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameContext {
    frame_number: u64,
    occlusion_processed: bool,
}

impl FrameContext {
    pub fn new(frame_number: u64) -> Self {
        Self {
            frame_number,
            occlusion_processed: false,
        }
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// `true` once a main-camera traversal has built this frame's buffer.
    pub fn occlusion_processed(&self) -> bool {
        self.occlusion_processed
    }

    pub(crate) fn mark_processed(&mut self) {
        self.occlusion_processed = true;
    }

    /// Move to the next logical frame.
    pub fn advance(&mut self) {
        self.frame_number += 1;
        self.occlusion_processed = false;
    }
}
