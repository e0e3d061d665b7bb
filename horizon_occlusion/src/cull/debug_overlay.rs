/// Depth-buffer visualization for on-screen debugging.
///
/// Holds a luminance image of the software buffer (bright = near) plus the
/// corner placement it should be drawn at. Uploading and drawing the quad
/// is the renderer's job; this only keeps the pixels current.

use crate::rasterizer::OcclusionCuller;

/// On-screen width of the overlay quad in pixels.
pub const OVERLAY_DISPLAY_WIDTH: u32 = 400;

/// Reciprocal depth is scaled by this before clamping to 1.
const LUMINANCE_SCALE: f32 = 50.0;

#[derive(Debug, Clone)]
pub struct DebugOverlay {
    width: u32,
    height: u32,
    depth: Vec<f32>,
    luminance: Vec<f32>,
    refresh_count: u64,
}

impl DebugOverlay {
    /// Overlay sized for `culler`'s buffer. `None` when it has no rasterizer.
    pub fn for_culler(culler: &OcclusionCuller) -> Option<Self> {
        let (width, height) = culler.resolution()?;
        if width == 0 || height == 0 {
            return None;
        }
        let len = (width * height) as usize;
        Some(Self {
            width,
            height,
            depth: vec![0.0; len],
            luminance: vec![0.0; len],
            refresh_count: 0,
        })
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Viewport size of the quad: fixed width, height following the buffer aspect.
    pub fn display_size(&self) -> (u32, u32) {
        let height = OVERLAY_DISPLAY_WIDTH as f32 * self.height as f32 / self.width as f32;
        (OVERLAY_DISPLAY_WIDTH, height as u32)
    }

    /// Copy the current buffer into the image. Rows run bottom to top.
    pub fn refresh(&mut self, culler: &OcclusionCuller) -> bool {
        if !culler.compute_pixel_depth_buffer(&mut self.depth) {
            return false;
        }
        for (out, d) in self.luminance.iter_mut().zip(&self.depth) {
            *out = (d * LUMINANCE_SCALE).min(1.0);
        }
        self.refresh_count += 1;
        true
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    /// One `f32` luminance value per pixel.
    pub fn pixels(&self) -> &[f32] {
        &self.luminance
    }

    /// Raw bytes of `pixels()`, ready for an R32_SFLOAT texture upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.luminance)
    }
}

#[cfg(test)]
#[path = "debug_overlay_tests.rs"]
mod tests;
