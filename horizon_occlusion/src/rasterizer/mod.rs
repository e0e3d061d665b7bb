//! Rasterizer module: CPU-side depth buffer used as a visibility oracle.
//!
//! `DepthRasterizer` is the seam between the culling logic and the buffer
//! implementation. `SoftwareDepthBuffer` is the built-in implementation;
//! `OcclusionCuller` is the per-frame wrapper the traversal talks to.

mod depth_rasterizer;
mod software_depth_buffer;
mod occlusion_culler;
#[cfg(test)]
pub(crate) mod mock_rasterizer;

pub use depth_rasterizer::{DepthRasterizer, CullingResult};
pub use software_depth_buffer::{SoftwareDepthBuffer, TILE_WIDTH, TILE_HEIGHT, NEAR_CLIP_W};
pub use occlusion_culler::{OcclusionCuller, FrameStats, BOX_TRIANGLE_INDICES};
