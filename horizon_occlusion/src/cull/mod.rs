//! Cull module: occlusion-aware scene traversal.
//!
//! `OcclusionSystem::cull` walks a `SceneGraph` from a root and dispatches
//! on the node variant:
//! - `Scene` begins the occlusion frame and rasterizes terrain
//! - `Cell` rejects whole cells, then runs the two child passes
//! - `PagedChunk` rasterizes its precomputed occluders
//!
//! Everything else is traversed as-is.

mod frame_context;
mod cull_output;
mod debug_overlay;
mod occlusion_system;
mod traversal;

pub use frame_context::FrameContext;
pub use cull_output::{CullOutput, VisibleDrawable};
pub use debug_overlay::{DebugOverlay, OVERLAY_DISPLAY_WIDTH};
pub use occlusion_system::OcclusionSystem;
