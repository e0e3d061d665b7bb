//! Terrain module: coarse, conservative terrain occluder geometry.
//!
//! Heights come from a `TerrainStorage` at full resolution and are
//! min-pooled onto a coarse grid so the occluder never rises above the
//! real surface.

mod storage;
mod terrain_occluder;

pub use storage::{TerrainStorage, HeightSamples, FnHeightStorage};
pub use terrain_occluder::TerrainOccluder;
