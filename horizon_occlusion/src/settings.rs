//! Occlusion culling configuration.
//!
//! Plain values only. Loading them from a settings file is the caller's job;
//! `sanitized()` clamps every field into its accepted range.

use crate::horizon_warn;

/// All tunables of the occlusion subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct OcclusionSettings {
    /// Master switch
    pub enabled: bool,
    /// Rasterize the coarse terrain mesh at the start of each frame
    pub terrain_occluder: bool,
    /// Rasterize large static objects as occluders (pass 1)
    pub static_occluders: bool,
    /// Run occlusion in interiors and quasi-exteriors (buildings only, no terrain)
    pub enable_interiors: bool,

    /// Software depth buffer width in pixels
    pub buffer_width: u32,
    /// Software depth buffer height in pixels
    pub buffer_height: u32,

    /// Terrain coarse grid step is `1 << terrain_lod` samples
    pub terrain_lod: u32,
    /// Terrain neighborhood radius, in cells
    pub terrain_radius: u32,
    /// World size of one terrain cell
    pub cell_world_size: f32,

    /// Children at least this large are handled in pass 1
    pub occluder_min_radius: f32,
    /// Children larger than this are never simplified (paging nodes)
    pub occluder_max_radius: f32,
    /// Simplified meshes are shrunk toward their centroid by this factor (never above 1)
    pub occluder_shrink_factor: f32,
    /// Base vertex-clustering grid resolution
    pub occluder_mesh_resolution: u32,
    /// Upper bound for the radius-adaptive grid resolution
    pub occluder_max_mesh_resolution: u32,
    /// Skip rasterizing when the eye is within `radius * threshold` of the center
    pub occluder_inside_threshold: f32,
    /// Skip rasterizing occluders farther than this from the eye
    pub occluder_max_distance: f32,
    /// Per-frame budget of occluder triangles (0 = unlimited)
    pub occluder_max_triangles: u32,
    /// Paged-chunk sub-meshes farther than this are not rasterized
    pub paged_occluder_max_distance: f32,

    /// Refresh the depth-buffer overlay image after each processed frame
    pub debug_overlay: bool,
    /// Emit the periodic statistics summary
    pub debug_messages: bool,
    /// Processed frames between two statistics summaries
    pub stats_interval_frames: u32,
}

impl Default for OcclusionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            terrain_occluder: true,
            static_occluders: true,
            enable_interiors: false,
            buffer_width: 512,
            buffer_height: 256,
            terrain_lod: 3,
            terrain_radius: 2,
            cell_world_size: 8192.0,
            occluder_min_radius: 300.0,
            occluder_max_radius: 3000.0,
            occluder_shrink_factor: 0.8,
            occluder_mesh_resolution: 8,
            occluder_max_mesh_resolution: 16,
            occluder_inside_threshold: 1.0,
            occluder_max_distance: 6000.0,
            occluder_max_triangles: 0,
            paged_occluder_max_distance: 8192.0,
            debug_overlay: false,
            debug_messages: false,
            stats_interval_frames: 300,
        }
    }
}

const SOURCE: &str = "horizon::OcclusionSettings";

fn clamp_u32(name: &str, value: u32, min: u32, max: u32) -> u32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        horizon_warn!(SOURCE, "{} = {} out of range [{}, {}], using {}", name, value, min, max, clamped);
    }
    clamped
}

fn clamp_f32(name: &str, value: f32, min: f32, max: f32) -> f32 {
    // NaN falls back to the lower bound
    let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
    if clamped != value {
        horizon_warn!(SOURCE, "{} = {} out of range [{}, {}], using {}", name, value, min, max, clamped);
    }
    clamped
}

impl OcclusionSettings {
    /// Clamp every field into its accepted range, logging each correction.
    ///
    /// Buffer dimensions are also rounded up to the rasterizer's tile size
    /// (width multiple of 8, height multiple of 4).
    pub fn sanitized(mut self) -> Self {
        self.buffer_width = clamp_u32("buffer_width", self.buffer_width, 64, 2048);
        self.buffer_height = clamp_u32("buffer_height", self.buffer_height, 64, 1024);
        self.buffer_width = (self.buffer_width + 7) & !7;
        self.buffer_height = (self.buffer_height + 3) & !3;

        self.terrain_lod = clamp_u32("terrain_lod", self.terrain_lod, 0, 6);
        self.terrain_radius = clamp_u32("terrain_radius", self.terrain_radius, 1, 20);
        self.cell_world_size = clamp_f32("cell_world_size", self.cell_world_size, 1.0, f32::MAX);

        self.occluder_min_radius =
            clamp_f32("occluder_min_radius", self.occluder_min_radius, 50.0, 50000.0);
        self.occluder_max_radius =
            clamp_f32("occluder_max_radius", self.occluder_max_radius, 500.0, 100000.0);
        self.occluder_shrink_factor =
            clamp_f32("occluder_shrink_factor", self.occluder_shrink_factor, 0.1, 1.0);
        self.occluder_mesh_resolution =
            clamp_u32("occluder_mesh_resolution", self.occluder_mesh_resolution, 4, 32);
        self.occluder_max_mesh_resolution = clamp_u32(
            "occluder_max_mesh_resolution",
            self.occluder_max_mesh_resolution,
            self.occluder_mesh_resolution,
            64,
        );
        self.occluder_inside_threshold =
            clamp_f32("occluder_inside_threshold", self.occluder_inside_threshold, 0.1, 5.0);
        self.occluder_max_distance =
            clamp_f32("occluder_max_distance", self.occluder_max_distance, 1000.0, 100000.0);
        self.paged_occluder_max_distance = clamp_f32(
            "paged_occluder_max_distance",
            self.paged_occluder_max_distance,
            1000.0,
            100000.0,
        );
        self.stats_interval_frames =
            clamp_u32("stats_interval_frames", self.stats_interval_frames, 1, u32::MAX);
        self
    }

    /// Grid resolution for an object of the given bounding radius.
    ///
    /// Grows with the square root of `radius / occluder_min_radius`, clamped to
    /// `[occluder_mesh_resolution, occluder_max_mesh_resolution]`.
    pub fn mesh_resolution_for_radius(&self, radius: f32) -> u32 {
        let base = self.occluder_mesh_resolution.max(1);
        let max = self.occluder_max_mesh_resolution.max(base);
        if self.occluder_min_radius <= 0.0 || !(radius > self.occluder_min_radius) {
            return base;
        }
        let scaled = (base as f32 * (radius / self.occluder_min_radius).sqrt()).round();
        (scaled as u32).clamp(base, max)
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
