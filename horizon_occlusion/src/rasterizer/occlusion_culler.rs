/// OcclusionCuller: per-frame wrapper around a `DepthRasterizer`.
///
/// Holds the frame's view-projection (double precision for box projection,
/// single precision for triangle rasterization) and the frame counters.
/// Without a rasterizer the wrapper is permanently inactive: every test
/// answers "visible" and every rasterize call is a no-op.

use glam::{DMat4, DVec2, Mat4, Vec3};
use crate::bounds::AABB;
use crate::{horizon_info, horizon_warn};
use super::depth_rasterizer::{DepthRasterizer, CullingResult};
use super::software_depth_buffer::SoftwareDepthBuffer;

const SOURCE: &str = "horizon::OcclusionCuller";

/// Depth used for boxes with a corner behind the eye; nothing can beat it.
const BEHIND_EYE_W: f64 = 0.0001;

/// Index list of the 12 triangles of a box, over `AABB::corners()` ordering.
pub const BOX_TRIANGLE_INDICES: [u32; 36] = [
    0, 1, 3, 0, 3, 2, // -Z
    4, 6, 7, 4, 7, 5, // +Z
    0, 4, 5, 0, 5, 1, // -Y
    2, 3, 7, 2, 7, 6, // +Y
    0, 2, 6, 0, 6, 4, // -X
    1, 5, 7, 1, 7, 3, // +X
];

/// Per-frame counters, reset by `begin_frame`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Boxes tested while the frame was active
    pub tested: u32,
    /// Boxes reported occluded
    pub occluded: u32,
    /// Static objects rasterized as occluders
    pub building_occluders: u32,
    /// Triangles of those occluders
    pub building_tris: u32,
    /// Vertices of those occluders
    pub building_verts: u32,
}

pub struct OcclusionCuller {
    rasterizer: Option<Box<dyn DepthRasterizer>>,
    view_projection: DMat4,
    view_projection_f32: Mat4,
    frame_active: bool,
    stats: FrameStats,
}

impl OcclusionCuller {
    /// Create a culler backed by a `SoftwareDepthBuffer`.
    ///
    /// An unusable resolution leaves the culler inactive (logged once).
    pub fn new(width: u32, height: u32) -> Self {
        match SoftwareDepthBuffer::create(width, height) {
            Some(buffer) => {
                let (w, h) = buffer.resolution();
                horizon_info!(SOURCE, "Software depth buffer created ({}x{})", w, h);
                Self::with_rasterizer(Box::new(buffer))
            }
            None => {
                horizon_warn!(
                    SOURCE,
                    "Depth rasterizer unavailable for {}x{}, occlusion culling disabled",
                    width,
                    height
                );
                Self::inactive()
            }
        }
    }

    /// Create a culler driving the given rasterizer.
    pub fn with_rasterizer(rasterizer: Box<dyn DepthRasterizer>) -> Self {
        Self {
            rasterizer: Some(rasterizer),
            ..Self::inactive()
        }
    }

    /// A culler without rasterizer: never occludes anything.
    pub fn inactive() -> Self {
        Self {
            rasterizer: None,
            view_projection: DMat4::IDENTITY,
            view_projection_f32: Mat4::IDENTITY,
            frame_active: false,
            stats: FrameStats::default(),
        }
    }

    // ===== STATE =====

    /// `true` if a rasterizer is available.
    pub fn is_active(&self) -> bool {
        self.rasterizer.is_some()
    }

    /// `true` between `begin_frame` and `end_frame` when a rasterizer exists.
    pub fn is_frame_active(&self) -> bool {
        self.frame_active
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Combined view-projection of the current frame.
    pub fn view_projection(&self) -> &DMat4 {
        &self.view_projection
    }

    /// Buffer resolution, or `None` when inactive.
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.rasterizer.as_ref().map(|r| r.resolution())
    }

    // ===== FRAME =====

    /// Clear the buffer, store the frame transform, reset counters.
    pub fn begin_frame(&mut self, view: &DMat4, projection: &DMat4) {
        self.frame_active = false;
        let Some(rasterizer) = self.rasterizer.as_mut() else {
            return;
        };

        rasterizer.clear();
        self.view_projection = *projection * *view;
        self.view_projection_f32 = self.view_projection.as_mat4();
        self.stats = FrameStats::default();
        self.frame_active = true;
    }

    /// Mark the frame inactive. Tests answer "visible" until the next `begin_frame`.
    pub fn end_frame(&mut self) {
        self.frame_active = false;
    }

    // ===== OCCLUDERS =====

    /// Rasterize a world-space triangle list as an occluder.
    pub fn rasterize_occluder(&mut self, positions: &[Vec3], indices: &[u32]) {
        if !self.frame_active || positions.is_empty() || indices.len() < 3 {
            return;
        }
        if let Some(rasterizer) = self.rasterizer.as_mut() {
            rasterizer.render_triangles(positions, indices, &self.view_projection_f32);
        }
    }

    /// Rasterize the 6 faces of a world-space box and count it as a building occluder.
    pub fn rasterize_aabb_occluder(&mut self, aabb: &AABB) {
        if !self.frame_active || !aabb.valid() {
            return;
        }
        let corners = aabb.corners();
        self.rasterize_occluder(&corners, &BOX_TRIANGLE_INDICES);
        self.increment_building_occluders(12, 8);
    }

    /// Account for one rasterized building occluder.
    pub fn increment_building_occluders(&mut self, tris: u32, verts: u32) {
        self.stats.building_occluders += 1;
        self.stats.building_tris += tris;
        self.stats.building_verts += verts;
    }

    // ===== QUERIES =====

    /// `false` only if the frame is active and the box is fully hidden.
    ///
    /// Corners behind the eye widen the query to the whole screen at a depth
    /// nothing can beat; a degenerate screen rectangle is visible.
    pub fn test_visible_aabb(&mut self, aabb: &AABB) -> bool {
        if !self.frame_active {
            return true;
        }
        let Some(rasterizer) = self.rasterizer.as_ref() else {
            return true;
        };

        self.stats.tested += 1;
        if !aabb.valid() {
            return true;
        }

        let mut ndc_min = DVec2::splat(1.0);
        let mut ndc_max = DVec2::splat(-1.0);
        let mut w_min = f64::MAX;

        for corner in aabb.corners() {
            let clip = self.view_projection * corner.as_dvec3().extend(1.0);
            if clip.w > 0.0 {
                let ndc = DVec2::new(clip.x, clip.y) / clip.w;
                ndc_min = ndc_min.min(ndc);
                ndc_max = ndc_max.max(ndc);
                w_min = w_min.min(clip.w);
            } else {
                ndc_min = DVec2::splat(-1.0);
                ndc_max = DVec2::splat(1.0);
                w_min = w_min.min(BEHIND_EYE_W);
            }
        }

        let ndc_min = ndc_min.max(DVec2::splat(-1.0));
        let ndc_max = ndc_max.min(DVec2::splat(1.0));
        if !(ndc_min.x < ndc_max.x) || !(ndc_min.y < ndc_max.y) {
            return true;
        }

        let result = rasterizer.test_rect(ndc_min.as_vec2(), ndc_max.as_vec2(), w_min as f32);
        if result == CullingResult::Occluded {
            self.stats.occluded += 1;
            return false;
        }
        true
    }

    /// Export the buffer bottom-to-top for diagnostics. `false` when inactive
    /// or when `out` is smaller than the resolution.
    pub fn compute_pixel_depth_buffer(&self, out: &mut [f32]) -> bool {
        let Some(rasterizer) = self.rasterizer.as_ref() else {
            return false;
        };
        let (w, h) = rasterizer.resolution();
        if out.len() < (w * h) as usize {
            return false;
        }
        rasterizer.compute_pixel_depth_buffer(out, true);
        true
    }
}

#[cfg(test)]
#[path = "occlusion_culler_tests.rs"]
mod tests;
