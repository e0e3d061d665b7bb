/// OccluderMesh: small world-space triangle list used only for occlusion.

use glam::Vec3;
use crate::bounds::AABB;

/// Simplified occluder geometry.
///
/// `aabb` bounds the source geometry before shrinking and is what gets
/// visibility-tested. `vertices` are shrunk toward their centroid, so the
/// rasterized mesh is never larger than the object it stands for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OccluderMesh {
    pub aabb: AABB,
    pub vertices: Vec<Vec3>,
    /// Triangle list; every index is a valid slot in `vertices`
    pub indices: Vec<u32>,
}

impl OccluderMesh {
    /// Mesh carrying only a box: testable, contributes no occlusion.
    pub fn bounds_only(aabb: AABB) -> Self {
        Self {
            aabb,
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// `true` if there is something to rasterize.
    pub fn has_triangles(&self) -> bool {
        !self.vertices.is_empty() && self.indices.len() >= 3
    }

    /// Box around the (shrunk) vertices.
    pub fn vertex_bounds(&self) -> AABB {
        AABB::from_points(&self.vertices)
    }
}
