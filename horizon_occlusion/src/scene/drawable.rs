/// Drawable geometry attached to scene leaves.
///
/// Only positions and primitive topology are kept: that is all the occluder
/// simplifier needs. Normals, UVs and materials stay with the renderer.

use glam::{Mat4, Vec3};
use crate::bounds::AABB;

/// How a primitive's vertex sequence forms geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    Points,
    Lines,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

/// Where a primitive reads its vertex sequence from.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveIndices {
    /// Explicit index buffer
    Indexed(Vec<u32>),
    /// `count` consecutive vertices starting at `first`
    Range { first: u32, count: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub topology: PrimitiveTopology,
    pub indices: PrimitiveIndices,
}

impl Primitive {
    pub fn indexed(topology: PrimitiveTopology, indices: Vec<u32>) -> Self {
        Self { topology, indices: PrimitiveIndices::Indexed(indices) }
    }

    pub fn range(topology: PrimitiveTopology, first: u32, count: u32) -> Self {
        Self { topology, indices: PrimitiveIndices::Range { first, count } }
    }

    fn len(&self) -> usize {
        match &self.indices {
            PrimitiveIndices::Indexed(indices) => indices.len(),
            PrimitiveIndices::Range { count, .. } => *count as usize,
        }
    }

    fn index(&self, i: usize) -> u32 {
        match &self.indices {
            PrimitiveIndices::Indexed(indices) => indices[i],
            PrimitiveIndices::Range { first, .. } => first + i as u32,
        }
    }

    /// Call `f` for each triangle as three vertex indices.
    ///
    /// Strips alternate winding so every triangle keeps the orientation of
    /// the first. Point and line topologies produce nothing.
    pub fn for_each_triangle(&self, mut f: impl FnMut(u32, u32, u32)) {
        let n = self.len();
        match self.topology {
            PrimitiveTopology::TriangleList => {
                for t in 0..n / 3 {
                    f(self.index(3 * t), self.index(3 * t + 1), self.index(3 * t + 2));
                }
            }
            PrimitiveTopology::TriangleStrip => {
                for i in 0..n.saturating_sub(2) {
                    if i % 2 == 0 {
                        f(self.index(i), self.index(i + 1), self.index(i + 2));
                    } else {
                        f(self.index(i + 1), self.index(i), self.index(i + 2));
                    }
                }
            }
            PrimitiveTopology::TriangleFan => {
                for i in 1..n.saturating_sub(1) {
                    f(self.index(0), self.index(i), self.index(i + 1));
                }
            }
            PrimitiveTopology::Points
            | PrimitiveTopology::Lines
            | PrimitiveTopology::LineStrip => {}
        }
    }
}

/// Vertex positions plus the primitives drawing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Drawable {
    pub positions: Vec<Vec3>,
    pub primitives: Vec<Primitive>,
}

impl Drawable {
    pub fn new(positions: Vec<Vec3>, primitives: Vec<Primitive>) -> Self {
        Self { positions, primitives }
    }

    /// Indexed triangle list drawable.
    pub fn triangles(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self::new(positions, vec![Primitive::indexed(PrimitiveTopology::TriangleList, indices)])
    }

    /// Closed box mesh (8 vertices, 12 triangles).
    pub fn cuboid(min: Vec3, max: Vec3) -> Self {
        let positions = AABB::new(min, max).corners().to_vec();
        Self::triangles(positions, crate::rasterizer::BOX_TRIANGLE_INDICES.to_vec())
    }

    pub fn bounds(&self) -> AABB {
        AABB::from_points(&self.positions)
    }

    /// Triangles whose three indices are valid vertex slots.
    pub fn for_each_triangle(&self, mut f: impl FnMut(u32, u32, u32)) {
        let count = self.positions.len() as u32;
        for primitive in &self.primitives {
            primitive.for_each_triangle(|a, b, c| {
                if a < count && b < count && c < count {
                    f(a, b, c);
                }
            });
        }
    }

    pub fn triangle_count(&self) -> usize {
        let mut count = 0;
        self.for_each_triangle(|_, _, _| count += 1);
        count
    }
}

/// Anything that can enumerate drawable geometry below itself.
///
/// `base` is the transform of the source's parent frame; the visitor gets
/// the accumulated transform for each drawable.
pub trait GeometrySource {
    fn for_each_drawable(&self, base: &Mat4, visit: &mut dyn FnMut(&Mat4, &Drawable));

    /// Bounds in the parent frame, used when no triangles can be collected.
    fn bounding_box(&self) -> AABB;
}

impl GeometrySource for Drawable {
    fn for_each_drawable(&self, base: &Mat4, visit: &mut dyn FnMut(&Mat4, &Drawable)) {
        visit(base, self);
    }

    fn bounding_box(&self) -> AABB {
        self.bounds()
    }
}

#[cfg(test)]
#[path = "drawable_tests.rs"]
mod tests;
