//! Bounding volumes shared by the rasterizer, the simplifier and the traversal.
//!
//! An `AABB` starts out empty (min = +inf, max = -inf) and is only "valid"
//! once min <= max on every axis. An invalid box can neither occlude nor be
//! occluded: every consumer treats it as "visible, contributes nothing".

use glam::{Mat4, Vec3};

// ===== AABB =====

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl AABB {
    /// The empty (invalid) box. Expanding it by a point yields that point.
    pub const EMPTY: AABB = AABB {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a box from explicit corners (not validated).
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point. Empty input gives `EMPTY`.
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.expand_by_point(*p);
        }
        aabb
    }

    /// Box enclosing a sphere. An invalid sphere gives `EMPTY`.
    pub fn from_sphere(sphere: &BoundingSphere) -> Self {
        let mut aabb = Self::EMPTY;
        aabb.expand_by_sphere(sphere);
        aabb
    }

    /// `true` iff min <= max on all three axes.
    pub fn valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn expand_by_aabb(&mut self, other: &AABB) {
        if !other.valid() {
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn expand_by_sphere(&mut self, sphere: &BoundingSphere) {
        if !sphere.valid() {
            return;
        }
        let r = Vec3::splat(sphere.radius);
        self.min = self.min.min(sphere.center - r);
        self.max = self.max.max(sphere.center + r);
    }

    /// Center point of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths along x, y, z.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Half of the diagonal length (radius of the enclosing sphere).
    pub fn radius(&self) -> f32 {
        self.size().length() * 0.5
    }

    /// The eight corners. Bit 0 of the index selects x, bit 1 y, bit 2 z (0 = min).
    pub fn corners(&self) -> [Vec3; 8] {
        let mut out = [Vec3::ZERO; 8];
        for (i, corner) in out.iter_mut().enumerate() {
            *corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
        }
        out
    }

    /// Transform this box by a matrix, returning the enclosing box.
    ///
    /// Uses the Arvo method: projects each matrix axis onto the box extents
    /// for a tight result without transforming all 8 corners.
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        if !self.valid() {
            return AABB::EMPTY;
        }

        let translation = matrix.col(3).truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        AABB { min: new_min, max: new_max }
    }
}

// ===== BOUNDING SPHERE =====

/// Bounding sphere. A negative radius marks it invalid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::INVALID
    }
}

impl BoundingSphere {
    pub const INVALID: BoundingSphere = BoundingSphere {
        center: Vec3::ZERO,
        radius: -1.0,
    };

    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere enclosing a box. An invalid box gives `INVALID`.
    pub fn from_aabb(aabb: &AABB) -> Self {
        if !aabb.valid() {
            return Self::INVALID;
        }
        Self {
            center: aabb.center(),
            radius: aabb.radius(),
        }
    }

    pub fn valid(&self) -> bool {
        self.radius >= 0.0
    }

    /// Transform the sphere; the radius is scaled by the largest axis scale.
    pub fn transformed(&self, matrix: &Mat4) -> BoundingSphere {
        if !self.valid() {
            return Self::INVALID;
        }
        let scale = matrix.x_axis.truncate().length()
            .max(matrix.y_axis.truncate().length())
            .max(matrix.z_axis.truncate().length());
        BoundingSphere {
            center: matrix.transform_point3(self.center),
            radius: self.radius * scale,
        }
    }
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
