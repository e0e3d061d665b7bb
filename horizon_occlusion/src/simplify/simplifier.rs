/// Vertex-clustering simplifier.
///
/// 1. Collect every drawable triangle below a node in world space.
/// 2. Snap vertices to a uniform grid sized from the largest box extent.
/// 3. Replace each occupied cell by the mean of its vertices.
/// 4. Remap triangles, dropping those that collapsed.
/// 5. Shrink the result toward its centroid.
///
/// Clustering is purely spatial, so concave outlines (arches, L-shapes)
/// survive where a hull would fill them in.

use glam::{Mat4, Vec3};
use rdst::RadixSort;
use rustc_hash::FxHashMap;
use crate::bounds::AABB;
use crate::scene::GeometrySource;
use super::occluder_mesh::OccluderMesh;

const MAX_RESOLUTION: u32 = 1024;

/// Raw world-space triangle soup gathered from a subtree.
#[derive(Debug, Clone, Default)]
pub struct CollectedMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl CollectedMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Gather world-space vertices and triangles below `source`.
///
/// `base` maps the source's parent frame to world space.
pub fn collect_mesh(source: &dyn GeometrySource, base: &Mat4) -> CollectedMesh {
    let mut mesh = CollectedMesh::default();
    source.for_each_drawable(base, &mut |matrix, drawable| {
        let offset = mesh.vertices.len() as u32;
        mesh.vertices.extend(drawable.positions.iter().map(|p| matrix.transform_point3(*p)));
        drawable.for_each_triangle(|a, b, c| {
            mesh.indices.extend_from_slice(&[offset + a, offset + b, offset + c]);
        });
    });
    mesh
}

#[derive(Default)]
struct ClusterCell {
    sum: Vec3,
    count: u32,
    new_index: u32,
}

/// Cluster `mesh` on a grid of `resolution` cells along its largest extent
/// and shrink the result by `shrink_factor` toward its centroid.
///
/// Returns a bounds-only mesh when there is nothing to simplify.
pub fn simplify_mesh(mesh: &CollectedMesh, resolution: u32, shrink_factor: f32) -> OccluderMesh {
    let aabb = AABB::from_points(&mesh.vertices);
    if mesh.vertices.len() < 3 || mesh.indices.len() < 3 {
        return OccluderMesh::bounds_only(aabb);
    }

    let grid_res = resolution.clamp(1, MAX_RESOLUTION);
    let size = aabb.size();
    let max_dim = size.max_element();
    let cell_size = max_dim / grid_res as f32;
    if !(cell_size > 0.0) || !cell_size.is_finite() {
        return OccluderMesh::bounds_only(aabb);
    }

    let res_x = ((size.x / cell_size).ceil() as u32).clamp(1, grid_res);
    let res_y = ((size.y / cell_size).ceil() as u32).clamp(1, grid_res);

    // Pass 1: assign every vertex to a cell, accumulate for averaging
    let mut cells: FxHashMap<u32, ClusterCell> = FxHashMap::default();
    let mut vertex_cell = Vec::with_capacity(mesh.vertices.len());
    for v in &mesh.vertices {
        let f = (*v - aabb.min) / cell_size;
        let gx = (f.x.max(0.0) as u32).min(res_x - 1);
        let gy = (f.y.max(0.0) as u32).min(res_y - 1);
        let gz = (f.z.max(0.0) as u32).min(grid_res - 1);
        let id = gx + gy * res_x + gz * res_x * res_y;

        let cell = cells.entry(id).or_default();
        cell.sum += *v;
        cell.count += 1;
        vertex_cell.push(id);
    }

    // Stable output order regardless of hash iteration
    let mut ids: Vec<u32> = cells.keys().copied().collect();
    ids.radix_sort_unstable();

    let mut vertices = Vec::with_capacity(ids.len());
    for (new_index, id) in ids.iter().enumerate() {
        if let Some(cell) = cells.get_mut(id) {
            cell.new_index = new_index as u32;
            vertices.push(cell.sum / cell.count as f32);
        }
    }

    // Pass 2: remap triangles, drop the ones that collapsed
    let remap = |i: u32| -> Option<u32> {
        let id = vertex_cell.get(i as usize)?;
        cells.get(id).map(|c| c.new_index)
    };
    let mut indices = Vec::new();
    for tri in mesh.indices.chunks_exact(3) {
        let (Some(a), Some(b), Some(c)) = (remap(tri[0]), remap(tri[1]), remap(tri[2])) else {
            continue;
        };
        if a != b && b != c && a != c {
            indices.extend_from_slice(&[a, b, c]);
        }
    }

    // Shrink toward the centroid
    let centroid = vertices.iter().copied().sum::<Vec3>() / vertices.len() as f32;
    for v in &mut vertices {
        *v = centroid + (*v - centroid) * shrink_factor;
    }

    OccluderMesh { aabb, vertices, indices }
}

/// Collect and simplify the geometry below `source`.
///
/// Falls back to the source's own bounds (moved to world space by `base`)
/// when fewer than 3 vertices or no triangles are found.
pub fn build_simplified_mesh(
    source: &dyn GeometrySource,
    base: &Mat4,
    resolution: u32,
    shrink_factor: f32,
) -> OccluderMesh {
    let collected = collect_mesh(source, base);
    if collected.vertices.len() < 3 || collected.indices.is_empty() {
        return OccluderMesh::bounds_only(source.bounding_box().transformed(base));
    }
    simplify_mesh(&collected, resolution, shrink_factor)
}

#[cfg(test)]
#[path = "simplifier_tests.rs"]
mod tests;
