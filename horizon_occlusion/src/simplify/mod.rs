//! Simplify module: conservative occluder meshes from arbitrary geometry.
//!
//! Vertex clustering on a coarse grid followed by a shrink toward the
//! centroid. Results are cached per scene node in an arena.

mod occluder_mesh;
mod simplifier;
mod mesh_cache;

pub use occluder_mesh::OccluderMesh;
pub use simplifier::{CollectedMesh, collect_mesh, simplify_mesh, build_simplified_mesh};
pub use mesh_cache::{OccluderMeshCache, OccluderMeshKey};
