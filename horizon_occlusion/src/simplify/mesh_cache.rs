/// OccluderMeshCache: simplified meshes keyed by scene node.
///
/// A mesh is built the first time a node is considered as an occluder and
/// reused on every later frame. Meshes are in world space, so the cache is
/// only valid for static geometry. `OcclusionSystem`'s scene-edit helpers
/// evict the affected nodes; direct graph edits must call `evict`.

use glam::Mat4;
use slotmap::{new_key_type, SecondaryMap, SlotMap};
use crate::horizon_debug;
use crate::scene::{NodeKey, SceneGraph};
use super::occluder_mesh::OccluderMesh;
use super::simplifier::build_simplified_mesh;

const SOURCE: &str = "horizon::OccluderMeshCache";

new_key_type! {
    /// Stable key for a cached occluder mesh.
    pub struct OccluderMeshKey;
}

#[derive(Debug)]
struct CachedMesh {
    node: NodeKey,
    mesh: OccluderMesh,
}

#[derive(Debug, Default)]
pub struct OccluderMeshCache {
    meshes: SlotMap<OccluderMeshKey, CachedMesh>,
    by_node: SecondaryMap<NodeKey, OccluderMeshKey>,
}

impl OccluderMeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached mesh for `node`, building it on first request.
    ///
    /// `base` maps the node's parent frame to world space. A node without
    /// triangles (or unknown to `graph`) yields a bounds-only mesh, which is
    /// cached as well.
    pub fn get_or_build(
        &mut self,
        graph: &SceneGraph,
        node: NodeKey,
        base: &Mat4,
        resolution: u32,
        shrink_factor: f32,
    ) -> &OccluderMesh {
        let key = match self.by_node.get(node) {
            Some(&key) => key,
            None => {
                let mesh = Self::build(graph, node, base, resolution, shrink_factor);
                let key = self.meshes.insert(CachedMesh { node, mesh });
                self.by_node.insert(node, key);
                // A reused node slot silently replaces the stale handle
                if self.meshes.len() > self.by_node.len() {
                    self.drop_orphans();
                }
                key
            }
        };
        &self.meshes[key].mesh
    }

    fn build(
        graph: &SceneGraph,
        node: NodeKey,
        base: &Mat4,
        resolution: u32,
        shrink_factor: f32,
    ) -> OccluderMesh {
        let name = graph.node(node).map(|n| n.name()).unwrap_or("<removed>");
        let mesh = build_simplified_mesh(&graph.subtree(node), base, resolution, shrink_factor);

        if mesh.vertices.is_empty() {
            horizon_debug!(SOURCE, "'{}': no triangles, using bounds only", name);
        } else {
            horizon_debug!(
                SOURCE,
                "'{}': {} verts / {} tris (res {}, radius {:.1})",
                name,
                mesh.vertex_count(),
                mesh.triangle_count(),
                resolution,
                mesh.aabb.radius()
            );
        }
        mesh
    }

    /// Remove meshes no longer reachable from `by_node`.
    fn drop_orphans(&mut self) {
        let by_node = &self.by_node;
        self.meshes.retain(|key, cached| by_node.get(cached.node) == Some(&key));
    }

    /// Drop the meshes of nodes that no longer exist in `graph`.
    ///
    /// Returns how many were dropped.
    pub fn retain_live(&mut self, graph: &SceneGraph) -> usize {
        let before = self.meshes.len();
        self.meshes.retain(|_, cached| graph.contains(cached.node));
        let meshes = &self.meshes;
        self.by_node.retain(|_, key| meshes.contains_key(*key));
        before - self.meshes.len()
    }

    pub fn get(&self, node: NodeKey) -> Option<&OccluderMesh> {
        self.by_node.get(node).and_then(|&key| self.meshes.get(key)).map(|c| &c.mesh)
    }

    pub fn contains(&self, node: NodeKey) -> bool {
        self.by_node.contains_key(node)
    }

    /// Drop the mesh of `node`. Returns `true` if one was cached.
    pub fn evict(&mut self, node: NodeKey) -> bool {
        match self.by_node.remove(node) {
            Some(key) => {
                self.meshes.remove(key);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.meshes.clear();
        self.by_node.clear();
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

#[cfg(test)]
#[path = "mesh_cache_tests.rs"]
mod tests;
