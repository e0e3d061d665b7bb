/// SceneGraph: arena of nodes addressed by stable keys.
///
/// Uses a SlotMap for O(1) insert/remove with stable keys. Each node keeps
/// its children in draw order and a cached bounding box expressed in its
/// parent's frame; any change below a node drops the cached boxes of the
/// node and all its ancestors.

use std::cell::Cell;
use bitflags::bitflags;
use glam::Mat4;
use slotmap::{new_key_type, SlotMap};
use crate::bounds::{AABB, BoundingSphere};
use crate::error::Result;
use crate::horizon_bail;
use crate::simplify::OccluderMesh;
use super::drawable::{Drawable, GeometrySource};

const SOURCE: &str = "horizon::SceneGraph";

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable key for a node within a SceneGraph.
    ///
    /// A key becomes invalid only when its own node is removed.
    pub struct NodeKey;
}

// ===== FLAGS =====

bitflags! {
    /// Per-node traversal flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u32 {
        /// Never occlusion-tested, always traversed (e.g. doors flush against walls)
        const SKIP_OCCLUSION = 1 << 0;
        /// Not traversed at all
        const HIDDEN = 1 << 1;
    }
}

// ===== NODE =====

/// Precomputed occluder meshes carried by a streamed chunk node.
#[derive(Debug, Clone, Default)]
pub struct PagedChunkOccluderData {
    /// World-space occluder meshes of the chunk's large sub-objects
    pub occluders: Vec<OccluderMesh>,
}

/// Closed set of node variants the cull traversal dispatches on.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Top of the visible scene; runs the per-frame orchestration
    Scene,
    /// Spatial partition (interior room, exterior region); runs the two-pass filter
    Cell,
    /// Streamed aggregate with precomputed occluders
    PagedChunk(PagedChunkOccluderData),
    /// Plain grouping node
    Group,
    /// Applies a matrix to its subtree
    Transform(Mat4),
    /// Leaf carrying geometry
    Geometry(Drawable),
}

impl NodeKind {
    /// `true` for variants that may have children.
    pub fn accepts_children(&self) -> bool {
        !matches!(self, NodeKind::Geometry(_))
    }
}

#[derive(Debug)]
pub struct Node {
    name: String,
    kind: NodeKind,
    flags: NodeFlags,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    bounds: Cell<Option<AABB>>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}

// ===== SCENE GRAPH =====

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self { nodes: SlotMap::with_key() }
    }

    /// Create a detached node.
    pub fn create_node(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeKey {
        self.nodes.insert(Node {
            name: name.into(),
            kind,
            flags: NodeFlags::empty(),
            parent: None,
            children: Vec::new(),
            bounds: Cell::new(None),
        })
    }

    /// Create a node and append it to `parent`'s children.
    pub fn add_node(
        &mut self,
        parent: NodeKey,
        name: impl Into<String>,
        kind: NodeKind,
    ) -> Result<NodeKey> {
        self.check_parent(parent)?;
        let key = self.create_node(name, kind);
        self.attach(parent, key);
        Ok(key)
    }

    /// Append an existing detached node to `parent`'s children.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.check_parent(parent)?;
        let Some(node) = self.nodes.get(child) else {
            horizon_bail!(InvalidNode, SOURCE, "child {:?} does not exist", child);
        };
        if node.parent.is_some() {
            horizon_bail!(InvalidNode, SOURCE, "node '{}' already has a parent", node.name);
        }
        if self.is_ancestor_or_self(child, parent) {
            horizon_bail!(InvalidNode, SOURCE, "attaching '{}' would create a cycle", node.name);
        }
        self.attach(parent, child);
        Ok(())
    }

    fn check_parent(&self, parent: NodeKey) -> Result<()> {
        let Some(node) = self.nodes.get(parent) else {
            horizon_bail!(InvalidNode, SOURCE, "parent {:?} does not exist", parent);
        };
        if !node.kind.accepts_children() {
            horizon_bail!(InvalidNode, SOURCE, "geometry node '{}' cannot have children", node.name);
        }
        Ok(())
    }

    fn attach(&mut self, parent: NodeKey, child: NodeKey) {
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
        self.dirty_bounds(parent);
    }

    /// `true` if `ancestor` is `key` or lies on its parent chain.
    fn is_ancestor_or_self(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.nodes.get(k).and_then(|n| n.parent);
        }
        false
    }

    /// Remove a node and its whole subtree. Returns every removed key.
    pub fn remove_node(&mut self, key: NodeKey) -> Result<Vec<NodeKey>> {
        let Some(node) = self.nodes.get(key) else {
            horizon_bail!(InvalidNode, SOURCE, "node {:?} does not exist", key);
        };
        if let Some(parent) = node.parent {
            if let Some(p) = self.nodes.get_mut(parent) {
                p.children.retain(|&c| c != key);
            }
            self.dirty_bounds(parent);
        }

        let mut removed = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.nodes.remove(k) {
                stack.extend(node.children);
                removed.push(k);
            }
        }
        Ok(removed)
    }

    // ===== ACCESS =====

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(key).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn flags(&self, key: NodeKey) -> NodeFlags {
        self.nodes.get(key).map(|n| n.flags).unwrap_or_default()
    }

    pub fn set_flags(&mut self, key: NodeKey, flags: NodeFlags) -> Result<()> {
        let Some(node) = self.nodes.get_mut(key) else {
            horizon_bail!(InvalidNode, SOURCE, "node {:?} does not exist", key);
        };
        node.flags = flags;
        Ok(())
    }

    /// Replace a transform node's matrix.
    pub fn set_matrix(&mut self, key: NodeKey, matrix: Mat4) -> Result<()> {
        let Some(node) = self.nodes.get_mut(key) else {
            horizon_bail!(InvalidNode, SOURCE, "node {:?} does not exist", key);
        };
        let NodeKind::Transform(m) = &mut node.kind else {
            horizon_bail!(InvalidNode, SOURCE, "node '{}' is not a transform", node.name);
        };
        *m = matrix;
        self.dirty_bounds(key);
        Ok(())
    }

    /// Replace a geometry node's drawable.
    pub fn set_drawable(&mut self, key: NodeKey, drawable: Drawable) -> Result<()> {
        let Some(node) = self.nodes.get_mut(key) else {
            horizon_bail!(InvalidNode, SOURCE, "node {:?} does not exist", key);
        };
        let NodeKind::Geometry(d) = &mut node.kind else {
            horizon_bail!(InvalidNode, SOURCE, "node '{}' is not a geometry node", node.name);
        };
        *d = drawable;
        self.dirty_bounds(key);
        Ok(())
    }

    // ===== BOUNDS =====

    fn dirty_bounds(&self, key: NodeKey) {
        let mut current = Some(key);
        while let Some(k) = current {
            let Some(node) = self.nodes.get(k) else { break };
            node.bounds.set(None);
            current = node.parent;
        }
    }

    /// Bounding box of the subtree, in the parent's frame. Invalid when empty.
    pub fn bounding_box(&self, key: NodeKey) -> AABB {
        let Some(node) = self.nodes.get(key) else {
            return AABB::EMPTY;
        };
        if let Some(cached) = node.bounds.get() {
            return cached;
        }

        let mut aabb = AABB::EMPTY;
        match &node.kind {
            NodeKind::Geometry(drawable) => aabb = drawable.bounds(),
            NodeKind::Transform(m) => {
                for &child in &node.children {
                    aabb.expand_by_aabb(&self.bounding_box(child).transformed(m));
                }
            }
            _ => {
                for &child in &node.children {
                    aabb.expand_by_aabb(&self.bounding_box(child));
                }
            }
        }
        node.bounds.set(Some(aabb));
        aabb
    }

    /// Bounding sphere of the subtree, in the parent's frame.
    pub fn bounding_sphere(&self, key: NodeKey) -> BoundingSphere {
        BoundingSphere::from_aabb(&self.bounding_box(key))
    }

    /// View of the subtree below `root` as a geometry source.
    pub fn subtree(&self, root: NodeKey) -> Subtree<'_> {
        Subtree { graph: self, root }
    }

    fn visit_drawables(&self, key: NodeKey, matrix: &Mat4, visit: &mut dyn FnMut(&Mat4, &Drawable)) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        match &node.kind {
            NodeKind::Geometry(drawable) => visit(matrix, drawable),
            NodeKind::Transform(m) => {
                let composed = *matrix * *m;
                for &child in &node.children {
                    self.visit_drawables(child, &composed, visit);
                }
            }
            _ => {
                for &child in &node.children {
                    self.visit_drawables(child, matrix, visit);
                }
            }
        }
    }
}

/// A subtree of a `SceneGraph`, enumerable as geometry.
#[derive(Clone, Copy)]
pub struct Subtree<'a> {
    graph: &'a SceneGraph,
    root: NodeKey,
}

impl GeometrySource for Subtree<'_> {
    fn for_each_drawable(&self, base: &Mat4, visit: &mut dyn FnMut(&Mat4, &Drawable)) {
        self.graph.visit_drawables(self.root, base, visit);
    }

    fn bounding_box(&self) -> AABB {
        self.graph.bounding_box(self.root)
    }
}

#[cfg(test)]
#[path = "scene_graph_tests.rs"]
mod tests;
