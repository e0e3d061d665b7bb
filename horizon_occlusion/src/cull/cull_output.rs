/// Result of one cull traversal.
///
/// Ephemeral, like a render view: the renderer consumes `visible` and
/// drops it. `traversed` lists every node entered, in visit order.

use glam::Mat4;
use crate::camera::CameraRole;
use crate::scene::NodeKey;

/// A geometry leaf that survived culling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleDrawable {
    pub node: NodeKey,
    pub world_matrix: Mat4,
}

#[derive(Debug, Clone)]
pub struct CullOutput {
    role: CameraRole,
    /// Whether the traversal tested against the depth buffer
    occlusion_active: bool,
    traversed: Vec<NodeKey>,
    visible: Vec<VisibleDrawable>,
}

impl CullOutput {
    pub(crate) fn new(role: CameraRole) -> Self {
        Self {
            role,
            occlusion_active: false,
            traversed: Vec::new(),
            visible: Vec::new(),
        }
    }

    pub fn role(&self) -> CameraRole {
        self.role
    }

    pub fn occlusion_active(&self) -> bool {
        self.occlusion_active
    }

    pub(crate) fn set_occlusion_active(&mut self, active: bool) {
        self.occlusion_active = active;
    }

    pub fn traversed(&self) -> &[NodeKey] {
        &self.traversed
    }

    pub fn visible(&self) -> &[VisibleDrawable] {
        &self.visible
    }

    /// `true` if the traversal entered `node`.
    pub fn is_traversed(&self, node: NodeKey) -> bool {
        self.traversed.contains(&node)
    }

    /// `true` if `node` is a geometry leaf that reached the output.
    pub fn is_visible(&self, node: NodeKey) -> bool {
        self.visible.iter().any(|v| v.node == node)
    }

    pub(crate) fn push_traversed(&mut self, node: NodeKey) {
        self.traversed.push(node);
    }

    pub(crate) fn push_visible(&mut self, node: NodeKey, world_matrix: Mat4) {
        self.visible.push(VisibleDrawable { node, world_matrix });
    }
}
