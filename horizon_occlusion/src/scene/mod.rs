//! Scene module: the node hierarchy the cull traversal walks.
//!
//! Nodes live in a slot-map arena and are addressed by `NodeKey`.
//! Geometry is exposed to the simplifier through `GeometrySource`.

mod drawable;
mod scene_graph;

pub use drawable::{
    Drawable, Primitive, PrimitiveIndices, PrimitiveTopology, GeometrySource,
};
pub use scene_graph::{
    SceneGraph, Node, NodeKey, NodeKind, NodeFlags, PagedChunkOccluderData, Subtree,
};
