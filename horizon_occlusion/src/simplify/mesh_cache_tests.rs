use glam::{Mat4, Vec3};
use crate::bounds::AABB;
use crate::scene::{Drawable, NodeKind, SceneGraph};
use super::*;

fn graph_with_building() -> (SceneGraph, NodeKey) {
    let mut graph = SceneGraph::new();
    let cell = graph.create_node("cell", NodeKind::Cell);
    let building = graph.add_node(cell, "building", NodeKind::Group).unwrap();
    graph
        .add_node(building, "walls", NodeKind::Geometry(Drawable::cuboid(Vec3::ZERO, Vec3::splat(10.0))))
        .unwrap();
    (graph, building)
}

#[test]
fn test_build_once_then_reuse() {
    let (mut graph, building) = graph_with_building();
    let mut cache = OccluderMeshCache::new();
    assert!(!cache.contains(building));

    let first = cache.get_or_build(&graph, building, &Mat4::IDENTITY, 8, 1.0).clone();
    assert_eq!(first.triangle_count(), 12);
    assert_eq!(cache.len(), 1);

    // Later geometry changes are not picked up until the node is evicted
    let walls = graph.children(building)[0];
    graph.set_drawable(walls, Drawable::default()).unwrap();
    let second = cache.get_or_build(&graph, building, &Mat4::IDENTITY, 8, 1.0);
    assert_eq!(*second, first);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_evict_rebuilds() {
    let (mut graph, building) = graph_with_building();
    let mut cache = OccluderMeshCache::new();
    cache.get_or_build(&graph, building, &Mat4::IDENTITY, 8, 1.0);

    let walls = graph.children(building)[0];
    graph
        .set_drawable(walls, Drawable::cuboid(Vec3::ZERO, Vec3::splat(20.0)))
        .unwrap();

    assert!(cache.evict(building));
    assert!(!cache.evict(building));
    assert!(cache.is_empty());

    let rebuilt = cache.get_or_build(&graph, building, &Mat4::IDENTITY, 8, 1.0);
    assert_eq!(rebuilt.aabb, AABB::new(Vec3::ZERO, Vec3::splat(20.0)));
}

#[test]
fn test_base_matrix_places_mesh_in_world() {
    let (graph, building) = graph_with_building();
    let mut cache = OccluderMeshCache::new();
    let base = Mat4::from_translation(Vec3::new(0.0, 500.0, 0.0));
    let mesh = cache.get_or_build(&graph, building, &base, 8, 1.0);
    assert_eq!(mesh.aabb, AABB::new(Vec3::new(0.0, 500.0, 0.0), Vec3::new(10.0, 510.0, 10.0)));
}

#[test]
fn test_empty_node_cached_as_bounds_only() {
    let mut graph = SceneGraph::new();
    let empty = graph.create_node("empty", NodeKind::Group);
    let mut cache = OccluderMeshCache::new();

    let mesh = cache.get_or_build(&graph, empty, &Mat4::IDENTITY, 8, 1.0);
    assert!(!mesh.has_triangles());
    assert!(!mesh.aabb.valid());
    assert!(cache.contains(empty));
    assert!(cache.get(empty).is_some());
}

#[test]
fn test_clear() {
    let (graph, building) = graph_with_building();
    let mut cache = OccluderMeshCache::new();
    cache.get_or_build(&graph, building, &Mat4::IDENTITY, 8, 1.0);
    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.get(building).is_none());
}

#[test]
fn test_reused_node_slot_does_not_grow_cache() {
    let mut graph = SceneGraph::new();
    let cell = graph.create_node("cell", NodeKind::Cell);
    let mut cache = OccluderMeshCache::new();

    for i in 0..100 {
        let rock = graph
            .add_node(cell, "rock", NodeKind::Geometry(Drawable::cuboid(Vec3::ZERO, Vec3::splat(1.0 + i as f32))))
            .unwrap();
        let mesh = cache.get_or_build(&graph, rock, &Mat4::IDENTITY, 8, 1.0);
        assert_eq!(mesh.aabb.max, Vec3::splat(1.0 + i as f32));
        graph.remove_node(rock).unwrap();
    }

    assert!(cache.len() <= 1);
}

#[test]
fn test_retain_live_drops_removed_nodes() {
    let (mut graph, building) = graph_with_building();
    let cell = graph.node(building).unwrap().parent().unwrap();
    let shed = graph
        .add_node(cell, "shed", NodeKind::Geometry(Drawable::cuboid(Vec3::ZERO, Vec3::ONE)))
        .unwrap();

    let mut cache = OccluderMeshCache::new();
    cache.get_or_build(&graph, building, &Mat4::IDENTITY, 8, 1.0);
    cache.get_or_build(&graph, shed, &Mat4::IDENTITY, 8, 1.0);
    assert_eq!(cache.retain_live(&graph), 0);

    graph.remove_node(shed).unwrap();
    assert_eq!(cache.retain_live(&graph), 1);
    assert_eq!(cache.len(), 1);
    assert!(cache.contains(building));
    assert!(!cache.contains(shed));
}
