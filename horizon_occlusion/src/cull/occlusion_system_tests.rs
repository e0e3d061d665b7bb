/// Tests for OcclusionSystem
///
/// Orchestration and dispatch are checked with the mock rasterizer
/// (scripted answers, call counts). Pass ordering and per-object results
/// need real pixels and use the software depth buffer.

use std::sync::{Arc, Mutex};
use glam::{DVec3, Mat4, Vec3};
use serial_test::serial;
use crate::bounds::AABB;
use crate::camera::{Camera, CameraRole};
use crate::error::Error;
use crate::log::{Log, LogEntry, LogSeverity, Logger};
use crate::rasterizer::mock_rasterizer::{MockRasterizer, MockRasterizerState};
use crate::rasterizer::{CullingResult, OcclusionCuller, BOX_TRIANGLE_INDICES};
use crate::scene::{Drawable, NodeFlags, NodeKey, NodeKind, PagedChunkOccluderData, SceneGraph};
use crate::settings::OcclusionSettings;
use crate::simplify::{OccluderMesh, OccluderMeshCache};
use crate::terrain::{FnHeightStorage, TerrainStorage};
use super::*;

// ============================================================================
// Helper Functions
// ============================================================================

fn camera(role: CameraRole, eye: Vec3) -> Camera {
    let eye = eye.as_dvec3();
    Camera::look_at(
        role,
        eye,
        eye + DVec3::Y,
        DVec3::Z,
        std::f64::consts::FRAC_PI_2,
        2.0,
        1.0,
        20000.0,
    )
}

fn main_camera() -> Camera {
    camera(CameraRole::Main, Vec3::new(0.0, 0.0, 50.0))
}

fn flat_storage() -> Arc<dyn TerrainStorage> {
    Arc::new(FnHeightStorage::new(8192.0, 9, |_| 0.0))
}

fn test_settings() -> OcclusionSettings {
    OcclusionSettings {
        occluder_min_radius: 50.0,
        occluder_max_radius: 500.0,
        enable_interiors: true,
        ..Default::default()
    }
}

/// Interior system (no terrain) driving a mock rasterizer.
fn mock_system(
    settings: OcclusionSettings,
    answer: CullingResult,
) -> (OcclusionSystem, Arc<Mutex<MockRasterizerState>>) {
    let (mock, state) = MockRasterizer::new(128, 64);
    state.lock().unwrap().answer = answer;
    let culler = OcclusionCuller::with_rasterizer(Box::new(mock));
    let mut system = OcclusionSystem::with_culler(settings, culler, flat_storage());
    system.set_cell_type(true, false);
    (system, state)
}

/// Interior system on a real software depth buffer.
fn software_system(settings: OcclusionSettings) -> OcclusionSystem {
    let mut system = OcclusionSystem::with_culler(settings, OcclusionCuller::new(128, 64), flat_storage());
    system.set_cell_type(true, false);
    system
}

struct TestScene {
    graph: SceneGraph,
    scene: NodeKey,
    cell: NodeKey,
    building: NodeKey,
    small: NodeKey,
}

/// A 200 x 20 x 200 building 500 units ahead of the camera and a small
/// crate 800 units ahead, offset sideways by `small_x`.
fn test_scene(small_x: f32) -> TestScene {
    let mut graph = SceneGraph::new();
    let scene = graph.create_node("scene", NodeKind::Scene);
    let cell = graph.add_node(scene, "cell", NodeKind::Cell).unwrap();
    let building = graph.add_node(cell, "building", NodeKind::Group).unwrap();
    graph
        .add_node(
            building,
            "walls",
            NodeKind::Geometry(Drawable::cuboid(Vec3::new(-100.0, 490.0, 0.0), Vec3::new(100.0, 510.0, 200.0))),
        )
        .unwrap();
    let small = graph
        .add_node(
            cell,
            "crate",
            NodeKind::Geometry(Drawable::cuboid(
                Vec3::new(small_x - 5.0, 795.0, 45.0),
                Vec3::new(small_x + 5.0, 805.0, 55.0),
            )),
        )
        .unwrap();
    TestScene { graph, scene, cell, building, small }
}

fn box_mesh(min: Vec3, max: Vec3) -> OccluderMesh {
    let aabb = AABB::new(min, max);
    OccluderMesh {
        aabb,
        vertices: aabb.corners().to_vec(),
        indices: BOX_TRIANGLE_INDICES.to_vec(),
    }
}

// ============================================================================
// Camera roles and frame deduplication
// ============================================================================

#[test]
fn test_auxiliary_camera_skips_occlusion() {
    let (mut system, state) = mock_system(test_settings(), CullingResult::Occluded);
    let s = test_scene(0.0);
    let mut frame = FrameContext::new(1);

    let out = system.cull(&s.graph, s.scene, &camera(CameraRole::Shadow, Vec3::new(0.0, 0.0, 50.0)), &mut frame);

    assert!(!out.occlusion_active());
    assert_eq!(out.role(), CameraRole::Shadow);
    assert!(out.is_traversed(s.building));
    assert!(out.is_visible(s.small));
    assert!(!frame.occlusion_processed());
    let state = state.lock().unwrap();
    assert_eq!(state.clears, 0);
    assert!(state.queries.is_empty());
}

#[test]
fn test_duplicate_traversal_reuses_buffer() {
    let (mut system, state) = mock_system(test_settings(), CullingResult::Visible);
    let s = test_scene(0.0);
    let mut frame = FrameContext::new(7);

    let first = system.cull(&s.graph, s.scene, &main_camera(), &mut frame);
    assert!(first.occlusion_active());
    assert!(frame.occlusion_processed());

    // Shadow pass in between leaves the main buffer alone
    system.cull(&s.graph, s.scene, &camera(CameraRole::Shadow, Vec3::ZERO), &mut frame);
    assert!(system.culler().is_frame_active());

    let second = system.cull(&s.graph, s.scene, &main_camera(), &mut frame);
    assert!(second.occlusion_active());
    assert!(second.is_visible(s.small));
    assert_eq!(state.lock().unwrap().clears, 1);
    assert_eq!(system.processed_frames(), 1);

    frame.advance();
    assert_eq!(frame.frame_number(), 8);
    system.cull(&s.graph, s.scene, &main_camera(), &mut frame);
    assert_eq!(state.lock().unwrap().clears, 2);
    assert_eq!(system.processed_frames(), 2);
}

// ============================================================================
// Interiors and terrain
// ============================================================================

#[test]
fn test_no_terrain_without_interior_support_disables_occlusion() {
    let settings = OcclusionSettings { enable_interiors: false, ..test_settings() };
    let (mut system, state) = mock_system(settings, CullingResult::Occluded);
    let s = test_scene(0.0);

    let out = system.cull(&s.graph, s.scene, &main_camera(), &mut FrameContext::new(1));

    assert!(!out.occlusion_active());
    assert!(!system.culler().is_frame_active());
    assert!(out.is_visible(s.small));
    assert!(out.is_traversed(s.building));
    assert_eq!(state.lock().unwrap().clears, 0);
}

#[test]
fn test_exterior_cell_without_worldspace_disables_occlusion() {
    let (mut system, state) = mock_system(test_settings(), CullingResult::Occluded);
    system.set_cell_type(false, false);
    let s = test_scene(0.0);

    let out = system.cull(&s.graph, s.scene, &main_camera(), &mut FrameContext::new(1));
    assert!(!out.occlusion_active());
    assert!(out.is_visible(s.small));
    assert_eq!(state.lock().unwrap().clears, 0);
}

#[test]
fn test_interior_begins_frame_without_terrain() {
    let (mut system, state) = mock_system(test_settings(), CullingResult::Visible);
    let mut graph = SceneGraph::new();
    let scene = graph.create_node("scene", NodeKind::Scene);

    let out = system.cull(&graph, scene, &main_camera(), &mut FrameContext::new(1));

    assert!(out.occlusion_active());
    let state = state.lock().unwrap();
    assert_eq!(state.clears, 1);
    assert_eq!(state.render_calls, 0);
}

#[test]
fn test_terrain_rasterized_first() {
    let (mut system, state) = mock_system(test_settings(), CullingResult::Visible);
    system.set_cell_type(false, false);
    system.set_worldspace(Some("world".to_string()));
    let mut graph = SceneGraph::new();
    let scene = graph.create_node("scene", NodeKind::Scene);

    system.cull(&graph, scene, &main_camera(), &mut FrameContext::new(1));

    // 9 samples, lod 3: one quad per cell, radius 2 -> 25 cells
    let state = state.lock().unwrap();
    assert_eq!(state.clears, 1);
    assert_eq!(state.render_calls, 1);
    assert_eq!(state.triangles, 50);
    assert_eq!(system.terrain().rebuild_count(), 1);
}

#[test]
fn test_terrain_occluder_switch() {
    let settings = OcclusionSettings { terrain_occluder: false, ..test_settings() };
    let (mut system, state) = mock_system(settings, CullingResult::Visible);
    system.set_worldspace(Some("world".to_string()));
    let mut graph = SceneGraph::new();
    let scene = graph.create_node("scene", NodeKind::Scene);

    let out = system.cull(&graph, scene, &main_camera(), &mut FrameContext::new(1));
    assert!(out.occlusion_active());
    assert_eq!(state.lock().unwrap().render_calls, 0);
}

#[test]
fn test_disabled_settings_never_create_buffer() {
    let settings = OcclusionSettings { enabled: false, ..test_settings() };
    let mut system = OcclusionSystem::new(settings, flat_storage());
    system.set_cell_type(true, false);
    let s = test_scene(0.0);

    assert!(!system.culler().is_active());
    let out = system.cull(&s.graph, s.scene, &main_camera(), &mut FrameContext::new(1));
    assert!(!out.occlusion_active());
    assert!(out.is_visible(s.small));
}

// ============================================================================
// Cell filter
// ============================================================================

#[test]
fn test_occluded_cell_skips_all_children() {
    let (mut system, state) = mock_system(test_settings(), CullingResult::Occluded);
    let s = test_scene(0.0);

    let out = system.cull(&s.graph, s.scene, &main_camera(), &mut FrameContext::new(1));

    assert!(out.is_traversed(s.cell));
    assert!(!out.is_traversed(s.building));
    assert!(!out.is_traversed(s.small));
    assert!(out.visible().is_empty());
    assert_eq!(state.lock().unwrap().queries.len(), 1);
    assert!(system.mesh_cache().is_empty());
}

#[test]
fn test_visible_building_becomes_occluder() {
    let (mut system, state) = mock_system(test_settings(), CullingResult::Visible);
    let s = test_scene(0.0);

    let out = system.cull(&s.graph, s.scene, &main_camera(), &mut FrameContext::new(1));

    assert!(out.is_traversed(s.building));
    assert!(out.is_visible(s.small));
    assert!(system.mesh_cache().contains(s.building));
    assert!(!system.mesh_cache().contains(s.small));

    let stats = *system.culler().stats();
    assert_eq!(stats.building_occluders, 1);
    assert_eq!(stats.building_tris, 12);
    assert_eq!(stats.building_verts, 8);
    // Cell, building mesh box, crate
    assert_eq!(stats.tested, 3);
    assert_eq!(state.lock().unwrap().triangles, 12);
}

#[test]
fn test_building_around_camera_not_rasterized() {
    let (mut system, _) = mock_system(test_settings(), CullingResult::Visible);
    let s = test_scene(0.0);
    let inside = camera(CameraRole::Main, Vec3::new(0.0, 500.0, 100.0));

    let out = system.cull(&s.graph, s.scene, &inside, &mut FrameContext::new(1));

    assert!(out.is_traversed(s.building));
    assert_eq!(system.culler().stats().building_occluders, 0);
}

#[test]
fn test_distant_building_not_rasterized() {
    let settings = OcclusionSettings { occluder_max_distance: 1000.0, ..test_settings() };
    let (mut system, _) = mock_system(settings, CullingResult::Visible);
    let s = test_scene(0.0);
    let far = camera(CameraRole::Main, Vec3::new(0.0, -2000.0, 50.0));

    let out = system.cull(&s.graph, s.scene, &far, &mut FrameContext::new(1));

    assert!(out.is_traversed(s.building));
    assert_eq!(system.culler().stats().building_occluders, 0);
}

#[test]
fn test_static_occluders_switch() {
    let settings = OcclusionSettings { static_occluders: false, ..test_settings() };
    let (mut system, state) = mock_system(settings, CullingResult::Visible);
    let s = test_scene(0.0);

    let out = system.cull(&s.graph, s.scene, &main_camera(), &mut FrameContext::new(1));
    assert!(out.is_traversed(s.building));
    assert_eq!(state.lock().unwrap().render_calls, 0);
}

#[test]
fn test_triangle_budget() {
    let settings = OcclusionSettings { occluder_max_triangles: 12, ..test_settings() };
    let (mut system, _) = mock_system(settings, CullingResult::Visible);
    let mut s = test_scene(0.0);
    let second = s
        .graph
        .add_node(
            s.cell,
            "second building",
            NodeKind::Geometry(Drawable::cuboid(Vec3::new(300.0, 490.0, 0.0), Vec3::new(500.0, 510.0, 200.0))),
        )
        .unwrap();

    let out = system.cull(&s.graph, s.scene, &main_camera(), &mut FrameContext::new(1));

    assert!(out.is_traversed(s.building));
    assert!(out.is_visible(second));
    assert_eq!(system.culler().stats().building_occluders, 1);
    assert_eq!(system.culler().stats().building_tris, 12);
}

#[test]
fn test_hidden_nodes_not_traversed() {
    let (mut system, _) = mock_system(test_settings(), CullingResult::Visible);
    let mut s = test_scene(0.0);
    s.graph.set_flags(s.small, NodeFlags::HIDDEN).unwrap();
    s.graph.set_flags(s.building, NodeFlags::HIDDEN).unwrap();

    let out = system.cull(&s.graph, s.scene, &main_camera(), &mut FrameContext::new(1));

    assert!(!out.is_traversed(s.small));
    assert!(!out.is_traversed(s.building));
    assert_eq!(system.culler().stats().building_occluders, 0);
}

#[test]
fn test_oversized_child_tested_without_simplification() {
    let (mut system, _) = mock_system(test_settings(), CullingResult::Visible);
    let mut s = test_scene(0.0);
    let hill = s
        .graph
        .add_node(
            s.cell,
            "hill",
            NodeKind::Geometry(Drawable::cuboid(Vec3::new(-2000.0, 1000.0, 0.0), Vec3::new(2000.0, 3000.0, 300.0))),
        )
        .unwrap();

    let out = system.cull(&s.graph, s.scene, &main_camera(), &mut FrameContext::new(1));

    assert!(out.is_visible(hill));
    assert!(!system.mesh_cache().contains(hill));
}

// ============================================================================
// Paged chunks
// ============================================================================

fn paged_scene(occluders: Vec<OccluderMesh>) -> (SceneGraph, NodeKey, NodeKey, NodeKey) {
    let mut graph = SceneGraph::new();
    let scene = graph.create_node("scene", NodeKind::Scene);
    let chunk = graph
        .add_node(scene, "chunk", NodeKind::PagedChunk(PagedChunkOccluderData { occluders }))
        .unwrap();
    let ground = graph
        .add_node(
            chunk,
            "objects",
            NodeKind::Geometry(Drawable::cuboid(Vec3::new(-4000.0, 100.0, 0.0), Vec3::new(4000.0, 8000.0, 500.0))),
        )
        .unwrap();
    (graph, scene, chunk, ground)
}

#[test]
fn test_paged_chunk_rasterizes_near_occluders() {
    let (mut system, state) = mock_system(test_settings(), CullingResult::Visible);
    let near = box_mesh(Vec3::new(-50.0, 600.0, 0.0), Vec3::new(50.0, 700.0, 100.0));
    let far = box_mesh(Vec3::new(-50.0, 60000.0, 0.0), Vec3::new(50.0, 60100.0, 100.0));
    let empty = OccluderMesh::bounds_only(AABB::new(Vec3::ZERO, Vec3::ONE));
    let (graph, scene, chunk, ground) = paged_scene(vec![near, far, empty]);

    let out = system.cull(&graph, scene, &main_camera(), &mut FrameContext::new(1));

    assert!(out.is_traversed(chunk));
    assert!(out.is_visible(ground));
    assert_eq!(system.culler().stats().building_occluders, 1);
    assert_eq!(state.lock().unwrap().triangles, 12);
}

#[test]
fn test_occluded_paged_chunk_skipped() {
    let (mut system, state) = mock_system(test_settings(), CullingResult::Occluded);
    let near = box_mesh(Vec3::new(-50.0, 600.0, 0.0), Vec3::new(50.0, 700.0, 100.0));
    let (graph, scene, chunk, ground) = paged_scene(vec![near]);

    let out = system.cull(&graph, scene, &main_camera(), &mut FrameContext::new(1));

    assert!(out.is_traversed(chunk));
    assert!(!out.is_visible(ground));
    assert_eq!(state.lock().unwrap().render_calls, 0);
}

#[test]
fn test_paged_chunk_in_cell_dispatches_to_injector() {
    let (mut system, _) = mock_system(test_settings(), CullingResult::Visible);
    let mut graph = SceneGraph::new();
    let scene = graph.create_node("scene", NodeKind::Scene);
    let cell = graph.add_node(scene, "cell", NodeKind::Cell).unwrap();
    let occluders = vec![box_mesh(Vec3::new(-50.0, 600.0, 0.0), Vec3::new(50.0, 700.0, 100.0))];
    let chunk = graph
        .add_node(cell, "chunk", NodeKind::PagedChunk(PagedChunkOccluderData { occluders }))
        .unwrap();
    let ground = graph
        .add_node(
            chunk,
            "objects",
            NodeKind::Geometry(Drawable::cuboid(Vec3::new(-4000.0, 100.0, 0.0), Vec3::new(4000.0, 8000.0, 500.0))),
        )
        .unwrap();

    let out = system.cull(&graph, scene, &main_camera(), &mut FrameContext::new(1));

    assert!(out.is_visible(ground));
    assert_eq!(system.culler().stats().building_occluders, 1);
    assert!(!system.mesh_cache().contains(chunk));
}

// ============================================================================
// Pass ordering (software depth buffer)
// ============================================================================

#[test]
fn test_small_object_behind_building_culled() {
    let mut system = software_system(test_settings());
    let s = test_scene(0.0);

    let out = system.cull(&s.graph, s.scene, &main_camera(), &mut FrameContext::new(1));

    assert!(out.is_traversed(s.building));
    assert!(!out.is_visible(s.small));
    assert_eq!(system.culler().stats().occluded, 1);
}

#[test]
fn test_small_object_beside_building_visible() {
    let mut system = software_system(test_settings());
    let s = test_scene(300.0);

    let out = system.cull(&s.graph, s.scene, &main_camera(), &mut FrameContext::new(1));
    assert!(out.is_visible(s.small));
}

#[test]
fn test_inflating_shrink_factor_does_not_hide_neighbors() {
    let mut graph = SceneGraph::new();
    let scene = graph.create_node("scene", NodeKind::Scene);
    let cell = graph.add_node(scene, "cell", NodeKind::Cell).unwrap();
    graph
        .add_node(
            cell,
            "building",
            NodeKind::Geometry(Drawable::cuboid(Vec3::new(-100.0, 490.0, 0.0), Vec3::new(100.0, 510.0, 200.0))),
        )
        .unwrap();
    // Just past the building's right edge; a 1.6x occluder would cover it
    let small = graph
        .add_node(
            cell,
            "crate",
            NodeKind::Geometry(Drawable::cuboid(Vec3::new(140.0, 595.0, 95.0), Vec3::new(150.0, 605.0, 105.0))),
        )
        .unwrap();

    let settings = OcclusionSettings { occluder_shrink_factor: 1.6, ..test_settings() };
    let mut system = software_system(settings);
    assert_eq!(system.settings().occluder_shrink_factor, 1.0);

    let eye = camera(CameraRole::Main, Vec3::new(0.0, 0.0, 100.0));
    let out = system.cull(&graph, scene, &eye, &mut FrameContext::new(1));
    assert!(out.is_visible(small));
}

#[test]
fn test_skip_occlusion_flag_forces_traversal() {
    let mut system = software_system(test_settings());
    let mut s = test_scene(0.0);
    s.graph.set_flags(s.small, NodeFlags::SKIP_OCCLUSION).unwrap();

    let out = system.cull(&s.graph, s.scene, &main_camera(), &mut FrameContext::new(1));
    assert!(out.is_visible(s.small));
}

#[test]
fn test_pass_order_matters() {
    // Same geometry as test_scene, driven by hand in the wrong order
    let s = test_scene(0.0);
    let cam = main_camera();
    let mut culler = OcclusionCuller::new(128, 64);
    culler.begin_frame(cam.view_matrix(), cam.projection_matrix());

    let small_box = AABB::from_sphere(&s.graph.bounding_sphere(s.small));
    let mut cache = OccluderMeshCache::new();
    let building = cache.get_or_build(&s.graph, s.building, &Mat4::IDENTITY, 8, 0.8).clone();

    // Small first: nothing in the buffer yet, wrongly reported visible
    assert!(culler.test_visible_aabb(&small_box));

    culler.rasterize_occluder(&building.vertices, &building.indices);
    assert!(!culler.test_visible_aabb(&small_box));
}

// ============================================================================
// Scene edits
// ============================================================================

#[test]
fn test_moved_geometry_evicts_building_mesh() {
    let mut system = software_system(test_settings());
    let mut s = test_scene(0.0);
    let mut frame = FrameContext::new(1);

    let out = system.cull(&s.graph, s.scene, &main_camera(), &mut frame);
    assert!(!out.is_visible(s.small));
    assert!(system.mesh_cache().contains(s.building));

    // Walls belong to the cached building group
    let walls = s.graph.children(s.building)[0];
    system
        .set_node_drawable(
            &mut s.graph,
            walls,
            Drawable::cuboid(Vec3::new(1000.0, 490.0, 0.0), Vec3::new(1200.0, 510.0, 200.0)),
        )
        .unwrap();
    assert!(!system.mesh_cache().contains(s.building));

    frame.advance();
    let out = system.cull(&s.graph, s.scene, &main_camera(), &mut frame);
    assert!(out.is_visible(s.small));
}

#[test]
fn test_matrix_change_evicts_subtree_and_ancestors() {
    let (mut system, _) = mock_system(test_settings(), CullingResult::Visible);
    let mut graph = SceneGraph::new();
    let cell = graph.create_node("cell", NodeKind::Cell);
    let building = graph.add_node(cell, "building", NodeKind::Group).unwrap();
    let pivot = graph.add_node(building, "pivot", NodeKind::Transform(Mat4::IDENTITY)).unwrap();
    let walls = graph
        .add_node(pivot, "walls", NodeKind::Geometry(Drawable::cuboid(Vec3::ZERO, Vec3::splat(10.0))))
        .unwrap();
    let shed = graph
        .add_node(cell, "shed", NodeKind::Geometry(Drawable::cuboid(Vec3::ZERO, Vec3::ONE)))
        .unwrap();
    for node in [building, pivot, walls, shed] {
        system.mesh_cache_mut().get_or_build(&graph, node, &Mat4::IDENTITY, 8, 1.0);
    }

    // Wrong node kind: nothing changes
    assert!(system.set_node_matrix(&mut graph, walls, Mat4::IDENTITY).is_err());
    assert_eq!(system.mesh_cache().len(), 4);

    let moved = Mat4::from_translation(Vec3::new(50.0, 0.0, 0.0));
    system.set_node_matrix(&mut graph, pivot, moved).unwrap();

    let cache = system.mesh_cache();
    assert!(!cache.contains(building));
    assert!(!cache.contains(pivot));
    assert!(!cache.contains(walls));
    assert!(cache.contains(shed));
}

#[test]
fn test_remove_node_drops_cached_meshes() {
    let (mut system, _) = mock_system(test_settings(), CullingResult::Visible);
    let mut s = test_scene(0.0);
    let walls = s.graph.children(s.building)[0];
    system.mesh_cache_mut().get_or_build(&s.graph, s.building, &Mat4::IDENTITY, 8, 1.0);
    system.mesh_cache_mut().get_or_build(&s.graph, walls, &Mat4::IDENTITY, 8, 1.0);

    let removed = system.remove_node(&mut s.graph, s.building).unwrap();
    assert_eq!(removed.len(), 2);
    assert!(system.mesh_cache().is_empty());
    assert!(!s.graph.contains(walls));

    assert!(matches!(
        system.remove_node(&mut s.graph, s.building),
        Err(Error::InvalidNode(_))
    ));
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_debug_overlay_refreshed_after_traversal() {
    let settings = OcclusionSettings { debug_overlay: true, ..test_settings() };
    let (mut system, _) = mock_system(settings, CullingResult::Visible);
    let s = test_scene(0.0);
    let mut frame = FrameContext::new(1);

    assert!(system.debug_overlay().is_none());
    system.cull(&s.graph, s.scene, &main_camera(), &mut frame);
    frame.advance();
    system.cull(&s.graph, s.scene, &main_camera(), &mut frame);

    let overlay = system.debug_overlay().unwrap();
    assert_eq!(overlay.refresh_count(), 2);
    assert_eq!(overlay.resolution(), (128, 64));
}

#[derive(Clone, Default)]
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

#[test]
#[serial]
fn test_stats_logged_every_interval() {
    let settings = OcclusionSettings {
        debug_messages: true,
        stats_interval_frames: 2,
        ..test_settings()
    };
    let (mut system, _) = mock_system(settings, CullingResult::Visible);
    let s = test_scene(0.0);
    let capture = CaptureLogger::default();
    Log::set_logger(capture.clone());

    let mut frame = FrameContext::new(0);
    for _ in 0..5 {
        system.cull(&s.graph, s.scene, &main_camera(), &mut frame);
        frame.advance();
    }
    Log::reset_logger();

    let entries = capture.entries.lock().unwrap();
    let stats: Vec<_> = entries
        .iter()
        .filter(|e| e.source == "horizon::OcclusionSystem" && e.message.starts_with("terrain tris="))
        .collect();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].severity, LogSeverity::Info);
    assert!(stats[0].message.contains("bldg occluders=1"));
}
