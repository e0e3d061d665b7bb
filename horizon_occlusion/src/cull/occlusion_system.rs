/// OcclusionSystem: owns every piece of occlusion state and runs the
/// scene-level orchestration.
///
/// Per main-camera frame:
/// 1. Begin the depth-buffer frame with the camera matrices.
/// 2. Rasterize the terrain occluder around the eye.
/// 3. Traverse the scene; cells test and enrich the buffer as they go.
/// 4. Refresh the debug overlay and, periodically, log statistics.
///
/// Auxiliary cameras (shadow, reflection) traverse with occlusion off and
/// leave the main camera's buffer untouched.

use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::camera::Camera;
use crate::rasterizer::OcclusionCuller;
use crate::error::Result;
use crate::scene::{Drawable, NodeKey, SceneGraph};
use crate::settings::OcclusionSettings;
use crate::simplify::OccluderMeshCache;
use crate::terrain::{TerrainOccluder, TerrainStorage};
use crate::{horizon_info, horizon_trace};
use super::cull_output::CullOutput;
use super::debug_overlay::DebugOverlay;
use super::frame_context::FrameContext;

const SOURCE: &str = "horizon::OcclusionSystem";

pub struct OcclusionSystem {
    pub(super) settings: OcclusionSettings,
    pub(super) culler: OcclusionCuller,
    pub(super) meshes: OccluderMeshCache,
    pub(super) terrain: TerrainOccluder,
    overlay: Option<DebugOverlay>,
    is_interior: bool,
    is_quasi_exterior: bool,
    processed_frames: u64,
    last_terrain_tris: u32,
}

impl OcclusionSystem {
    /// Create a system with a software depth buffer sized from `settings`.
    ///
    /// Settings are sanitized first. With `enabled` off no buffer is created
    /// and nothing is ever occluded.
    pub fn new(settings: OcclusionSettings, storage: Arc<dyn TerrainStorage>) -> Self {
        let settings = settings.sanitized();
        let culler = if settings.enabled {
            OcclusionCuller::new(settings.buffer_width, settings.buffer_height)
        } else {
            horizon_info!(SOURCE, "Occlusion culling disabled by settings");
            OcclusionCuller::inactive()
        };
        Self::with_culler(settings, culler, storage)
    }

    /// Create a system around an existing culler (custom rasterizer).
    pub fn with_culler(
        settings: OcclusionSettings,
        culler: OcclusionCuller,
        storage: Arc<dyn TerrainStorage>,
    ) -> Self {
        let settings = settings.sanitized();
        let mut terrain = TerrainOccluder::new(storage, settings.cell_world_size);
        terrain.set_lod_level(settings.terrain_lod);
        Self {
            settings,
            culler,
            meshes: OccluderMeshCache::new(),
            terrain,
            overlay: None,
            is_interior: false,
            is_quasi_exterior: false,
            processed_frames: 0,
            last_terrain_tris: 0,
        }
    }

    // ===== ACCESS =====

    pub fn settings(&self) -> &OcclusionSettings {
        &self.settings
    }

    pub fn culler(&self) -> &OcclusionCuller {
        &self.culler
    }

    pub fn culler_mut(&mut self) -> &mut OcclusionCuller {
        &mut self.culler
    }

    pub fn mesh_cache(&self) -> &OccluderMeshCache {
        &self.meshes
    }

    /// Direct cache access for edits made outside the scene-edit helpers.
    pub fn mesh_cache_mut(&mut self) -> &mut OccluderMeshCache {
        &mut self.meshes
    }

    pub fn terrain(&self) -> &TerrainOccluder {
        &self.terrain
    }

    pub fn terrain_mut(&mut self) -> &mut TerrainOccluder {
        &mut self.terrain
    }

    /// Latest depth-buffer image, once `debug_overlay` has produced one.
    pub fn debug_overlay(&self) -> Option<&DebugOverlay> {
        self.overlay.as_ref()
    }

    /// Main-camera frames that went through the full orchestration.
    pub fn processed_frames(&self) -> u64 {
        self.processed_frames
    }

    // ===== WORLD STATE =====

    /// Select the worldspace whose terrain is rasterized; `None` inside.
    pub fn set_worldspace(&mut self, worldspace: Option<String>) {
        self.terrain.set_worldspace(worldspace);
    }

    /// Update cell type flags when the viewer changes cell.
    pub fn set_cell_type(&mut self, is_interior: bool, is_quasi_exterior: bool) {
        self.is_interior = is_interior;
        self.is_quasi_exterior = is_quasi_exterior;
    }

    /// Drop every cached occluder mesh (scene unload).
    pub fn clear_caches(&mut self) {
        self.meshes.clear();
        self.terrain.invalidate();
    }

    // ===== SCENE EDITS =====

    /// Set a transform node's matrix and evict every cached mesh it affects.
    pub fn set_node_matrix(&mut self, graph: &mut SceneGraph, key: NodeKey, matrix: Mat4) -> Result<()> {
        graph.set_matrix(key, matrix)?;
        self.evict_affected(graph, key);
        Ok(())
    }

    /// Replace a geometry node's drawable and evict every cached mesh it affects.
    pub fn set_node_drawable(&mut self, graph: &mut SceneGraph, key: NodeKey, drawable: Drawable) -> Result<()> {
        graph.set_drawable(key, drawable)?;
        self.evict_affected(graph, key);
        Ok(())
    }

    /// Remove a node's subtree from `graph` along with the meshes built from it.
    pub fn remove_node(&mut self, graph: &mut SceneGraph, key: NodeKey) -> Result<Vec<NodeKey>> {
        if graph.contains(key) {
            self.evict_affected(graph, key);
        }
        graph.remove_node(key)
    }

    /// Meshes of `key`'s subtree and of its ancestors all include its geometry.
    fn evict_affected(&mut self, graph: &SceneGraph, key: NodeKey) {
        let mut evicted = 0usize;
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            evicted += usize::from(self.meshes.evict(k));
            stack.extend_from_slice(graph.children(k));
        }
        let mut current = graph.node(key).and_then(|n| n.parent());
        while let Some(k) = current {
            evicted += usize::from(self.meshes.evict(k));
            current = graph.node(k).and_then(|n| n.parent());
        }
        if evicted > 0 {
            horizon_trace!(SOURCE, "evicted {} occluder meshes around {:?}", evicted, key);
        }
    }

    // ===== CULL =====

    /// Traverse the graph from `root` for `camera`.
    ///
    /// `frame` must be shared by every traversal of the same logical frame.
    pub fn cull(
        &mut self,
        graph: &SceneGraph,
        root: NodeKey,
        camera: &Camera,
        frame: &mut FrameContext,
    ) -> CullOutput {
        let mut out = CullOutput::new(camera.role());
        let mut state = TraversalState {
            camera,
            eye: camera.eye_point(),
            occlusion_active: false,
            frame,
        };
        self.traverse(graph, root, &Mat4::IDENTITY, &mut state, &mut out);
        out
    }

    /// Scene node: decide whether this traversal uses occlusion, build the
    /// frame if it is the first main traversal, then visit the children.
    pub(super) fn cull_scene(
        &mut self,
        graph: &SceneGraph,
        key: NodeKey,
        model: &Mat4,
        state: &mut TraversalState<'_>,
        out: &mut CullOutput,
    ) {
        if !state.camera.is_main() {
            state.occlusion_active = false;
            out.set_occlusion_active(false);
            self.traverse_children(graph, key, model, state, out);
            return;
        }

        if state.frame.occlusion_processed() {
            horizon_trace!(
                SOURCE,
                "Frame {} already processed, reusing depth buffer",
                state.frame.frame_number()
            );
            state.occlusion_active = self.culler.is_frame_active();
            out.set_occlusion_active(state.occlusion_active);
            self.traverse_children(graph, key, model, state, out);
            return;
        }
        state.frame.mark_processed();

        if !self.begin_occlusion_frame(state) {
            self.culler.end_frame();
            state.occlusion_active = false;
            out.set_occlusion_active(false);
            self.traverse_children(graph, key, model, state, out);
            return;
        }

        state.occlusion_active = self.culler.is_frame_active();
        out.set_occlusion_active(state.occlusion_active);
        self.traverse_children(graph, key, model, state, out);

        if self.settings.debug_overlay {
            self.refresh_overlay();
        }
        self.processed_frames += 1;
        self.log_stats();
    }

    /// Begin the buffer frame and rasterize terrain. `false` when this
    /// frame runs without occlusion.
    fn begin_occlusion_frame(&mut self, state: &TraversalState<'_>) -> bool {
        if !self.settings.enabled || !self.culler.is_active() {
            return false;
        }

        let has_terrain = self.terrain.has_terrain_data();
        if !has_terrain {
            // Interiors rely on building occluders alone
            let indoor = self.is_interior || self.is_quasi_exterior;
            if !(self.settings.enable_interiors && indoor) {
                return false;
            }
        }

        let camera = state.camera;
        self.culler.begin_frame(camera.view_matrix(), camera.projection_matrix());

        self.last_terrain_tris = 0;
        if has_terrain && self.settings.terrain_occluder {
            let (positions, indices) = self.terrain.build(state.eye, self.settings.terrain_radius);
            self.culler.rasterize_occluder(positions, indices);
            self.last_terrain_tris = (indices.len() / 3) as u32;
        }
        true
    }

    fn refresh_overlay(&mut self) {
        if self.overlay.is_none() {
            self.overlay = DebugOverlay::for_culler(&self.culler);
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.refresh(&self.culler);
        }
    }

    fn log_stats(&self) {
        if !self.settings.debug_messages {
            return;
        }
        if self.processed_frames % self.settings.stats_interval_frames as u64 != 0 {
            return;
        }
        let stats = self.culler.stats();
        horizon_info!(
            SOURCE,
            "terrain tris={} bldg occluders={} tris={} verts={} tested={} occluded={}",
            self.last_terrain_tris,
            stats.building_occluders,
            stats.building_tris,
            stats.building_verts,
            stats.tested,
            stats.occluded
        );
    }
}

/// What one traversal carries down the tree.
pub(super) struct TraversalState<'a> {
    pub camera: &'a Camera,
    pub eye: Vec3,
    /// Cleared for auxiliary cameras and frames without occlusion
    pub occlusion_active: bool,
    pub frame: &'a mut FrameContext,
}

#[cfg(test)]
#[path = "occlusion_system_tests.rs"]
mod tests;
