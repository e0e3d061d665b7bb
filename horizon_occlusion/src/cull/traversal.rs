/// Node dispatch plus the cell and paged-chunk callbacks.
///
/// Cells run two ordered passes over their children. Large objects go
/// first: each is tested and, when visible, rasterized as an occluder.
/// Small objects are tested afterwards against the enriched buffer.
/// Running the passes in the other order would test small objects before
/// the buildings in front of them are in the buffer.

use glam::Mat4;
use crate::bounds::{AABB, BoundingSphere};
use crate::scene::{NodeFlags, NodeKey, NodeKind, SceneGraph};
use super::cull_output::CullOutput;
use super::occlusion_system::{OcclusionSystem, TraversalState};

impl OcclusionSystem {
    /// Visit one node. `model` maps the node's parent frame to world space.
    pub(super) fn traverse(
        &mut self,
        graph: &SceneGraph,
        key: NodeKey,
        model: &Mat4,
        state: &mut TraversalState<'_>,
        out: &mut CullOutput,
    ) {
        let Some(node) = graph.node(key) else {
            return;
        };
        if node.flags().contains(NodeFlags::HIDDEN) {
            return;
        }
        out.push_traversed(key);

        match node.kind() {
            NodeKind::Scene => self.cull_scene(graph, key, model, state, out),
            NodeKind::Cell => self.cull_cell(graph, key, model, state, out),
            NodeKind::PagedChunk(_) => self.cull_paged_chunk(graph, key, model, state, out),
            NodeKind::Group => self.traverse_children(graph, key, model, state, out),
            NodeKind::Transform(matrix) => {
                let composed = *model * *matrix;
                self.traverse_children(graph, key, &composed, state, out);
            }
            NodeKind::Geometry(_) => out.push_visible(key, *model),
        }
    }

    pub(super) fn traverse_children(
        &mut self,
        graph: &SceneGraph,
        key: NodeKey,
        model: &Mat4,
        state: &mut TraversalState<'_>,
        out: &mut CullOutput,
    ) {
        for &child in graph.children(key) {
            self.traverse(graph, child, model, state, out);
        }
    }

    fn occlusion_enabled(&self, state: &TraversalState<'_>) -> bool {
        state.occlusion_active && self.culler.is_frame_active()
    }

    /// `false` only if the box around `sphere` is hidden. Invalid spheres are visible.
    fn sphere_visible(&mut self, sphere: &BoundingSphere) -> bool {
        if !sphere.valid() {
            return true;
        }
        self.culler.test_visible_aabb(&AABB::from_sphere(sphere))
    }

    // ===== CELL =====

    fn cull_cell(
        &mut self,
        graph: &SceneGraph,
        key: NodeKey,
        model: &Mat4,
        state: &mut TraversalState<'_>,
        out: &mut CullOutput,
    ) {
        if !self.occlusion_enabled(state) {
            self.traverse_children(graph, key, model, state, out);
            return;
        }

        // Whole cell hidden: no child is visited
        let cell_sphere = graph.bounding_sphere(key).transformed(model);
        if !self.sphere_visible(&cell_sphere) {
            return;
        }

        let children = graph.children(key);
        let min_radius = self.settings.occluder_min_radius;

        // Pass 1: large objects, tested then rasterized as occluders
        for &child in children {
            if graph.flags(child).contains(NodeFlags::HIDDEN) {
                continue;
            }
            let sphere = graph.bounding_sphere(child).transformed(model);
            if !sphere.valid() || sphere.radius < min_radius {
                continue;
            }

            if sphere.radius > self.settings.occluder_max_radius {
                // Paging nodes: never simplified, chunks inject their own occluders
                let is_chunk = graph
                    .node(child)
                    .is_some_and(|n| matches!(n.kind(), NodeKind::PagedChunk(_)));
                if is_chunk || self.sphere_visible(&sphere) {
                    self.traverse(graph, child, model, state, out);
                }
                continue;
            }

            if self.process_large_object(graph, child, model, &sphere, state) {
                self.traverse(graph, child, model, state, out);
            }
        }

        // Pass 2: small objects against terrain plus pass-1 occluders
        for &child in children {
            if graph.flags(child).contains(NodeFlags::HIDDEN) {
                continue;
            }
            let sphere = graph.bounding_sphere(child).transformed(model);
            if !sphere.valid() {
                self.traverse(graph, child, model, state, out);
                continue;
            }
            if sphere.radius >= min_radius {
                continue;
            }

            let skip_test = graph.flags(child).contains(NodeFlags::SKIP_OCCLUSION);
            if skip_test || self.sphere_visible(&sphere) {
                self.traverse(graph, child, model, state, out);
            }
        }
    }

    /// Test a large object's occluder box and, if visible, rasterize its
    /// simplified mesh. Returns whether the object should be traversed.
    fn process_large_object(
        &mut self,
        graph: &SceneGraph,
        child: NodeKey,
        model: &Mat4,
        sphere: &BoundingSphere,
        state: &TraversalState<'_>,
    ) -> bool {
        let settings = &self.settings;
        let resolution = settings.mesh_resolution_for_radius(sphere.radius);
        let mesh = self.meshes.get_or_build(
            graph,
            child,
            model,
            resolution,
            settings.occluder_shrink_factor,
        );

        if !mesh.aabb.valid() {
            return true;
        }
        if !self.culler.test_visible_aabb(&mesh.aabb) {
            return false;
        }
        if !settings.static_occluders || !mesh.has_triangles() {
            return true;
        }

        // Co-located with the viewer: it would hide what surrounds the camera
        let dist_sq = sphere.center.distance_squared(state.eye);
        let inside = sphere.radius * settings.occluder_inside_threshold;
        if dist_sq <= inside * inside {
            return true;
        }
        let max_distance = settings.occluder_max_distance;
        if dist_sq > max_distance * max_distance {
            return true;
        }

        let tris = mesh.triangle_count() as u32;
        let budget = settings.occluder_max_triangles;
        if budget > 0 && self.culler.stats().building_tris + tris > budget {
            return true;
        }

        self.culler.rasterize_occluder(&mesh.vertices, &mesh.indices);
        self.culler.increment_building_occluders(tris, mesh.vertex_count() as u32);
        true
    }

    // ===== PAGED CHUNK =====

    fn cull_paged_chunk(
        &mut self,
        graph: &SceneGraph,
        key: NodeKey,
        model: &Mat4,
        state: &mut TraversalState<'_>,
        out: &mut CullOutput,
    ) {
        if !self.occlusion_enabled(state) {
            self.traverse_children(graph, key, model, state, out);
            return;
        }

        let sphere = graph.bounding_sphere(key).transformed(model);
        if !self.sphere_visible(&sphere) {
            return;
        }

        if let Some(NodeKind::PagedChunk(data)) = graph.node(key).map(|n| n.kind()) {
            let max_distance = self.settings.paged_occluder_max_distance;
            let budget = self.settings.occluder_max_triangles;
            for mesh in &data.occluders {
                if !mesh.has_triangles() {
                    continue;
                }
                if mesh.aabb.center().distance_squared(state.eye) > max_distance * max_distance {
                    continue;
                }
                let tris = mesh.triangle_count() as u32;
                if budget > 0 && self.culler.stats().building_tris + tris > budget {
                    continue;
                }
                self.culler.rasterize_occluder(&mesh.vertices, &mesh.indices);
                self.culler.increment_building_occluders(tris, mesh.vertex_count() as u32);
            }
        }

        self.traverse_children(graph, key, model, state, out);
    }
}
