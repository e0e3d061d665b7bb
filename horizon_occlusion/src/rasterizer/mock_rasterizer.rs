/// Mock rasterizer for unit tests (no pixels involved)
///
/// Records every call into shared state so tests can inspect what the
/// wrapper and the traversal did after the mock has been boxed away.

use std::sync::{Arc, Mutex};
use glam::{Mat4, Vec2, Vec3};
use super::depth_rasterizer::{DepthRasterizer, CullingResult};

#[derive(Debug)]
pub struct MockRasterizerState {
    pub clears: u32,
    pub render_calls: u32,
    pub triangles: u32,
    pub last_world_to_clip: Option<Mat4>,
    /// Every `test_rect` query as (ndc_min, ndc_max, w_min)
    pub queries: Vec<(Vec2, Vec2, f32)>,
    /// Answer returned by `test_rect`
    pub answer: CullingResult,
}

pub struct MockRasterizer {
    width: u32,
    height: u32,
    state: Arc<Mutex<MockRasterizerState>>,
}

impl MockRasterizer {
    pub fn new(width: u32, height: u32) -> (Self, Arc<Mutex<MockRasterizerState>>) {
        let state = Arc::new(Mutex::new(MockRasterizerState {
            clears: 0,
            render_calls: 0,
            triangles: 0,
            last_world_to_clip: None,
            queries: Vec::new(),
            answer: CullingResult::Visible,
        }));
        (Self { width, height, state: state.clone() }, state)
    }
}

impl DepthRasterizer for MockRasterizer {
    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.state.lock().unwrap().clears += 1;
    }

    fn render_triangles(&mut self, _positions: &[Vec3], indices: &[u32], world_to_clip: &Mat4) {
        let mut state = self.state.lock().unwrap();
        state.render_calls += 1;
        state.triangles += (indices.len() / 3) as u32;
        state.last_world_to_clip = Some(*world_to_clip);
    }

    fn test_rect(&self, ndc_min: Vec2, ndc_max: Vec2, w_min: f32) -> CullingResult {
        let mut state = self.state.lock().unwrap();
        state.queries.push((ndc_min, ndc_max, w_min));
        state.answer
    }

    fn compute_pixel_depth_buffer(&self, out: &mut [f32], _flip_y: bool) {
        out.fill(0.5);
    }
}
