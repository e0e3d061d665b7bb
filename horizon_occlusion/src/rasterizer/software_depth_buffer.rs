/// Software hierarchical depth buffer.
///
/// Per-pixel reciprocal w (0 = empty, larger = closer) plus one value per
/// 8x4 tile holding the farthest pixel of that tile. Queries skip whole
/// tiles whose farthest pixel already beats the query depth.

use glam::{Mat4, Vec2, Vec3, Vec4};
use crate::error::Result;
use crate::{horizon_bail, horizon_err};
use super::depth_rasterizer::{DepthRasterizer, CullingResult};

/// Tile width in pixels; buffer width is rounded up to a multiple of it
pub const TILE_WIDTH: u32 = 8;
/// Tile height in pixels; buffer height is rounded up to a multiple of it
pub const TILE_HEIGHT: u32 = 4;
/// Triangles are clipped against the plane w = NEAR_CLIP_W
pub const NEAR_CLIP_W: f32 = 0.1;

const MAX_DIMENSION: u32 = 16384;
const SOURCE: &str = "horizon::SoftwareDepthBuffer";

pub struct SoftwareDepthBuffer {
    width: u32,
    height: u32,
    tiles_x: u32,
    tiles_y: u32,
    depth: Vec<f32>,
    tile_min: Vec<f32>,
}

impl SoftwareDepthBuffer {
    /// Allocate a cleared buffer. Dimensions are rounded up to whole tiles.
    ///
    /// A zero or oversized dimension is `InvalidParameter`; a failed
    /// allocation is `InitializationFailed`.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if !Self::supports(width, height) {
            horizon_bail!(
                InvalidParameter,
                SOURCE,
                "unsupported depth buffer resolution {}x{}",
                width,
                height
            );
        }
        match Self::allocate(width, height) {
            Some(buffer) => Ok(buffer),
            None => Err(horizon_err!(
                InitializationFailed,
                SOURCE,
                "cannot allocate a {}x{} depth buffer",
                width,
                height
            )),
        }
    }

    /// Like `new`, but an unusable resolution is an absent capability:
    /// `None`, nothing logged.
    pub fn create(width: u32, height: u32) -> Option<Self> {
        if !Self::supports(width, height) {
            return None;
        }
        Self::allocate(width, height)
    }

    /// `true` if a buffer of this resolution can be created.
    pub fn supports(width: u32, height: u32) -> bool {
        (1..=MAX_DIMENSION).contains(&width) && (1..=MAX_DIMENSION).contains(&height)
    }

    fn allocate(width: u32, height: u32) -> Option<Self> {
        let tiles_x = width.div_ceil(TILE_WIDTH);
        let tiles_y = height.div_ceil(TILE_HEIGHT);
        let width = tiles_x * TILE_WIDTH;
        let height = tiles_y * TILE_HEIGHT;

        let mut depth = Vec::new();
        depth.try_reserve_exact((width * height) as usize).ok()?;
        depth.resize((width * height) as usize, 0.0);
        let mut tile_min = Vec::new();
        tile_min.try_reserve_exact((tiles_x * tiles_y) as usize).ok()?;
        tile_min.resize((tiles_x * tiles_y) as usize, 0.0);

        Some(Self {
            width,
            height,
            tiles_x,
            tiles_y,
            depth,
            tile_min,
        })
    }

    /// Reciprocal w stored at a pixel (row 0 = top). Out of range reads 0.
    pub fn pixel(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.depth[(y * self.width + x) as usize]
    }

    // ===== RASTERIZATION =====

    fn render_clip_triangle(&mut self, tri: [Vec4; 3]) {
        let (count, clipped) = clip_triangle_near(tri, NEAR_CLIP_W);
        for tri in clipped.iter().take(count) {
            self.rasterize_triangle(tri);
        }
    }

    /// Rasterize a triangle whose vertices all have w >= NEAR_CLIP_W.
    fn rasterize_triangle(&mut self, tri: &[Vec4; 3]) {
        let w = self.width as f32;
        let h = self.height as f32;

        let mut screen = [Vec2::ZERO; 3];
        let mut inv_w = [0.0f32; 3];
        for i in 0..3 {
            inv_w[i] = 1.0 / tri[i].w;
            let ndc = Vec2::new(tri[i].x * inv_w[i], tri[i].y * inv_w[i]);
            screen[i] = ndc_to_screen(ndc, w, h);
        }

        let area = edge_function(screen[0], screen[1], screen[2]);
        if !area.is_finite() || area.abs() < 1e-8 {
            return;
        }

        let min = screen[0].min(screen[1]).min(screen[2]);
        let max = screen[0].max(screen[1]).max(screen[2]);

        // Pixel centers inside the bounding box
        let x0 = (min.x - 0.5).ceil().max(0.0);
        let y0 = (min.y - 0.5).ceil().max(0.0);
        let x1 = (max.x - 0.5).floor().min(w - 1.0);
        let y1 = (max.y - 0.5).floor().min(h - 1.0);
        if x0 > x1 || y0 > y1 {
            return;
        }
        let (x0, y0, x1, y1) = (x0 as u32, y0 as u32, x1 as u32, y1 as u32);

        let inv_area = 1.0 / area;
        for y in y0..=y1 {
            let py = y as f32 + 0.5;
            let row = (y * self.width) as usize;
            for x in x0..=x1 {
                let p = Vec2::new(x as f32 + 0.5, py);
                let b0 = edge_function(screen[1], screen[2], p) * inv_area;
                let b1 = edge_function(screen[2], screen[0], p) * inv_area;
                let b2 = edge_function(screen[0], screen[1], p) * inv_area;
                if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                    continue;
                }
                let z = b0 * inv_w[0] + b1 * inv_w[1] + b2 * inv_w[2];
                let slot = &mut self.depth[row + x as usize];
                if z > *slot {
                    *slot = z;
                }
            }
        }

        self.refresh_tiles(x0, y0, x1, y1);
    }

    /// Recompute the farthest value of every tile touching the pixel rect.
    fn refresh_tiles(&mut self, x0: u32, y0: u32, x1: u32, y1: u32) {
        for ty in (y0 / TILE_HEIGHT)..=(y1 / TILE_HEIGHT) {
            for tx in (x0 / TILE_WIDTH)..=(x1 / TILE_WIDTH) {
                let mut farthest = f32::INFINITY;
                for py in ty * TILE_HEIGHT..(ty + 1) * TILE_HEIGHT {
                    let row = (py * self.width) as usize;
                    for px in tx * TILE_WIDTH..(tx + 1) * TILE_WIDTH {
                        farthest = farthest.min(self.depth[row + px as usize]);
                    }
                }
                self.tile_min[(ty * self.tiles_x + tx) as usize] = farthest;
            }
        }
    }
}

impl DepthRasterizer for SoftwareDepthBuffer {
    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.depth.fill(0.0);
        self.tile_min.fill(0.0);
    }

    fn render_triangles(&mut self, positions: &[Vec3], indices: &[u32], world_to_clip: &Mat4) {
        let count = positions.len();
        for tri in indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            if a >= count || b >= count || c >= count {
                continue;
            }
            let clip = [
                *world_to_clip * positions[a].extend(1.0),
                *world_to_clip * positions[b].extend(1.0),
                *world_to_clip * positions[c].extend(1.0),
            ];
            self.render_clip_triangle(clip);
        }
    }

    fn test_rect(&self, ndc_min: Vec2, ndc_max: Vec2, w_min: f32) -> CullingResult {
        if !(w_min > 0.0) || !(ndc_min.x <= ndc_max.x) || !(ndc_min.y <= ndc_max.y) {
            return CullingResult::Visible;
        }
        if ndc_max.x < -1.0 || ndc_min.x > 1.0 || ndc_max.y < -1.0 || ndc_min.y > 1.0 {
            return CullingResult::ViewCulled;
        }

        let threshold = 1.0 / w_min;
        let w = self.width as f32;
        let h = self.height as f32;

        // Every pixel the rectangle touches, even partially
        let left = ((ndc_min.x.max(-1.0) + 1.0) * 0.5 * w).floor();
        let right = ((ndc_max.x.min(1.0) + 1.0) * 0.5 * w).ceil() - 1.0;
        let top = ((1.0 - ndc_max.y.min(1.0)) * 0.5 * h).floor();
        let bottom = ((1.0 - ndc_min.y.max(-1.0)) * 0.5 * h).ceil() - 1.0;

        let x0 = left.clamp(0.0, w - 1.0) as u32;
        let y0 = top.clamp(0.0, h - 1.0) as u32;
        let x1 = (right.clamp(0.0, w - 1.0) as u32).max(x0);
        let y1 = (bottom.clamp(0.0, h - 1.0) as u32).max(y0);

        for ty in (y0 / TILE_HEIGHT)..=(y1 / TILE_HEIGHT) {
            for tx in (x0 / TILE_WIDTH)..=(x1 / TILE_WIDTH) {
                if self.tile_min[(ty * self.tiles_x + tx) as usize] > threshold {
                    continue;
                }
                let py0 = y0.max(ty * TILE_HEIGHT);
                let py1 = y1.min((ty + 1) * TILE_HEIGHT - 1);
                let px0 = x0.max(tx * TILE_WIDTH);
                let px1 = x1.min((tx + 1) * TILE_WIDTH - 1);
                for py in py0..=py1 {
                    let row = (py * self.width) as usize;
                    for px in px0..=px1 {
                        if self.depth[row + px as usize] <= threshold {
                            return CullingResult::Visible;
                        }
                    }
                }
            }
        }

        CullingResult::Occluded
    }

    fn compute_pixel_depth_buffer(&self, out: &mut [f32], flip_y: bool) {
        let width = self.width as usize;
        let height = self.height as usize;
        for (row, dst) in out.chunks_exact_mut(width).take(height).enumerate() {
            let src = if flip_y { height - 1 - row } else { row };
            dst.copy_from_slice(&self.depth[src * width..(src + 1) * width]);
        }
    }
}

// ===== CLIP / SCREEN HELPERS =====

fn ndc_to_screen(ndc: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * width,
        (1.0 - ndc.y) * 0.5 * height,
    )
}

/// Twice the signed area of (a, b, c)
fn edge_function(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

fn intersect_near(a: Vec4, b: Vec4, threshold: f32) -> Vec4 {
    let t = (threshold - a.w) / (b.w - a.w);
    a + (b - a) * t
}

/// Clip a clip-space triangle against w = threshold.
/// Returns (triangle_count, triangles) with a count of 0, 1 or 2.
pub(crate) fn clip_triangle_near(tri: [Vec4; 3], threshold: f32) -> (usize, [[Vec4; 3]; 2]) {
    let mut polygon = [tri[0]; 4];
    let mut len = 0usize;

    let mut prev = tri[2];
    let mut prev_inside = prev.w >= threshold;
    for &curr in tri.iter() {
        let curr_inside = curr.w >= threshold;
        if prev_inside != curr_inside {
            polygon[len] = intersect_near(prev, curr, threshold);
            len += 1;
        }
        if curr_inside {
            polygon[len] = curr;
            len += 1;
        }
        prev = curr;
        prev_inside = curr_inside;
    }

    let mut out = [[tri[0]; 3]; 2];
    match len {
        3 => {
            out[0] = [polygon[0], polygon[1], polygon[2]];
            (1, out)
        }
        4 => {
            out[0] = [polygon[0], polygon[1], polygon[2]];
            out[1] = [polygon[0], polygon[2], polygon[3]];
            (2, out)
        }
        _ => (0, out),
    }
}

#[cfg(test)]
#[path = "software_depth_buffer_tests.rs"]
mod tests;
