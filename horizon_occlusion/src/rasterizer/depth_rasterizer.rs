/// Depth rasterizer trait: the capability the occlusion wrapper drives.

use glam::{Mat4, Vec2, Vec3};

/// Answer of a rectangle occlusion query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullingResult {
    /// At least one covered pixel is not closer than the query depth
    Visible,
    /// Every covered pixel holds something strictly closer
    Occluded,
    /// The rectangle lies entirely outside the screen
    ViewCulled,
}

/// Software depth rasterizer.
///
/// Depth is stored as reciprocal clip-space w: 0 means empty, larger means
/// closer. Triangles are two-sided.
pub trait DepthRasterizer: Send {
    /// Buffer resolution in pixels (width, height)
    fn resolution(&self) -> (u32, u32);

    /// Reset every pixel to empty
    fn clear(&mut self);

    /// Rasterize an indexed triangle list.
    ///
    /// `positions` are in world space and projected with `world_to_clip`.
    /// Triangles referencing an out-of-range index are skipped.
    fn render_triangles(&mut self, positions: &[Vec3], indices: &[u32], world_to_clip: &Mat4);

    /// Query whether the NDC rectangle at nearest depth `w_min` is hidden.
    fn test_rect(&self, ndc_min: Vec2, ndc_max: Vec2, w_min: f32) -> CullingResult;

    /// Copy the per-pixel reciprocal-w values into `out` (row-major).
    ///
    /// Row 0 is the top row, or the bottom row when `flip_y` is set.
    fn compute_pixel_depth_buffer(&self, out: &mut [f32], flip_y: bool);
}
