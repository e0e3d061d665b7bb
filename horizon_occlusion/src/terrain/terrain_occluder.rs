/// TerrainOccluder: coarse terrain mesh around the camera.
///
/// For every cell in a square neighborhood of the camera cell:
/// 1. Fetch full-resolution height samples from storage.
/// 2. Take the minimum height over each coarse quad (`1 << lod` samples wide).
/// 3. Give each coarse vertex the minimum of its (up to four) adjacent quads.
/// 4. Emit two triangles per coarse quad in world space.
///
/// The two min passes keep the coarse surface at or below the real one.
/// The result is cached until the camera changes cell or the radius,
/// worldspace or LOD change.

use std::sync::Arc;
use glam::{IVec2, Vec2, Vec3};
use crate::horizon_debug;
use super::storage::{HeightSamples, TerrainStorage};

const SOURCE: &str = "horizon::TerrainOccluder";

/// Keeps `1 << lod` well inside u32.
const MAX_LOD: u32 = 16;

pub struct TerrainOccluder {
    storage: Arc<dyn TerrainStorage>,
    cell_world_size: f32,
    worldspace: Option<String>,
    lod_level: u32,

    /// (cell, radius) of the cached build, `None` when invalidated
    cached: Option<(IVec2, u32)>,
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    rebuild_count: u32,

    // Scratch reused across cells
    samples: HeightSamples,
    quad_mins: Vec<f32>,
}

impl TerrainOccluder {
    pub fn new(storage: Arc<dyn TerrainStorage>, cell_world_size: f32) -> Self {
        Self {
            storage,
            cell_world_size,
            worldspace: None,
            lod_level: 3,
            cached: None,
            positions: Vec::new(),
            indices: Vec::new(),
            rebuild_count: 0,
            samples: HeightSamples::default(),
            quad_mins: Vec::new(),
        }
    }

    // ===== CONFIGURATION =====

    /// Select the worldspace to sample; `None` for interiors (no terrain).
    pub fn set_worldspace(&mut self, worldspace: Option<String>) {
        if self.worldspace != worldspace {
            self.worldspace = worldspace;
            self.invalidate();
        }
    }

    pub fn worldspace(&self) -> Option<&str> {
        self.worldspace.as_deref()
    }

    /// Coarse grid step is `1 << lod` full-resolution samples.
    pub fn set_lod_level(&mut self, lod: u32) {
        let lod = lod.min(MAX_LOD);
        if self.lod_level != lod {
            self.lod_level = lod;
            self.invalidate();
        }
    }

    pub fn lod_level(&self) -> u32 {
        self.lod_level
    }

    pub fn cell_world_size(&self) -> f32 {
        self.cell_world_size
    }

    /// `true` when a worldspace with terrain is selected.
    pub fn has_terrain_data(&self) -> bool {
        self.worldspace.is_some()
    }

    /// Drop the cached mesh; the next `build` regenerates it.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Number of times the mesh was actually regenerated.
    pub fn rebuild_count(&self) -> u32 {
        self.rebuild_count
    }

    /// Cell containing a world position.
    pub fn cell_of(&self, eye: Vec3) -> IVec2 {
        (eye.truncate() / self.cell_world_size).floor().as_ivec2()
    }

    // ===== BUILD =====

    /// World-space triangles covering `radius_cells` cells around `eye`.
    ///
    /// Empty without terrain data. Reuses the previous result while the
    /// camera stays in the same cell.
    pub fn build(&mut self, eye: Vec3, radius_cells: u32) -> (&[Vec3], &[u32]) {
        let Some(worldspace) = self.worldspace.as_deref() else {
            return (&[], &[]);
        };

        let cell = self.cell_of(eye);
        if self.cached == Some((cell, radius_cells)) {
            return (&self.positions, &self.indices);
        }

        self.positions.clear();
        self.indices.clear();
        let step = 1u32 << self.lod_level;
        let radius = i32::try_from(radius_cells).unwrap_or(i32::MAX);

        // Cells saturate at the edge of i32 space for far-out eyes
        for cy in cell.y.saturating_sub(radius)..=cell.y.saturating_add(radius) {
            for cx in cell.x.saturating_sub(radius)..=cell.x.saturating_add(radius) {
                let center = Vec2::new(cx as f32 + 0.5, cy as f32 + 0.5);
                self.storage.fill_height_samples(worldspace, center, &mut self.samples);

                let offset = (center * self.cell_world_size).extend(0.0);
                append_cell(
                    &self.samples,
                    step,
                    offset,
                    &mut self.quad_mins,
                    &mut self.positions,
                    &mut self.indices,
                );
            }
        }

        self.cached = Some((cell, radius_cells));
        self.rebuild_count += 1;
        horizon_debug!(
            SOURCE,
            "Rebuilt around cell ({}, {}), radius {}: {} tris",
            cell.x,
            cell.y,
            radius_cells,
            self.indices.len() / 3
        );
        (&self.positions, &self.indices)
    }
}

/// Min-pool one cell's samples and append its coarse grid.
///
/// Cells with fewer than 2 samples or 2 coarse vertices per side are skipped.
fn append_cell(
    samples: &HeightSamples,
    step: u32,
    offset: Vec3,
    quad_mins: &mut Vec<f32>,
    positions: &mut Vec<Vec3>,
    indices: &mut Vec<u32>,
) {
    let full = samples.per_side;
    if full < 2 || samples.positions.len() < (full * full) as usize {
        return;
    }
    let coarse = (full - 1) / step + 1;
    if coarse < 2 {
        return;
    }
    let quads = coarse - 1;

    // Pass 1: minimum over every sample a quad covers, borders included
    quad_mins.clear();
    for qj in 0..quads {
        for qi in 0..quads {
            let (i0, j0) = (qi * step, qj * step);
            let (i1, j1) = (((qi + 1) * step).min(full - 1), ((qj + 1) * step).min(full - 1));
            let mut min_h = f32::MAX;
            for j in j0..=j1 {
                for i in i0..=i1 {
                    min_h = min_h.min(samples.at(i, j).z);
                }
            }
            quad_mins.push(min_h);
        }
    }

    // Pass 2: each vertex takes the minimum of its adjacent quads
    let base = positions.len() as u32;
    for cj in 0..coarse {
        for ci in 0..coarse {
            let mut min_h = f32::MAX;
            for qj in cj.saturating_sub(1)..=cj.min(quads - 1) {
                for qi in ci.saturating_sub(1)..=ci.min(quads - 1) {
                    min_h = min_h.min(quad_mins[(qj * quads + qi) as usize]);
                }
            }
            let sample = samples.at(ci * step, cj * step);
            positions.push(Vec3::new(sample.x, sample.y, min_h) + offset);
        }
    }

    for row in 0..quads {
        for col in 0..quads {
            let tl = base + row * coarse + col;
            let tr = tl + 1;
            let bl = tl + coarse;
            let br = bl + 1;
            indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
        }
    }
}

#[cfg(test)]
#[path = "terrain_occluder_tests.rs"]
mod tests;
