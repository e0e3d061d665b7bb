/// Terrain height source consumed by the terrain occluder.

use glam::{Vec2, Vec3};

/// Full-resolution height samples of one terrain cell.
///
/// `positions` is a row-major square grid of `per_side * per_side`
/// samples (row = +Y, column = +X), expressed relative to the cell centre.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeightSamples {
    pub per_side: u32,
    pub positions: Vec<Vec3>,
}

impl HeightSamples {
    pub fn clear(&mut self) {
        self.per_side = 0;
        self.positions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sample at column `i`, row `j`.
    pub fn at(&self, i: u32, j: u32) -> Vec3 {
        self.positions[(j * self.per_side + i) as usize]
    }
}

/// Provider of terrain heights per worldspace.
pub trait TerrainStorage: Send + Sync {
    /// Fill `out` with the samples of the cell centred on `cell_center`
    /// (in cell units, e.g. `(2.5, -0.5)`). Leaves `out` empty when the
    /// worldspace has no terrain there.
    fn fill_height_samples(&self, worldspace: &str, cell_center: Vec2, out: &mut HeightSamples);
}

/// Storage backed by a height function over world XY.
///
/// Every cell of every worldspace is sampled on the same regular grid.
pub struct FnHeightStorage<F> {
    cell_world_size: f32,
    per_side: u32,
    height: F,
}

impl<F> FnHeightStorage<F>
where
    F: Fn(Vec2) -> f32 + Send + Sync,
{
    pub fn new(cell_world_size: f32, per_side: u32, height: F) -> Self {
        Self { cell_world_size, per_side, height }
    }
}

impl<F> TerrainStorage for FnHeightStorage<F>
where
    F: Fn(Vec2) -> f32 + Send + Sync,
{
    fn fill_height_samples(&self, _worldspace: &str, cell_center: Vec2, out: &mut HeightSamples) {
        out.clear();
        if self.per_side < 2 {
            return;
        }

        let spacing = self.cell_world_size / (self.per_side - 1) as f32;
        let half = self.cell_world_size * 0.5;
        let origin = cell_center * self.cell_world_size;

        out.per_side = self.per_side;
        out.positions.reserve((self.per_side * self.per_side) as usize);
        for j in 0..self.per_side {
            for i in 0..self.per_side {
                let local = Vec2::new(i as f32 * spacing - half, j as f32 * spacing - half);
                let z = (self.height)(origin + local);
                out.positions.push(local.extend(z));
            }
        }
    }
}
