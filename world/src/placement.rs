use std::collections::{BTreeSet, HashSet};

use grid_snake_core::{FoodKind, FoodWeights, PlacementError, Position};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::grid::Grid;

/// Seeded source of random entity placements.
#[derive(Clone, Debug)]
pub struct Placer {
    rng: ChaCha8Rng,
}

impl Placer {
    /// Creates a placer whose draws are fully determined by `seed`.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draws uniformly from the grid until a cell outside `excluding` is found.
    ///
    /// Fails with [`PlacementError::ExhaustedGrid`] when the exclusion set
    /// covers every cell, which would otherwise loop forever.
    pub fn place_random(
        &mut self,
        grid: &Grid,
        excluding: &HashSet<Position>,
    ) -> Result<Position, PlacementError> {
        if free_cells(grid, excluding) == 0 {
            return Err(PlacementError::ExhaustedGrid);
        }

        loop {
            let candidate = self.draw(grid);
            if !excluding.contains(&candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Draws `count` distinct obstacle cells outside `reserved`.
    pub fn generate_obstacles(
        &mut self,
        grid: &Grid,
        count: u32,
        reserved: &HashSet<Position>,
    ) -> Result<BTreeSet<Position>, PlacementError> {
        let wanted = usize::try_from(count).unwrap_or(usize::MAX);
        if wanted > free_cells(grid, reserved) {
            return Err(PlacementError::ExhaustedGrid);
        }

        let mut obstacles = BTreeSet::new();
        while obstacles.len() < wanted {
            let candidate = self.draw(grid);
            if reserved.contains(&candidate) {
                continue;
            }
            let _ = obstacles.insert(candidate);
        }
        Ok(obstacles)
    }

    /// Draws a food kind according to `weights`.
    pub fn pick_food_kind(&mut self, weights: &FoodWeights) -> FoodKind {
        weights.select(self.rng.gen::<f64>())
    }

    fn draw(&mut self, grid: &Grid) -> Position {
        let side = i32::try_from(grid.size()).unwrap_or(i32::MAX).max(1);
        Position::new(self.rng.gen_range(0..side), self.rng.gen_range(0..side))
    }
}

fn free_cells(grid: &Grid, excluding: &HashSet<Position>) -> usize {
    let blocked = excluding
        .iter()
        .filter(|position| grid.contains(**position))
        .count();
    grid.area().saturating_sub(blocked)
}
