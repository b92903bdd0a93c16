use std::collections::HashSet;

use grid_snake_core::{Direction, GameSnapshot, Position};
use grid_snake_world::Grid;

/// Greedy steering that heads for the food while avoiding fatal cells.
///
/// Returns `None` when no safe direction exists, leaving the snake on course.
pub(crate) fn choose(snapshot: &GameSnapshot) -> Option<Direction> {
    let head = snapshot.head()?;
    let grid = Grid::new(snapshot.grid_size);
    let obstacles: HashSet<Position> = snapshot.obstacles.iter().copied().collect();
    let body: HashSet<Position> = snapshot
        .snake
        .iter()
        .take(snapshot.snake.len().saturating_sub(1))
        .copied()
        .collect();

    Direction::ALL
        .into_iter()
        .filter(|direction| *direction != snapshot.direction.opposite())
        .filter_map(|direction| {
            let mut next = grid.next_head_position(head, direction, snapshot.boundary_mode);
            if let Some(exit) = snapshot
                .portals
                .iter()
                .find_map(|portal| portal.exit_for(next))
            {
                next = exit;
            }
            let safe = grid.contains(next) && !obstacles.contains(&next) && !body.contains(&next);
            safe.then_some((direction, next))
        })
        .min_by_key(|(direction, next)| {
            let distance = snapshot
                .food
                .map_or(0, |food| next.manhattan_distance(food.cell));
            (distance, *direction != snapshot.direction)
        })
        .map(|(direction, _)| direction)
}
