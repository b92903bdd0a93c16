use std::collections::{BTreeSet, HashMap};

use grid_snake_core::{BoundaryMode, DeathCause, Direction, Food, FoodKind, Position};

use crate::{grid::Grid, snake::Snake};

/// Result of resolving a single tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionOutcome {
    /// The snake moved without eating.
    None,
    /// The snake collided; the move was not committed.
    Dead(DeathCause),
    /// The snake moved onto the food and grew by one segment.
    Fed(FoodKind),
}

/// Static surroundings the snake moves through during a tick.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Arena<'a> {
    pub(crate) grid: &'a Grid,
    pub(crate) boundary_mode: BoundaryMode,
    pub(crate) portals: &'a HashMap<Position, Position>,
    pub(crate) obstacles: &'a BTreeSet<Position>,
    pub(crate) food: Option<Food>,
}

/// Movement details of a resolved tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Resolution {
    pub(crate) outcome: CollisionOutcome,
    pub(crate) head: Position,
    pub(crate) vacated: Option<Position>,
    pub(crate) teleported: bool,
}

/// Moves the snake one step in `direction` and classifies the result.
///
/// Wrapping and teleporting can drop the head straight onto a segment that
/// would leave this tick, so in those cases the full pre-move body counts.
/// Otherwise the checks run against the body as it is after the move, where
/// the vacating tail cell is free.
pub(crate) fn resolve(snake: &mut Snake, direction: Direction, arena: &Arena<'_>) -> Resolution {
    let planned = snake.plan_step(arena.grid, direction, arena.boundary_mode, arena.portals);
    let head = planned.head;
    let eats = arena.food.is_some_and(|food| food.cell == head);
    let dead = |cause| Resolution {
        outcome: CollisionOutcome::Dead(cause),
        head,
        vacated: None,
        teleported: planned.teleported,
    };

    if arena.boundary_mode == BoundaryMode::Wrap || planned.teleported {
        if snake.occupies(head) {
            return dead(DeathCause::SelfCollision);
        }
        if arena.obstacles.contains(&head) {
            return dead(DeathCause::Obstacle);
        }
    }

    if arena.boundary_mode == BoundaryMode::Die && !arena.grid.contains(head) {
        return dead(DeathCause::Boundary);
    }
    if arena.obstacles.contains(&head) {
        return dead(DeathCause::Obstacle);
    }
    if snake.overlaps_after_move(head, eats) {
        return dead(DeathCause::SelfCollision);
    }

    let vacated = snake.advance(head, eats);
    let outcome = match arena.food {
        Some(food) if eats => CollisionOutcome::Fed(food.kind),
        _ => CollisionOutcome::None,
    };

    Resolution {
        outcome,
        head,
        vacated,
        teleported: planned.teleported,
    }
}
