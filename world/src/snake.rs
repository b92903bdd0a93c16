use std::collections::{HashMap, VecDeque};

use grid_snake_core::{BoundaryMode, Direction, Position};

use crate::grid::Grid;

/// Ordered snake body with a coordinate-keyed occupancy index.
#[derive(Clone, Debug)]
pub struct Snake {
    body: VecDeque<Position>,
    occupancy: HashMap<Position, u32>,
}

/// Head placement computed for the next tick before it is committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlannedStep {
    /// Cell the head will occupy.
    pub head: Position,
    /// Whether a portal redirected the head.
    pub teleported: bool,
}

impl Snake {
    /// Creates a snake from segments listed head first.
    ///
    /// Returns `None` when no segment is provided.
    #[must_use]
    pub fn from_segments(segments: impl IntoIterator<Item = Position>) -> Option<Self> {
        let snake = Self::build(segments);
        (!snake.body.is_empty()).then_some(snake)
    }

    /// Lays a horizontal snake in the middle row, head on the right, facing right.
    #[must_use]
    pub(crate) fn centered(grid: &Grid, length: u32) -> Self {
        let side = i32::try_from(grid.size()).unwrap_or(i32::MAX);
        let length = i32::try_from(length.clamp(1, grid.size().max(1))).unwrap_or(1);
        let row = side / 2;
        let start_col = side / 2 - length / 2;
        Self::build((0..length).rev().map(|offset| Position::new(row, start_col + offset)))
    }

    /// Head segment.
    #[must_use]
    pub fn head(&self) -> Position {
        self.body.front().copied().unwrap_or(Position::new(0, 0))
    }

    /// Tail segment.
    #[must_use]
    pub fn tail(&self) -> Position {
        self.body.back().copied().unwrap_or(Position::new(0, 0))
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Always false; a snake has at least one segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Segments ordered from head to tail.
    pub fn segments(&self) -> impl Iterator<Item = Position> + '_ {
        self.body.iter().copied()
    }

    /// Reports whether any segment covers `position`.
    #[must_use]
    pub fn occupies(&self, position: Position) -> bool {
        self.occupancy.contains_key(&position)
    }

    /// Computes where the head lands next tick, applying the boundary policy
    /// and any portal teleport.
    #[must_use]
    pub fn plan_step(
        &self,
        grid: &Grid,
        direction: Direction,
        boundary_mode: BoundaryMode,
        portals: &HashMap<Position, Position>,
    ) -> PlannedStep {
        let candidate = grid.next_head_position(self.head(), direction, boundary_mode);
        match portals.get(&candidate) {
            Some(exit) => PlannedStep {
                head: *exit,
                teleported: true,
            },
            None => PlannedStep {
                head: candidate,
                teleported: false,
            },
        }
    }

    /// Whether `head` overlaps the body once the move completes.
    ///
    /// When the tail pops this tick its cell is free again, unless another
    /// segment shares it.
    #[must_use]
    pub fn overlaps_after_move(&self, head: Position, grows: bool) -> bool {
        let count = self.occupancy.get(&head).copied().unwrap_or(0);
        if !grows && head == self.tail() {
            count > 1
        } else {
            count > 0
        }
    }

    /// Prepends `head` and pops the tail unless the snake grows this tick.
    ///
    /// Returns the vacated tail cell.
    pub fn advance(&mut self, head: Position, grows: bool) -> Option<Position> {
        self.body.push_front(head);
        self.occupy(head);
        if grows {
            return None;
        }

        let vacated = self.body.pop_back()?;
        self.release(vacated);
        Some(vacated)
    }

    fn build(segments: impl IntoIterator<Item = Position>) -> Self {
        let mut snake = Self {
            body: VecDeque::new(),
            occupancy: HashMap::new(),
        };
        for segment in segments {
            snake.body.push_back(segment);
            snake.occupy(segment);
        }
        snake
    }

    fn occupy(&mut self, position: Position) {
        *self.occupancy.entry(position).or_insert(0) += 1;
    }

    fn release(&mut self, position: Position) {
        if let Some(count) = self.occupancy.get_mut(&position) {
            *count -= 1;
            if *count == 0 {
                let _ = self.occupancy.remove(&position);
            }
        }
    }
}
