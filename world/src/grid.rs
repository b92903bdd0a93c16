use grid_snake_core::{BoundaryMode, Direction, Position};

/// Square coordinate space the snake moves within.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    size: u32,
}

impl Grid {
    /// Creates a grid with `size` rows and `size` columns.
    #[must_use]
    pub const fn new(size: u32) -> Self {
        Self { size }
    }

    /// Side length of the grid.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Number of cells in the grid.
    #[must_use]
    pub fn area(&self) -> usize {
        let side = usize::try_from(self.size).unwrap_or(usize::MAX);
        side.saturating_mul(side)
    }

    /// Reports whether the position lies within `[0, size)` on both axes.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        let side = self.side();
        (0..side).contains(&position.row) && (0..side).contains(&position.col)
    }

    /// Iterates every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Position> {
        let side = self.side();
        (0..side).flat_map(move |row| (0..side).map(move |col| Position::new(row, col)))
    }

    /// Computes the head position one step from `current`.
    ///
    /// In die mode the raw candidate is returned even when it leaves the grid;
    /// the collision resolver rejects it. In wrap mode each axis is normalised
    /// modulo the grid size.
    #[must_use]
    pub fn next_head_position(
        &self,
        current: Position,
        direction: Direction,
        boundary_mode: BoundaryMode,
    ) -> Position {
        let candidate = current.stepped(direction);
        match boundary_mode {
            BoundaryMode::Die => candidate,
            BoundaryMode::Wrap => {
                let side = self.side();
                Position::new(candidate.row.rem_euclid(side), candidate.col.rem_euclid(side))
            }
        }
    }

    fn side(&self) -> i32 {
        i32::try_from(self.size).unwrap_or(i32::MAX).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn die_mode_returns_out_of_range_candidates() {
        let grid = Grid::new(20);
        let head = Position::new(10, 19);
        let next = grid.next_head_position(head, Direction::Right, BoundaryMode::Die);
        assert_eq!(next, Position::new(10, 20));
        assert!(!grid.contains(next));

        let top = grid.next_head_position(Position::new(0, 4), Direction::Up, BoundaryMode::Die);
        assert_eq!(top, Position::new(-1, 4));
    }

    #[test]
    fn wrap_mode_normalises_both_edges() {
        let grid = Grid::new(20);
        assert_eq!(
            grid.next_head_position(Position::new(10, 19), Direction::Right, BoundaryMode::Wrap),
            Position::new(10, 0)
        );
        assert_eq!(
            grid.next_head_position(Position::new(0, 3), Direction::Up, BoundaryMode::Wrap),
            Position::new(19, 3)
        );
        assert_eq!(
            grid.next_head_position(Position::new(5, 0), Direction::Left, BoundaryMode::Wrap),
            Position::new(5, 19)
        );
    }

    #[test]
    fn cells_cover_the_area_once() {
        let grid = Grid::new(4);
        let cells: Vec<_> = grid.cells().collect();
        assert_eq!(cells.len(), grid.area());
        assert!(cells.iter().all(|cell| grid.contains(*cell)));
        assert_eq!(cells.first(), Some(&Position::new(0, 0)));
        assert_eq!(cells.last(), Some(&Position::new(3, 3)));
    }
}
