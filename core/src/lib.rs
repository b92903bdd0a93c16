#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Snake engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. The session submits [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, read immutable
//! views, and respond exclusively with new command batches. Renderers only
//! ever see a [`GameSnapshot`].

mod config;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use config::{
    ConfigError, GameConfig, LevelConfig, ObstacleConfig, ResolvedLevel, ScoringConfig,
};

/// Numeric identifier of a level. Level 1 is the first level of a campaign.
pub type LevelNumber = u32;

/// Lifecycle phase of a single game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// The level is laid out and waits for the player to start.
    Ready,
    /// Ticks are being delivered and the snake moves.
    Playing,
    /// Tick delivery is suspended without discarding state.
    Paused,
    /// The level ended positively (threshold reached, time expired or board full).
    Celebrating,
    /// The snake collided; the session is over until reset.
    GameOver,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Moves a ready level into the playing phase.
    Start,
    /// Rebuilds the current level from its configuration and returns to ready.
    Reset,
    /// Performs exactly one simulation step.
    Tick,
    /// Reports that wall-clock time elapsed outside of the tick cadence.
    AdvanceTime {
        /// Duration of real time that elapsed.
        dt: Duration,
    },
    /// Records the direction the snake should take on the next tick.
    Steer {
        /// Intended next direction.
        direction: Direction,
    },
    /// Suspends tick delivery.
    Pause,
    /// Restores tick delivery after a pause.
    Resume,
    /// Player request to jump to another unlocked level.
    SwitchLevel {
        /// Level the player selected.
        level: LevelNumber,
    },
    /// Adds points to the running score.
    AwardScore {
        /// Number of points to add.
        points: u32,
    },
    /// Replaces the live tick interval; takes effect on the next scheduled tick.
    SetTickInterval {
        /// New duration between ticks.
        interval: Duration,
    },
    /// Selects the colour theme presented by renderers.
    SetTheme {
        /// Index into the renderer's palette.
        index: u32,
    },
    /// Marks the current level as complete and starts the celebration.
    CompleteLevel {
        /// Level that becomes active once the celebration ends.
        next: LevelNumber,
    },
    /// Activates a level after a completed transition and resumes play.
    EnterLevel {
        /// Level to activate.
        level: LevelNumber,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that wall-clock time advanced.
    TimeAdvanced {
        /// Duration of time that elapsed.
        dt: Duration,
    },
    /// Announces that one simulation step began.
    Ticked {
        /// Monotonic index of the tick within the session.
        tick: u64,
    },
    /// The level left the ready phase and ticks should be delivered.
    Started {
        /// Level that started.
        level: LevelNumber,
    },
    /// Tick delivery was suspended.
    Paused,
    /// Tick delivery resumed.
    Resumed,
    /// The current level was rebuilt and awaits a start request.
    Reset {
        /// Level that was rebuilt.
        level: LevelNumber,
    },
    /// A steering request was stored for the next tick.
    DirectionQueued {
        /// Direction that will be applied.
        direction: Direction,
    },
    /// A steering request was dropped because it reversed the snake.
    DirectionRejected {
        /// Direction that was requested.
        direction: Direction,
    },
    /// Confirms that the snake advanced by one cell.
    SnakeMoved {
        /// New head position.
        head: Position,
        /// Tail cell released by the move, absent on growth ticks.
        vacated: Option<Position>,
        /// Whether the head passed through a portal.
        teleported: bool,
    },
    /// The head reached the food cell.
    FoodConsumed {
        /// Food that was eaten.
        food: Food,
    },
    /// A new food item was placed on the grid.
    FoodSpawned {
        /// Food that was placed.
        food: Food,
    },
    /// No free cell remained for the next food item.
    FoodPlacementFailed {
        /// Reason the placement failed.
        reason: PlacementError,
    },
    /// The configured obstacle count could not be satisfied.
    ObstaclePlacementFailed {
        /// Number of obstacles requested by the level.
        requested: u32,
        /// Reason the placement failed.
        reason: PlacementError,
    },
    /// The snake collided and the session ended.
    GameOver {
        /// What the head ran into.
        cause: DeathCause,
        /// Score at the moment of the collision.
        final_score: u32,
    },
    /// The running score changed.
    ScoreChanged {
        /// Level the score belongs to.
        level: LevelNumber,
        /// Updated score.
        score: u32,
    },
    /// The live tick interval changed.
    TickIntervalChanged {
        /// Updated duration between ticks.
        interval: Duration,
    },
    /// The colour theme changed.
    ThemeChanged {
        /// Updated palette index.
        index: u32,
    },
    /// The score threshold of the next level was reached.
    LevelCompleted {
        /// Level that was completed.
        level: LevelNumber,
        /// Level that will be entered after the celebration.
        next: LevelNumber,
    },
    /// A level became available for the rest of the session.
    LevelUnlocked {
        /// Level that was unlocked.
        level: LevelNumber,
    },
    /// A level was entered after a completed transition.
    LevelEntered {
        /// Level that is now active.
        level: LevelNumber,
    },
    /// The player switched to another unlocked level.
    LevelSwitched {
        /// Level that is now active.
        level: LevelNumber,
    },
    /// The time limit of a time-boxed level ran out.
    TimeExpired {
        /// Level whose timer expired.
        level: LevelNumber,
    },
    /// Every free cell is covered, so no food can be placed.
    BoardCleared {
        /// Level that was cleared.
        level: LevelNumber,
    },
}

/// Cardinal movement directions available to the snake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
}

impl Direction {
    /// All directions in a stable order.
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Returns the direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Row and column delta of a single step.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }
}

/// Policy applied when the head leaves the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    /// Leaving the grid is a collision.
    #[default]
    Die,
    /// The head re-enters from the opposite edge.
    Wrap,
}

/// What the head ran into on a fatal tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// The head left the grid in die mode.
    Boundary,
    /// The head entered an obstacle cell.
    Obstacle,
    /// The head entered one of the snake's own segments.
    SelfCollision,
}

/// Location of a single grid cell expressed as row and column indices.
///
/// Coordinates are signed so that a die-mode candidate that left the grid can
/// still be represented and rejected downstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based row index.
    pub row: i32,
    /// Zero-based column index.
    pub col: i32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Position one step away in the provided direction, without any bounds policy.
    #[must_use]
    pub const fn stepped(self, direction: Direction) -> Self {
        let (dr, dc) = direction.offset();
        Self::new(self.row + dr, self.col + dc)
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub fn manhattan_distance(self, other: Position) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

/// Kinds of food with distinct effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodKind {
    /// Baseline food.
    Normal,
    /// Worth double the baseline.
    Big,
    /// Baseline points, but slows the snake down.
    Slow,
}

/// Food item resting on a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Food {
    /// Cell the food occupies.
    pub cell: Position,
    /// Kind drawn when the food spawned.
    pub kind: FoodKind,
}

/// Probability weights used to draw the kind of each spawned food.
///
/// Weights are used exactly as configured. When they do not sum to one the
/// `slow` branch absorbs whatever probability mass remains.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoodWeights {
    /// Weight of [`FoodKind::Normal`].
    pub normal: f64,
    /// Weight of [`FoodKind::Big`].
    pub big: f64,
    /// Weight of [`FoodKind::Slow`].
    pub slow: f64,
}

impl FoodWeights {
    /// Creates a new weight table.
    #[must_use]
    pub const fn new(normal: f64, big: f64, slow: f64) -> Self {
        Self { normal, big, slow }
    }

    /// Selects a food kind for a uniform draw `r` in `[0, 1)`.
    #[must_use]
    pub fn select(&self, r: f64) -> FoodKind {
        if r < self.normal {
            FoodKind::Normal
        } else if r < self.normal + self.big {
            FoodKind::Big
        } else {
            FoodKind::Slow
        }
    }

    /// Reports whether the weights form a proper probability distribution.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        let all_positive = self.normal >= 0.0 && self.big >= 0.0 && self.slow >= 0.0;
        all_positive && (self.normal + self.big + self.slow - 1.0).abs() < 1e-6
    }
}

impl Default for FoodWeights {
    fn default() -> Self {
        Self::new(0.7, 0.2, 0.1)
    }
}

/// Linked pair of cells; entering either endpoint exits through the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Portal {
    /// First endpoint.
    pub a: Position,
    /// Second endpoint.
    pub b: Position,
}

impl Portal {
    /// Creates a portal linking the two endpoints.
    #[must_use]
    pub const fn new(a: Position, b: Position) -> Self {
        Self { a, b }
    }

    /// Returns the opposite endpoint when `position` is one of the portal's ends.
    #[must_use]
    pub fn exit_for(&self, position: Position) -> Option<Position> {
        if position == self.a {
            Some(self.b)
        } else if position == self.b {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Reasons an entity placement request may fail.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum PlacementError {
    /// The exclusion set covers every cell of the grid.
    #[error("no free grid cell remains for placement")]
    ExhaustedGrid,
}

/// Read-only values the progression system needs to respond to events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressionView {
    /// Level currently active.
    pub level: LevelNumber,
    /// Running score before the events being handled took effect.
    pub score: u32,
    /// Live duration between ticks.
    pub tick_interval: Duration,
    /// Whether the current level has already been completed.
    pub level_completed: bool,
    /// Lifecycle phase of the session.
    pub phase: Phase,
}

/// Display metadata describing the active level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    /// Level number.
    pub number: LevelNumber,
    /// Human readable name.
    pub name: String,
    /// Short description shown alongside the name.
    pub description: String,
}

/// Immutable per-tick projection of a session handed to renderers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Side length of the square grid.
    pub grid_size: u32,
    /// Boundary policy of the active level.
    pub boundary_mode: BoundaryMode,
    /// Snake segments, head first.
    pub snake: Vec<Position>,
    /// Direction committed on the last tick.
    pub direction: Direction,
    /// Current food item, absent only when the board is full.
    pub food: Option<Food>,
    /// Obstacle cells in ascending order.
    pub obstacles: Vec<Position>,
    /// Portals active on the level.
    pub portals: Vec<Portal>,
    /// Running score.
    pub score: u32,
    /// Best score recorded for the level.
    pub high_score: u32,
    /// Live duration between ticks.
    pub tick_interval: Duration,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Active level metadata.
    pub level: LevelInfo,
    /// Levels unlocked so far, ascending.
    pub unlocked_levels: Vec<LevelNumber>,
    /// Whether the current level has been completed.
    pub level_completed: bool,
    /// Palette index of the colour theme.
    pub theme_index: u32,
    /// Time left on a time-boxed level.
    pub remaining_time: Option<Duration>,
    /// Number of ticks processed in the session.
    pub tick: u64,
}

impl GameSnapshot {
    /// Head of the snake.
    #[must_use]
    pub fn head(&self) -> Option<Position> {
        self.snake.first().copied()
    }

    /// Returns the snapshot with the provided high score attached.
    #[must_use]
    pub fn with_high_score(mut self, high_score: u32) -> Self {
        self.high_score = high_score;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BoundaryMode, Direction, FoodKind, FoodWeights, GameSnapshot, LevelInfo, Phase, Portal,
        Position,
    };
    use std::time::Duration;

    #[test]
    fn opposite_directions_pair_up() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_ne!(direction.opposite(), direction);
        }
    }

    #[test]
    fn stepping_follows_row_column_convention() {
        let origin = Position::new(10, 9);
        assert_eq!(origin.stepped(Direction::Right), Position::new(10, 10));
        assert_eq!(origin.stepped(Direction::Up), Position::new(9, 9));
        assert_eq!(Position::new(0, 0).stepped(Direction::Left), Position::new(0, -1));
    }

    #[test]
    fn food_weights_follow_cumulative_thresholds() {
        let weights = FoodWeights::new(0.7, 0.2, 0.1);
        assert_eq!(weights.select(0.0), FoodKind::Normal);
        assert_eq!(weights.select(0.69), FoodKind::Normal);
        assert_eq!(weights.select(0.75), FoodKind::Big);
        assert_eq!(weights.select(0.95), FoodKind::Slow);
    }

    #[test]
    fn oversized_weights_never_reach_slow() {
        let weights = FoodWeights::new(0.8, 0.4, 0.3);
        assert!(!weights.is_normalized());
        assert_eq!(weights.select(0.99), FoodKind::Big);
    }

    #[test]
    fn default_weights_are_normalized() {
        assert!(FoodWeights::default().is_normalized());
    }

    #[test]
    fn portal_links_both_endpoints() {
        let portal = Portal::new(Position::new(1, 1), Position::new(5, 7));
        assert_eq!(portal.exit_for(Position::new(1, 1)), Some(Position::new(5, 7)));
        assert_eq!(portal.exit_for(Position::new(5, 7)), Some(Position::new(1, 1)));
        assert_eq!(portal.exit_for(Position::new(2, 2)), None);
    }

    #[test]
    fn snapshot_survives_bincode() {
        let snapshot = GameSnapshot {
            grid_size: 20,
            boundary_mode: BoundaryMode::Wrap,
            snake: vec![Position::new(10, 10), Position::new(10, 9)],
            direction: Direction::Right,
            food: None,
            obstacles: vec![Position::new(3, 4)],
            portals: vec![Portal::new(Position::new(0, 0), Position::new(19, 19))],
            score: 40,
            high_score: 120,
            tick_interval: Duration::from_millis(135),
            phase: Phase::Paused,
            level: LevelInfo {
                number: 2,
                name: "Obstacles".to_owned(),
                description: String::new(),
            },
            unlocked_levels: vec![1, 2],
            level_completed: false,
            theme_index: 1,
            remaining_time: Some(Duration::from_secs(12)),
            tick: 77,
        };

        let bytes = bincode::serialize(&snapshot).expect("serialize");
        let restored: GameSnapshot = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, snapshot);
        assert_eq!(restored.head(), Some(Position::new(10, 10)));
    }
}
