#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Grid Snake.
//!
//! The world owns the grid, the snake, food, obstacles and portals of a single
//! session. It mutates only through [`apply`] and reports every change as an
//! [`Event`]. Read access goes through the [`query`] module.

mod collision;
mod grid;
mod placement;
mod snake;

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    time::Duration,
};

use grid_snake_core::{
    Command, Direction, Event, Food, GameConfig, LevelNumber, Phase, PlacementError, Portal,
    Position, ResolvedLevel,
};
use log::{debug, info, warn};

pub use collision::CollisionOutcome;
pub use grid::Grid;
pub use placement::Placer;
pub use snake::{PlannedStep, Snake};

use collision::Arena;

const DEFAULT_PLACEMENT_SEED: u64 = 0x5eed_5a4e_c0ff_ee01;

/// Represents the authoritative state of one game session.
#[derive(Clone, Debug)]
pub struct World {
    config: GameConfig,
    current_level: LevelNumber,
    level: ResolvedLevel,
    grid: Grid,
    snake: Snake,
    food: Option<Food>,
    obstacles: BTreeSet<Position>,
    portals: Vec<Portal>,
    portal_links: HashMap<Position, Position>,
    placer: Placer,
    direction: Direction,
    pending_direction: Direction,
    score: u32,
    tick_interval: Duration,
    phase: Phase,
    unlocked: BTreeSet<LevelNumber>,
    level_completed: bool,
    theme_index: u32,
    remaining_time: Option<Duration>,
    tick_index: u64,
    last_outcome: Option<CollisionOutcome>,
}

impl World {
    /// Creates a world on the configured default level, ready to start.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        let config = config.sanitized();
        let current_level = config.default_level;
        let level = config.resolve_level(current_level);
        let grid = Grid::new(config.grid_size);
        let snake = Snake::centered(&grid, config.initial_snake_length);
        let placer = Placer::from_seed(config.seed.unwrap_or(DEFAULT_PLACEMENT_SEED));

        let mut world = Self {
            current_level,
            tick_interval: level.tick_interval,
            level,
            grid,
            snake,
            food: None,
            obstacles: BTreeSet::new(),
            portals: Vec::new(),
            portal_links: HashMap::new(),
            placer,
            direction: Direction::Right,
            pending_direction: Direction::Right,
            score: 0,
            phase: Phase::Ready,
            unlocked: BTreeSet::from([1, current_level]),
            level_completed: false,
            theme_index: 0,
            remaining_time: None,
            tick_index: 0,
            last_outcome: None,
            config,
        };

        let mut discarded = Vec::new();
        world.prepare_level(&mut discarded);
        world
    }

    /// Rebuilds snake, obstacles, portals and food from the current level.
    fn prepare_level(&mut self, out_events: &mut Vec<Event>) {
        self.level = self.config.resolve_level(self.current_level);
        self.grid = Grid::new(self.config.grid_size);
        self.portals = self.level.portals.clone();
        self.portal_links = link_portals(&self.portals);
        self.snake = Snake::centered(&self.grid, self.config.initial_snake_length);

        let reserved: HashSet<Position> = self
            .snake
            .segments()
            .chain(portal_endpoints(&self.portals))
            .collect();
        let requested = self.level.obstacle_count;
        self.obstacles = match self
            .placer
            .generate_obstacles(&self.grid, requested, &reserved)
        {
            Ok(obstacles) => obstacles,
            Err(reason) => {
                warn!("level {} cannot hold {requested} obstacles: {reason}", self.current_level);
                out_events.push(Event::ObstaclePlacementFailed { requested, reason });
                BTreeSet::new()
            }
        };

        self.direction = Direction::Right;
        self.pending_direction = Direction::Right;
        self.score = 0;
        self.tick_interval = self.level.tick_interval;
        self.phase = Phase::Ready;
        self.level_completed = false;
        self.theme_index = 0;
        self.remaining_time = self.level.time_limit;
        self.last_outcome = None;

        if let Err(reason) = self.spawn_food(out_events) {
            warn!("level {} starts without food: {reason}", self.current_level);
        }
    }

    fn spawn_food(&mut self, out_events: &mut Vec<Event>) -> Result<Food, PlacementError> {
        let excluding: HashSet<Position> = self
            .snake
            .segments()
            .chain(self.obstacles.iter().copied())
            .chain(portal_endpoints(&self.portals))
            .collect();

        match self.placer.place_random(&self.grid, &excluding) {
            Ok(cell) => {
                let kind = self.placer.pick_food_kind(&self.level.food_weights);
                let food = Food { cell, kind };
                self.food = Some(food);
                out_events.push(Event::FoodSpawned { food });
                Ok(food)
            }
            Err(reason) => {
                self.food = None;
                out_events.push(Event::FoodPlacementFailed { reason });
                Err(reason)
            }
        }
    }

    fn tick(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Playing {
            debug!("ignoring tick while {:?}", self.phase);
            return;
        }

        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::Ticked {
            tick: self.tick_index,
        });
        self.direction = self.pending_direction;

        let arena = Arena {
            grid: &self.grid,
            boundary_mode: self.level.boundary_mode,
            portals: &self.portal_links,
            obstacles: &self.obstacles,
            food: self.food,
        };
        let resolution = collision::resolve(&mut self.snake, self.direction, &arena);
        self.last_outcome = Some(resolution.outcome);

        match resolution.outcome {
            CollisionOutcome::Dead(cause) => {
                self.phase = Phase::GameOver;
                info!(
                    "game over on level {} ({cause:?}) with score {}",
                    self.current_level, self.score
                );
                out_events.push(Event::GameOver {
                    cause,
                    final_score: self.score,
                });
            }
            CollisionOutcome::None => out_events.push(Event::SnakeMoved {
                head: resolution.head,
                vacated: resolution.vacated,
                teleported: resolution.teleported,
            }),
            CollisionOutcome::Fed(_) => {
                out_events.push(Event::SnakeMoved {
                    head: resolution.head,
                    vacated: resolution.vacated,
                    teleported: resolution.teleported,
                });
                if let Some(food) = self.food.take() {
                    out_events.push(Event::FoodConsumed { food });
                }
                if self.spawn_food(out_events).is_err() {
                    self.phase = Phase::Celebrating;
                    self.level_completed = true;
                    self.unlock_next(out_events);
                    info!("level {} cleared: no free cell left", self.current_level);
                    out_events.push(Event::BoardCleared {
                        level: self.current_level,
                    });
                }
            }
        }
    }

    fn advance_time(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { dt });
        if self.phase != Phase::Playing {
            return;
        }

        let Some(remaining) = self.remaining_time else {
            return;
        };
        let left = remaining.saturating_sub(dt);
        self.remaining_time = Some(left);
        if left.is_zero() {
            self.phase = Phase::Celebrating;
            self.level_completed = true;
            self.unlock_next(out_events);
            info!("time ran out on level {}", self.current_level);
            out_events.push(Event::TimeExpired {
                level: self.current_level,
            });
        }
    }

    fn steer(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Playing {
            debug!("ignoring steer {direction:?} while {:?}", self.phase);
            return;
        }

        if direction == self.direction.opposite() {
            out_events.push(Event::DirectionRejected { direction });
        } else {
            self.pending_direction = direction;
            out_events.push(Event::DirectionQueued { direction });
        }
    }

    fn unlock(&mut self, level: LevelNumber, out_events: &mut Vec<Event>) {
        if self.unlocked.insert(level) {
            info!("level {level} unlocked");
            out_events.push(Event::LevelUnlocked { level });
        }
    }

    fn unlock_next(&mut self, out_events: &mut Vec<Event>) {
        let next = self.current_level.saturating_add(1);
        if self.config.defines_level(next) {
            self.unlock(next, out_events);
        }
    }
}

fn link_portals(portals: &[Portal]) -> HashMap<Position, Position> {
    let mut links = HashMap::with_capacity(portals.len() * 2);
    for portal in portals {
        let _ = links.insert(portal.a, portal.b);
        let _ = links.insert(portal.b, portal.a);
    }
    links
}

fn portal_endpoints(portals: &[Portal]) -> impl Iterator<Item = Position> + '_ {
    portals.iter().flat_map(|portal| [portal.a, portal.b])
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Start => {
            if world.phase == Phase::Ready {
                world.phase = Phase::Playing;
                info!("level {} started", world.current_level);
                out_events.push(Event::Started {
                    level: world.current_level,
                });
            }
        }
        Command::Reset => {
            world.prepare_level(out_events);
            out_events.push(Event::Reset {
                level: world.current_level,
            });
        }
        Command::Tick => world.tick(out_events),
        Command::AdvanceTime { dt } => world.advance_time(dt, out_events),
        Command::Steer { direction } => world.steer(direction, out_events),
        Command::Pause => {
            if world.phase == Phase::Playing {
                world.phase = Phase::Paused;
                out_events.push(Event::Paused);
            }
        }
        Command::Resume => {
            if world.phase == Phase::Paused {
                world.phase = Phase::Playing;
                out_events.push(Event::Resumed);
            }
        }
        Command::SwitchLevel { level } => {
            if world.config.defines_level(level) && world.unlocked.contains(&level) {
                world.current_level = level;
                world.prepare_level(out_events);
                out_events.push(Event::LevelSwitched { level });
            } else {
                debug!("ignoring switch to locked or undefined level {level}");
            }
        }
        Command::AwardScore { points } => {
            if matches!(world.phase, Phase::Playing | Phase::Celebrating) {
                world.score = world.score.saturating_add(points);
                out_events.push(Event::ScoreChanged {
                    level: world.current_level,
                    score: world.score,
                });
            }
        }
        Command::SetTickInterval { interval } => {
            if interval != world.tick_interval {
                world.tick_interval = interval;
                out_events.push(Event::TickIntervalChanged { interval });
            }
        }
        Command::SetTheme { index } => {
            if index != world.theme_index {
                world.theme_index = index;
                out_events.push(Event::ThemeChanged { index });
            }
        }
        Command::CompleteLevel { next } => {
            if world.phase != Phase::Playing
                || world.level_completed
                || !world.config.defines_level(next)
            {
                debug!("ignoring completion request towards level {next}");
                return;
            }

            world.level_completed = true;
            world.phase = Phase::Celebrating;
            info!(
                "level {} completed with score {}",
                world.current_level, world.score
            );
            out_events.push(Event::LevelCompleted {
                level: world.current_level,
                next,
            });
            world.unlock(next, out_events);
        }
        Command::EnterLevel { level } => {
            if world.phase != Phase::Celebrating || !world.config.defines_level(level) {
                debug!("ignoring entry into level {level} while {:?}", world.phase);
                return;
            }

            world.current_level = level;
            world.unlock(level, out_events);
            world.prepare_level(out_events);
            world.phase = Phase::Playing;
            info!("entered level {level}");
            out_events.push(Event::LevelEntered { level });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::{collections::BTreeSet, time::Duration};

    use grid_snake_core::{
        Direction, Food, GameConfig, GameSnapshot, LevelNumber, Phase, Portal, Position,
        ProgressionView, ResolvedLevel,
    };

    use super::{CollisionOutcome, Grid, Snake, World};

    /// Lifecycle phase of the session.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Running score on the current level.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// Level currently active.
    #[must_use]
    pub fn current_level(world: &World) -> LevelNumber {
        world.current_level
    }

    /// Whether the active level has been completed.
    #[must_use]
    pub fn level_completed(world: &World) -> bool {
        world.level_completed
    }

    /// Live duration between ticks.
    #[must_use]
    pub fn tick_interval(world: &World) -> Duration {
        world.tick_interval
    }

    /// Direction committed on the last tick.
    #[must_use]
    pub fn direction(world: &World) -> Direction {
        world.direction
    }

    /// Direction that the next tick will commit.
    #[must_use]
    pub fn pending_direction(world: &World) -> Direction {
        world.pending_direction
    }

    /// Provides read-only access to the snake.
    #[must_use]
    pub fn snake(world: &World) -> &Snake {
        &world.snake
    }

    /// Current food item.
    #[must_use]
    pub fn food(world: &World) -> Option<Food> {
        world.food
    }

    /// Obstacle cells of the level.
    #[must_use]
    pub fn obstacles(world: &World) -> &BTreeSet<Position> {
        &world.obstacles
    }

    /// Portals of the level.
    #[must_use]
    pub fn portals(world: &World) -> &[Portal] {
        &world.portals
    }

    /// Grid the session plays on.
    #[must_use]
    pub fn grid(world: &World) -> Grid {
        world.grid
    }

    /// Levels unlocked during the session, ascending.
    #[must_use]
    pub fn unlocked_levels(world: &World) -> Vec<LevelNumber> {
        world.unlocked.iter().copied().collect()
    }

    /// Whether the level may be selected.
    #[must_use]
    pub fn is_unlocked(world: &World, level: LevelNumber) -> bool {
        world.unlocked.contains(&level)
    }

    /// Configuration the world was built from.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Merged settings of the active level.
    #[must_use]
    pub fn level(world: &World) -> &ResolvedLevel {
        &world.level
    }

    /// Time left on a time-boxed level.
    #[must_use]
    pub fn remaining_time(world: &World) -> Option<Duration> {
        world.remaining_time
    }

    /// Palette index of the colour theme.
    #[must_use]
    pub fn theme_index(world: &World) -> u32 {
        world.theme_index
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Classification of the most recent tick on this level.
    #[must_use]
    pub fn last_outcome(world: &World) -> Option<CollisionOutcome> {
        world.last_outcome
    }

    /// Captures the values the progression system reacts to.
    #[must_use]
    pub fn progression_view(world: &World) -> ProgressionView {
        ProgressionView {
            level: world.current_level,
            score: world.score,
            tick_interval: world.tick_interval,
            level_completed: world.level_completed,
            phase: world.phase,
        }
    }

    /// Captures an immutable snapshot for renderers.
    ///
    /// The world does not know the persisted high score, so the snapshot
    /// carries zero until the owner attaches one.
    #[must_use]
    pub fn snapshot(world: &World) -> GameSnapshot {
        GameSnapshot {
            grid_size: world.grid.size(),
            boundary_mode: world.level.boundary_mode,
            snake: world.snake.segments().collect(),
            direction: world.direction,
            food: world.food,
            obstacles: world.obstacles.iter().copied().collect(),
            portals: world.portals.clone(),
            score: world.score,
            high_score: 0,
            tick_interval: world.tick_interval,
            phase: world.phase,
            level: world.level.info.clone(),
            unlocked_levels: unlocked_levels(world),
            level_completed: world.level_completed,
            theme_index: world.theme_index,
            remaining_time: world.remaining_time,
            tick: world.tick_index,
        }
    }
}

/// Helpers that stage hand-authored layouts for deterministic scenarios.
#[cfg(feature = "scaffolding")]
pub mod scaffolding {
    use grid_snake_core::{Direction, Food, GameConfig, Phase, Portal, Position};

    use super::{link_portals, Snake, World};

    /// Explicit arrangement of every entity on the grid.
    #[derive(Clone, Debug)]
    pub struct Layout {
        /// Snake segments, head first. Must not be empty.
        pub snake: Vec<Position>,
        /// Direction the snake is already travelling in.
        pub direction: Direction,
        /// Food on the grid.
        pub food: Option<Food>,
        /// Obstacle cells.
        pub obstacles: Vec<Position>,
        /// Portals replacing those of the level.
        pub portals: Vec<Portal>,
        /// Score the level starts from.
        pub score: u32,
        /// Phase the world starts in.
        pub phase: Phase,
    }

    impl Layout {
        /// Creates a layout with only a snake, travelling right, already playing.
        #[must_use]
        pub fn with_snake(snake: Vec<Position>) -> Self {
            Self {
                snake,
                direction: Direction::Right,
                food: None,
                obstacles: Vec::new(),
                portals: Vec::new(),
                score: 0,
                phase: Phase::Playing,
            }
        }
    }

    impl World {
        /// Builds a world on the default level and replaces its entities with `layout`.
        #[must_use]
        pub fn with_layout(config: GameConfig, layout: Layout) -> Self {
            let mut world = World::new(config);
            if let Some(snake) = Snake::from_segments(layout.snake) {
                world.snake = snake;
            }
            world.direction = layout.direction;
            world.pending_direction = layout.direction;
            world.food = layout.food;
            world.obstacles = layout.obstacles.into_iter().collect();
            world.portal_links = link_portals(&layout.portals);
            world.portals = layout.portals;
            world.score = layout.score;
            world.phase = layout.phase;
            world
        }
    }
}
