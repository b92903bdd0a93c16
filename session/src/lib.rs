#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session orchestrator for Grid Snake.
//!
//! A [`Session`] owns one world together with the systems reacting to it. The
//! owner drives it with player [`Input`] and elapsed time; every processed tick
//! is handed to the rendering backend as a fresh presentation.

mod high_scores;

use std::time::Duration;

use grid_snake_core::{Command, Direction, Event, GameConfig, GameSnapshot, LevelNumber, Phase};
use grid_snake_rendering::{Presentation, RenderingBackend};
use grid_snake_system_clock::SimulationClock;
use grid_snake_system_progression::{Config as ProgressionConfig, Progression};
use grid_snake_world::{self as world, query, World};
use log::info;

pub use high_scores::{HighScoreLedger, HighScoreStore, MemoryStore, StoreError};

/// Discrete player intents accepted by a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    /// Requests the direction for the next tick.
    Steer(Direction),
    /// Starts a ready level.
    Start,
    /// Pauses a running level.
    Pause,
    /// Resumes a paused level.
    Resume,
    /// Pauses when running, resumes when paused.
    TogglePause,
    /// Rebuilds the current level.
    Reset,
    /// Jumps to another unlocked level.
    SwitchLevel(LevelNumber),
}

/// Errors surfaced while driving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The rendering backend rejected a frame. The simulation state is intact.
    #[error("renderer failed to present a frame")]
    Render(#[source] anyhow::Error),
}

/// One independent game session.
#[derive(Debug)]
pub struct Session<S, B> {
    world: World,
    progression: Progression,
    clock: SimulationClock,
    ledger: HighScoreLedger<S>,
    backend: B,
    events: Vec<Event>,
}

impl<S: HighScoreStore, B: RenderingBackend> Session<S, B> {
    /// Creates a session on the default level of `config`.
    #[must_use]
    pub fn new(config: GameConfig, store: S, backend: B) -> Self {
        Self::from_world(World::new(config), store, backend)
    }

    /// Wraps an existing world. A world that is already playing starts ticking.
    #[must_use]
    pub fn from_world(world: World, store: S, backend: B) -> Self {
        let progression = Progression::new(ProgressionConfig::from_game_config(query::config(
            &world,
        )));
        let mut ledger = HighScoreLedger::new(store);
        let _ = ledger.best(query::current_level(&world));

        let mut clock = SimulationClock::new();
        if query::phase(&world) == Phase::Playing {
            let _ = clock.start(query::tick_interval(&world));
        }

        Self {
            world,
            progression,
            clock,
            ledger,
            backend,
            events: Vec::new(),
        }
    }

    /// Applies a player intent and presents the result when state changed.
    pub fn input(&mut self, input: Input) -> Result<(), SessionError> {
        let command = match input {
            Input::Steer(direction) => Command::Steer { direction },
            Input::Start => Command::Start,
            Input::Pause => Command::Pause,
            Input::Resume => Command::Resume,
            Input::TogglePause => {
                if query::phase(&self.world) == Phase::Paused {
                    Command::Resume
                } else {
                    Command::Pause
                }
            }
            Input::Reset => Command::Reset,
            Input::SwitchLevel(level) => Command::SwitchLevel { level },
        };

        if self.execute(vec![command]) {
            self.present()?;
        }
        Ok(())
    }

    /// Feeds elapsed wall time, running every tick that falls due.
    ///
    /// Returns the number of ticks processed.
    pub fn advance(&mut self, dt: Duration) -> Result<u32, SessionError> {
        self.clock.advance(dt);
        let mut fired = 0;
        while self.clock.take_due().is_some() {
            self.tick()?;
            self.clock.rearm(query::tick_interval(&self.world));
            fired += 1;
        }

        let start = self.events.len();
        let _ = self.execute(vec![Command::AdvanceTime { dt }]);
        let transitioned = self.events[start..]
            .iter()
            .any(|event| !matches!(event, Event::TimeAdvanced { .. }));
        if transitioned {
            self.present()?;
        }
        Ok(fired)
    }

    /// Performs one simulation step immediately and presents it.
    pub fn tick(&mut self) -> Result<(), SessionError> {
        let _ = self.execute(vec![Command::Tick]);
        self.present()
    }

    /// Immutable snapshot including the high score of the current level.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        let level = query::current_level(&self.world);
        query::snapshot(&self.world).with_high_score(self.ledger.cached(level))
    }

    /// Removes and returns every event recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Provides read-only access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Provides read-only access to the clock.
    #[must_use]
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Provides read-only access to the high score ledger.
    #[must_use]
    pub fn ledger(&self) -> &HighScoreLedger<S> {
        &self.ledger
    }

    /// Provides read-only access to the rendering backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Applies commands and pumps the resulting events through the systems
    /// until no system has anything left to say.
    ///
    /// Returns whether the world emitted any event.
    fn execute(&mut self, commands: Vec<Command>) -> bool {
        let mut pending = commands;
        let mut changed = false;

        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            if events.is_empty() {
                break;
            }
            changed = true;

            let world = &self.world;
            self.progression.handle(
                &events,
                query::progression_view(world),
                |level| query::config(world).defines_level(level),
                &mut pending,
            );
            self.clock.handle(&events, query::tick_interval(world));
            self.track_scores(&events);
            self.events.extend(events);
        }

        changed
    }

    fn track_scores(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::ScoreChanged { level, score } => {
                    if self.ledger.record(*level, *score) {
                        info!("new high score {score} on level {level}");
                    }
                }
                Event::Started { level }
                | Event::Reset { level }
                | Event::LevelEntered { level }
                | Event::LevelSwitched { level } => {
                    let _ = self.ledger.best(*level);
                }
                _ => {}
            }
        }
    }

    fn present(&mut self) -> Result<(), SessionError> {
        let presentation = Presentation::from_snapshot(&self.snapshot());
        self.backend
            .present(&presentation)
            .map_err(SessionError::Render)
    }
}
