#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level and score progression system.
//!
//! Translates food consumption into score, speed and theme commands, requests
//! level completion once the configured threshold is reached, and schedules the
//! entry into the next level after the celebration delay.

use std::{collections::BTreeMap, time::Duration};

use grid_snake_core::{
    Command, Event, FoodKind, GameConfig, LevelNumber, ProgressionView, ScoringConfig,
};
use log::{debug, info};

/// Configuration parameters required to construct the progression system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    scoring: ScoringConfig,
    speed_step: Duration,
    min_interval: Duration,
    max_interval: Duration,
    slow_down_step: Duration,
    level_up_scores: BTreeMap<LevelNumber, u32>,
    transition_delay: Duration,
}

impl Config {
    /// Creates a new configuration from the speed, scoring and threshold knobs of `config`.
    #[must_use]
    pub fn from_game_config(config: &GameConfig) -> Self {
        Self {
            scoring: config.scoring,
            speed_step: Duration::from_millis(config.speed_step),
            min_interval: Duration::from_millis(config.min_speed),
            max_interval: Duration::from_millis(config.max_speed),
            slow_down_step: Duration::from_millis(config.slow_down_step),
            level_up_scores: config.level_up_scores.clone(),
            transition_delay: Duration::from_millis(config.transition_delay_ms),
        }
    }

    /// Cumulative score required to unlock `level`, if it has a threshold.
    #[must_use]
    pub fn threshold(&self, level: LevelNumber) -> Option<u32> {
        self.level_up_scores.get(&level).copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingTransition {
    next: LevelNumber,
    remaining: Duration,
}

/// Pure system that reacts to world events and emits progression commands.
#[derive(Debug)]
pub struct Progression {
    config: Config,
    pending: Option<PendingTransition>,
}

impl Progression {
    /// Creates a new progression system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            pending: None,
        }
    }

    /// Level the system is waiting to enter, if a transition is scheduled.
    #[must_use]
    pub fn pending_level(&self) -> Option<LevelNumber> {
        self.pending.map(|pending| pending.next)
    }

    /// Consumes world events and the progression view to emit commands.
    ///
    /// `defines_level` reports whether the configuration knows a level.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        view: ProgressionView,
        defines_level: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(LevelNumber) -> bool,
    {
        let mut score = view.score;
        let mut interval = view.tick_interval;
        let mut completion_requested = view.level_completed;

        for event in events {
            match event {
                Event::FoodConsumed { food } => {
                    let before = score;
                    let points = self.config.scoring.points_for(food.kind);
                    score = score.saturating_add(points);
                    out.push(Command::AwardScore { points });

                    let next_interval = self.next_interval(interval, food.kind, before, score);
                    if next_interval != interval {
                        interval = next_interval;
                        out.push(Command::SetTickInterval { interval });
                    }

                    let scoring = &self.config.scoring;
                    if crossed(before, score, scoring.theme_every) {
                        let index = (score / scoring.theme_every) % scoring.theme_count.max(1);
                        out.push(Command::SetTheme { index });
                    }

                    let next = view.level.saturating_add(1);
                    let reached = self
                        .config
                        .threshold(next)
                        .is_some_and(|threshold| score >= threshold);
                    if reached && !completion_requested && defines_level(next) {
                        completion_requested = true;
                        debug!("score {score} reaches the threshold of level {next}");
                        out.push(Command::CompleteLevel { next });
                    }
                }
                Event::LevelCompleted { next, .. } => self.schedule(*next, out),
                Event::TimeExpired { level } | Event::BoardCleared { level } => {
                    let next = level.saturating_add(1);
                    if defines_level(next) {
                        self.schedule(next, out);
                    }
                }
                Event::TimeAdvanced { dt } => {
                    if let Some(mut pending) = self.pending {
                        pending.remaining = pending.remaining.saturating_sub(*dt);
                        if pending.remaining.is_zero() {
                            self.pending = None;
                            out.push(Command::EnterLevel {
                                level: pending.next,
                            });
                        } else {
                            self.pending = Some(pending);
                        }
                    }
                }
                Event::Reset { .. }
                | Event::LevelSwitched { .. }
                | Event::LevelEntered { .. }
                | Event::GameOver { .. } => {
                    if let Some(pending) = self.pending.take() {
                        debug!("dropping transition into level {}", pending.next);
                    }
                }
                _ => {}
            }
        }
    }

    fn next_interval(&self, current: Duration, kind: FoodKind, before: u32, after: u32) -> Duration {
        if kind == FoodKind::Slow {
            return (current + self.config.slow_down_step).min(self.config.max_interval);
        }

        if crossed(before, after, self.config.scoring.speed_up_every) {
            return current
                .saturating_sub(self.config.speed_step)
                .max(self.config.min_interval);
        }

        current
    }

    fn schedule(&mut self, next: LevelNumber, out: &mut Vec<Command>) {
        info!(
            "entering level {next} in {} ms",
            self.config.transition_delay.as_millis()
        );
        if self.config.transition_delay.is_zero() {
            self.pending = None;
            out.push(Command::EnterLevel { level: next });
            return;
        }

        self.pending = Some(PendingTransition {
            next,
            remaining: self.config.transition_delay,
        });
    }
}

/// Whether moving from `before` to `after` passes a multiple of `every`.
fn crossed(before: u32, after: u32, every: u32) -> bool {
    every > 0 && before / every < after / every
}
