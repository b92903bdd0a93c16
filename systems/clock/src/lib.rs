#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-interval tick driver decoupled from wall-clock time.
//!
//! The owner feeds elapsed time through [`SimulationClock::advance`] and asks
//! for due ticks with [`SimulationClock::take_due`]. After each tick the clock
//! must be re-armed with the interval that is live at that moment, so a speed
//! change only ever affects the next scheduled tick.

use std::time::Duration;

use grid_snake_core::Event;
use log::debug;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Identifies one armed timer. A new handle is issued on every start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Generation number of the handle.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Armed {
        handle: TimerHandle,
        until_next: Duration,
    },
    Due {
        handle: TimerHandle,
    },
    Suspended {
        handle: TimerHandle,
    },
}

/// Tick scheduler owning at most one live timer handle.
#[derive(Debug)]
pub struct SimulationClock {
    state: State,
    generation: u64,
    banked: Duration,
}

impl SimulationClock {
    /// Creates an idle clock.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: State::Idle,
            generation: 0,
            banked: Duration::ZERO,
        }
    }

    /// Arms a fresh timer, invalidating any previous handle.
    pub fn start(&mut self, interval: Duration) -> TimerHandle {
        self.generation = self.generation.wrapping_add(1);
        let handle = TimerHandle(self.generation);
        self.banked = Duration::ZERO;
        self.state = State::Armed {
            handle,
            until_next: interval.max(MIN_INTERVAL),
        };
        handle
    }

    /// Suspends tick delivery. Returns `false` when nothing was running.
    pub fn pause(&mut self) -> bool {
        match self.state {
            State::Armed { handle, .. } | State::Due { handle } => {
                self.state = State::Suspended { handle };
                self.banked = Duration::ZERO;
                true
            }
            State::Idle | State::Suspended { .. } => false,
        }
    }

    /// Restarts tick delivery with the live interval. Returns `false` when the
    /// clock was not paused.
    pub fn resume(&mut self, live_interval: Duration) -> bool {
        match self.state {
            State::Suspended { handle } => {
                self.state = State::Armed {
                    handle,
                    until_next: live_interval.max(MIN_INTERVAL),
                };
                true
            }
            State::Idle | State::Armed { .. } | State::Due { .. } => false,
        }
    }

    /// Drops the live handle. No tick is reported for it afterwards.
    pub fn cancel(&mut self) {
        self.state = State::Idle;
        self.banked = Duration::ZERO;
    }

    /// Handle of the timer that is armed or paused, if any.
    #[must_use]
    pub fn live_handle(&self) -> Option<TimerHandle> {
        match self.state {
            State::Idle => None,
            State::Armed { handle, .. } | State::Due { handle } | State::Suspended { handle } => {
                Some(handle)
            }
        }
    }

    /// Whether ticks are currently being delivered.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Armed { .. } | State::Due { .. })
    }

    /// Whether the live timer is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        matches!(self.state, State::Suspended { .. })
    }

    /// Banks elapsed wall time. Ignored unless the timer is armed.
    pub fn advance(&mut self, dt: Duration) {
        if matches!(self.state, State::Armed { .. }) {
            self.banked = self.banked.saturating_add(dt);
        }
    }

    /// Reports a due tick, consuming one interval of banked time.
    ///
    /// The clock then waits in the due state until [`Self::rearm`] is called.
    pub fn take_due(&mut self) -> Option<TimerHandle> {
        let State::Armed { handle, until_next } = self.state else {
            return None;
        };
        if self.banked < until_next {
            return None;
        }

        self.banked -= until_next;
        self.state = State::Due { handle };
        Some(handle)
    }

    /// Schedules the next tick after a due tick was processed.
    pub fn rearm(&mut self, live_interval: Duration) {
        if let State::Due { handle } = self.state {
            self.state = State::Armed {
                handle,
                until_next: live_interval.max(MIN_INTERVAL),
            };
        }
    }

    /// Reacts to world events, starting, pausing or cancelling the timer.
    pub fn handle(&mut self, events: &[Event], live_interval: Duration) {
        for event in events {
            match event {
                Event::Started { .. } | Event::LevelEntered { .. } => {
                    let handle = self.start(live_interval);
                    debug!("clock armed with handle {}", handle.generation());
                }
                Event::Paused | Event::LevelCompleted { .. } => {
                    let _ = self.pause();
                }
                Event::Resumed => {
                    let _ = self.resume(live_interval);
                }
                Event::GameOver { .. }
                | Event::Reset { .. }
                | Event::LevelSwitched { .. }
                | Event::TimeExpired { .. }
                | Event::BoardCleared { .. } => self.cancel(),
                _ => {}
            }
        }
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}
