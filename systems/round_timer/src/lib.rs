#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Countdown clock for a single level.
//!
//! The timer ticks through [`Task::TimerTick`] callbacks at a fixed interval,
//! publishes the remaining time rounded up to whole seconds, and reports
//! expiry exactly once per countdown.

use std::time::Duration;

use log::trace;
use serde::{Deserialize, Serialize};
use whack_core::{Event, Scheduler, Task, TaskToken};

const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Tick cadence and warning window of the countdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Milliseconds between countdown updates.
    pub tick_interval_ms: u64,
    /// Remaining seconds at or below which the countdown is in its warning window.
    pub warning_secs: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            warning_secs: 10,
        }
    }
}

impl TimerConfig {
    fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms).max(MIN_TICK_INTERVAL)
    }

    fn warning_threshold(&self) -> Duration {
        Duration::from_secs(self.warning_secs)
    }
}

/// Result of handling a fired [`Task::TimerTick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickStatus {
    /// The countdown advanced and keeps running.
    Running,
    /// The countdown reached zero with this tick.
    Expired,
    /// The tick did not belong to the current countdown and was ignored.
    Stale,
}

/// Single countdown clock, either stopped or running.
#[derive(Debug)]
pub struct RoundTimer {
    config: TimerConfig,
    remaining: Duration,
    tick: Option<TaskToken>,
}

impl RoundTimer {
    /// Creates a stopped timer.
    #[must_use]
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            remaining: Duration::ZERO,
            tick: None,
        }
    }

    /// Starts a countdown of `duration`, cancelling any countdown already running.
    pub fn start<S: Scheduler + ?Sized>(&mut self, duration: Duration, scheduler: &mut S) {
        self.cancel_tick(scheduler);
        self.remaining = duration;
        self.tick = Some(scheduler.schedule_after(self.config.tick_interval(), Task::TimerTick));
    }

    /// Halts the countdown without reporting expiry.
    pub fn stop<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.cancel_tick(scheduler);
    }

    /// Handles a fired [`Task::TimerTick`].
    ///
    /// Publishes [`Event::TimerTicked`] and, when the countdown runs out,
    /// [`Event::TimerExpired`] followed by a transition to stopped.
    pub fn on_tick<S: Scheduler + ?Sized>(
        &mut self,
        token: TaskToken,
        scheduler: &mut S,
        out: &mut Vec<Event>,
    ) -> TickStatus {
        if self.tick != Some(token) {
            trace!("ignoring stale timer tick {token:?}");
            return TickStatus::Stale;
        }
        self.tick = None;

        let interval = self.config.tick_interval();
        self.remaining = self.remaining.saturating_sub(interval);
        out.push(Event::TimerTicked {
            remaining_secs: self.remaining_secs(),
            warning: self.is_warning(),
        });

        if self.remaining.is_zero() {
            out.push(Event::TimerExpired);
            return TickStatus::Expired;
        }

        self.tick = Some(scheduler.schedule_after(interval, Task::TimerTick));
        TickStatus::Running
    }

    /// Reports whether a countdown is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.tick.is_some()
    }

    /// Exact time left on the countdown.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Time left rounded up to whole seconds.
    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        let millis = self.remaining.as_millis();
        u32::try_from(millis.div_ceil(1_000)).unwrap_or(u32::MAX)
    }

    /// Reports whether the countdown is inside its warning window.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.remaining <= self.config.warning_threshold()
    }

    fn cancel_tick<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(token) = self.tick.take() {
            let _ = scheduler.cancel(token);
        }
    }
}
