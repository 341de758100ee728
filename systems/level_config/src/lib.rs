#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure resolver mapping a level number onto its difficulty parameters.
//!
//! Every parameter is a deterministic function of the level: the score
//! threshold ramps exponentially, spawn cadence and mole lifetimes shrink
//! linearly down to a floor, and the number of moles allowed on the field at
//! once grows in steps up to a cap.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use whack_core::{DurationRange, Level, LevelConfig, SLOT_COUNT};

/// Shortest delay any ramp may resolve to, so spawns and lifetimes never become instant.
const MIN_DELAY: Duration = Duration::from_millis(1);

/// Resolves the difficulty parameters of `level` using the default tuning.
#[must_use]
pub fn config_for(level: u32) -> LevelConfig {
    LevelTuning::default().config_for(level)
}

/// Designer-facing knobs that shape the difficulty curve.
///
/// Deserialization merges onto [`LevelTuning::default`]: any omitted knob,
/// including a single field of a ramp table, keeps its reference value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "TuningOverrides")]
pub struct LevelTuning {
    /// Length of every level countdown in seconds.
    pub duration_secs: u64,
    /// Threshold of level one; values at or below zero are raised to one.
    pub base_threshold: i64,
    /// Per-level threshold growth; values below one are treated as one.
    pub threshold_growth: f64,
    /// Lower bound of the delay between spawn attempts.
    pub spawn_interval_min: LinearRamp,
    /// Upper bound of the delay between spawn attempts.
    pub spawn_interval_max: LinearRamp,
    /// Lower bound of a mole's lifetime.
    pub active_duration_min: LinearRamp,
    /// Upper bound of a mole's lifetime.
    pub active_duration_max: LinearRamp,
    /// Step schedule for the number of simultaneous moles.
    pub max_simultaneous: StepRamp,
    /// Selection weight of penalty moles at every level.
    pub penalty_weight: u32,
}

impl Default for LevelTuning {
    fn default() -> Self {
        Self {
            duration_secs: 30,
            base_threshold: 500,
            threshold_growth: 1.3,
            spawn_interval_min: LinearRamp::new(600, 30, 250),
            spawn_interval_max: LinearRamp::new(1_200, 50, 450),
            active_duration_min: LinearRamp::new(800, 30, 400),
            active_duration_max: LinearRamp::new(1_500, 50, 600),
            max_simultaneous: StepRamp::new(3, 3, 7),
            penalty_weight: 12,
        }
    }
}

impl LevelTuning {
    /// Resolves the parameters of `level`, treating zero as level one.
    #[must_use]
    pub fn config_for(&self, level: u32) -> LevelConfig {
        let level = Level::new(level);
        let steps = level.get() - 1;

        LevelConfig {
            level,
            duration: Duration::from_secs(self.duration_secs.max(1)),
            score_threshold: self.threshold_at(steps),
            spawn_interval: DurationRange::new(
                self.spawn_interval_min.at(steps),
                self.spawn_interval_max.at(steps),
            ),
            active_duration: DurationRange::new(
                self.active_duration_min.at(steps),
                self.active_duration_max.at(steps),
            ),
            max_simultaneous: self.max_simultaneous.at(steps),
            penalty_weight: self.penalty_weight,
        }
    }

    fn threshold_at(&self, steps: u32) -> u32 {
        let base = self.base_threshold.max(1) as f64;
        let growth = if self.threshold_growth.is_finite() {
            self.threshold_growth.max(1.0)
        } else {
            1.0
        };
        let exponent = i32::try_from(steps).unwrap_or(i32::MAX);
        let scaled = (base * growth.powi(exponent)).round();
        // Float-to-int casts saturate, so runaway growth pins at u32::MAX.
        (scaled as u32).max(1)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TuningOverrides {
    duration_secs: Option<u64>,
    base_threshold: Option<i64>,
    threshold_growth: Option<f64>,
    spawn_interval_min: LinearOverrides,
    spawn_interval_max: LinearOverrides,
    active_duration_min: LinearOverrides,
    active_duration_max: LinearOverrides,
    max_simultaneous: StepOverrides,
    penalty_weight: Option<u32>,
}

impl From<TuningOverrides> for LevelTuning {
    fn from(overrides: TuningOverrides) -> Self {
        let base = Self::default();
        Self {
            duration_secs: overrides.duration_secs.unwrap_or(base.duration_secs),
            base_threshold: overrides.base_threshold.unwrap_or(base.base_threshold),
            threshold_growth: overrides.threshold_growth.unwrap_or(base.threshold_growth),
            spawn_interval_min: overrides.spawn_interval_min.onto(base.spawn_interval_min),
            spawn_interval_max: overrides.spawn_interval_max.onto(base.spawn_interval_max),
            active_duration_min: overrides.active_duration_min.onto(base.active_duration_min),
            active_duration_max: overrides.active_duration_max.onto(base.active_duration_max),
            max_simultaneous: overrides.max_simultaneous.onto(base.max_simultaneous),
            penalty_weight: overrides.penalty_weight.unwrap_or(base.penalty_weight),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LinearOverrides {
    start_ms: Option<u64>,
    step_ms: Option<u64>,
    floor_ms: Option<u64>,
}

impl LinearOverrides {
    fn onto(self, base: LinearRamp) -> LinearRamp {
        LinearRamp {
            start_ms: self.start_ms.unwrap_or(base.start_ms),
            step_ms: self.step_ms.unwrap_or(base.step_ms),
            floor_ms: self.floor_ms.unwrap_or(base.floor_ms),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StepOverrides {
    base: Option<u32>,
    every_levels: Option<u32>,
    cap: Option<u32>,
}

impl StepOverrides {
    fn onto(self, base: StepRamp) -> StepRamp {
        StepRamp {
            base: self.base.unwrap_or(base.base),
            every_levels: self.every_levels.unwrap_or(base.every_levels),
            cap: self.cap.unwrap_or(base.cap),
        }
    }
}

/// Millisecond value that shrinks by a fixed step per level down to a floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearRamp {
    /// Value at level one.
    pub start_ms: u64,
    /// Reduction applied for each level above one.
    pub step_ms: u64,
    /// Smallest value the ramp may reach.
    pub floor_ms: u64,
}

impl LinearRamp {
    /// Creates a ramp from its start value, per-level step, and floor.
    #[must_use]
    pub const fn new(start_ms: u64, step_ms: u64, floor_ms: u64) -> Self {
        Self {
            start_ms,
            step_ms,
            floor_ms,
        }
    }

    fn at(&self, steps: u32) -> Duration {
        let reduction = self.step_ms.saturating_mul(u64::from(steps));
        let millis = self.start_ms.saturating_sub(reduction).max(self.floor_ms);
        Duration::from_millis(millis).max(MIN_DELAY)
    }
}

/// Count that grows by one every few levels up to a cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRamp {
    /// Count at level one.
    pub base: u32,
    /// Number of levels between increments.
    pub every_levels: u32,
    /// Largest count the ramp may reach.
    pub cap: u32,
}

impl StepRamp {
    /// Creates a step ramp from its base count, increment period, and cap.
    #[must_use]
    pub const fn new(base: u32, every_levels: u32, cap: u32) -> Self {
        Self {
            base,
            every_levels,
            cap,
        }
    }

    fn at(&self, steps: u32) -> usize {
        let increments = steps / self.every_levels.max(1);
        let count = self.base.saturating_add(increments).min(self.cap);
        (count as usize).clamp(1, SLOT_COUNT)
    }
}
