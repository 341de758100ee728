#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Whack engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative round controller, and the pure systems it drives. Adapters
//! submit [`Command`] values describing player input and elapsed time, the
//! world executes those commands via its `apply` entry point, and then
//! broadcasts [`Event`] values for presentation layers to react to. Every
//! delayed callback is expressed as a [`Task`] held by a [`Scheduler`], so no
//! system ever captures shared state in a closure.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of holes laid out on the playing field.
pub const SLOT_COUNT: usize = 9;

/// Commands that express all permissible round mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Starts a fresh round at level one, tearing down any round in flight.
    StartRound,
    /// Advances the virtual clock by the provided delta time.
    Tick {
        /// Duration of time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Reports a pointer or tap on the field, already hit-tested by the caller.
    ///
    /// `None` and out-of-range indices both count as a miss.
    Whack {
        /// Raw index of the hole under the pointer, if any.
        slot: Option<u32>,
    },
    /// Skips the remaining delay of a level-transition overlay.
    DismissTransition,
    /// Freezes the running level without tearing it down.
    Pause,
    /// Continues a paused level.
    Resume,
    /// Abandons the current round and returns to the menu.
    ReturnToMenu,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the host clock advanced.
    TimeAdvanced {
        /// Duration that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a new round began.
    RoundStarted,
    /// Announces that the round entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: RoundPhase,
    },
    /// Announces that the player paused or resumed the level.
    PauseChanged {
        /// Whether the level is now paused.
        paused: bool,
    },
    /// Announces that a level started running with the provided parameters.
    LevelStarted {
        /// Level that started.
        level: Level,
        /// Difficulty parameters resolved for the level.
        config: LevelConfig,
    },
    /// Confirms that a mole popped out of a hole.
    MoleSpawned {
        /// State of the mole at the moment it appeared.
        mole: MoleSnapshot,
    },
    /// Confirms that a live mole was whacked.
    MoleWhacked {
        /// State of the mole after the hit was registered.
        mole: MoleSnapshot,
        /// Scoring result produced by the hit.
        outcome: HitOutcome,
    },
    /// Reports a whack that found no live mole.
    Missed {
        /// Combo streak that the miss broke, zero when no streak was running.
        broken_combo: u32,
    },
    /// Reports that a mole retreated without being hit.
    MoleRetreated {
        /// Final state of the mole, marked [`HitState::Retreated`].
        mole: MoleSnapshot,
    },
    /// Reports that a whacked mole finished its feedback grace period.
    MoleCleared {
        /// Identifier of the mole that was removed.
        mole: MoleId,
        /// Hole the mole vacated.
        slot: SlotIndex,
    },
    /// Periodic countdown update for heads-up displays.
    TimerTicked {
        /// Remaining time rounded up to whole seconds.
        remaining_secs: u32,
        /// Whether the countdown entered its warning window.
        warning: bool,
    },
    /// Reports that the level countdown reached zero.
    TimerExpired,
    /// Reports that the level threshold was met.
    LevelPassed {
        /// Level that was completed.
        level: Level,
        /// Score accrued within the level.
        level_score: u32,
        /// Score the level required.
        threshold: u32,
    },
    /// Reports that the round is over and surfaces its final results.
    RoundEnded {
        /// Final score and statistics of the round.
        summary: RoundSummary,
    },
}

/// Delayed callbacks owned by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Task {
    /// Attempts to pop a new mole out of an empty hole.
    SpawnAttempt,
    /// Retreats the identified mole if it is still live in the hole.
    Retreat {
        /// Hole the mole was spawned into.
        slot: SlotIndex,
        /// Mole the retreat belongs to.
        mole: MoleId,
    },
    /// Frees the hole of a whacked mole once its grace period elapsed.
    ClearHit {
        /// Hole the mole occupies.
        slot: SlotIndex,
        /// Mole that was whacked.
        mole: MoleId,
    },
    /// Advances the level countdown by one tick interval.
    TimerTick,
    /// Leaves the level-transition overlay and starts the next level.
    AdvanceLevel,
}

/// Handle to a scheduled [`Task`], usable for cancellation.
///
/// Tokens order by due time first and scheduling sequence second, which is
/// also the order in which due tasks fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskToken {
    due: Duration,
    sequence: u64,
}

impl TaskToken {
    /// Creates a token for a task due at the provided virtual time.
    #[must_use]
    pub const fn new(due: Duration, sequence: u64) -> Self {
        Self { due, sequence }
    }

    /// Virtual time at which the task falls due.
    #[must_use]
    pub const fn due(&self) -> Duration {
        self.due
    }

    /// Monotonic sequence number assigned when the task was scheduled.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Delayed-callback facility that systems schedule their work through.
pub trait Scheduler {
    /// Current virtual time.
    fn now(&self) -> Duration;

    /// Schedules `task` to fire once `delay` has elapsed.
    fn schedule_after(&mut self, delay: Duration, task: Task) -> TaskToken;

    /// Cancels a pending task, returning whether it was still pending.
    fn cancel(&mut self, token: TaskToken) -> bool;
}

/// Index of one of the nine holes on the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotIndex(u8);

impl SlotIndex {
    /// Validates a raw hole index, rejecting values outside the grid.
    #[must_use]
    pub fn new(raw: u32) -> Option<Self> {
        if (raw as usize) < SLOT_COUNT {
            u8::try_from(raw).ok().map(Self)
        } else {
            None
        }
    }

    /// Zero-based index of the hole.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0 as usize
    }

    /// Iterates over every hole in ascending order.
    pub fn all() -> impl Iterator<Item = SlotIndex> {
        (0..SLOT_COUNT as u8).map(SlotIndex)
    }
}

/// Unique identifier assigned to each spawned mole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MoleId(u64);

impl MoleId {
    /// Creates a new mole identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Categories of targets that may pop out of a hole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MoleKind {
    /// Most frequent target worth a modest reward.
    Common,
    /// Less frequent target worth double.
    Rare,
    /// Scarce high-value target.
    Golden,
    /// Target that must not be hit; hitting it costs points and the combo.
    Penalty,
}

impl MoleKind {
    /// Every category in table order.
    pub const ALL: [MoleKind; 4] = [
        MoleKind::Common,
        MoleKind::Rare,
        MoleKind::Golden,
        MoleKind::Penalty,
    ];

    /// Points awarded for hitting the category before any multiplier.
    #[must_use]
    pub const fn base_points(self) -> i32 {
        match self {
            Self::Common => 100,
            Self::Rare => 200,
            Self::Golden => 500,
            Self::Penalty => -200,
        }
    }

    /// Reports whether hitting the category is penalised.
    #[must_use]
    pub const fn is_penalty(self) -> bool {
        matches!(self, Self::Penalty)
    }
}

/// Lifecycle of a spawned mole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitState {
    /// Visible and hittable.
    Active,
    /// Whacked and lingering for feedback; no longer hittable.
    Hit,
    /// Gone without being hit.
    Retreated,
}

/// Immutable representation of a single mole used for events and queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MoleSnapshot {
    /// Identifier unique to this spawn.
    pub id: MoleId,
    /// Hole the mole occupies.
    pub slot: SlotIndex,
    /// Category drawn for the mole.
    pub kind: MoleKind,
    /// Virtual time at which the mole appeared.
    pub spawned_at: Duration,
    /// Lifetime after which an unhit mole retreats.
    pub active_duration: Duration,
    /// Current lifecycle state.
    pub state: HitState,
}

/// One-based level number, never below one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Level(u32);

impl Level {
    /// The level every round starts at.
    pub const FIRST: Level = Level(1);

    /// Creates a level, clamping values below one to one.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        if value == 0 {
            Self(1)
        } else {
            Self(value)
        }
    }

    /// Retrieves the numeric level.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the level that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Inclusive range of durations that random draws are taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DurationRange {
    min: Duration,
    max: Duration,
}

impl DurationRange {
    /// Creates a range, swapping the bounds if they arrive reversed.
    #[must_use]
    pub fn new(a: Duration, b: Duration) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Lower bound of the range.
    #[must_use]
    pub const fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound of the range.
    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }
}

/// Difficulty parameters of a single level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Level the parameters belong to.
    pub level: Level,
    /// Length of the level countdown.
    pub duration: Duration,
    /// Score the level must accrue to pass.
    pub score_threshold: u32,
    /// Delay between consecutive spawn attempts.
    pub spawn_interval: DurationRange,
    /// Lifetime of a mole that is not hit.
    pub active_duration: DurationRange,
    /// Upper bound on moles occupying holes at once.
    pub max_simultaneous: usize,
    /// Selection weight of the penalty category, overriding the base table.
    pub penalty_weight: u32,
}

/// Score multiplier tier unlocked by a combo streak.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComboMultiplier {
    /// 1.0x, no streak bonus.
    Single,
    /// 1.5x.
    OneAndHalf,
    /// 2.0x.
    Double,
    /// 3.0x.
    Triple,
}

impl ComboMultiplier {
    /// Numeric factor applied to base points.
    #[must_use]
    pub const fn factor(self) -> f64 {
        match self {
            Self::Single => 1.0,
            Self::OneAndHalf => 1.5,
            Self::Double => 2.0,
            Self::Triple => 3.0,
        }
    }

    /// Scales base points by the factor, rounding half away from zero.
    #[must_use]
    pub fn apply(self, base_points: i32) -> i32 {
        (f64::from(base_points) * self.factor()).round() as i32
    }
}

/// Result of registering a hit with the scoring engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HitOutcome {
    /// Points added to (or, for penalties, removed from) the score.
    pub points: i32,
    /// Multiplier tier used to compute `points`.
    pub multiplier: ComboMultiplier,
    /// Combo streak after the hit.
    pub combo: u32,
    /// Combo milestone reached by this hit, if any.
    pub milestone: Option<u32>,
}

/// Top-level state machine of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No round is running.
    Menu,
    /// A level is running: moles spawn and the countdown ticks.
    Playing,
    /// A level was passed and the summary overlay is showing.
    LevelTransition,
    /// The round ended after a failed level.
    RoundOver,
}

/// Hit counts per mole category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KindCounts {
    counts: [u32; 4],
}

impl KindCounts {
    /// Number of hits recorded for the category.
    #[must_use]
    pub const fn get(&self, kind: MoleKind) -> u32 {
        self.counts[kind as usize]
    }

    /// Records one more hit on the category.
    pub fn increment(&mut self, kind: MoleKind) {
        let slot = &mut self.counts[kind as usize];
        *slot = slot.saturating_add(1);
    }

    /// Iterates over every category together with its count.
    pub fn iter(&self) -> impl Iterator<Item = (MoleKind, u32)> + '_ {
        MoleKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

/// Auxiliary statistics gathered over a round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundStats {
    /// Live moles whacked, penalties included.
    pub hits: u32,
    /// Whacks that found no live mole.
    pub misses: u32,
    /// Hits broken down per category.
    pub hits_by_kind: KindCounts,
    /// Longest combo streak reached during the round.
    pub max_combo: u32,
}

impl RoundStats {
    /// Fraction of whacks that landed on a live mole, zero without whacks.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let attempts = u64::from(self.hits) + u64::from(self.misses);
        if attempts == 0 {
            return 0.0;
        }
        self.hits as f64 / attempts as f64
    }
}

/// Final results of a round handed to the persistence boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundSummary {
    /// Round score at the moment the round ended.
    pub final_score: u32,
    /// Highest level the round reached.
    pub level_reached: Level,
    /// Statistics accumulated over the round.
    pub stats: RoundStats,
}
