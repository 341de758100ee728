#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Mole spawning system that owns the nine holes of the field.
//!
//! The spawner drives a self-scheduling loop of spawn attempts through the
//! [`Scheduler`], keeps exactly one cancellation token per pending callback,
//! and checks the token or mole identity of every task that fires before
//! touching a hole. Deactivation cancels every token it holds, so no callback
//! from a finished level can reach the board afterwards.

mod selection;

use std::time::Duration;

use log::trace;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use whack_core::{
    DurationRange, Event, HitState, LevelConfig, MoleId, MoleSnapshot, Scheduler, SlotIndex, Task,
    TaskToken, SLOT_COUNT,
};

pub use selection::{KindTable, KindWeights};

const DEFAULT_HIT_GRACE: Duration = Duration::from_millis(400);
const DEFAULT_FIRST_SPAWN_MIN: Duration = Duration::from_millis(300);
const DEFAULT_FIRST_SPAWN_MAX: Duration = Duration::from_millis(800);

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
    weights: KindWeights,
    hit_grace: Duration,
    first_spawn_delay: DurationRange,
}

impl Config {
    /// Creates a configuration with the reference weights and timings.
    #[must_use]
    pub fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            weights: KindWeights::default(),
            hit_grace: DEFAULT_HIT_GRACE,
            first_spawn_delay: DurationRange::new(DEFAULT_FIRST_SPAWN_MIN, DEFAULT_FIRST_SPAWN_MAX),
        }
    }

    /// Replaces the base category weights; each level still overrides the penalty weight.
    #[must_use]
    pub fn with_weights(mut self, weights: KindWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Sets how long a whacked mole lingers before its hole frees up.
    #[must_use]
    pub fn with_hit_grace(mut self, hit_grace: Duration) -> Self {
        self.hit_grace = hit_grace;
        self
    }

    /// Sets the range the delay before the first spawn of a level is drawn from.
    #[must_use]
    pub fn with_first_spawn_delay(mut self, first_spawn_delay: DurationRange) -> Self {
        self.first_spawn_delay = first_spawn_delay;
        self
    }
}

/// Spawning system owning the moles that currently occupy holes.
#[derive(Debug)]
pub struct Spawner {
    config: Config,
    rng: ChaCha8Rng,
    next_id: u64,
    holes: [Option<Occupant>; SLOT_COUNT],
    level: Option<ActiveLevel>,
    spawn_token: Option<TaskToken>,
}

impl Spawner {
    /// Creates an inactive spawner using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            next_id: 0,
            holes: [None; SLOT_COUNT],
            level: None,
            spawn_token: None,
        }
    }

    /// Starts spawning with the parameters of `level`.
    ///
    /// A spawner that is already active is torn down first, so its pending
    /// callbacks never mix with the new level's.
    pub fn activate<S: Scheduler + ?Sized>(&mut self, level: &LevelConfig, scheduler: &mut S) {
        self.deactivate(scheduler);
        self.level = Some(ActiveLevel {
            spawn_interval: level.spawn_interval,
            active_duration: level.active_duration,
            max_simultaneous: level.max_simultaneous,
            kinds: KindTable::new(self.config.weights.with_penalty(level.penalty_weight)),
        });

        let delay = draw_duration(&mut self.rng, self.config.first_spawn_delay);
        self.spawn_token = Some(scheduler.schedule_after(delay, Task::SpawnAttempt));
    }

    /// Stops spawning, cancels every pending callback, and empties all holes.
    pub fn deactivate<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(token) = self.spawn_token.take() {
            let _ = scheduler.cancel(token);
        }
        for hole in &mut self.holes {
            if let Some(occupant) = hole.take() {
                if let Some(token) = occupant.pending {
                    let _ = scheduler.cancel(token);
                }
            }
        }
        self.level = None;
    }

    /// Reports whether the spawner is running a level.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.level.is_some()
    }

    /// Handles a fired [`Task::SpawnAttempt`], ignoring tokens that are no longer current.
    pub fn on_spawn_attempt<S: Scheduler + ?Sized>(
        &mut self,
        token: TaskToken,
        scheduler: &mut S,
        out: &mut Vec<Event>,
    ) {
        if self.spawn_token != Some(token) {
            trace!("ignoring stale spawn attempt {token:?}");
            return;
        }
        self.spawn_token = None;
        let _ = self.spawn(scheduler, out);
    }

    /// Attempts to pop a mole into a random empty hole, then schedules the next attempt.
    ///
    /// The attempt is a no-op when the level's cap is reached or every hole is
    /// taken; the next attempt is scheduled either way.
    pub fn spawn<S: Scheduler + ?Sized>(
        &mut self,
        scheduler: &mut S,
        out: &mut Vec<Event>,
    ) -> Option<MoleSnapshot> {
        let spawned = self.try_spawn(scheduler, out);
        self.schedule_next_attempt(scheduler);
        spawned
    }

    /// Whacks the hole, returning the mole if one was live there.
    ///
    /// The mole stays in its hole, marked [`HitState::Hit`], until the grace
    /// period elapses and [`Task::ClearHit`] fires.
    pub fn hit<S: Scheduler + ?Sized>(
        &mut self,
        slot: SlotIndex,
        scheduler: &mut S,
    ) -> Option<MoleSnapshot> {
        let occupant = self.holes[slot.get()].as_mut()?;
        if occupant.mole.state != HitState::Active {
            return None;
        }

        if let Some(token) = occupant.pending.take() {
            let _ = scheduler.cancel(token);
        }
        occupant.mole.state = HitState::Hit;
        let clear = Task::ClearHit {
            slot,
            mole: occupant.mole.id,
        };
        occupant.pending = Some(scheduler.schedule_after(self.config.hit_grace, clear));
        Some(occupant.mole)
    }

    /// Handles a fired [`Task::Retreat`]; only the mole it was scheduled for may retreat.
    pub fn retreat(&mut self, slot: SlotIndex, mole: MoleId, out: &mut Vec<Event>) {
        let Some(occupant) = self.take_matching(slot, mole, HitState::Active) else {
            trace!("ignoring stale retreat of mole {} in hole {}", mole.get(), slot.get());
            return;
        };
        let mut retreated = occupant.mole;
        retreated.state = HitState::Retreated;
        out.push(Event::MoleRetreated { mole: retreated });
    }

    /// Handles a fired [`Task::ClearHit`]; only the whacked mole it belongs to is removed.
    pub fn clear_hit(&mut self, slot: SlotIndex, mole: MoleId, out: &mut Vec<Event>) {
        if self.take_matching(slot, mole, HitState::Hit).is_none() {
            trace!("ignoring stale clear of mole {} in hole {}", mole.get(), slot.get());
            return;
        }
        out.push(Event::MoleCleared { mole, slot });
    }

    /// Returns the mole occupying `slot`, whether live or lingering after a hit.
    #[must_use]
    pub fn occupant(&self, slot: SlotIndex) -> Option<&MoleSnapshot> {
        self.holes[slot.get()].as_ref().map(|occupant| &occupant.mole)
    }

    /// Iterates over every mole currently occupying a hole in hole order.
    pub fn moles(&self) -> impl Iterator<Item = &MoleSnapshot> {
        self.holes.iter().flatten().map(|occupant| &occupant.mole)
    }

    /// Number of holes currently occupied.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.holes.iter().flatten().count()
    }

    fn take_matching(&mut self, slot: SlotIndex, mole: MoleId, state: HitState) -> Option<Occupant> {
        let hole = &mut self.holes[slot.get()];
        let matches = hole
            .as_ref()
            .map_or(false, |occupant| occupant.mole.id == mole && occupant.mole.state == state);
        if matches {
            hole.take()
        } else {
            None
        }
    }

    fn try_spawn<S: Scheduler + ?Sized>(
        &mut self,
        scheduler: &mut S,
        out: &mut Vec<Event>,
    ) -> Option<MoleSnapshot> {
        let level = self.level.as_ref()?;
        let occupied = self.holes.iter().flatten().count();
        if occupied >= level.max_simultaneous {
            trace!("spawn skipped: {occupied} moles already out");
            return None;
        }

        let empty: Vec<SlotIndex> = SlotIndex::all()
            .filter(|slot| self.holes[slot.get()].is_none())
            .collect();
        let slot = *empty.choose(&mut self.rng)?;
        let kind = level.kinds.draw(&mut self.rng);
        let active_duration = draw_duration(&mut self.rng, level.active_duration);

        let id = MoleId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let mole = MoleSnapshot {
            id,
            slot,
            kind,
            spawned_at: scheduler.now(),
            active_duration,
            state: HitState::Active,
        };
        let retreat = scheduler.schedule_after(active_duration, Task::Retreat { slot, mole: id });
        self.holes[slot.get()] = Some(Occupant {
            mole,
            pending: Some(retreat),
        });

        trace!("spawned {kind:?} mole {} in hole {}", id.get(), slot.get());
        out.push(Event::MoleSpawned { mole });
        Some(mole)
    }

    fn schedule_next_attempt<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        let Some(level) = self.level.as_ref() else {
            return;
        };
        let delay = draw_duration(&mut self.rng, level.spawn_interval);
        if let Some(previous) = self.spawn_token.take() {
            let _ = scheduler.cancel(previous);
        }
        self.spawn_token = Some(scheduler.schedule_after(delay, Task::SpawnAttempt));
    }
}

/// Parameters of the level currently being spawned for.
#[derive(Clone, Debug)]
struct ActiveLevel {
    spawn_interval: DurationRange,
    active_duration: DurationRange,
    max_simultaneous: usize,
    kinds: KindTable,
}

/// Mole in a hole plus the token of its pending retreat or clear.
#[derive(Clone, Copy, Debug)]
struct Occupant {
    mole: MoleSnapshot,
    pending: Option<TaskToken>,
}

fn draw_duration<R: Rng + ?Sized>(rng: &mut R, range: DurationRange) -> Duration {
    let min = millis(range.min());
    let max = millis(range.max());
    Duration::from_millis(rng.gen_range(min..=max))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
