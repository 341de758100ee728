#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative round state for the whack-a-mole game.
//!
//! The world owns the virtual clock and every system. Adapters mutate it only
//! through [`apply`] and observe it through the [`query`] module and the
//! events each command produces.

use std::time::Duration;

use log::{debug, trace};
use whack_core::{
    Command, Event, Level, LevelConfig, RoundPhase, RoundSummary, SlotIndex, Task, TaskToken,
};
use whack_scheduler::{DueTask, TaskQueue};
use whack_system_round_timer::{RoundTimer, TickStatus};
use whack_system_scoring::Scoring;
use whack_system_spawning::Spawner;

pub use whack_system_level_config::LevelTuning;
pub use whack_system_round_timer::TimerConfig;
pub use whack_system_spawning::{Config as SpawnerConfig, KindWeights};

const DEFAULT_SEED: u64 = 0x5eed_0f_3a11;
const DEFAULT_TRANSITION_DELAY: Duration = Duration::from_millis(3_000);

/// Every knob that shapes a round.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Difficulty curve used to resolve each level.
    pub tuning: LevelTuning,
    /// Seed, category weights and timings of the mole spawner.
    pub spawner: SpawnerConfig,
    /// Cadence and warning window of the level countdown.
    pub timer: TimerConfig,
    /// Time the pass overlay stays up before the next level starts.
    pub transition_delay: Duration,
}

impl WorldConfig {
    /// Creates the reference configuration with the provided spawner seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            tuning: LevelTuning::default(),
            spawner: SpawnerConfig::new(seed),
            timer: TimerConfig::default(),
            transition_delay: DEFAULT_TRANSITION_DELAY,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

/// Represents the authoritative round state.
#[derive(Debug)]
pub struct World {
    tuning: LevelTuning,
    transition_delay: Duration,
    queue: TaskQueue<Task>,
    spawner: Spawner,
    timer: RoundTimer,
    scoring: Scoring,
    phase: RoundPhase,
    level: Level,
    level_config: Option<LevelConfig>,
    paused: bool,
    transition: Option<TaskToken>,
}

impl World {
    /// Creates a world waiting in the menu.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            tuning: config.tuning,
            transition_delay: config.transition_delay,
            queue: TaskQueue::new(),
            spawner: Spawner::new(config.spawner),
            timer: RoundTimer::new(config.timer),
            scoring: Scoring::new(),
            phase: RoundPhase::Menu,
            level: Level::FIRST,
            level_config: None,
            paused: false,
            transition: None,
        }
    }

    fn start_round(&mut self, out_events: &mut Vec<Event>) {
        self.teardown();
        self.scoring = Scoring::new();
        self.level = Level::FIRST;
        debug!("round started");
        out_events.push(Event::RoundStarted);
        self.enter_level(out_events);
    }

    fn enter_level(&mut self, out_events: &mut Vec<Event>) {
        let config = self.tuning.config_for(self.level.get());
        self.scoring.begin_level();
        self.timer.start(config.duration, &mut self.queue);
        self.spawner.activate(&config, &mut self.queue);
        self.level_config = Some(config);
        self.set_phase(RoundPhase::Playing, out_events);

        debug!(
            "level {} started: threshold {}, {} moles at most",
            self.level.get(),
            config.score_threshold,
            config.max_simultaneous
        );
        out_events.push(Event::LevelStarted {
            level: self.level,
            config,
        });
    }

    fn advance_level(&mut self, out_events: &mut Vec<Event>) {
        self.transition = None;
        self.level = self.level.next();
        self.enter_level(out_events);
    }

    fn finish_level(&mut self, out_events: &mut Vec<Event>) {
        let Some(config) = self.level_config else {
            return;
        };
        self.spawner.deactivate(&mut self.queue);

        let level_score = self.scoring.level_total();
        if level_score >= config.score_threshold {
            debug!(
                "level {} passed with {level_score}/{}",
                self.level.get(),
                config.score_threshold
            );
            out_events.push(Event::LevelPassed {
                level: self.level,
                level_score,
                threshold: config.score_threshold,
            });
            self.set_phase(RoundPhase::LevelTransition, out_events);
            self.transition = Some(
                self.queue
                    .push_after(self.transition_delay, Task::AdvanceLevel),
            );
        } else {
            let summary = self.summary();
            debug!(
                "round over at level {} with {} points",
                summary.level_reached.get(),
                summary.final_score
            );
            self.set_phase(RoundPhase::RoundOver, out_events);
            out_events.push(Event::RoundEnded { summary });
        }
    }

    fn whack(&mut self, slot: Option<u32>, out_events: &mut Vec<Event>) {
        if self.phase != RoundPhase::Playing || self.paused {
            trace!("ignoring whack outside of play");
            return;
        }

        let hit = slot
            .and_then(SlotIndex::new)
            .and_then(|slot| self.spawner.hit(slot, &mut self.queue));
        match hit {
            Some(mole) => {
                let outcome = self.scoring.record_hit(mole.kind);
                out_events.push(Event::MoleWhacked { mole, outcome });
            }
            None => {
                let broken_combo = self.scoring.record_miss();
                out_events.push(Event::Missed { broken_combo });
            }
        }
    }

    fn advance_clock(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.paused {
            return;
        }
        let deadline = self.queue.now().saturating_add(dt);
        while let Some(due) = self.queue.pop_due(deadline) {
            self.dispatch(due, out_events);
        }
        self.queue.advance_to(deadline);
    }

    fn dispatch(&mut self, due: DueTask<Task>, out_events: &mut Vec<Event>) {
        let DueTask { token, task } = due;
        match task {
            Task::SpawnAttempt => {
                self.spawner
                    .on_spawn_attempt(token, &mut self.queue, out_events);
            }
            Task::Retreat { slot, mole } => self.spawner.retreat(slot, mole, out_events),
            Task::ClearHit { slot, mole } => self.spawner.clear_hit(slot, mole, out_events),
            Task::TimerTick => {
                if self.timer.on_tick(token, &mut self.queue, out_events) == TickStatus::Expired {
                    self.finish_level(out_events);
                }
            }
            Task::AdvanceLevel => {
                if self.transition == Some(token) {
                    self.advance_level(out_events);
                } else {
                    trace!("ignoring stale level advance {token:?}");
                }
            }
        }
    }

    fn dismiss_transition(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != RoundPhase::LevelTransition {
            return;
        }
        if let Some(token) = self.transition.take() {
            let _ = self.queue.remove(token);
        }
        self.advance_level(out_events);
    }

    fn set_paused(&mut self, paused: bool, out_events: &mut Vec<Event>) {
        if self.paused == paused || (paused && self.phase != RoundPhase::Playing) {
            return;
        }
        debug!("paused: {paused}");
        self.paused = paused;
        out_events.push(Event::PauseChanged { paused });
    }

    fn return_to_menu(&mut self, out_events: &mut Vec<Event>) {
        self.teardown();
        self.level_config = None;
        self.set_phase(RoundPhase::Menu, out_events);
    }

    fn teardown(&mut self) {
        self.spawner.deactivate(&mut self.queue);
        self.timer.stop(&mut self.queue);
        if let Some(token) = self.transition.take() {
            let _ = self.queue.remove(token);
        }
        self.paused = false;
    }

    fn set_phase(&mut self, phase: RoundPhase, out_events: &mut Vec<Event>) {
        if self.phase == phase {
            return;
        }
        debug!("phase {:?} -> {phase:?}", self.phase);
        self.phase = phase;
        out_events.push(Event::PhaseChanged { phase });
    }

    fn summary(&self) -> RoundSummary {
        RoundSummary {
            final_score: self.scoring.round_total(),
            level_reached: self.level,
            stats: self.scoring.stats(),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartRound => world.start_round(out_events),
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            world.advance_clock(dt, out_events);
        }
        Command::Whack { slot } => world.whack(slot, out_events),
        Command::DismissTransition => world.dismiss_transition(out_events),
        Command::Pause => world.set_paused(true, out_events),
        Command::Resume => world.set_paused(false, out_events),
        Command::ReturnToMenu => world.return_to_menu(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use whack_core::{
        ComboMultiplier, Level, LevelConfig, MoleSnapshot, RoundPhase, RoundStats, RoundSummary,
        SlotIndex,
    };

    /// Phase the round is currently in.
    #[must_use]
    pub fn phase(world: &World) -> RoundPhase {
        world.phase
    }

    /// Level being played, or the last one played once the round ended.
    #[must_use]
    pub fn level(world: &World) -> Level {
        world.level
    }

    /// Parameters of the current level, absent while in the menu.
    #[must_use]
    pub fn level_config(world: &World) -> Option<LevelConfig> {
        world.level_config
    }

    /// Cumulative score of the round.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.scoring.round_total()
    }

    /// Score accrued within the current level.
    #[must_use]
    pub fn level_score(world: &World) -> u32 {
        world.scoring.level_total()
    }

    /// Current streak of consecutive hits.
    #[must_use]
    pub fn combo(world: &World) -> u32 {
        world.scoring.combo()
    }

    /// Multiplier tier unlocked by the current streak.
    #[must_use]
    pub fn multiplier(world: &World) -> ComboMultiplier {
        world.scoring.multiplier()
    }

    /// Hit and miss statistics accumulated during the round.
    #[must_use]
    pub fn stats(world: &World) -> RoundStats {
        world.scoring.stats()
    }

    /// Results the round would report if it ended now.
    #[must_use]
    pub fn summary(world: &World) -> RoundSummary {
        world.summary()
    }

    /// Moles currently occupying holes, in hole order.
    pub fn moles(world: &World) -> impl Iterator<Item = &MoleSnapshot> {
        world.spawner.moles()
    }

    /// Mole occupying the provided hole, if any.
    #[must_use]
    pub fn occupant(world: &World, slot: SlotIndex) -> Option<&MoleSnapshot> {
        world.spawner.occupant(slot)
    }

    /// Level countdown rounded up to whole seconds.
    #[must_use]
    pub fn remaining_secs(world: &World) -> u32 {
        world.timer.remaining_secs()
    }

    /// Whether the countdown is inside its warning window.
    #[must_use]
    pub fn is_warning(world: &World) -> bool {
        world.timer.is_warning()
    }

    /// Whether the round is paused.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.paused
    }

    /// Whether spawning and the countdown are currently running.
    #[must_use]
    pub fn is_active(world: &World) -> bool {
        world.phase == RoundPhase::Playing && !world.paused
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.queue.now()
    }

    /// Number of delayed callbacks waiting to fire.
    #[must_use]
    pub fn pending_tasks(world: &World) -> usize {
        world.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whack_core::RoundStats;

    fn started() -> (World, Vec<Event>) {
        let mut world = World::default();
        let mut events = Vec::new();
        apply(&mut world, Command::StartRound, &mut events);
        (world, events)
    }

    #[test]
    fn new_world_waits_in_menu() {
        let world = World::default();
        assert_eq!(query::phase(&world), RoundPhase::Menu);
        assert_eq!(query::pending_tasks(&world), 0);
        assert!(query::level_config(&world).is_none());
        assert!(!query::is_active(&world));
    }

    #[test]
    fn start_round_enters_level_one() {
        let (world, events) = started();
        let config = query::level_config(&world).expect("level one is configured");

        assert_eq!(
            events,
            vec![
                Event::RoundStarted,
                Event::PhaseChanged {
                    phase: RoundPhase::Playing,
                },
                Event::LevelStarted {
                    level: Level::FIRST,
                    config,
                },
            ]
        );
        assert_eq!(config.score_threshold, 500);
        assert_eq!(query::remaining_secs(&world), 30);
        assert!(query::is_active(&world));
        assert_eq!(query::pending_tasks(&world), 2);
    }

    #[test]
    fn whack_in_menu_is_ignored() {
        let mut world = World::default();
        let mut events = Vec::new();
        apply(&mut world, Command::Whack { slot: Some(0) }, &mut events);
        assert!(events.is_empty());
        assert_eq!(query::stats(&world).misses, 0);
    }

    #[test]
    fn empty_hole_counts_as_miss() {
        let (mut world, _) = started();
        let mut events = Vec::new();
        apply(&mut world, Command::Whack { slot: Some(4) }, &mut events);
        assert_eq!(events, vec![Event::Missed { broken_combo: 0 }]);
    }

    #[test]
    fn restart_discards_the_running_round() {
        let (mut world, _) = started();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(5),
            },
            &mut events,
        );
        let whacked = SlotIndex::all().find(|slot| query::occupant(&world, *slot).is_some());
        if let Some(slot) = whacked {
            let raw = u32::try_from(slot.get()).expect("slot index fits in u32");
            apply(&mut world, Command::Whack { slot: Some(raw) }, &mut events);
        }

        events.clear();
        apply(&mut world, Command::StartRound, &mut events);
        assert_eq!(query::score(&world), 0);
        assert_eq!(query::stats(&world), RoundStats::default());
        assert_eq!(query::moles(&world).count(), 0);
        assert_eq!(query::pending_tasks(&world), 2);
        assert_eq!(events.first(), Some(&Event::RoundStarted));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::PhaseChanged { .. })));
    }

    #[test]
    fn return_to_menu_cancels_everything() {
        let (mut world, _) = started();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(2),
            },
            &mut events,
        );

        events.clear();
        apply(&mut world, Command::ReturnToMenu, &mut events);
        assert_eq!(
            events,
            vec![Event::PhaseChanged {
                phase: RoundPhase::Menu,
            }]
        );
        assert_eq!(query::pending_tasks(&world), 0);
        assert_eq!(query::moles(&world).count(), 0);
    }
}
