//! Scripted player that turns round events into whacks.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use whack_core::{Command, Event, MoleId, SlotIndex};

/// Chance that the autopilot leaves a penalty mole alone.
const PENALTY_RESTRAINT: f64 = 0.9;

#[derive(Clone, Copy, Debug)]
struct PlannedWhack {
    due: Duration,
    mole: MoleId,
    slot: SlotIndex,
}

/// Reacts to spawned moles after a fixed reaction time with a given accuracy.
#[derive(Debug)]
pub(crate) struct Autopilot {
    reaction: Duration,
    accuracy: f64,
    rng: ChaCha8Rng,
    planned: Vec<PlannedWhack>,
}

impl Autopilot {
    /// Creates a player; `accuracy` is clamped to `[0, 1]`.
    pub(crate) fn new(reaction: Duration, accuracy: f64, seed: u64) -> Self {
        let accuracy = if accuracy.is_nan() {
            0.0
        } else {
            accuracy.clamp(0.0, 1.0)
        };
        Self {
            reaction,
            accuracy,
            rng: ChaCha8Rng::seed_from_u64(seed),
            planned: Vec::new(),
        }
    }

    /// Updates the plan from the events of the last frame and returns immediate commands.
    pub(crate) fn observe(&mut self, events: &[Event]) -> Vec<Command> {
        let mut commands = Vec::new();
        for event in events {
            match event {
                Event::MoleSpawned { mole } => {
                    if mole.kind.is_penalty() && self.rng.gen_bool(PENALTY_RESTRAINT) {
                        continue;
                    }
                    self.planned.push(PlannedWhack {
                        due: mole.spawned_at.saturating_add(self.reaction),
                        mole: mole.id,
                        slot: mole.slot,
                    });
                }
                Event::MoleRetreated { mole } => {
                    self.planned.retain(|planned| planned.mole != mole.id);
                }
                Event::LevelPassed { .. } => {
                    self.planned.clear();
                    commands.push(Command::DismissTransition);
                }
                Event::RoundEnded { .. } => self.planned.clear(),
                _ => {}
            }
        }
        commands
    }

    /// Issues every whack whose reaction time has elapsed by `now`.
    pub(crate) fn due_commands(&mut self, now: Duration) -> Vec<Command> {
        self.planned.sort_by_key(|planned| planned.due);
        let ready = self.planned.partition_point(|planned| planned.due <= now);
        let due: Vec<PlannedWhack> = self.planned.drain(..ready).collect();

        due.into_iter()
            .map(|planned| {
                let slot = if self.rng.gen_bool(self.accuracy) {
                    u32::try_from(planned.slot.get()).ok()
                } else {
                    None
                };
                Command::Whack { slot }
            })
            .collect()
    }
}
