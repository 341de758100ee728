#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combo and scoring engine.
//!
//! Tracks the consecutive-hit streak, resolves the multiplier tier the streak
//! unlocks, signals combo milestones, and accumulates the round and level
//! score ledgers together with the statistics surfaced at round end.

use whack_core::{ComboMultiplier, HitOutcome, MoleKind, RoundStats};

/// Streak lengths that unlock each multiplier tier, highest first.
const MULTIPLIER_TIERS: [(u32, ComboMultiplier); 4] = [
    (8, ComboMultiplier::Triple),
    (5, ComboMultiplier::Double),
    (3, ComboMultiplier::OneAndHalf),
    (1, ComboMultiplier::Single),
];

/// Streak lengths that trigger a celebratory signal.
pub const COMBO_MILESTONES: [u32; 5] = [5, 10, 15, 20, 25];

/// Resolves the multiplier tier unlocked by a streak of `combo` hits.
#[must_use]
pub fn multiplier_for(combo: u32) -> ComboMultiplier {
    MULTIPLIER_TIERS
        .iter()
        .find(|(threshold, _)| combo >= *threshold)
        .map_or(ComboMultiplier::Single, |(_, multiplier)| *multiplier)
}

/// Stateful scoring engine owned by the round controller.
#[derive(Clone, Debug, Default)]
pub struct Scoring {
    combo: u32,
    round_total: u32,
    level_total: u32,
    stats: RoundStats,
}

impl Scoring {
    /// Creates an engine with empty ledgers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hit on a live mole of the provided category.
    ///
    /// Penalty hits break the streak and deduct their base value unscaled.
    /// Any other hit extends the streak first, so the hit that reaches a tier
    /// already benefits from it.
    pub fn record_hit(&mut self, kind: MoleKind) -> HitOutcome {
        self.stats.hits = self.stats.hits.saturating_add(1);
        self.stats.hits_by_kind.increment(kind);

        let outcome = if kind.is_penalty() {
            self.break_combo();
            HitOutcome {
                points: kind.base_points(),
                multiplier: ComboMultiplier::Single,
                combo: 0,
                milestone: None,
            }
        } else {
            self.combo = self.combo.saturating_add(1);
            self.stats.max_combo = self.stats.max_combo.max(self.combo);
            let multiplier = multiplier_for(self.combo);
            HitOutcome {
                points: multiplier.apply(kind.base_points()),
                multiplier,
                combo: self.combo,
                milestone: COMBO_MILESTONES
                    .contains(&self.combo)
                    .then_some(self.combo),
            }
        };

        self.credit(outcome.points);
        outcome
    }

    /// Registers a whack that found no live mole, returning the streak it broke.
    pub fn record_miss(&mut self) -> u32 {
        self.stats.misses = self.stats.misses.saturating_add(1);
        let broken = self.combo;
        if broken > 0 {
            self.break_combo();
        }
        broken
    }

    /// Clears the level ledger when a new level starts; the round total carries over.
    pub fn begin_level(&mut self) {
        self.level_total = 0;
    }

    /// Current consecutive-hit streak.
    #[must_use]
    pub fn combo(&self) -> u32 {
        self.combo
    }

    /// Multiplier tier the current streak has unlocked.
    #[must_use]
    pub fn multiplier(&self) -> ComboMultiplier {
        multiplier_for(self.combo)
    }

    /// Score accumulated over the whole round, never below zero.
    #[must_use]
    pub fn round_total(&self) -> u32 {
        self.round_total
    }

    /// Score accumulated within the current level, never below zero.
    #[must_use]
    pub fn level_total(&self) -> u32 {
        self.level_total
    }

    /// Statistics accumulated over the round.
    #[must_use]
    pub fn stats(&self) -> RoundStats {
        self.stats
    }

    fn break_combo(&mut self) {
        self.combo = 0;
    }

    fn credit(&mut self, points: i32) {
        self.round_total = floored_sum(self.round_total, points);
        self.level_total = floored_sum(self.level_total, points);
    }
}

fn floored_sum(total: u32, points: i32) -> u32 {
    let sum = i64::from(total) + i64::from(points);
    u32::try_from(sum.max(0)).unwrap_or(u32::MAX)
}
