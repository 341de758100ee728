//! Weighted draw over mole categories.

use log::warn;
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};
use serde::{Deserialize, Serialize};
use whack_core::MoleKind;

/// Integer selection weight per mole category; probability is proportional to weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindWeights {
    /// Weight of [`MoleKind::Common`].
    pub common: u32,
    /// Weight of [`MoleKind::Rare`].
    pub rare: u32,
    /// Weight of [`MoleKind::Golden`].
    pub golden: u32,
    /// Weight of [`MoleKind::Penalty`].
    pub penalty: u32,
}

impl Default for KindWeights {
    fn default() -> Self {
        Self {
            common: 44,
            rare: 26,
            golden: 18,
            penalty: 12,
        }
    }
}

impl KindWeights {
    /// Weight assigned to `kind`.
    #[must_use]
    pub const fn weight(&self, kind: MoleKind) -> u32 {
        match kind {
            MoleKind::Common => self.common,
            MoleKind::Rare => self.rare,
            MoleKind::Golden => self.golden,
            MoleKind::Penalty => self.penalty,
        }
    }

    /// Returns a copy of the table with the penalty weight replaced.
    #[must_use]
    pub const fn with_penalty(self, penalty: u32) -> Self {
        Self { penalty, ..self }
    }
}

/// Cumulative distribution built from a [`KindWeights`] table.
#[derive(Clone, Debug)]
pub struct KindTable {
    index: Option<WeightedIndex<u32>>,
}

impl KindTable {
    /// Builds the distribution; a table without any positive weight always draws `Common`.
    #[must_use]
    pub fn new(weights: KindWeights) -> Self {
        let index = WeightedIndex::new(MoleKind::ALL.map(|kind| weights.weight(kind)));
        if let Err(error) = &index {
            warn!("unusable mole weights {weights:?} ({error}); every spawn will be common");
        }
        Self { index: index.ok() }
    }

    /// Draws a category with probability proportional to its weight.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> MoleKind {
        match &self.index {
            Some(index) => MoleKind::ALL[index.sample(rng)],
            None => MoleKind::Common,
        }
    }
}
