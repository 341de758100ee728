//! Personal-best records persisted between runs.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use whack_core::RoundSummary;

/// Errors raised while reading or writing the personal-bests file.
#[derive(Debug, Error)]
pub(crate) enum BestsError {
    /// The file exists but could not be read.
    #[error("failed to read personal bests from {path}")]
    Read {
        /// Location that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file did not contain valid records.
    #[error("failed to parse personal bests in {path}")]
    Parse {
        /// Location that was parsed.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: toml::de::Error,
    },
    /// The records could not be encoded.
    #[error("failed to encode personal bests")]
    Encode(#[from] toml::ser::Error),
    /// The file could not be written.
    #[error("failed to write personal bests to {path}")]
    Write {
        /// Location that was written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Best results across every recorded round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PersonalBests {
    /// Highest final score.
    pub(crate) best_score: u32,
    /// Highest hit accuracy in `[0, 1]`.
    pub(crate) best_accuracy: f64,
    /// Longest combo streak.
    pub(crate) max_combo: u32,
    /// Highest level reached.
    pub(crate) highest_level: u32,
    /// Number of rounds recorded.
    pub(crate) rounds_played: u32,
}

impl PersonalBests {
    /// Folds a finished round into the records.
    ///
    /// Returns whether the round beat the best score recorded before it.
    pub(crate) fn record(&mut self, summary: &RoundSummary) -> bool {
        let new_high_score = summary.final_score > self.best_score;
        self.best_score = self.best_score.max(summary.final_score);
        self.best_accuracy = self.best_accuracy.max(summary.stats.accuracy());
        self.max_combo = self.max_combo.max(summary.stats.max_combo);
        self.highest_level = self.highest_level.max(summary.level_reached.get());
        self.rounds_played = self.rounds_played.saturating_add(1);
        new_high_score
    }
}

/// TOML file holding [`PersonalBests`].
#[derive(Clone, Debug)]
pub(crate) struct BestsStore {
    path: PathBuf,
}

impl BestsStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored records; a missing file yields empty records.
    pub(crate) fn load(&self) -> Result<PersonalBests, BestsError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(PersonalBests::default())
            }
            Err(source) => {
                return Err(BestsError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        toml::from_str(&text).map_err(|source| BestsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub(crate) fn save(&self, bests: &PersonalBests) -> Result<(), BestsError> {
        let text = toml::to_string(bests)?;
        fs::write(&self.path, text).map_err(|source| BestsError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
