//! Optional TOML settings file that overrides the reference tuning.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use whack_core::DurationRange;
use whack_world::{KindWeights, LevelTuning, SpawnerConfig, TimerConfig, WorldConfig};

/// Errors raised while loading a settings file.
#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    /// The file could not be read.
    #[error("failed to read settings from {path}")]
    Read {
        /// Location that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file was not valid settings TOML.
    #[error("failed to parse settings in {path}")]
    Parse {
        /// Location that was parsed.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: toml::de::Error,
    },
}

/// Every field is optional; omitted values keep their reference defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    /// Spawner seed used when `--seed` is absent.
    pub(crate) seed: Option<u64>,
    /// Difficulty curve.
    pub(crate) levels: LevelTuning,
    /// Mole category weights and timings.
    pub(crate) spawner: SpawnerSettings,
    /// Countdown cadence and warning window.
    pub(crate) timer: TimerConfig,
    /// Delay of the level-transition overlay in milliseconds.
    pub(crate) transition_delay_ms: Option<u64>,
}

/// Spawner overrides.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SpawnerSettings {
    /// Base category weights.
    pub(crate) weights: KindWeights,
    /// Lingering time of whacked moles in milliseconds.
    pub(crate) hit_grace_ms: Option<u64>,
    /// Bounds of the delay before a level's first spawn, in milliseconds.
    pub(crate) first_spawn_ms: Option<[u64; 2]>,
}

impl Settings {
    /// Reads settings from `path`.
    pub(crate) fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Builds the world configuration, preferring `seed` over the file's seed.
    pub(crate) fn world_config(&self, seed: Option<u64>) -> WorldConfig {
        let mut config = match seed.or(self.seed) {
            Some(seed) => WorldConfig::new(seed),
            None => WorldConfig::default(),
        };
        config.tuning = self.levels.clone();
        config.timer = self.timer;
        config.spawner = self.spawner.apply(config.spawner);
        if let Some(delay) = self.transition_delay_ms {
            config.transition_delay = Duration::from_millis(delay);
        }
        config
    }
}

impl SpawnerSettings {
    fn apply(&self, base: SpawnerConfig) -> SpawnerConfig {
        let mut config = base.with_weights(self.weights);
        if let Some(grace) = self.hit_grace_ms {
            config = config.with_hit_grace(Duration::from_millis(grace));
        }
        if let Some([min, max]) = self.first_spawn_ms {
            config = config.with_first_spawn_delay(DurationRange::new(
                Duration::from_millis(min),
                Duration::from_millis(max),
            ));
        }
        config
    }
}
