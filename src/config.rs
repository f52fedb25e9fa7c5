//! JSON configuration
//!
//! ```json
//! {
//!   "assets_dir": "assets",
//!   "downbeat": { "asset": "first_beat", "gain": 1.0 },
//!   "other_beat": { "asset": "second_beat", "gain": 0.6 },
//!   "digits": [1, 2, 0]
//! }
//! ```
//!
//! Every field is optional.

use crate::audio::{AssetStore, AudioCue, CueSpec};
use crate::bpm::{BpmDigits, BpmError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Upper bound accepted for a cue gain
pub const MAX_GAIN: f32 = 2.0;

/// Error type for configuration loading
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("cannot read {path:?}: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not valid JSON for this schema
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Well-formed but out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Per-cue settings; unset fields fall back to the cue's built-in values
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    /// Logical asset name
    pub asset: Option<String>,
    /// Linear gain in `[0, MAX_GAIN]`
    pub gain: Option<f32>,
}

impl CueConfig {
    /// Resolve against the defaults of `cue`.
    pub fn spec(&self, cue: AudioCue) -> CueSpec {
        CueSpec::new(
            cue,
            self.asset.as_deref().unwrap_or(cue.default_asset()),
            self.gain.unwrap_or(cue.default_gain()),
        )
    }
}

/// Metronome settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    /// Root directory for cue assets
    pub assets_dir: PathBuf,
    /// Beat 1 cue
    pub downbeat: CueConfig,
    /// Beats 2 to 4 cue
    pub other_beat: CueConfig,
    /// Initial hundreds, tens and units digits
    pub digits: [u8; 3],
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        MetronomeConfig {
            assets_dir: PathBuf::from("assets"),
            downbeat: CueConfig::default(),
            other_beat: CueConfig::default(),
            digits: [0, 0, 0],
        }
    }
}

impl MetronomeConfig {
    /// Load and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: MetronomeConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check gains and digits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (downbeat, other_beat) = self.cue_specs();
        for CueSpec { cue, asset, gain } in [downbeat, other_beat] {
            if !(0.0..=MAX_GAIN).contains(&gain) {
                return Err(ConfigError::Invalid(format!(
                    "{cue} gain {gain} outside 0..={MAX_GAIN}"
                )));
            }
            if asset.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{cue} asset name is empty")));
            }
        }
        self.initial_digits()
            .map(|_| ())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Initial digit selection
    pub fn initial_digits(&self) -> Result<BpmDigits, BpmError> {
        let [h, t, u] = self.digits;
        BpmDigits::new(h, t, u)
    }

    /// Asset store rooted at `assets_dir`
    pub fn asset_store(&self) -> AssetStore {
        AssetStore::new(&self.assets_dir)
    }

    /// Downbeat and other-beat cue specs
    pub fn cue_specs(&self) -> (CueSpec, CueSpec) {
        (
            self.downbeat.spec(AudioCue::Downbeat),
            self.other_beat.spec(AudioCue::OtherBeat),
        )
    }
}
