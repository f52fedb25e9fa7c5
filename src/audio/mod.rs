//! Audio cues & playback
//!
//! Two cues exist: an accented click for the downbeat and a quieter one for
//! the remaining beats. Both are decoded once from WAV assets and replayed
//! through an [`OutputRoute`].

mod assets;
mod cue;
mod dispatcher;
pub mod synth;

#[cfg(feature = "streaming")]
mod device;

pub use assets::AssetStore;
pub use cue::CueSample;
pub use dispatcher::{select, BeatAudioDispatcher, OutputRoute};

#[cfg(feature = "streaming")]
pub use device::{CueSource, RodioRoute};

use crate::clock::BeatPosition;
use std::fmt;
use std::path::PathBuf;

/// Gain applied to the downbeat cue
pub const DOWNBEAT_GAIN: f32 = 1.0;
/// Gain applied to beats 2, 3 and 4
pub const OTHER_BEAT_GAIN: f32 = 0.6;

/// Error type for cue loading and playback
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// No file backs the logical asset name
    #[error("audio asset '{name}' not found (searched {searched:?})")]
    AssetMissing {
        /// Logical asset name
        name: String,
        /// Paths that were tried
        searched: Vec<PathBuf>,
    },

    /// The asset exists but is not playable audio
    #[error("audio asset '{name}' could not be decoded: {reason}")]
    DecodeFailure {
        /// Logical asset name
        name: String,
        /// Decoder message
        reason: String,
    },

    /// The output device is unavailable, even after a restart attempt
    #[error("audio output is not running: {0}")]
    EngineNotRunning(String),

    /// A rendered cue could not be written
    #[error("could not write {path:?}: {reason}")]
    WriteFailure {
        /// Destination file
        path: PathBuf,
        /// Encoder message
        reason: String,
    },
}

/// Which of the two clicks to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// Beat 1
    Downbeat,
    /// Beats 2, 3, 4
    OtherBeat,
}

impl AudioCue {
    /// Both cues, downbeat first
    pub const ALL: [AudioCue; 2] = [AudioCue::Downbeat, AudioCue::OtherBeat];

    /// Cue that sounds on `position`
    pub fn for_position(position: BeatPosition) -> Self {
        if position.is_downbeat() {
            AudioCue::Downbeat
        } else {
            AudioCue::OtherBeat
        }
    }

    /// Logical asset name used when none is configured
    pub fn default_asset(self) -> &'static str {
        match self {
            AudioCue::Downbeat => "first_beat",
            AudioCue::OtherBeat => "second_beat",
        }
    }

    /// Gain used when none is configured
    pub fn default_gain(self) -> f32 {
        match self {
            AudioCue::Downbeat => DOWNBEAT_GAIN,
            AudioCue::OtherBeat => OTHER_BEAT_GAIN,
        }
    }

    fn index(self) -> usize {
        match self {
            AudioCue::Downbeat => 0,
            AudioCue::OtherBeat => 1,
        }
    }
}

impl fmt::Display for AudioCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AudioCue::Downbeat => "downbeat",
            AudioCue::OtherBeat => "other beat",
        })
    }
}

/// Asset name and gain for one cue
#[derive(Debug, Clone, PartialEq)]
pub struct CueSpec {
    /// Cue this spec configures
    pub cue: AudioCue,
    /// Logical asset name resolved through the [`AssetStore`]
    pub asset: String,
    /// Linear playback gain
    pub gain: f32,
}

impl CueSpec {
    /// Spec with an explicit asset and gain
    pub fn new(cue: AudioCue, asset: impl Into<String>, gain: f32) -> Self {
        CueSpec {
            cue,
            asset: asset.into(),
            gain,
        }
    }

    /// Built-in asset name and gain for `cue`
    pub fn default_for(cue: AudioCue) -> Self {
        CueSpec::new(cue, cue.default_asset(), cue.default_gain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_for_position() {
        let cues: Vec<AudioCue> = BeatPosition::all().map(AudioCue::for_position).collect();
        assert_eq!(
            cues,
            vec![
                AudioCue::Downbeat,
                AudioCue::OtherBeat,
                AudioCue::OtherBeat,
                AudioCue::OtherBeat
            ]
        );
    }

    #[test]
    fn test_default_specs() {
        let down = CueSpec::default_for(AudioCue::Downbeat);
        assert_eq!(down.asset, "first_beat");
        assert_eq!(down.gain, 1.0);

        let other = CueSpec::default_for(AudioCue::OtherBeat);
        assert_eq!(other.asset, "second_beat");
        assert!(other.gain < down.gain);
    }
}
