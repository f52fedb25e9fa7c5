//! Musee metronome engine
//!
//! A four-beat metronome core: three digit selections compose a BPM value, a
//! monotonic beat clock fires one tick per beat and cycles the beat position
//! through 1..=4, and a dispatcher plays an accented click on the downbeat and
//! a quieter click on the other beats.
//!
//! # Features
//! - Drift-free periodic ticks aligned to [`std::time::Instant`]
//! - Synchronous stop: no tick fires once [`BeatClock::stop`] has returned
//! - Two pre-loaded WAV cues with per-cue gain and overlapping retrigger
//! - Audio failures are logged and never interrupt the beat clock
//!
//! # Crate feature flags
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio` dep)
//!
//! # Quick start
//! ## Clock only
//! ```no_run
//! use musee::{BeatClock, Bpm};
//! let clock = BeatClock::new();
//! clock.on_tick(|event| println!("beat {}", event.position));
//! clock.start(Bpm::new(120)).unwrap();
//! std::thread::sleep(std::time::Duration::from_secs(2));
//! clock.stop();
//! ```
//!
//! ## Full metronome with sound
//! ```no_run
//! # #[cfg(feature = "streaming")]
//! # {
//! use musee::audio::{AssetStore, BeatAudioDispatcher, RodioRoute};
//! use musee::Metronome;
//! let route = RodioRoute::open_default().unwrap();
//! let dispatcher = BeatAudioDispatcher::new(AssetStore::new("assets"), route);
//! let metronome = Metronome::new(dispatcher);
//! metronome.input().set_digits(1, 2, 0).unwrap();
//! metronome.start().unwrap();
//! # }
//! ```

#![warn(missing_docs)]

pub mod audio; // Cue loading & playback
pub mod bpm; // Digit input
pub mod clock; // Beat clock
pub mod config; // JSON configuration
pub mod metronome; // Wiring

pub use audio::{AudioCue, AudioError, BeatAudioDispatcher, OutputRoute};
pub use bpm::{Bpm, BpmDigits, BpmError, BpmInput};
pub use clock::{BeatClock, BeatEvent, BeatPosition, ClockError, ClockState};
pub use config::{ConfigError, MetronomeConfig};
pub use metronome::Metronome;

/// Error types for metronome operations
#[derive(thiserror::Error, Debug)]
pub enum MusError {
    /// Clock refused to start
    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),

    /// Digit selection rejected
    #[error("BPM input error: {0}")]
    Bpm(#[from] BpmError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for metronome operations
pub type Result<T> = std::result::Result<T, MusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err: MusError = ClockError::InvalidBpm(0).into();
        assert!(matches!(err, MusError::Clock(ClockError::InvalidBpm(0))));
        assert!(err.to_string().starts_with("Clock error:"));

        let err: MusError = ConfigError::Invalid("gain".into()).into();
        assert!(err.to_string().starts_with("Configuration error:"));
    }
}
