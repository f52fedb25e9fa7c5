//! Beat-to-cue dispatch
//!
//! Picks the cue for a beat position and hands it to the output route. The
//! dispatcher never blocks on playback: routes schedule and return.

use super::{AssetStore, AudioCue, AudioError, CueSample, CueSpec};
use crate::clock::BeatPosition;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};

/// Destination for cue playback
///
/// Each `play` call must start an independent voice so that a retriggered
/// cue overlaps the still-decaying previous one.
pub trait OutputRoute: Send {
    /// Whether the route can currently accept playback
    fn is_running(&self) -> bool;

    /// Tear down and reopen the underlying output.
    fn restart(&mut self) -> Result<(), AudioError>;

    /// Schedule `cue` for immediate playback at `gain`.
    fn play(&mut self, cue: &CueSample, gain: f32) -> Result<(), AudioError>;
}

impl<R: OutputRoute + ?Sized> OutputRoute for Box<R> {
    fn is_running(&self) -> bool {
        (**self).is_running()
    }

    fn restart(&mut self) -> Result<(), AudioError> {
        (**self).restart()
    }

    fn play(&mut self, cue: &CueSample, gain: f32) -> Result<(), AudioError> {
        (**self).play(cue, gain)
    }
}

/// Cue and gain for `position` with the built-in gains
pub fn select(position: BeatPosition) -> (AudioCue, f32) {
    let cue = AudioCue::for_position(position);
    (cue, cue.default_gain())
}

struct CueSlot {
    spec: CueSpec,
    sample: Option<CueSample>,
    /// Set once the "cue unavailable" warning has been logged
    warned: AtomicBool,
}

impl CueSlot {
    fn new(spec: CueSpec) -> Self {
        CueSlot {
            spec,
            sample: None,
            warned: AtomicBool::new(false),
        }
    }
}

/// Plays the downbeat or other-beat cue for each beat position
pub struct BeatAudioDispatcher<R> {
    assets: AssetStore,
    slots: [CueSlot; 2],
    route: Mutex<R>,
}

impl<R: OutputRoute> BeatAudioDispatcher<R> {
    /// Dispatcher with the built-in asset names and gains
    pub fn new(assets: AssetStore, route: R) -> Self {
        Self::with_cues(
            assets,
            route,
            CueSpec::default_for(AudioCue::Downbeat),
            CueSpec::default_for(AudioCue::OtherBeat),
        )
    }

    /// Dispatcher with explicit cue specs
    pub fn with_cues(assets: AssetStore, route: R, downbeat: CueSpec, other_beat: CueSpec) -> Self {
        let downbeat = CueSpec {
            cue: AudioCue::Downbeat,
            ..downbeat
        };
        let other_beat = CueSpec {
            cue: AudioCue::OtherBeat,
            ..other_beat
        };
        BeatAudioDispatcher {
            assets,
            slots: [CueSlot::new(downbeat), CueSlot::new(other_beat)],
            route: Mutex::new(route),
        }
    }

    /// Load both cues.
    ///
    /// Every cue is attempted; whichever loads stays usable even when the
    /// other fails. The first failure is returned.
    pub fn preload(&mut self) -> Result<(), AudioError> {
        let mut first_error = None;

        for slot in &mut self.slots {
            match self.assets.load(&slot.spec.asset) {
                Ok(sample) => {
                    log::debug!(
                        "{} cue '{}' loaded ({:?})",
                        slot.spec.cue,
                        slot.spec.asset,
                        sample.duration()
                    );
                    slot.sample = Some(sample);
                    slot.warned.store(false, Ordering::Relaxed);
                }
                Err(err) => {
                    log::warn!("{} cue unavailable, its beats will be silent: {err}", slot.spec.cue);
                    slot.sample = None;
                    first_error.get_or_insert(err);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Whether `cue` has a decoded sample
    pub fn is_loaded(&self, cue: AudioCue) -> bool {
        self.slot(cue).sample.is_some()
    }

    /// Configured spec for `cue`
    pub fn spec(&self, cue: AudioCue) -> &CueSpec {
        &self.slot(cue).spec
    }

    /// Cue and configured gain for `position`
    pub fn select(&self, position: BeatPosition) -> (AudioCue, f32) {
        let cue = AudioCue::for_position(position);
        (cue, self.slot(cue).spec.gain)
    }

    /// Play the cue for `position`.
    ///
    /// An unloaded cue is skipped with a warning. A route that is down, or
    /// that rejects the cue, gets one restart before the call gives up with
    /// [`AudioError::EngineNotRunning`].
    pub fn play(&self, position: BeatPosition) -> Result<(), AudioError> {
        let (cue, gain) = self.select(position);
        let slot = self.slot(cue);

        let Some(sample) = &slot.sample else {
            if !slot.warned.swap(true, Ordering::Relaxed) {
                log::warn!("no sample for {cue} cue '{}', playing silence", slot.spec.asset);
            }
            return Ok(());
        };

        let mut route = self.route.lock();
        let mut restarted = false;

        if !route.is_running() {
            restart(&mut *route)?;
            restarted = true;
        }

        match route.play(sample, gain) {
            Ok(()) => Ok(()),
            Err(err) if !restarted => {
                log::warn!("{cue} cue playback failed ({err}), restarting output");
                restart(&mut *route)?;
                route.play(sample, gain).map_err(into_not_running)
            }
            Err(err) => Err(into_not_running(err)),
        }
    }

    /// Exclusive access to the output route
    pub fn route(&self) -> MutexGuard<'_, R> {
        self.route.lock()
    }

    /// Asset store cues are loaded from
    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    fn slot(&self, cue: AudioCue) -> &CueSlot {
        &self.slots[cue.index()]
    }
}

fn restart<R: OutputRoute + ?Sized>(route: &mut R) -> Result<(), AudioError> {
    route.restart().map_err(into_not_running)?;
    log::info!("audio output restarted");
    Ok(())
}

fn into_not_running(err: AudioError) -> AudioError {
    match err {
        AudioError::EngineNotRunning(_) => err,
        other => AudioError::EngineNotRunning(other.to_string()),
    }
}

impl<R> std::fmt::Debug for BeatAudioDispatcher<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeatAudioDispatcher")
            .field("assets", &self.assets)
            .field("downbeat", &self.slots[0].spec)
            .field("other_beat", &self.slots[1].spec)
            .finish_non_exhaustive()
    }
}
