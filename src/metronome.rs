//! Metronome wiring
//!
//! Connects the digit input, the beat clock and the audio dispatcher: each
//! tick plays the cue for its position.

use crate::audio::{BeatAudioDispatcher, OutputRoute};
use crate::bpm::{Bpm, BpmInput};
use crate::clock::{BeatClock, BeatEvent, BeatPosition, ClockError, ClockState, BEATS_PER_BAR};
use crate::config::MetronomeConfig;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// A beat clock driving audio cues from a digit input
pub struct Metronome<R: OutputRoute + 'static> {
    input: BpmInput,
    clock: BeatClock,
    dispatcher: Arc<BeatAudioDispatcher<R>>,
}

impl<R: OutputRoute + 'static> Metronome<R> {
    /// Metronome with a zeroed digit input
    pub fn new(dispatcher: BeatAudioDispatcher<R>) -> Self {
        Self::with_input(dispatcher, BpmInput::new())
    }

    /// Metronome driven by an existing digit input
    pub fn with_input(dispatcher: BeatAudioDispatcher<R>, input: BpmInput) -> Self {
        let clock = BeatClock::with_input(input.clone());
        let dispatcher = Arc::new(dispatcher);

        let audio = Arc::clone(&dispatcher);
        clock.on_tick(move |event: &BeatEvent| {
            if let Err(err) = audio.play(event.position) {
                log::warn!("beat {} (tick {}) silent: {err}", event.position, event.tick);
            }
        });

        Metronome {
            input,
            clock,
            dispatcher,
        }
    }

    /// Build from a config: cues, gains and initial digits.
    ///
    /// The config is validated first. Cues that fail to load are logged and
    /// stay silent.
    pub fn from_config(config: &MetronomeConfig, route: R) -> crate::Result<Self> {
        config.validate()?;
        let (downbeat, other_beat) = config.cue_specs();
        let mut dispatcher =
            BeatAudioDispatcher::with_cues(config.asset_store(), route, downbeat, other_beat);
        if let Err(err) = dispatcher.preload() {
            log::warn!("continuing with missing cues: {err}");
        }

        let input = BpmInput::with_digits(config.initial_digits()?);
        Ok(Self::with_input(dispatcher, input))
    }

    /// Live digit input
    pub fn input(&self) -> &BpmInput {
        &self.input
    }

    /// Start at the tempo composed from the current digits.
    ///
    /// Restarts from the downbeat when already running. Returns the tempo in
    /// use.
    pub fn start(&self) -> Result<Bpm, ClockError> {
        let bpm = self.input.bpm();
        self.clock.start(bpm)?;
        log::info!("metronome started at {bpm} bpm");
        Ok(bpm)
    }

    /// Select the digits spelling `bpm` and (re)start at that tempo.
    pub fn start_at(&self, bpm: Bpm) -> crate::Result<Bpm> {
        self.input.set_bpm(bpm)?;
        Ok(self.start()?)
    }

    /// Stop and zero the digits. Returns whether it was running.
    pub fn stop(&self) -> bool {
        let was_running = self.clock.stop();
        if was_running {
            log::info!("metronome stopped");
        }
        was_running
    }

    /// Start when stopped, stop when running. Returns the new state.
    pub fn toggle(&self) -> Result<ClockState, ClockError> {
        if self.clock.is_running() {
            self.stop();
        } else {
            self.start()?;
        }
        Ok(self.clock.state())
    }

    /// Transport state
    pub fn state(&self) -> ClockState {
        self.clock.state()
    }

    /// Current beat position; `None` while stopped
    pub fn position(&self) -> Option<BeatPosition> {
        self.clock.position()
    }

    /// Receive every future beat.
    pub fn subscribe(&self) -> Receiver<BeatEvent> {
        self.clock.subscribe()
    }

    /// Underlying clock
    pub fn clock(&self) -> &BeatClock {
        &self.clock
    }

    /// Audio dispatcher shared with the tick handler
    pub fn dispatcher(&self) -> &BeatAudioDispatcher<R> {
        &self.dispatcher
    }
}

impl<R: OutputRoute + 'static> std::fmt::Debug for Metronome<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metronome")
            .field("digits", &self.input.digits())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Four-dot beat indicator, filled on the current position
pub fn indicator(position: Option<BeatPosition>) -> String {
    (1..=BEATS_PER_BAR)
        .map(|n| {
            if position.map(BeatPosition::get) == Some(n) {
                '●'
            } else {
                '○'
            }
        })
        .map(String::from)
        .collect::<Vec<_>>()
        .join(" ")
}
