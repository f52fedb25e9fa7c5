use musee::audio::{synth, AssetStore, AudioError, BeatAudioDispatcher, CueSample, OutputRoute};
use musee::bpm::compose;
use musee::{BeatEvent, BeatPosition, ClockState, Metronome, MetronomeConfig};
use parking_lot::Mutex;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

type PlayLog = Arc<Mutex<Vec<(String, f32, Instant)>>>;

#[derive(Default)]
struct RecordingRoute {
    log: PlayLog,
}

impl OutputRoute for RecordingRoute {
    fn is_running(&self) -> bool {
        true
    }

    fn restart(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn play(&mut self, cue: &CueSample, gain: f32) -> Result<(), AudioError> {
        self.log
            .lock()
            .push((cue.name().to_string(), gain, Instant::now()));
        Ok(())
    }
}

fn cue_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    synth::write_cue_set(&dir.path().join("AUDIO"), 22050).unwrap();
    dir
}

fn recv(rx: &Receiver<BeatEvent>, count: usize) -> Vec<BeatEvent> {
    (0..count)
        .map_while(|_| rx.recv_timeout(Duration::from_secs(3)).ok())
        .collect()
}

#[test]
fn digits_120_play_a_bar_at_half_second_beats() {
    let dir = cue_dir();
    let route = RecordingRoute::default();
    let log = Arc::clone(&route.log);

    let mut dispatcher = BeatAudioDispatcher::new(AssetStore::new(dir.path()), route);
    dispatcher.preload().unwrap();
    let metronome = Metronome::new(dispatcher);

    assert_eq!(compose(1, 2, 0).unwrap().get(), 120);
    metronome.input().set_digits(1, 2, 0).unwrap();

    let rx = metronome.subscribe();
    metronome.start().unwrap();
    assert_eq!(
        metronome.clock().interval(),
        Some(Duration::from_millis(500))
    );

    let events = recv(&rx, 5);
    metronome.stop();

    let positions: Vec<u8> = events.iter().map(|e| e.position.get()).collect();
    assert_eq!(positions, vec![1, 2, 3, 4, 1]);

    let log = log.lock();
    let cues: Vec<(&str, f32)> = log.iter().map(|(n, g, _)| (n.as_str(), *g)).collect();
    assert_eq!(
        cues,
        vec![
            ("first_beat", 1.0),
            ("second_beat", 0.6),
            ("second_beat", 0.6),
            ("second_beat", 0.6),
            ("first_beat", 1.0),
        ]
    );

    // Four periods between the first and fifth click.
    let span = log[4].2.duration_since(log[0].2);
    assert!(span >= Duration::from_millis(1950), "span {span:?}");
    assert!(span <= Duration::from_millis(2300), "span {span:?}");
}

#[test]
fn stop_resets_everything_and_restart_begins_on_the_downbeat() {
    let dir = cue_dir();
    let config = MetronomeConfig {
        assets_dir: dir.path().to_path_buf(),
        digits: [2, 4, 0],
        ..Default::default()
    };
    let metronome = Metronome::from_config(&config, RecordingRoute::default()).unwrap();
    let rx = metronome.subscribe();

    metronome.start().unwrap();
    assert_eq!(recv(&rx, 2).len(), 2);
    assert!(metronome.stop());

    assert_eq!(metronome.state(), ClockState::Stopped);
    assert_eq!(metronome.position(), None);
    assert_eq!(metronome.input().bpm().get(), 0);
    while rx.try_recv().is_ok() {}

    // Stopping again is harmless.
    assert!(!metronome.stop());

    metronome.input().set_digits(2, 4, 0).unwrap();
    metronome.start().unwrap();
    let events = recv(&rx, 2);
    metronome.stop();

    assert_eq!(events[0].position, BeatPosition::DOWNBEAT);
    assert_eq!(events[0].tick, 0);
    assert_eq!(events[1].position.get(), 2);
}

#[test]
fn missing_assets_keep_time_silently() {
    let dir = tempfile::tempdir().unwrap();
    let route = RecordingRoute::default();
    let log = Arc::clone(&route.log);
    let config = MetronomeConfig {
        assets_dir: dir.path().to_path_buf(),
        digits: [2, 9, 9],
        ..Default::default()
    };
    let metronome = Metronome::from_config(&config, route).unwrap();
    let rx = metronome.subscribe();

    metronome.start().unwrap();
    assert_eq!(recv(&rx, 4).len(), 4);
    metronome.stop();

    assert!(log.lock().is_empty());
}
