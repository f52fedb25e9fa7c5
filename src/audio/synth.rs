//! Default cue rendering
//!
//! Synthesizes a woodblock-style click pair so the metronome works without
//! recorded assets. The downbeat click is pitched higher than the others.

use super::{AudioCue, AudioError, CueSample};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

/// Sample rate used by `musee --write-cues`
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Click length in milliseconds
const CLICK_MS: f32 = 20.0;

/// Fundamental and overtone of each click
fn partials(cue: AudioCue) -> (f32, f32) {
    match cue {
        AudioCue::Downbeat => (1200.0, 2400.0),
        AudioCue::OtherBeat => (800.0, 1600.0),
    }
}

/// Render the default click for `cue` as mono samples.
pub fn render_click(cue: AudioCue, sample_rate: u32) -> CueSample {
    let rate = sample_rate.max(1) as f32;
    let len = ((rate * CLICK_MS) / 1000.0).max(1.0) as usize;
    let (f1, f2) = partials(cue);

    let samples = (0..len)
        .map(|i| {
            let t = i as f32 / rate;
            let envelope = 1.0 - i as f32 / len as f32;
            let envelope = envelope * envelope;
            let body = 0.5 * (2.0 * PI * f1 * t).sin() + 0.3 * (2.0 * PI * f2 * t).sin();
            // Short burst of deterministic grit on the attack
            let grit = if i < len / 8 { (i as f32 * 0.7).sin() * 0.1 } else { 0.0 };
            (body + grit) * envelope
        })
        .collect();

    CueSample::from_samples(cue.default_asset(), 1, sample_rate, samples)
}

/// Write `cue` as a 16-bit PCM WAV file.
pub fn write_wav(cue: &CueSample, path: &Path) -> Result<(), AudioError> {
    let write_failure = |reason: String| AudioError::WriteFailure {
        path: path.to_path_buf(),
        reason,
    };

    let spec = WavSpec {
        channels: cue.channels(),
        sample_rate: cue.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| write_failure(e.to_string()))?;
    for &sample in cue.samples() {
        let pcm = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        writer
            .write_sample(pcm)
            .map_err(|e| write_failure(e.to_string()))?;
    }
    writer.finalize().map_err(|e| write_failure(e.to_string()))
}

/// Render both default cues into `dir` under their default asset names.
///
/// The directory is created if needed. Returns the written paths, downbeat
/// first.
pub fn write_cue_set(dir: &Path, sample_rate: u32) -> Result<Vec<PathBuf>, AudioError> {
    fs::create_dir_all(dir).map_err(|e| AudioError::WriteFailure {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    AudioCue::ALL
        .iter()
        .map(|&cue| {
            let path = dir.join(format!("{}.wav", cue.default_asset()));
            write_wav(&render_click(cue, sample_rate), &path)?;
            log::debug!("wrote {cue} cue to {}", path.display());
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AssetStore;

    #[test]
    fn test_click_shape() {
        let click = render_click(AudioCue::Downbeat, 44100);
        assert_eq!(click.channels(), 1);
        assert_eq!(click.frames(), 882);
        assert!(click.samples().iter().all(|s| s.abs() <= 1.0));
        // Decays to near silence by the tail.
        let tail = &click.samples()[click.frames() - 20..];
        assert!(tail.iter().all(|s| s.abs() < 0.01));
    }

    #[test]
    fn test_downbeat_is_brighter() {
        // More zero crossings for the higher-pitched click.
        fn crossings(cue: &CueSample) -> usize {
            cue.samples()
                .windows(2)
                .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
                .count()
        }
        let down = render_click(AudioCue::Downbeat, 44100);
        let other = render_click(AudioCue::OtherBeat, 44100);
        assert!(crossings(&down) > crossings(&other));
    }

    #[test]
    fn test_write_cue_set_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("cues");
        let paths = write_cue_set(&target, 22050).unwrap();
        assert_eq!(
            paths,
            vec![target.join("first_beat.wav"), target.join("second_beat.wav")]
        );

        let store = AssetStore::new(&target);
        let cue = store.load("second_beat").unwrap();
        assert_eq!(cue.sample_rate(), 22050);
        assert_eq!(cue.frames(), 441);
    }

    #[test]
    fn test_write_into_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, b"x").unwrap();
        assert!(matches!(
            write_cue_set(&blocker, 44100),
            Err(AudioError::WriteFailure { .. })
        ));
    }
}
