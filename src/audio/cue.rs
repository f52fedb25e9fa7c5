//! Decoded cue samples

use super::AudioError;
use hound::{SampleFormat, WavReader};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A decoded, immutable cue
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]`. Cloning shares the buffer.
#[derive(Debug, Clone)]
pub struct CueSample {
    name: Arc<str>,
    channels: u16,
    sample_rate: u32,
    samples: Arc<[f32]>,
}

impl CueSample {
    /// Wrap already decoded samples.
    pub fn from_samples(name: &str, channels: u16, sample_rate: u32, samples: Vec<f32>) -> Self {
        CueSample {
            name: name.into(),
            channels: channels.max(1),
            sample_rate,
            samples: samples.into(),
        }
    }

    /// Decode a WAV file.
    pub fn from_wav_file(name: &str, path: &Path) -> Result<Self, AudioError> {
        let file = File::open(path).map_err(|e| AudioError::DecodeFailure {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_wav_reader(name, BufReader::new(file))
    }

    /// Decode WAV data from any reader.
    pub fn from_wav_reader<R: Read>(name: &str, reader: R) -> Result<Self, AudioError> {
        let decode_failure = |reason: String| AudioError::DecodeFailure {
            name: name.to_string(),
            reason,
        };

        let reader = WavReader::new(reader).map_err(|e| decode_failure(e.to_string()))?;
        let spec = reader.spec();
        if spec.sample_rate == 0 || spec.channels == 0 {
            return Err(decode_failure(format!(
                "unplayable format: {} Hz, {} channels",
                spec.sample_rate, spec.channels
            )));
        }

        let samples: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| decode_failure(e.to_string()))?,
            SampleFormat::Int => {
                let scale = int_scale(spec.bits_per_sample);
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| decode_failure(e.to_string()))?
            }
        };

        if samples.is_empty() {
            return Err(decode_failure("no audio frames".into()));
        }

        Ok(Self::from_samples(name, spec.channels, spec.sample_rate, samples))
    }

    /// Logical name this cue was loaded under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interleaved channel count
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Shared handle on the sample buffer
    pub fn shared_samples(&self) -> Arc<[f32]> {
        Arc::clone(&self.samples)
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    /// Playback length
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }
}

/// Full-scale magnitude of a signed integer sample of `bits` width
fn int_scale(bits: u16) -> f32 {
    (1u64 << (bits.clamp(1, 32) - 1)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hound::{WavSpec, WavWriter};
    use std::io::Cursor;

    fn wav_bytes(spec: WavSpec, write: impl FnOnce(&mut WavWriter<&mut Cursor<Vec<u8>>>)) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            write(&mut writer);
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_int16() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, |w| {
            w.write_sample(i16::MAX).unwrap();
            w.write_sample(0i16).unwrap();
            w.write_sample(i16::MIN).unwrap();
        });

        let cue = CueSample::from_wav_reader("click", Cursor::new(bytes)).unwrap();
        assert_eq!(cue.channels(), 1);
        assert_eq!(cue.sample_rate(), 44100);
        assert_eq!(cue.frames(), 3);
        assert_relative_eq!(cue.samples()[0], 1.0, epsilon = 1e-4);
        assert_eq!(cue.samples()[1], 0.0);
        assert_relative_eq!(cue.samples()[2], -1.0);
    }

    #[test]
    fn test_decode_float_stereo() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let bytes = wav_bytes(spec, |w| {
            for s in [0.25f32, -0.25, 0.5, -0.5] {
                w.write_sample(s).unwrap();
            }
        });

        let cue = CueSample::from_wav_reader("click", Cursor::new(bytes)).unwrap();
        assert_eq!(cue.frames(), 2);
        assert_eq!(cue.samples(), &[0.25, -0.25, 0.5, -0.5]);
    }

    #[test]
    fn test_garbage_is_decode_failure() {
        let err = CueSample::from_wav_reader("first_beat", Cursor::new(b"not a wav".to_vec()))
            .unwrap_err();
        assert!(matches!(err, AudioError::DecodeFailure { ref name, .. } if name == "first_beat"));
    }

    #[test]
    fn test_empty_wav_is_decode_failure() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, |_| {});
        assert!(matches!(
            CueSample::from_wav_reader("empty", Cursor::new(bytes)),
            Err(AudioError::DecodeFailure { .. })
        ));
    }

    /// Minimal 16-bit PCM file with a hand-written header
    fn raw_wav(channels: u16, sample_rate: u32, frames: &[i16]) -> Vec<u8> {
        let block_align = channels * 2;
        let data_len = (frames.len() * 2) as u32;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
        bytes.extend_from_slice(&block_align.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for sample in frames {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_raw_header_decodes() {
        let cue = CueSample::from_wav_reader("click", Cursor::new(raw_wav(1, 8000, &[100, -100])))
            .unwrap();
        assert_eq!(cue.sample_rate(), 8000);
        assert_eq!(cue.frames(), 2);
    }

    #[test]
    fn test_zero_sample_rate_is_decode_failure() {
        let result = CueSample::from_wav_reader("first_beat", Cursor::new(raw_wav(1, 0, &[1000])));
        assert!(matches!(
            result,
            Err(AudioError::DecodeFailure { ref name, .. }) if name == "first_beat"
        ));
    }

    #[test]
    fn test_duration() {
        let cue = CueSample::from_samples("tone", 2, 1000, vec![0.0; 1000]);
        assert_eq!(cue.frames(), 500);
        assert_eq!(cue.duration(), Duration::from_millis(500));
    }
}
