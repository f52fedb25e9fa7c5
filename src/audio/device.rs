//! Audio device integration using rodio
//!
//! Each cue is mixed into the default output as its own voice, so a
//! retriggered click overlaps the tail of the previous one.

use super::{AudioError, CueSample, OutputRoute};
use rodio::{OutputStream, OutputStreamHandle, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// One-shot playback of a cue at a fixed gain
pub struct CueSource {
    samples: Arc<[f32]>,
    pos: usize,
    channels: u16,
    sample_rate: u32,
    gain: f32,
}

impl CueSource {
    /// Source playing `cue` once, scaled by `gain`
    pub fn new(cue: &CueSample, gain: f32) -> Self {
        CueSource {
            samples: cue.shared_samples(),
            pos: 0,
            channels: cue.channels(),
            sample_rate: cue.sample_rate(),
            gain,
        }
    }
}

impl Iterator for CueSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = *self.samples.get(self.pos)?;
        self.pos += 1;
        Some(sample * self.gain)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.samples.len() - self.pos;
        (remaining, Some(remaining))
    }
}

impl Source for CueSource {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.samples.len() - self.pos)
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        let frames = self.samples.len() / usize::from(self.channels.max(1));
        Some(Duration::from_secs_f64(
            frames as f64 / f64::from(self.sample_rate.max(1)),
        ))
    }
}

enum RouteCommand {
    /// Drop the current stream and open a new one on the default device
    Reopen(SyncSender<Result<OutputStreamHandle, String>>),
    Shutdown,
}

/// [`OutputRoute`] to the system's default output device
///
/// The rodio stream is not `Send`, so it lives on a small holder thread and
/// only its handle is kept here.
pub struct RodioRoute {
    handle: Option<OutputStreamHandle>,
    commands: Sender<RouteCommand>,
    holder: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl RodioRoute {
    /// Open the default output device.
    pub fn open_default() -> Result<Self, AudioError> {
        let (commands, rx) = mpsc::channel::<RouteCommand>();
        let running = Arc::new(AtomicBool::new(false));
        let holder_running = Arc::clone(&running);

        let holder = thread::Builder::new()
            .name("musee-audio-route".into())
            .spawn(move || {
                let mut stream: Option<OutputStream> = None;
                while let Ok(RouteCommand::Reopen(reply)) = rx.recv() {
                    stream = None;
                    let opened = match OutputStream::try_default() {
                        Ok((new_stream, handle)) => {
                            stream = Some(new_stream);
                            Ok(handle)
                        }
                        Err(e) => Err(format!("failed to open audio output: {e}")),
                    };
                    holder_running.store(opened.is_ok(), Ordering::Relaxed);
                    let _ = reply.send(opened);
                }
                drop(stream);
                holder_running.store(false, Ordering::Relaxed);
            })
            .map_err(|e| AudioError::EngineNotRunning(e.to_string()))?;

        let mut route = RodioRoute {
            handle: None,
            commands,
            holder: Some(holder),
            running,
        };
        route.reopen()?;
        log::info!("audio output opened on the default device");
        Ok(route)
    }

    fn reopen(&mut self) -> Result<(), AudioError> {
        self.handle = None;
        let (reply, response) = mpsc::sync_channel(1);
        self.commands
            .send(RouteCommand::Reopen(reply))
            .map_err(|_| AudioError::EngineNotRunning("audio route thread has exited".into()))?;

        let handle = response
            .recv()
            .map_err(|_| AudioError::EngineNotRunning("audio route thread has exited".into()))?
            .map_err(AudioError::EngineNotRunning)?;
        self.handle = Some(handle);
        Ok(())
    }
}

impl OutputRoute for RodioRoute {
    fn is_running(&self) -> bool {
        self.handle.is_some() && self.running.load(Ordering::Relaxed)
    }

    fn restart(&mut self) -> Result<(), AudioError> {
        self.reopen()
    }

    fn play(&mut self, cue: &CueSample, gain: f32) -> Result<(), AudioError> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| AudioError::EngineNotRunning("no output stream".into()))?;

        handle.play_raw(CueSource::new(cue, gain)).map_err(|e| {
            self.running.store(false, Ordering::Relaxed);
            AudioError::EngineNotRunning(e.to_string())
        })
    }
}

impl Drop for RodioRoute {
    fn drop(&mut self) {
        self.handle = None;
        let _ = self.commands.send(RouteCommand::Shutdown);
        if let Some(holder) = self.holder.take() {
            let _ = holder.join();
        }
    }
}

impl std::fmt::Debug for RodioRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioRoute")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
