//! Beat clock
//!
//! Turns a [`Bpm`] into a periodic tick, tracks the beat position and fans
//! every tick out to registered handlers and channel subscribers.
//!
//! The transport is an explicit two-state machine. `start` and `stop` are
//! the only transitions, and a running clock owns exactly one ticker thread.

mod position;
mod ticker;

pub use position::{BeatEvent, BeatPosition, BEATS_PER_BAR};

use crate::bpm::{Bpm, BpmInput};
use parking_lot::{Mutex, RwLock};
use position::BeatCounter;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;
use ticker::Ticker;

/// Error type for clock transitions
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// Tempo of zero has no finite interval
    #[error("invalid tempo: {0} bpm (must be greater than zero)")]
    InvalidBpm(u16),

    /// The ticker thread could not be created
    #[error("could not start the beat timer: {0}")]
    TimerUnavailable(String),
}

/// Observable transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockState {
    /// No timer exists
    #[default]
    Stopped,
    /// A ticker is firing
    Running,
}

type TickHandler = Arc<dyn Fn(&BeatEvent) + Send + Sync>;

enum Transport {
    Stopped,
    Running { ticker: Ticker },
}

/// State visible to observers without touching the transport lock
#[derive(Debug, Clone, Copy, Default)]
struct Published {
    state: ClockState,
    bpm: Option<Bpm>,
    interval: Option<Duration>,
    position: Option<BeatPosition>,
    ticker: Option<ThreadId>,
}

#[derive(Default)]
struct Shared {
    published: Mutex<Published>,
    handlers: RwLock<Vec<TickHandler>>,
    subscribers: Mutex<Vec<Sender<BeatEvent>>>,
}

impl Shared {
    fn on_ticker_thread(&self) -> bool {
        self.published.lock().ticker == Some(thread::current().id())
    }

    fn dispatch(&self, event: BeatEvent) {
        {
            // Tick 0 can race `start` publishing the thread id.
            let mut published = self.published.lock();
            published.position = Some(event.position);
            published.ticker = Some(thread::current().id());
        }

        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(event).is_ok());

        // Snapshot so handlers may register more handlers without deadlocking.
        let handlers: Vec<TickHandler> = self.handlers.read().clone();
        for handler in &handlers {
            handler(&event);
        }
    }
}

/// Periodic beat clock
///
/// ```no_run
/// use musee::{BeatClock, Bpm};
///
/// let clock = BeatClock::new();
/// clock.on_tick(|event| println!("{} of 4", event.position));
/// clock.start(Bpm::new(90)).unwrap();
/// ```
pub struct BeatClock {
    transport: Mutex<Transport>,
    shared: Arc<Shared>,
    input: Option<BpmInput>,
}

impl BeatClock {
    /// Create a stopped clock.
    pub fn new() -> Self {
        Self::stopped(None)
    }

    /// Create a stopped clock that zeroes `input` whenever a run is stopped.
    pub fn with_input(input: BpmInput) -> Self {
        Self::stopped(Some(input))
    }

    fn stopped(input: Option<BpmInput>) -> Self {
        BeatClock {
            transport: Mutex::new(Transport::Stopped),
            shared: Arc::new(Shared::default()),
            input,
        }
    }

    /// Start ticking at `bpm`.
    ///
    /// The downbeat fires immediately and each following tick advances the
    /// position. Calling this while running replaces the current ticker and
    /// restarts the bar at beat 1.
    pub fn start(&self, bpm: Bpm) -> Result<(), ClockError> {
        let interval = bpm
            .interval_secs()
            .map(Duration::from_secs_f64)
            .ok_or(ClockError::InvalidBpm(bpm.get()))?;

        let Some(mut transport) = self.lock_transport() else {
            return Err(ClockError::TimerUnavailable(
                "clock is being reconfigured by another caller".into(),
            ));
        };

        if let Transport::Running { ticker } = std::mem::replace(&mut *transport, Transport::Stopped)
        {
            log::debug!("restarting beat clock at {bpm} bpm");
            ticker.cancel();
        }

        // Published before the ticker exists: tick 0 may be observed at once.
        *self.shared.published.lock() = Published {
            state: ClockState::Running,
            bpm: Some(bpm),
            interval: Some(interval),
            position: None,
            ticker: None,
        };

        let shared = Arc::clone(&self.shared);
        let mut counter = BeatCounter::new();
        let ticker = Ticker::spawn(interval, move || {
            let (tick, position) = counter.advance();
            shared.dispatch(BeatEvent {
                position,
                tick,
                bpm,
            });
        })
        .map_err(|e| {
            self.publish_stopped();
            ClockError::TimerUnavailable(e.to_string())
        })?;

        self.shared.published.lock().ticker = ticker.thread_id();
        *transport = Transport::Running { ticker };

        log::debug!("beat clock running at {bpm} bpm ({interval:?} per beat)");
        Ok(())
    }

    /// Stop ticking.
    ///
    /// Safe to call at any time. When it returns no further tick fires. A
    /// running clock also forgets its beat position and zeroes the attached
    /// digit input; stopping an already stopped clock changes nothing.
    /// Returns whether the clock was running.
    pub fn stop(&self) -> bool {
        let Some(mut transport) = self.lock_transport() else {
            return false;
        };

        let Transport::Running { ticker } = std::mem::replace(&mut *transport, Transport::Stopped)
        else {
            return false;
        };

        ticker.cancel();
        self.publish_stopped();
        if let Some(input) = &self.input {
            input.reset();
        }

        log::debug!("beat clock stopped");
        true
    }

    /// Register a callback invoked once per tick on the clock thread.
    ///
    /// Callbacks run in registration order and must return quickly; the next
    /// tick waits for them.
    pub fn on_tick<F>(&self, handler: F)
    where
        F: Fn(&BeatEvent) + Send + Sync + 'static,
    {
        self.shared.handlers.write().push(Arc::new(handler));
    }

    /// Receive every future tick over a channel.
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<BeatEvent> {
        let (tx, rx) = mpsc::channel();
        self.shared.subscribers.lock().push(tx);
        rx
    }

    /// Current transport state
    pub fn state(&self) -> ClockState {
        self.shared.published.lock().state
    }

    /// Whether a ticker is running
    pub fn is_running(&self) -> bool {
        self.state() == ClockState::Running
    }

    /// Position reached by the latest tick; `None` while stopped
    pub fn position(&self) -> Option<BeatPosition> {
        self.shared.published.lock().position
    }

    /// Tempo of the current run
    pub fn bpm(&self) -> Option<Bpm> {
        self.shared.published.lock().bpm
    }

    /// Period of the current run
    pub fn interval(&self) -> Option<Duration> {
        self.shared.published.lock().interval
    }

    /// Digit input zeroed on stop, if any
    pub fn input(&self) -> Option<&BpmInput> {
        self.input.as_ref()
    }

    /// Callers on the ticker thread (a tick handler) must not block on the
    /// transport: another thread holding it may be waiting for this tick.
    fn lock_transport(&self) -> Option<parking_lot::MutexGuard<'_, Transport>> {
        if self.shared.on_ticker_thread() {
            self.transport.try_lock()
        } else {
            Some(self.transport.lock())
        }
    }

    fn publish_stopped(&self) {
        *self.shared.published.lock() = Published::default();
    }
}

impl Default for BeatClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BeatClock {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for BeatClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let published = *self.shared.published.lock();
        f.debug_struct("BeatClock")
            .field("state", &published.state)
            .field("bpm", &published.bpm)
            .field("position", &published.position)
            .finish()
    }
}
