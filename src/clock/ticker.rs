//! Periodic ticker thread
//!
//! Fires a callback on a fixed period measured against [`Instant`]. Slot `n`
//! is due at `started + n * interval`, so lateness of one tick never shifts
//! the ones after it.

use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

/// Thread name shown in debuggers and panic messages
const TICKER_THREAD_NAME: &str = "musee-beat-clock";

struct Shared {
    /// Held by the ticker while a tick is dispatched; released while waiting.
    gate: Mutex<()>,
    wake: Condvar,
    cancelled: AtomicBool,
}

/// Handle to a running ticker thread
pub(crate) struct Ticker {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
    interval: Duration,
}

impl Ticker {
    /// Start ticking. Tick 0 fires immediately.
    pub(crate) fn spawn<F>(interval: Duration, on_tick: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let shared = Arc::new(Shared {
            gate: Mutex::new(()),
            wake: Condvar::new(),
            cancelled: AtomicBool::new(false),
        });

        let thread_shared = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name(TICKER_THREAD_NAME.into())
            .spawn(move || run(&thread_shared, interval, on_tick))?;

        Ok(Ticker {
            shared,
            thread: Some(thread),
            interval,
        })
    }

    /// Tick period
    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    /// Id of the ticker thread
    pub(crate) fn thread_id(&self) -> Option<ThreadId> {
        self.thread.as_ref().map(|t| t.thread().id())
    }

    /// Stop ticking.
    ///
    /// From any other thread this waits for an in-flight tick to finish and
    /// joins the ticker, so no tick fires after it returns. From inside a
    /// tick callback it only flags cancellation; the loop exits once the
    /// callback returns.
    pub(crate) fn cancel(mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        if thread.thread().id() == thread::current().id() {
            self.shared.cancelled.store(true, Ordering::SeqCst);
            return;
        }

        {
            let _gate = self.shared.gate.lock();
            self.shared.cancelled.store(true, Ordering::SeqCst);
            self.shared.wake.notify_all();
        }

        if thread.join().is_err() {
            log::warn!("beat clock thread panicked before shutdown");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        // Detach quietly; cancel() is the orderly path.
        self.shared.cancelled.store(true, Ordering::SeqCst);
        self.shared.wake.notify_all();
    }
}

fn run<F: FnMut()>(shared: &Shared, interval: Duration, mut on_tick: F) {
    let started = Instant::now();
    let mut slot: u64 = 0;
    let mut gate = shared.gate.lock();

    loop {
        let due = due_at(started, interval, slot);
        while !shared.cancelled.load(Ordering::SeqCst) && Instant::now() < due {
            shared.wake.wait_until(&mut gate, due);
        }
        if shared.cancelled.load(Ordering::SeqCst) {
            break;
        }

        on_tick();

        slot = next_slot(started, interval, slot, Instant::now());
    }
}

/// Instant at which `slot` is due
fn due_at(started: Instant, interval: Duration, slot: u64) -> Instant {
    let nanos = interval.as_nanos().saturating_mul(u128::from(slot));
    started + Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Slot following `slot`, skipping any slots that are already in the past.
fn next_slot(started: Instant, interval: Duration, slot: u64, now: Instant) -> u64 {
    let next = slot + 1;
    if now < due_at(started, interval, next) {
        return next;
    }
    // Fell behind by a whole period or more: realign to the first future slot.
    let elapsed = now.duration_since(started).as_nanos();
    let period = interval.as_nanos().max(1);
    u64::try_from(elapsed / period + 1).unwrap_or(u64::MAX)
}
