use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

/// Opaque id of one armed countdown
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEventKind {
    /// Remaining time after one interval elapsed, always > 0
    Tick { remaining_secs: u32 },
    Expired,
}

/// A callback from a countdown, tagged with the handle that produced it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerEvent {
    pub handle: TimerHandle,
    pub kind: TimerEventKind,
}

/// Countdown capability consumed by the session controller.
///
/// An armed countdown reports `Tick` once per interval with strictly
/// decreasing remaining time, then `Expired` exactly once when the
/// remaining time reaches zero. Nothing is reported for a handle after
/// it has been cancelled or has expired.
pub trait TimerService {
    fn arm(&mut self, duration_secs: u32, interval_secs: u32) -> TimerHandle;
    /// Idempotent; unknown, expired and already cancelled handles are no-ops.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Where a background countdown delivers its events
pub trait TimerSink: Send + 'static {
    /// Returns false once the receiving side is gone.
    fn deliver(&self, event: TimerEvent) -> bool;
}

impl<E> TimerSink for Sender<E>
where
    E: From<TimerEvent> + Send + 'static,
{
    fn deliver(&self, event: TimerEvent) -> bool {
        self.send(E::from(event)).is_ok()
    }
}

/// Wall-clock countdowns, one sleeping thread per armed handle
pub struct ThreadTimerService<S: TimerSink + Clone> {
    sink: S,
    unit: Duration,
    next_id: u64,
    live: HashMap<TimerHandle, Arc<AtomicBool>>,
}

impl<S: TimerSink + Clone> ThreadTimerService<S> {
    pub fn new(sink: S) -> Self {
        Self::with_unit(sink, Duration::from_secs(1))
    }

    /// Scale what "one second" means; tests use milliseconds.
    pub fn with_unit(sink: S, unit: Duration) -> Self {
        Self {
            sink,
            unit,
            next_id: 0,
            live: HashMap::new(),
        }
    }

    pub fn live_count(&self) -> usize {
        self.live
            .values()
            .filter(|done| !done.load(Ordering::SeqCst))
            .count()
    }
}

impl<S: TimerSink + Clone> TimerService for ThreadTimerService<S> {
    fn arm(&mut self, duration_secs: u32, interval_secs: u32) -> TimerHandle {
        // drop bookkeeping for countdowns that already finished
        self.live.retain(|_, done| !done.load(Ordering::SeqCst));

        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let done = Arc::new(AtomicBool::new(false));
        self.live.insert(handle, Arc::clone(&done));

        let sink = self.sink.clone();
        let unit = self.unit;
        let interval_secs = interval_secs.max(1);
        debug!(?handle, duration_secs, interval_secs, "arming countdown thread");

        thread::spawn(move || {
            let mut remaining = duration_secs;
            loop {
                // the last step only waits for what is left
                let step = interval_secs.min(remaining);
                thread::sleep(unit * step);
                if done.load(Ordering::SeqCst) {
                    break;
                }
                remaining -= step;
                let kind = if remaining == 0 {
                    done.store(true, Ordering::SeqCst);
                    TimerEventKind::Expired
                } else {
                    TimerEventKind::Tick {
                        remaining_secs: remaining,
                    }
                };
                if !sink.deliver(TimerEvent { handle, kind }) || remaining == 0 {
                    break;
                }
            }
        });

        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(done) = self.live.remove(&handle) {
            done.store(true, Ordering::SeqCst);
            debug!(?handle, "countdown cancelled");
        }
    }
}

impl<S: TimerSink + Clone> Drop for ThreadTimerService<S> {
    fn drop(&mut self) {
        for done in self.live.values() {
            done.store(true, Ordering::SeqCst);
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Countdown {
    handle: TimerHandle,
    remaining: u32,
    interval: u32,
    since_last: u32,
}

/// Deterministic countdowns advanced by hand
#[derive(Debug, Default)]
pub struct ManualTimer {
    next_id: u64,
    live: Vec<Countdown>,
    armed: Vec<(TimerHandle, u32)>,
    cancelled: usize,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move every live countdown forward by `secs`, returning the events
    /// they produced in order.
    pub fn advance(&mut self, secs: u32) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        for _ in 0..secs {
            for countdown in self.live.iter_mut() {
                countdown.since_last += 1;
                if countdown.since_last < countdown.interval.min(countdown.remaining) {
                    continue;
                }
                countdown.remaining = countdown.remaining.saturating_sub(countdown.since_last);
                countdown.since_last = 0;
                let kind = if countdown.remaining == 0 {
                    TimerEventKind::Expired
                } else {
                    TimerEventKind::Tick {
                        remaining_secs: countdown.remaining,
                    }
                };
                trace!(handle = ?countdown.handle, ?kind, "manual timer fired");
                events.push(TimerEvent {
                    handle: countdown.handle,
                    kind,
                });
            }
            self.live.retain(|c| c.remaining > 0);
        }
        events
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.live.iter().any(|c| c.handle == handle)
    }

    pub fn active_count(&self) -> usize {
        self.live.len()
    }

    /// Every `(handle, duration)` ever armed, oldest first
    pub fn armed(&self) -> &[(TimerHandle, u32)] {
        &self.armed
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled
    }
}

impl TimerService for ManualTimer {
    fn arm(&mut self, duration_secs: u32, interval_secs: u32) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.armed.push((handle, duration_secs));
        self.live.push(Countdown {
            handle,
            remaining: duration_secs,
            interval: interval_secs.max(1),
            since_last: 0,
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        let before = self.live.len();
        self.live.retain(|c| c.handle != handle);
        if self.live.len() != before {
            self.cancelled += 1;
        }
    }
}
