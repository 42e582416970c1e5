use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::snapshot::Snapshot;
use crate::timer::{TimerEvent, TimerEventKind, TimerHandle, TimerService};

pub const DEFAULT_SESSION_SECS: u32 = 60;
pub const DEFAULT_TICK_SECS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    session_secs: u32,
    tick_secs: u32,
}

impl SessionConfig {
    pub fn new(session_secs: u32, tick_secs: u32) -> Result<Self> {
        if session_secs == 0 {
            return Err(Error::InvalidConfig(
                "session length must be at least one second".into(),
            ));
        }
        if tick_secs == 0 {
            return Err(Error::InvalidConfig(
                "tick interval must be at least one second".into(),
            ));
        }
        Ok(Self {
            session_secs,
            tick_secs,
        })
    }

    pub fn session_secs(&self) -> u32 {
        self.session_secs
    }

    pub fn tick_secs(&self) -> u32 {
        self.tick_secs
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_secs: DEFAULT_SESSION_SECS,
            tick_secs: DEFAULT_TICK_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Running,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub score: u32,
    pub time_remaining_secs: u32,
    pub phase: Phase,
}

impl SessionState {
    fn fresh(config: &SessionConfig) -> Self {
        Self {
            score: 0,
            time_remaining_secs: config.session_secs,
            phase: Phase::Idle,
        }
    }
}

/// What the display layer gets to see after each mutation
pub type SessionView = SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Changed(SessionView),
    /// Emitted once per natural expiry, before the automatic reset
    Ended { final_score: u32 },
}

/// Single-writer state machine for one tap-counting session at a time.
///
/// Timer callbacks come back in through [`SessionController::on_timer_event`];
/// callers serialize those with the user operations.
pub struct SessionController<T: TimerService> {
    config: SessionConfig,
    state: SessionState,
    timer: T,
    active: Option<TimerHandle>,
    events: Vec<SessionEvent>,
}

impl<T: TimerService> SessionController<T> {
    pub fn new(config: SessionConfig, timer: T) -> Self {
        Self {
            state: SessionState::fresh(&config),
            config,
            timer,
            active: None,
            events: Vec::new(),
        }
    }

    /// Score one tap, starting the session first when idle.
    pub fn tap(&mut self) -> u32 {
        if self.state.phase == Phase::Idle {
            self.start();
        }
        self.state.score = self.state.score.saturating_add(1);
        self.notify();
        self.state.score
    }

    pub fn start(&mut self) {
        if self.state.phase == Phase::Running {
            return;
        }
        self.arm(self.config.session_secs);
        self.state.phase = Phase::Running;
        info!(session_secs = self.config.session_secs, "session started");
        self.notify();
    }

    pub fn reset(&mut self) {
        self.disarm();
        self.state = SessionState::fresh(&self.config);
        debug!("session reset");
        self.notify();
    }

    /// Capture progress and suspend the countdown.
    pub fn snapshot(&mut self) -> Snapshot {
        self.disarm();
        let snapshot = Snapshot {
            score: i64::from(self.state.score),
            time_left: i64::from(self.state.time_remaining_secs),
        };
        info!(?snapshot, phase = %self.state.phase, "session suspended");
        snapshot
    }

    /// Resume from a snapshot, counting down only the time that was left.
    ///
    /// A snapshot with no time left is an already finished session and
    /// resets instead. Negative values or more time than a session holds
    /// are rejected and leave the controller untouched.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        let session_secs = self.config.session_secs;
        let valid = snapshot.score >= 0
            && snapshot.time_left >= 0
            && snapshot.time_left <= i64::from(session_secs)
            && snapshot.score <= i64::from(u32::MAX);
        if !valid {
            warn!(?snapshot, session_secs, "rejecting snapshot");
            return Err(Error::InvalidSnapshot {
                score: snapshot.score,
                time_left: snapshot.time_left,
                session_secs,
            });
        }

        if snapshot.time_left == 0 {
            info!(?snapshot, "snapshot already expired, resetting");
            self.reset();
            return Ok(());
        }

        self.disarm();
        self.state.score = snapshot.score as u32;
        self.state.time_remaining_secs = snapshot.time_left as u32;

        if self.state.score == 0 && self.state.time_remaining_secs == session_secs {
            self.state.phase = Phase::Idle;
        } else {
            self.arm(self.state.time_remaining_secs);
            self.state.phase = Phase::Running;
        }
        info!(?snapshot, phase = %self.state.phase, "session restored");
        self.notify();
        Ok(())
    }

    /// Fold one countdown callback into the session.
    pub fn on_timer_event(&mut self, event: TimerEvent) {
        if self.active != Some(event.handle) {
            debug!(?event, "ignoring event from stale countdown");
            return;
        }

        match event.kind {
            TimerEventKind::Tick { remaining_secs } => {
                if remaining_secs == 0 || remaining_secs >= self.state.time_remaining_secs {
                    warn!(
                        remaining_secs,
                        current = self.state.time_remaining_secs,
                        "ignoring non-decreasing tick"
                    );
                    return;
                }
                self.state.time_remaining_secs = remaining_secs;
                debug!(remaining_secs, "tick");
                self.notify();
            }
            TimerEventKind::Expired => {
                self.active = None;
                self.timer.cancel(event.handle);
                self.state.time_remaining_secs = 0;
                self.state.phase = Phase::Ended;
                let final_score = self.state.score;
                info!(final_score, "session ended");
                self.events.push(SessionEvent::Ended { final_score });
                self.reset();
            }
        }
    }

    pub fn view(&self) -> SessionView {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn has_active_timer(&self) -> bool {
        self.active.is_some()
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Drain notifications accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn arm(&mut self, duration_secs: u32) {
        // one live countdown per controller
        self.disarm();
        self.active = Some(self.timer.arm(duration_secs, self.config.tick_secs));
    }

    fn disarm(&mut self) {
        if let Some(handle) = self.active.take() {
            self.timer.cancel(handle);
        }
    }

    fn notify(&mut self) {
        self.events.push(SessionEvent::Changed(self.state));
    }
}
