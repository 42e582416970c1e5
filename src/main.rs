pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::{Duration, Instant},
};
use timefighter::{
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    snapshot::{FileSnapshotStore, SnapshotStore},
    telemetry,
    timer::{ThreadTimerService, TimerEvent, TimerService},
    SessionConfig, SessionController, SessionEvent, SessionView,
};
use tracing::{info, warn};

const TICK_RATE_MS: u64 = 100;
// how long the end-of-session message stays up
const TOAST_DURATION: Duration = Duration::from_millis(3500);

/// tap as fast as you can before the clock runs out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timefighter: score a point for every tap before the countdown hits zero. The first tap starts the clock; when time runs out your score is shown and a fresh session is ready."
)]
pub struct Cli {
    /// length of a session in seconds
    #[clap(short = 's', long)]
    secs: Option<u32>,

    /// seconds between countdown updates
    #[clap(short = 't', long)]
    tick: Option<u32>,

    /// ignore the session saved when the game was last quit
    #[clap(long)]
    fresh: bool,

    /// store the effective session settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Playing,
    About,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub shown_at: Instant,
}

impl Toast {
    fn new(message: String) -> Self {
        Self {
            message,
            shown_at: Instant::now(),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= TOAST_DURATION
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum KeyOutcome {
    Continue,
    Quit,
}

pub struct App<T: TimerService> {
    pub session: SessionController<T>,
    pub view: SessionView,
    pub state: AppState,
    pub toast: Option<Toast>,
}

impl<T: TimerService> App<T> {
    pub fn new(session: SessionController<T>) -> Self {
        Self {
            view: session.view(),
            session,
            state: AppState::Playing,
            toast: None,
        }
    }

    pub fn tap(&mut self) {
        self.session.tap();
        self.sync();
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.sync();
    }

    pub fn on_timer_event(&mut self, event: TimerEvent) {
        self.session.on_timer_event(event);
        self.sync();
    }

    /// Drop the toast once it has been up long enough. Returns true when a
    /// redraw is needed.
    pub fn expire_toast(&mut self, now: Instant) -> bool {
        match &self.toast {
            Some(toast) if toast.is_expired(now) => {
                self.toast = None;
                true
            }
            _ => false,
        }
    }

    /// Fold controller notifications into what the screen shows
    fn sync(&mut self) {
        for event in self.session.take_events() {
            match event {
                SessionEvent::Changed(view) => self.view = view,
                SessionEvent::Ended { final_score } => {
                    self.toast = Some(Toast::new(format!(
                        "Time's up! Your score was {}",
                        final_score
                    )));
                }
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.kind == KeyEventKind::Release {
            return KeyOutcome::Continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }

        match self.state {
            AppState::About => match key.code {
                KeyCode::Char('q') => return KeyOutcome::Quit,
                _ => self.state = AppState::Playing,
            },
            AppState::Playing => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Quit,
                KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('t') => self.tap(),
                KeyCode::Char('r') => self.reset(),
                KeyCode::Char('?') | KeyCode::Char('a') => self.state = AppState::About,
                _ => {}
            },
        }
        KeyOutcome::Continue
    }
}

/// Pick up where the last run left off, falling back to a fresh session
fn resume<T: TimerService, S: SnapshotStore>(app: &mut App<T>, store: &S) {
    match store.load() {
        Ok(Some(snapshot)) => {
            if let Err(e) = app.session.restore(&snapshot) {
                warn!(error = %e, "could not resume saved session");
                app.session.reset();
            }
            if let Err(e) = store.clear() {
                warn!(error = %e, "could not clear saved session");
            }
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "could not read saved session"),
    }
    app.sync();
}

fn suspend<T: TimerService, S: SnapshotStore>(app: &mut App<T>, store: &S) {
    let snapshot = app.session.snapshot();
    match store.save(&snapshot) {
        Ok(()) => info!(?snapshot, "session saved"),
        Err(e) => warn!(error = %e, "could not save session"),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    telemetry::init_tracing(&AppDirs::log_path())?;

    let config_store = FileConfigStore::new();
    let config = config_store.load().with_overrides(cli.secs, cli.tick);
    let session_config = match SessionConfig::try_from(&config) {
        Ok(session_config) => session_config,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, e.to_string()).exit();
        }
    };
    if cli.save_config {
        config_store.save(&config)?;
    }

    let events = CrosstermEventSource::new();
    let timer = ThreadTimerService::new(events.sender());
    let mut app = App::new(SessionController::new(session_config, timer));

    let snapshots = FileSnapshotStore::new();
    if !cli.fresh {
        resume(&mut app, &snapshots);
    }

    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    suspend(&mut app, &snapshots);

    result
}

fn start_tui<B: Backend, E: EventSource, K: Ticker, T: TimerService>(
    terminal: &mut Terminal<B>,
    app: &mut App<T>,
    runner: &Runner<E, K>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        let redraw = match runner.step() {
            AppEvent::Tick => app.expire_toast(Instant::now()),
            AppEvent::Resize => true,
            AppEvent::Timer(event) => {
                app.on_timer_event(event);
                true
            }
            AppEvent::Key(key) => match app.on_key(key) {
                KeyOutcome::Quit => break,
                KeyOutcome::Continue => true,
            },
        };

        if redraw {
            terminal.draw(|f| ui(app, f))?;
        }
    }

    Ok(())
}

fn ui<T: TimerService>(app: &App<T>, f: &mut Frame) {
    ui::screen::current_screen::<T>(&app.state).render(app, f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crossterm::event::KeyEventState;
    use ratatui::{backend::TestBackend, Terminal};
    use tempfile::tempdir;
    use timefighter::{snapshot::Snapshot, timer::ManualTimer, Phase};

    fn app() -> App<ManualTimer> {
        App::new(SessionController::new(
            SessionConfig::default(),
            ManualTimer::new(),
        ))
    }

    fn press(app: &mut App<ManualTimer>, code: KeyCode) -> KeyOutcome {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn run(app: &mut App<ManualTimer>, secs: u32) {
        for event in app.session.timer_mut().advance(secs) {
            app.on_timer_event(event);
        }
    }

    fn rendered(app: &App<ManualTimer>) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(app, f)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["timefighter"]);

        assert_eq!(cli.secs, None);
        assert_eq!(cli.tick, None);
        assert!(!cli.fresh);
        assert!(!cli.save_config);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["timefighter", "-s", "30", "--tick", "2", "--fresh"]);

        assert_eq!(cli.secs, Some(30));
        assert_eq!(cli.tick, Some(2));
        assert!(cli.fresh);
    }

    #[test]
    fn test_space_taps_and_starts() {
        let mut app = app();
        assert_eq!(press(&mut app, KeyCode::Char(' ')), KeyOutcome::Continue);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.view.score, 2);
        assert_eq!(app.view.phase, Phase::Running);
    }

    #[test]
    fn test_view_follows_ticks() {
        let mut app = app();
        press(&mut app, KeyCode::Char('t'));
        run(&mut app, 4);
        assert_eq!(app.view.time_remaining_secs, 56);
    }

    #[test]
    fn test_release_events_are_ignored() {
        let mut app = app();
        app.on_key(KeyEvent {
            code: KeyCode::Char(' '),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert_eq!(app.view.score, 0);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert_eq!(press(&mut app, KeyCode::Esc), KeyOutcome::Quit);
        assert_eq!(press(&mut app, KeyCode::Char('q')), KeyOutcome::Quit);
        assert_eq!(
            app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyOutcome::Quit
        );
    }

    #[test]
    fn test_reset_key_clears_score() {
        let mut app = app();
        for _ in 0..5 {
            press(&mut app, KeyCode::Char(' '));
        }
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.view.score, 0);
        assert_eq!(app.view.phase, Phase::Idle);
    }

    #[test]
    fn test_about_toggles_and_swallows_taps() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.state, AppState::About);
        assert!(rendered(&app).contains(env!("CARGO_PKG_VERSION")));

        // any key closes the dialog without scoring
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.state, AppState::Playing);
        assert_eq!(app.view.score, 0);

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(press(&mut app, KeyCode::Esc), KeyOutcome::Continue);
        assert_eq!(app.state, AppState::Playing);
    }

    #[test]
    fn test_session_end_shows_toast_then_expires() {
        let mut app = app();
        for _ in 0..3 {
            press(&mut app, KeyCode::Char(' '));
        }
        run(&mut app, 60);

        assert_matches!(&app.toast, Some(toast) if toast.message == "Time's up! Your score was 3");
        assert_eq!(app.view.score, 0);
        assert_eq!(app.view.phase, Phase::Idle);
        assert!(rendered(&app).contains("Time's up!"));

        let shown_at = app.toast.as_ref().unwrap().shown_at;
        assert!(!app.expire_toast(shown_at + Duration::from_millis(100)));
        assert!(app.expire_toast(shown_at + TOAST_DURATION));
        assert!(app.toast.is_none());
    }

    #[test]
    fn test_render_shows_score_and_time() {
        let mut app = app();
        press(&mut app, KeyCode::Char(' '));
        run(&mut app, 2);

        let content = rendered(&app);
        assert!(content.contains("Your score: 1"));
        assert!(content.contains("Time left: 58"));
    }

    #[test]
    fn test_suspend_then_resume_continues_countdown() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::with_path(dir.path().join("snapshot.json"));

        let mut first = app();
        press(&mut first, KeyCode::Char(' '));
        press(&mut first, KeyCode::Char(' '));
        run(&mut first, 20);
        suspend(&mut first, &store);
        assert!(!first.session.has_active_timer());

        let mut second = app();
        resume(&mut second, &store);
        assert_eq!(second.view.score, 2);
        assert_eq!(second.view.time_remaining_secs, 40);
        assert_eq!(second.view.phase, Phase::Running);
        assert_eq!(second.session.timer().armed()[0].1, 40);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_resume_falls_back_to_reset_on_bad_snapshot() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::with_path(dir.path().join("snapshot.json"));
        store
            .save(&Snapshot {
                score: 4,
                time_left: 900,
            })
            .unwrap();

        let mut app = app();
        resume(&mut app, &store);
        assert_eq!(app.view.score, 0);
        assert_eq!(app.view.phase, Phase::Idle);
        assert!(!app.session.has_active_timer());
    }
}
