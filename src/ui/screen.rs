use ratatui::Frame;
use timefighter::timer::TimerService;

use crate::{ui::AboutDialog, App, AppState};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen<T: TimerService> {
    fn render(&self, app: &App<T>, f: &mut Frame);
}

/// Score, countdown and the tap button
pub struct PlayScreen;

impl<T: TimerService> Screen<T> for PlayScreen {
    fn render(&self, app: &App<T>, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// The play screen with the about dialog on top
pub struct AboutScreen;

impl<T: TimerService> Screen<T> for AboutScreen {
    fn render(&self, app: &App<T>, f: &mut Frame) {
        f.render_widget(app, f.area());
        f.render_widget(AboutDialog, f.area());
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen<T: TimerService>(state: &AppState) -> Box<dyn Screen<T>> {
    match state {
        AppState::Playing => Box::new(PlayScreen),
        AppState::About => Box::new(AboutScreen),
    }
}
