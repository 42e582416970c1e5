pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use timefighter::{timer::TimerService, Phase};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const YELLOW_THRESHOLD_SECS: u32 = 10;
const RED_THRESHOLD_SECS: u32 = 3;

impl<T: TimerService> Widget for &App<T> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let view = self.view;

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let time_style = match view.time_remaining_secs {
            t if view.phase == Phase::Running && t <= RED_THRESHOLD_SECS => {
                bold_style.fg(Color::Red)
            }
            t if view.phase == Phase::Running && t <= YELLOW_THRESHOLD_SECS => {
                bold_style.fg(Color::Yellow)
            }
            _ => bold_style,
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // score
                Constraint::Length(1), // time left
                Constraint::Min(1),
                Constraint::Length(5), // button
                Constraint::Min(1),
                Constraint::Length(1), // toast
                Constraint::Length(1), // help
            ])
            .split(area);

        Paragraph::new(Span::styled(
            format!("Your score: {}", view.score),
            bold_style.fg(Color::Green),
        ))
        .render(chunks[0], buf);

        Paragraph::new(Span::styled(
            format!("Time left: {}", view.time_remaining_secs),
            time_style,
        ))
        .alignment(Alignment::Right)
        .render(chunks[1], buf);

        let button_label = match view.phase {
            Phase::Idle => "TAP ME TO START",
            _ => "TAP ME",
        };
        let button_area = centered(chunks[3], 24);
        Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(button_label, bold_style.fg(Color::Magenta))),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(button_area, buf);

        if let Some(toast) = &self.toast {
            Paragraph::new(Span::styled(
                toast.message.as_str(),
                bold_style.fg(Color::Cyan),
            ))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
        }

        Paragraph::new(Span::styled(
            "(space) tap / (r)eset / (?) about / (esc)ape",
            italic_style.patch(dim_style),
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[6], buf);
    }
}

/// Modal with the game's name and version, drawn over whatever is below
pub struct AboutDialog;

impl Widget for AboutDialog {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered(
            Rect {
                y: area.y + area.height.saturating_sub(7) / 2,
                height: 7.min(area.height),
                ..area
            },
            52,
        );

        Clear.render(popup, buf);
        Paragraph::new(vec![
            Line::from("Tap as many times as you can before the"),
            Line::from("clock hits zero. When time runs out your"),
            Line::from("score is shown and a new round is ready."),
            Line::from(""),
            Line::from(Span::styled(
                "press any key to close",
                Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
            )),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Timefighter {} ", env!("CARGO_PKG_VERSION")))
                .title_alignment(Alignment::Center),
        )
        .render(popup, buf);
    }
}

fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}
