//! TUI for maestro.
//!
//! The instrument pane doubles as the pointer surface: rendering it yields
//! the hit boxes the app uses for mouse handling, so what you see is exactly
//! what you can click.

mod instrument;
mod lesson;
mod review;
mod transport;

use std::collections::HashSet;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use maestro::instrument::Instrument;
use maestro::notes::Note;
use maestro::session::Review;

use instrument::render_instrument;
use lesson::render_lesson;
use review::render_review;
use transport::render_transport;

/// The active lesson, seen from the renderer.
pub struct LessonView {
    pub title: String,
    pub step: usize,
    pub total: usize,
    pub label: Option<String>,
}

/// Everything the renderer needs for one frame, detached from app state so
/// drawing borrows nothing mutable.
pub struct View {
    pub instrument: Instrument,
    pub genre: &'static str,
    pub recording: bool,
    pub takes: usize,
    pub active_notes: HashSet<Note>,
    pub target: Option<Note>,
    pub lesson: Option<LessonView>,
    pub pending_lesson: bool,
    pub review: Option<Review>,
    pub chat_line: Option<String>,
    pub chat_waiting: bool,
    pub midi_port: Option<String>,
    /// Text-entry prompt: (label, buffer).
    pub entry: Option<(&'static str, String)>,
}

/// Draw one frame. Returns the per-note hit boxes of the instrument pane.
pub fn render(frame: &mut Frame, view: &View) -> Vec<(Rect, Note)> {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // transport
            Constraint::Length(3), // lesson strip
            Constraint::Min(7),    // instrument
            Constraint::Length(3), // chat / text entry
            Constraint::Length(1), // help
        ])
        .split(frame.area());

    render_transport(frame, chunks[0], view);
    render_lesson(frame, chunks[1], view);
    let hit_boxes = render_instrument(frame, chunks[2], view);
    render_chat(frame, chunks[3], view);
    render_help(frame, chunks[4], view);

    // The review card draws last, over everything.
    if let Some(review) = &view.review {
        let area = frame.area();
        render_review(frame, area, review);
    }

    hit_boxes
}

fn render_chat(frame: &mut Frame, area: Rect, view: &View) {
    use ratatui::widgets::{Block, Borders};

    let (title, text, color) = if let Some((label, buffer)) = &view.entry {
        (
            format!(" {label} (Enter to send, Esc to cancel) "),
            format!("{buffer}\u{2588}"),
            Color::White,
        )
    } else if view.chat_waiting {
        (" Tutor ".to_string(), "...".to_string(), Color::DarkGray)
    } else if let Some(line) = &view.chat_line {
        (" Tutor ".to_string(), line.clone(), Color::Cyan)
    } else {
        (
            " Tutor ".to_string(),
            "Press F4 to ask for a tip.".to_string(),
            Color::DarkGray,
        )
    };

    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(color))
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame, area: Rect, view: &View) {
    let help = Paragraph::new(format!(
        " [Tab] Instrument  [Enter] Record  [F2] Lesson  [F3] Song  [F4] Ask  [F6] Genre: {}  [Esc] Quit",
        view.genre
    ))
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, area);
}

/// Center a `width` x `height` box inside `area`, clamped to fit.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
