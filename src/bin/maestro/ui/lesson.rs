//! Lesson strip - current tutorial title, progress, and next target.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::View;

pub fn render_lesson(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default().title(" Lesson ").borders(Borders::ALL);

    let line = if view.pending_lesson {
        Line::from(Span::styled(
            " Composing your lesson...",
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(lesson) = &view.lesson {
        let target = view
            .target
            .as_ref()
            .map(|n| n.name().to_string())
            .unwrap_or_default();
        let hint = lesson
            .label
            .as_ref()
            .map(|l| format!(" ({l})"))
            .unwrap_or_default();
        Line::from(vec![
            Span::styled(
                format!(" {}  ", lesson.title),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!("step {}/{}  ", lesson.step + 1, lesson.total),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                format!("play: {target}{hint}"),
                Style::default().fg(Color::Yellow),
            ),
        ])
    } else {
        Line::from(Span::styled(
            " No lesson. F2 for a surprise, F3 to request a song.",
            Style::default().fg(Color::DarkGray),
        ))
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
}
