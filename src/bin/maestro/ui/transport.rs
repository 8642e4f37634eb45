//! Transport bar - recording state, take count, MIDI device.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::View;

pub fn render_transport(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default().title(" maestro ").borders(Borders::ALL);

    let record_span = if view.recording {
        Span::styled("● REC  ", Style::default().fg(Color::Red))
    } else {
        Span::styled("○ idle  ", Style::default().fg(Color::DarkGray))
    };

    let midi_span = match &view.midi_port {
        Some(name) => Span::styled(
            format!("MIDI: {name}  "),
            Style::default().fg(Color::Green),
        ),
        None => Span::styled("MIDI: none  ", Style::default().fg(Color::DarkGray)),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {}  ", view.instrument.label()),
            Style::default().fg(Color::Cyan),
        ),
        record_span,
        Span::styled(
            format!("Takes: {}  ", view.takes),
            Style::default().fg(Color::White),
        ),
        midi_span,
        Span::styled(
            format!("Genre: {}", view.genre),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
