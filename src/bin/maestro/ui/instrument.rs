//! Instrument pane - one clickable box per note, with key bindings shown.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use maestro::input::key_map;
use maestro::notes::Note;

use super::View;

/// Minimum width of one note box, borders included.
const MIN_KEY_WIDTH: u16 = 5;
const KEY_HEIGHT: u16 = 5;

/// Render the playable surface and return the hit box of every note.
pub fn render_instrument(frame: &mut Frame, area: Rect, view: &View) -> Vec<(Rect, Note)> {
    let block = Block::default()
        .title(format!(" {} ", view.instrument.label()))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let palette = view.instrument.palette();
    if palette.is_empty() || inner.width < MIN_KEY_WIDTH || inner.height < KEY_HEIGHT {
        return Vec::new();
    }

    let bindings = key_map(view.instrument);
    let per_row = (inner.width / MIN_KEY_WIDTH).max(1) as usize;
    let key_width = inner.width / per_row.min(palette.len()) as u16;

    let mut hit_boxes = Vec::with_capacity(palette.len());
    for (i, name) in palette.iter().enumerate() {
        let row = i / per_row;
        let col = i % per_row;
        let y = inner.y + row as u16 * KEY_HEIGHT;
        if y + KEY_HEIGHT > inner.y + inner.height {
            break; // pane too short for the rest of the palette
        }
        let rect = Rect {
            x: inner.x + col as u16 * key_width,
            y,
            width: key_width,
            height: KEY_HEIGHT,
        };

        let note = Note::from(*name);
        let is_active = view.active_notes.contains(&note);
        let is_target = view.target.as_ref() == Some(&note);

        let style = if is_active {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else if is_target {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else if name.contains('#') {
            Style::default().fg(Color::Magenta)
        } else {
            Style::default().fg(Color::White)
        };

        let binding = bindings
            .iter()
            .find(|(_, n)| n == name)
            .map(|(k, _)| if *k == ' ' { "spc".to_string() } else { k.to_string() })
            .unwrap_or_default();

        let marker = if is_target { "◆" } else { "" };
        let key_block = Block::default().borders(Borders::ALL).style(style);
        let body = Paragraph::new(vec![
            Line::from(marker),
            Line::from(*name),
            Line::from(binding),
        ])
        .centered()
        .block(key_block);
        frame.render_widget(body, rect);

        hit_boxes.push((rect, note));
    }
    hit_boxes
}
