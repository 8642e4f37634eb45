//! Review card - the tutor's verdict, drawn over the whole screen.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use maestro::session::Review;

use super::centered;

pub fn render_review(frame: &mut Frame, area: Rect, review: &Review) {
    let card = centered(area, 46, 9);
    frame.render_widget(Clear, card);

    let stars: String = "★".repeat(review.star_rating as usize)
        + &"☆".repeat(5usize.saturating_sub(review.star_rating as usize));

    let lines = vec![
        Line::styled(
            review.badge_name.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Line::styled(stars, Style::default().fg(Color::Yellow)),
        Line::raw(""),
        Line::raw(review.feedback.clone()),
        Line::raw(""),
        Line::styled("Esc to close", Style::default().fg(Color::DarkGray)),
    ];

    let card_block = Block::default()
        .title(" Performance Review ")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::White));
    let body = Paragraph::new(lines)
        .centered()
        .wrap(Wrap { trim: true })
        .block(card_block);
    frame.render_widget(body, card);
}
