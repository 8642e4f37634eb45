//! maestro - terminal music studio
//!
//! Run with: cargo run
//!
//! Play the on-screen instrument with your keyboard or mouse, plug in a MIDI
//! keyboard if you have one, record takes, and let the tutor hand out lessons
//! and reviews.

mod app;
mod ui;

use app::App;

fn main() -> color_eyre::Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let mut terminal = ratatui::init();
    let result = App::new().run(&mut terminal);
    ratatui::restore();
    result
}
