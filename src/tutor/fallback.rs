//! Deterministic stand-ins for every collaborator operation.
//!
//! The app must stay fully playable with the collaborator offline; these are
//! the values that keep it so. They are fixed on purpose — a predictable
//! canned lesson beats a surprising error.

use crate::instrument::Instrument;
use crate::session::{Review, Tutorial, TutorialStep};

/// Steps in the fallback lesson.
const FALLBACK_STEPS: usize = 5;

pub fn review() -> Review {
    Review {
        badge_name: "Rising Star".to_string(),
        feedback: "Wonderful performance! Your dedication to music is inspiring.".to_string(),
        star_rating: 5,
    }
}

/// A short walk up the instrument's palette, titled after the requested song
/// when there was one.
pub fn tutorial(instrument: Instrument, song_name: Option<&str>) -> Tutorial {
    Tutorial {
        title: song_name.unwrap_or("Simple Scale").to_string(),
        steps: instrument
            .palette_notes()
            .into_iter()
            .take(FALLBACK_STEPS)
            .map(|note| TutorialStep { note, label: None })
            .collect(),
    }
}

pub fn chat_reply() -> &'static str {
    "I'm having trouble connecting to the musical heavens right now. Let's keep playing!"
}

/// Used when the model answers but says nothing.
pub fn empty_chat_reply() -> &'static str {
    "I'm momentarily lost in thought! Let's keep practicing."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_tutorial_uses_the_palette() {
        let t = tutorial(Instrument::Chimes, None);
        assert_eq!(t.title, "Simple Scale");
        assert_eq!(t.steps.len(), FALLBACK_STEPS);
        for step in &t.steps {
            assert!(Instrument::Chimes.palette().contains(&step.note.name()));
        }
    }

    #[test]
    fn fallback_tutorial_keeps_the_song_title() {
        let t = tutorial(Instrument::Piano, Some("Ode to Joy"));
        assert_eq!(t.title, "Ode to Joy");
    }

    #[test]
    fn drums_fallback_fits_three_pads() {
        let t = tutorial(Instrument::Drums, None);
        assert_eq!(t.steps.len(), 3);
    }
}
