// Purpose: the generative collaborator. Everything the app asks an AI for —
// performance reviews, lesson generation, chat replies — goes through the
// `Tutor` trait, degrades to deterministic fallbacks on any failure, and
// reaches the caller through a polled, generation-tagged service.

pub mod fallback;
mod prompt;
pub mod service;

pub use prompt::{JsonTutor, TextModel};
pub use service::{
    DirectLink, Generation, TutorLink, TutorReply, TutorRequest, TutorResponse, TutorService,
};

use thiserror::Error;

use crate::instrument::Instrument;
use crate::notes::Note;
use crate::session::{Review, Tutorial};

#[derive(Debug, Error)]
pub enum TutorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("malformed collaborator reply: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The three operations the generative collaborator offers.
///
/// Implementations may fail freely; every call site replaces errors with the
/// fallbacks in [`fallback`], so a failing tutor only costs personalization.
pub trait Tutor: Send {
    fn review_recording(
        &mut self,
        instrument: Instrument,
        notes: &[Note],
    ) -> Result<Review, TutorError>;

    fn generate_tutorial(
        &mut self,
        instrument: Instrument,
        song_name: Option<&str>,
        genre: &str,
    ) -> Result<Tutorial, TutorError>;

    fn chat(&mut self, prompt: &str, instrument: Instrument) -> Result<String, TutorError>;
}

/// A tutor with no backend at all: every operation yields its fallback.
/// This is what the app runs on when no text model is configured.
pub struct OfflineTutor;

impl Tutor for OfflineTutor {
    fn review_recording(
        &mut self,
        _instrument: Instrument,
        _notes: &[Note],
    ) -> Result<Review, TutorError> {
        Ok(fallback::review())
    }

    fn generate_tutorial(
        &mut self,
        instrument: Instrument,
        song_name: Option<&str>,
        _genre: &str,
    ) -> Result<Tutorial, TutorError> {
        Ok(fallback::tutorial(instrument, song_name))
    }

    fn chat(&mut self, _prompt: &str, _instrument: Instrument) -> Result<String, TutorError> {
        Ok(fallback::chat_reply().to_string())
    }
}
