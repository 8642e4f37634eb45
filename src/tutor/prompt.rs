//! Prompt construction and reply decoding over an abstract text model.
//!
//! [`JsonTutor`] speaks to any backend that can complete text. It builds the
//! prompts, constrains note choices to the instrument's palette, and decodes
//! the structured replies with serde_json. Transport is someone else's
//! problem; so is failure — a malformed reply is just a `TutorError` that
//! the service layer swaps for a fallback.

use crate::instrument::Instrument;
use crate::notes::Note;
use crate::session::{Review, Tutorial};

use super::{fallback, Tutor, TutorError};

const SYSTEM_INSTRUCTION: &str = "You are Maestro Spark, a friendly, encouraging, and highly \
knowledgeable music tutor. Provide short, inspiring tips on how to play better, theory bits, \
or fun facts. Keep responses under 3 sentences unless asked for complex theory.";

/// Minimal text-completion backend: system instruction + prompt in, raw text
/// out. The one seam a real network client would fill.
pub trait TextModel: Send {
    fn complete(&mut self, system: &str, prompt: &str) -> Result<String, TutorError>;
}

pub struct JsonTutor<M: TextModel> {
    model: M,
}

impl<M: TextModel> JsonTutor<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

impl<M: TextModel> Tutor for JsonTutor<M> {
    fn review_recording(
        &mut self,
        instrument: Instrument,
        notes: &[Note],
    ) -> Result<Review, TutorError> {
        let played = join_notes(notes);
        let prompt = format!(
            "The student just recorded a performance on the {}. They played these notes: {}. \
             Analyze this loosely (it's a learner) and reply as JSON with fields \
             badgeName, feedback (2 sentences), and starRating (0-5).",
            instrument.label(),
            played,
        );
        let reply = self.model.complete(SYSTEM_INSTRUCTION, &prompt)?;
        Ok(serde_json::from_str(strip_code_fence(&reply))?)
    }

    fn generate_tutorial(
        &mut self,
        instrument: Instrument,
        song_name: Option<&str>,
        genre: &str,
    ) -> Result<Tutorial, TutorError> {
        let palette = instrument.palette().join(", ");
        let prompt = match song_name {
            Some(song) => format!(
                "Generate a tutorial for the song \"{song}\" in a {genre} style played on the {}. \
                 Translate the melody into a sequence of notes, adapting it to the genre. \
                 Use ONLY these exact note names: {palette}. Include enough notes to make the \
                 main melody recognizable (up to 32 notes). Reply as JSON with fields title and \
                 steps, each step an object with note and an optional label.",
                instrument.label(),
            ),
            None => format!(
                "Generate a beginner 5-8 note melody tutorial for the {} in the style of {genre} \
                 music. Use ONLY these exact note names: {palette}. Give the melody a fun name. \
                 Reply as JSON with fields title and steps, each step an object with note and an \
                 optional label.",
                instrument.label(),
            ),
        };
        let reply = self.model.complete(SYSTEM_INSTRUCTION, &prompt)?;
        Ok(serde_json::from_str(strip_code_fence(&reply))?)
    }

    fn chat(&mut self, prompt: &str, instrument: Instrument) -> Result<String, TutorError> {
        let system = format!(
            "{SYSTEM_INSTRUCTION} The student is currently playing the {}.",
            instrument.label()
        );
        let reply = self.model.complete(&system, prompt)?;
        let reply = reply.trim();
        if reply.is_empty() {
            Ok(fallback::empty_chat_reply().to_string())
        } else {
            Ok(reply.to_string())
        }
    }
}

fn join_notes(notes: &[Note]) -> String {
    notes
        .iter()
        .map(Note::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Models love wrapping JSON in markdown fences; tolerate that.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedModel {
        reply: String,
    }

    impl TextModel for CannedModel {
        fn complete(&mut self, _system: &str, _prompt: &str) -> Result<String, TutorError> {
            Ok(self.reply.clone())
        }
    }

    struct DeadModel;

    impl TextModel for DeadModel {
        fn complete(&mut self, _system: &str, _prompt: &str) -> Result<String, TutorError> {
            Err(TutorError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn decodes_a_review_reply() {
        let mut tutor = JsonTutor::new(CannedModel {
            reply: r#"{"badgeName":"Melody Weaver","feedback":"Lovely phrasing. Keep going!","starRating":4}"#
                .to_string(),
        });
        let review = tutor
            .review_recording(Instrument::Piano, &[Note::from("C4")])
            .unwrap();
        assert_eq!(review.badge_name, "Melody Weaver");
        assert_eq!(review.star_rating, 4);
    }

    #[test]
    fn decodes_a_fenced_tutorial_reply() {
        let mut tutor = JsonTutor::new(CannedModel {
            reply: "```json\n{\"title\":\"Tiny Waltz\",\"steps\":[{\"note\":\"C4\"},{\"note\":\"E4\"}]}\n```"
                .to_string(),
        });
        let tutorial = tutor
            .generate_tutorial(Instrument::Piano, None, "Classical")
            .unwrap();
        assert_eq!(tutorial.title, "Tiny Waltz");
        assert_eq!(tutorial.steps.len(), 2);
    }

    #[test]
    fn malformed_reply_is_an_error() {
        let mut tutor = JsonTutor::new(CannedModel {
            reply: "sorry, I can only answer in prose".to_string(),
        });
        let result = tutor.generate_tutorial(Instrument::Harp, Some("Greensleeves"), "Folk");
        assert!(matches!(result, Err(TutorError::Malformed(_))));
    }

    #[test]
    fn dead_backend_is_an_error() {
        let mut tutor = JsonTutor::new(DeadModel);
        let result = tutor.review_recording(Instrument::Violin, &[]);
        assert!(matches!(result, Err(TutorError::Unavailable(_))));
    }

    #[test]
    fn empty_chat_reply_gets_the_canned_line() {
        let mut tutor = JsonTutor::new(CannedModel {
            reply: "   ".to_string(),
        });
        let reply = tutor.chat("any tips?", Instrument::Chimes).unwrap();
        assert_eq!(reply, fallback::empty_chat_reply());
    }
}
