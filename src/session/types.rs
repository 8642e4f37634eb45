//! Session data: recordings, tutorials, reviews.
//!
//! `Recording` and `NoteEvent` are immutable once sealed; history is
//! append-only, newest first, and lives only for the process lifetime.

use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use crate::instrument::Instrument;
use crate::notes::Note;

/// One captured note-down. Timestamps are milliseconds relative to the
/// session epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub note: Note,
    pub timestamp_ms: u64,
}

/// A sealed performance. Created only from a non-empty capture buffer or a
/// completed tutorial; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub id: String,
    pub instrument: Instrument,
    pub notes: Vec<NoteEvent>,
    /// Wall clock, milliseconds since the Unix epoch.
    pub created_at_ms: u64,
}

impl Recording {
    pub fn new(instrument: Instrument, notes: Vec<NoteEvent>) -> Self {
        Self {
            id: random_id(),
            instrument,
            notes,
            created_at_ms: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
        }
    }
}

fn random_id() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(9)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialStep {
    pub note: Note,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A generated lesson: an ordered list of target notes. Immutable; progress
/// lives in the session controller, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tutorial {
    pub title: String,
    pub steps: Vec<TutorialStep>,
}

/// The collaborator's verdict on a performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub badge_name: String,
    pub feedback: String,
    #[serde(deserialize_with = "stars_from_number")]
    pub star_rating: u8,
}

/// The wire format sends a bare number; clamp whatever arrives into 0..=5.
fn stars_from_number<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.round().clamp(0.0, 5.0) as u8)
}
