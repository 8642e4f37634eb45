//! Note names and pitch lookup.
//!
//! A [`Note`] is an opaque name: a pitch like `"C4"` or a percussion label
//! like `"kick"`. It is the key of the active-voice map, the payload of every
//! input event, and the unit a tutorial step targets.
//!
//! Pitched lookup covers the two octaves the on-screen instruments label
//! (C4 through B5). Anything outside that table falls back to A4 so an odd
//! note name can never fail a trigger.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pitch returned for names missing from the frequency table.
pub const FALLBACK_HZ: f32 = 440.0;

/// An opaque note name: `"C4"`, `"F#5"`, `"kick"`, ...
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Note(String);

impl Note {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Frequency in Hz, falling back to [`FALLBACK_HZ`] for unknown names.
    pub fn frequency(&self) -> f32 {
        lookup_frequency(&self.0).unwrap_or(FALLBACK_HZ)
    }
}

impl From<&str> for Note {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Equal-tempered frequencies for the displayable two-octave band, A4 = 440.
const FREQUENCIES: &[(&str, f32)] = &[
    ("C4", 261.63),
    ("C#4", 277.18),
    ("D4", 293.66),
    ("D#4", 311.13),
    ("E4", 329.63),
    ("F4", 349.23),
    ("F#4", 369.99),
    ("G4", 392.00),
    ("G#4", 415.30),
    ("A4", 440.00),
    ("A#4", 466.16),
    ("B4", 493.88),
    ("C5", 523.25),
    ("C#5", 554.37),
    ("D5", 587.33),
    ("D#5", 622.25),
    ("E5", 659.25),
    ("F5", 698.46),
    ("F#5", 739.99),
    ("G5", 783.99),
    ("G#5", 830.61),
    ("A5", 880.00),
    ("A#5", 932.33),
    ("B5", 987.77),
];

fn lookup_frequency(name: &str) -> Option<f32> {
    FREQUENCIES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, hz)| *hz)
}

const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Map a MIDI note number into the displayable band.
///
/// The pitch class is kept; the octave is clamped to 4..=5 since that is all
/// the on-screen instruments label.
pub fn midi_to_note(midi: u8) -> Note {
    let class = PITCH_CLASSES[(midi % 12) as usize];
    let octave = (i32::from(midi) / 12 - 1).clamp(4, 5);
    Note::new(format!("{class}{octave}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_c_frequency() {
        assert!((Note::from("C4").frequency() - 261.63).abs() < 1e-3);
    }

    #[test]
    fn a440_reference() {
        assert_eq!(Note::from("A4").frequency(), 440.0);
    }

    #[test]
    fn unknown_name_falls_back() {
        assert_eq!(Note::from("H9").frequency(), FALLBACK_HZ);
        assert_eq!(Note::from("kick").frequency(), FALLBACK_HZ);
    }

    #[test]
    fn midi_maps_into_display_band() {
        // Middle C stays where it is.
        assert_eq!(midi_to_note(60), Note::from("C4"));
        // A0 is pushed up into octave 4.
        assert_eq!(midi_to_note(21), Note::from("A4"));
        // C8 is pulled down into octave 5.
        assert_eq!(midi_to_note(108), Note::from("C5"));
        assert_eq!(midi_to_note(70), Note::from("A#4"));
    }
}
