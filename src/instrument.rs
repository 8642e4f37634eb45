//! The five playable instruments and their data tables.
//!
//! Timbre selection is data-driven: each melodic instrument maps to a
//! waveform, attack ramp, and peak gain. Drums are the odd one out — their
//! sounds are fixed one-shot recipes keyed by label (see [`crate::voice`]).

use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;
use crate::notes::Note;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    Piano,
    Drums,
    Violin,
    Harp,
    Chimes,
}

pub const ALL_INSTRUMENTS: [Instrument; 5] = [
    Instrument::Piano,
    Instrument::Drums,
    Instrument::Violin,
    Instrument::Harp,
    Instrument::Chimes,
];

/// How a melodic instrument shapes its sustained voices.
#[derive(Debug, Clone, Copy)]
pub struct Timbre {
    pub waveform: Waveform,
    /// Linear attack ramp, seconds.
    pub attack: f32,
    /// Gain the attack ramps up to.
    pub peak_gain: f32,
}

impl Instrument {
    pub fn label(&self) -> &'static str {
        match self {
            Instrument::Piano => "Piano",
            Instrument::Drums => "Drums",
            Instrument::Violin => "Violin",
            Instrument::Harp => "Harp",
            Instrument::Chimes => "Chimes",
        }
    }

    /// Timbre for sustained voices. `None` for drums, whose sounds are
    /// one-shot recipes rather than sustained tones.
    pub fn timbre(&self) -> Option<Timbre> {
        let t = match self {
            Instrument::Piano => Timbre {
                waveform: Waveform::Triangle,
                attack: 0.02,
                peak_gain: 0.4,
            },
            Instrument::Violin => Timbre {
                waveform: Waveform::Saw,
                attack: 0.08,
                peak_gain: 0.2,
            },
            Instrument::Harp => Timbre {
                waveform: Waveform::Sine,
                attack: 0.01,
                peak_gain: 0.3,
            },
            Instrument::Chimes => Timbre {
                waveform: Waveform::Square,
                attack: 0.01,
                peak_gain: 0.15,
            },
            Instrument::Drums => return None,
        };
        Some(t)
    }

    /// Notes this instrument exposes, in display order. Also the palette the
    /// tutorial generator is allowed to draw from.
    pub fn palette(&self) -> &'static [&'static str] {
        match self {
            Instrument::Piano => &[
                "C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5", "D5", "E5", "F5", "G5", "A5",
                "B5", "C#4", "D#4", "F#4", "G#4", "A#4",
            ],
            Instrument::Drums => &["kick", "snare", "hihat"],
            Instrument::Violin => &["G4", "D4", "A4", "E5"],
            Instrument::Harp => &[
                "C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5", "D5", "E5", "F5", "G5", "A5",
                "B5",
            ],
            Instrument::Chimes => &["C5", "E5", "G5", "B5", "D5", "F5", "A5"],
        }
    }

    pub fn palette_notes(&self) -> Vec<Note> {
        self.palette().iter().map(|n| Note::from(*n)).collect()
    }

    pub fn next(&self) -> Instrument {
        let idx = ALL_INSTRUMENTS.iter().position(|i| i == self).unwrap_or(0);
        ALL_INSTRUMENTS[(idx + 1) % ALL_INSTRUMENTS.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drums_have_no_sustained_timbre() {
        assert!(Instrument::Drums.timbre().is_none());
        for inst in [
            Instrument::Piano,
            Instrument::Violin,
            Instrument::Harp,
            Instrument::Chimes,
        ] {
            assert!(inst.timbre().is_some());
        }
    }

    #[test]
    fn palettes_are_nonempty() {
        for inst in ALL_INSTRUMENTS {
            assert!(!inst.palette().is_empty());
        }
    }

    #[test]
    fn next_cycles_through_all() {
        let mut inst = Instrument::Piano;
        for _ in 0..ALL_INSTRUMENTS.len() {
            inst = inst.next();
        }
        assert_eq!(inst, Instrument::Piano);
    }
}
