//! Percussion one-shots.
//!
//! Three fixed recipes, one per drum pad. Each is self-terminating: it plays
//! its decay and reports finished, so it never occupies the sustained-voice
//! map and never needs a note-up.
//!
//! - kick: sine with an exponential pitch sweep 150 Hz down toward silence,
//!   full-level amplitude decay over half a second
//! - snare: white-noise burst band-passed around 3 kHz, tenth-of-a-second decay
//! - hihat: 10 kHz square burst, twentieth-of-a-second decay

use crate::dsp::envelope::DecayEnvelope;
use crate::dsp::filter::BandPass;
use crate::dsp::oscillator::{Oscillator, Waveform};
use crate::notes::Note;

const KICK_START_HZ: f32 = 150.0;
const HIHAT_HZ: f32 = 10_000.0;

pub enum OneShot {
    Kick {
        osc: Oscillator,
        pitch: DecayEnvelope,
        amp: DecayEnvelope,
    },
    Snare {
        osc: Oscillator,
        rattle: BandPass,
        amp: DecayEnvelope,
    },
    Hihat {
        osc: Oscillator,
        amp: DecayEnvelope,
    },
}

impl OneShot {
    /// Recipe for a drum pad label; `None` for labels no pad produces.
    pub fn from_label(note: &Note) -> Option<Self> {
        match note.name() {
            "kick" => Some(OneShot::Kick {
                osc: Oscillator::new(Waveform::Sine),
                pitch: DecayEnvelope::new(1.0, 0.5),
                amp: DecayEnvelope::new(1.0, 0.5),
            }),
            "snare" => Some(OneShot::Snare {
                osc: Oscillator::new(Waveform::Noise),
                rattle: BandPass::new(3_000.0),
                amp: DecayEnvelope::new(0.5, 0.1),
            }),
            "hihat" => Some(OneShot::Hihat {
                osc: Oscillator::new(Waveform::Square),
                amp: DecayEnvelope::new(0.1, 0.05),
            }),
            _ => None,
        }
    }

    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        match self {
            OneShot::Kick { osc, pitch, amp } => {
                let frequency = KICK_START_HZ * pitch.next_sample(sample_rate);
                osc.next_sample(frequency, sample_rate) * amp.next_sample(sample_rate)
            }
            OneShot::Snare { osc, rattle, amp } => {
                let noise = osc.next_sample(0.0, sample_rate);
                rattle.next_sample(noise, sample_rate) * amp.next_sample(sample_rate)
            }
            OneShot::Hihat { osc, amp } => {
                osc.next_sample(HIHAT_HZ, sample_rate) * amp.next_sample(sample_rate)
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            OneShot::Kick { amp, .. }
            | OneShot::Snare { amp, .. }
            | OneShot::Hihat { amp, .. } => amp.is_finished(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    #[test]
    fn labels_map_to_recipes() {
        assert!(OneShot::from_label(&Note::from("kick")).is_some());
        assert!(OneShot::from_label(&Note::from("snare")).is_some());
        assert!(OneShot::from_label(&Note::from("hihat")).is_some());
        assert!(OneShot::from_label(&Note::from("cowbell")).is_none());
        assert!(OneShot::from_label(&Note::from("C4")).is_none());
    }

    #[test]
    fn one_shots_terminate_on_their_own() {
        for label in ["kick", "snare", "hihat"] {
            let mut shot = OneShot::from_label(&Note::from(label)).unwrap();
            // Longest recipe is the 0.5 s kick
            for _ in 0..(SAMPLE_RATE as usize) {
                shot.next_sample(SAMPLE_RATE);
            }
            assert!(shot.is_finished(), "{label} should have finished");
        }
    }

    #[test]
    fn hihat_is_shorter_than_kick() {
        let mut hihat = OneShot::from_label(&Note::from("hihat")).unwrap();
        let mut kick = OneShot::from_label(&Note::from("kick")).unwrap();
        for _ in 0..((0.1 * SAMPLE_RATE) as usize) {
            hihat.next_sample(SAMPLE_RATE);
            kick.next_sample(SAMPLE_RATE);
        }
        assert!(hihat.is_finished());
        assert!(!kick.is_finished());
    }
}
