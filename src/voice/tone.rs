//! Sustained melodic voice: one oscillator shaped by one gate envelope.

use std::time::{Duration, Instant};

use crate::dsp::envelope::GateEnvelope;
use crate::dsp::oscillator::Oscillator;
use crate::instrument::Timbre;
use crate::RELEASE_SECS;

/// Grace period after the release window before a voice is reaped, covering
/// the exponential tail.
const RELEASE_TAIL: Duration = Duration::from_millis(200);

pub struct SustainedVoice {
    osc: Oscillator,
    env: GateEnvelope,
    frequency: f32,
    released_at: Option<Instant>,
}

impl SustainedVoice {
    pub fn start(timbre: Timbre, frequency: f32) -> Self {
        let mut env = GateEnvelope::new(timbre.attack, timbre.peak_gain, RELEASE_SECS);
        env.note_on();
        Self {
            osc: Oscillator::new(timbre.waveform),
            env,
            frequency,
            released_at: None,
        }
    }

    /// Begin the release ramp. Harmless on a voice already released.
    pub fn release(&mut self, sample_rate: f32, now: Instant) {
        if self.released_at.is_none() {
            self.released_at = Some(now);
        }
        self.env.note_off(sample_rate);
    }

    pub fn is_releasing(&self) -> bool {
        self.released_at.is_some()
    }

    /// True once the voice can be dropped: its envelope went idle, or its
    /// release window (plus tail) has elapsed without a render pass.
    pub fn is_dead(&self, now: Instant) -> bool {
        if !self.env.is_active() {
            return true;
        }
        match self.released_at {
            Some(at) => now.duration_since(at) >= RELEASE_TAIL,
            None => false,
        }
    }

    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        self.osc.next_sample(self.frequency, sample_rate) * self.env.next_sample(sample_rate)
    }
}
