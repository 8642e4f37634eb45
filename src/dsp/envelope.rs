//! Amplitude envelopes.
//!
//! Two shapes cover everything the instruments need:
//!
//! - [`GateEnvelope`]: note-down ramps linearly up to the instrument's peak
//!   gain over its attack time, holds there while the key is down, and on
//!   note-up decays exponentially over a fixed release window. Exponential
//!   release is what the ear expects from a struck or plucked sound; linear
//!   attack keeps the onset punchy.
//!
//! - [`DecayEnvelope`]: a one-shot exponential decay from a start level down
//!   to silence over a fixed duration. Drum recipes use this; it never
//!   sustains and reports itself finished when the duration elapses.
//!
//! State machine for the gate shape:
//!
//! ```text
//! Idle --note_on--> Attack --(level=peak)--> Sustain
//!   ^                  |                        |
//!   |               note_off                 note_off
//!   |                  v                        v
//!   +----(level~0)--- Release <-----------------+
//! ```
//!
//! note_off starts the release from the CURRENT level, not the peak, so
//! releasing mid-attack cannot click.

use crate::MIN_TIME;

/// Level an exponential release decays toward before the stage ends.
/// A true exponential never reaches zero; below this it is inaudible.
const SILENCE_FLOOR: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStage {
    Idle,
    Attack,
    Sustain,
    Release,
}

pub struct GateEnvelope {
    attack_time: f32,
    peak: f32,
    release_time: f32,

    stage: GateStage,
    level: f32,
    /// Per-sample multiplier during release, computed at note_off.
    release_coeff: f32,
}

impl GateEnvelope {
    pub fn new(attack_time: f32, peak: f32, release_time: f32) -> Self {
        Self {
            attack_time: attack_time.max(MIN_TIME),
            peak: peak.clamp(0.0, 1.0),
            release_time: release_time.max(MIN_TIME),
            stage: GateStage::Idle,
            level: 0.0,
            release_coeff: 1.0,
        }
    }

    /// Gate high: restart the attack from zero.
    pub fn note_on(&mut self) {
        self.level = 0.0;
        self.stage = GateStage::Attack;
    }

    /// Gate low: decay exponentially from the current level.
    ///
    /// Idempotent — calling on an idle or already-releasing envelope changes
    /// nothing, so double note-offs are harmless.
    pub fn note_off(&mut self, sample_rate: f32) {
        if matches!(self.stage, GateStage::Idle | GateStage::Release) {
            return;
        }
        let start = self.level.max(SILENCE_FLOOR);
        let release_samples = (self.release_time * sample_rate).max(1.0);
        // level(n) = start * coeff^n, hitting SILENCE_FLOOR at n = release_samples
        self.release_coeff = (SILENCE_FLOOR / start).powf(1.0 / release_samples);
        self.stage = GateStage::Release;
    }

    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        match self.stage {
            GateStage::Idle => {
                self.level = 0.0;
            }
            GateStage::Attack => {
                let increment = self.peak / (self.attack_time * sample_rate);
                self.level += increment;
                if self.level >= self.peak {
                    self.level = self.peak;
                    self.stage = GateStage::Sustain;
                }
            }
            GateStage::Sustain => {
                self.level = self.peak;
            }
            GateStage::Release => {
                self.level *= self.release_coeff;
                if self.level <= SILENCE_FLOOR {
                    self.level = 0.0;
                    self.stage = GateStage::Idle;
                }
            }
        }
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.stage != GateStage::Idle
    }

    pub fn stage(&self) -> GateStage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }
}

/// One-shot exponential decay: `start_level` down to silence over `duration`.
pub struct DecayEnvelope {
    start_level: f32,
    duration: f32,
    elapsed_samples: u32,
    total_samples: u32,
    started: bool,
}

impl DecayEnvelope {
    pub fn new(start_level: f32, duration: f32) -> Self {
        Self {
            start_level: start_level.clamp(0.0, 1.0),
            duration: duration.max(MIN_TIME),
            elapsed_samples: 0,
            total_samples: 0,
            started: false,
        }
    }

    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        if !self.started {
            self.started = true;
            self.total_samples = (self.duration * sample_rate).round().max(1.0) as u32;
        }
        if self.elapsed_samples >= self.total_samples {
            return 0.0;
        }
        let progress = self.elapsed_samples as f32 / self.total_samples as f32;
        // start * (floor/start)^progress: exponential glide to the floor
        let level = self.start_level
            * (SILENCE_FLOOR / self.start_level.max(SILENCE_FLOOR)).powf(progress);
        self.elapsed_samples += 1;
        level
    }

    pub fn is_finished(&self) -> bool {
        self.started && self.elapsed_samples >= self.total_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn run(env: &mut GateEnvelope, samples: usize) -> f32 {
        let mut last = 0.0;
        for _ in 0..samples {
            last = env.next_sample(SAMPLE_RATE);
        }
        last
    }

    #[test]
    fn attack_reaches_peak_then_sustains() {
        let mut env = GateEnvelope::new(0.02, 0.4, 0.15);
        env.note_on();
        let level = run(&mut env, (0.02 * SAMPLE_RATE) as usize + 2);
        assert!((level - 0.4).abs() < 1e-6);
        assert_eq!(env.stage(), GateStage::Sustain);
    }

    #[test]
    fn release_decays_to_idle() {
        let mut env = GateEnvelope::new(0.01, 0.4, 0.05);
        env.note_on();
        run(&mut env, 20);
        env.note_off(SAMPLE_RATE);
        run(&mut env, (0.05 * SAMPLE_RATE) as usize + 5);
        assert!(!env.is_active());
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn note_off_is_idempotent() {
        let mut env = GateEnvelope::new(0.01, 0.4, 0.05);
        env.note_off(SAMPLE_RATE);
        assert!(!env.is_active());

        env.note_on();
        run(&mut env, 20);
        env.note_off(SAMPLE_RATE);
        let coeff_before = run(&mut env, 3);
        env.note_off(SAMPLE_RATE); // second stop must not restart the ramp
        let after = run(&mut env, 1);
        assert!(after < coeff_before);
    }

    #[test]
    fn release_from_mid_attack_starts_at_current_level() {
        let mut env = GateEnvelope::new(0.1, 1.0, 0.05);
        env.note_on();
        let mid = run(&mut env, 10); // well before the peak
        assert!(mid < 0.5);
        env.note_off(SAMPLE_RATE);
        let next = env.next_sample(SAMPLE_RATE);
        assert!(next <= mid, "release must not jump above the current level");
    }

    #[test]
    fn one_shot_finishes_on_its_own() {
        let mut env = DecayEnvelope::new(1.0, 0.01);
        let mut levels = Vec::new();
        for _ in 0..((0.01 * SAMPLE_RATE) as usize + 2) {
            levels.push(env.next_sample(SAMPLE_RATE));
        }
        assert!(env.is_finished());
        assert!(levels[0] > levels[levels.len() - 2] || levels.last() == Some(&0.0));
    }
}
