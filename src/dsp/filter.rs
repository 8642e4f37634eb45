//! Band-pass tone shaping for the snare recipe.
//!
//! Two one-pole stages in series: the input minus a low-pass gives the
//! high-pass residue, which is then low-passed again. Both poles share one
//! cutoff, which is all the drum voicing needs.

use std::f32::consts::TAU;

pub struct BandPass {
    cutoff_hz: f32,
    lp_state: f32,
    lp_state2: f32,
}

impl BandPass {
    pub fn new(cutoff_hz: f32) -> Self {
        Self {
            cutoff_hz,
            lp_state: 0.0,
            lp_state2: 0.0,
        }
    }

    #[inline]
    fn alpha(&self, sample_rate: f32) -> f32 {
        // Standard one-pole coefficient: alpha = 1 - e^(-2*pi*fc/sr)
        let x = TAU * self.cutoff_hz / sample_rate.max(1.0);
        1.0 - (-x).exp()
    }

    pub fn next_sample(&mut self, input: f32, sample_rate: f32) -> f32 {
        let alpha = self.alpha(sample_rate);
        self.lp_state += alpha * (input - self.lp_state);
        let hp = input - self.lp_state;
        self.lp_state2 += alpha * (hp - self.lp_state2);
        self.lp_state2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn rms_at(frequency: f32) -> f32 {
        let mut filter = BandPass::new(3_000.0);
        let n = 4_800;
        let mut sum = 0.0;
        for i in 0..n {
            let x = (TAU * frequency * i as f32 / SAMPLE_RATE).sin();
            let y = filter.next_sample(x, SAMPLE_RATE);
            sum += y * y;
        }
        (sum / n as f32).sqrt()
    }

    #[test]
    fn blocks_dc() {
        let mut filter = BandPass::new(3_000.0);
        let mut out = 1.0;
        for _ in 0..10_000 {
            out = filter.next_sample(1.0, SAMPLE_RATE);
        }
        assert!(out.abs() < 1e-2);
    }

    #[test]
    fn centre_of_the_band_passes_more_than_the_edges() {
        let centre = rms_at(3_000.0);
        let low = rms_at(30.0);
        let high = rms_at(20_000.0);
        assert!(centre > 0.1, "band centre should retain energy: {centre}");
        assert!(centre > 2.0 * low);
        assert!(centre > 2.0 * high);
    }
}
