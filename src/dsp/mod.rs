// Purpose: low-level, allocation-free building blocks for voice rendering.
// Everything here is per-sample or per-block math; lifecycle lives in voice/.

pub mod envelope;
pub mod filter;
pub mod oscillator;
