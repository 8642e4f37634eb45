pub mod dsp;
pub mod input; // Keyboard/pointer/MIDI normalization
pub mod instrument;
pub mod notes;
pub mod session; // Recording and tutorial state machines
pub mod tutor; // Generative collaborator (reviews, lessons, chat)
pub mod voice; // Voice lifecycle and mixing

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;

/// Retrigger guard: a second start for the same note inside this window is
/// treated as a duplicate of one physical press.
pub const DEBOUNCE: std::time::Duration = std::time::Duration::from_millis(20);

/// Note-up release ramp length in seconds.
pub const RELEASE_SECS: f32 = 0.15;

/// Process-wide output gain applied after voice mixing.
pub const MASTER_GAIN: f32 = 0.5;
