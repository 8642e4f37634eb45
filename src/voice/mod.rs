// Purpose: note-to-voice lifecycle. At most one live voice per note name,
// retrigger debounce, release reaping, and block mixing for the audio callback.

mod drums;
mod tone;

pub use drums::OneShot;
pub use tone::SustainedVoice;

use std::collections::HashMap;
use std::time::Instant;

use log::debug;

use crate::instrument::Instrument;
use crate::notes::Note;
use crate::{DEBOUNCE, MASTER_GAIN};

/// Owns every sounding voice and the one rule that matters: a note name maps
/// to at most one live sustained voice at any time.
///
/// Mutation (start/stop) happens on the event thread; rendering happens on
/// the audio callback. The caller shares the manager behind an `Arc<Mutex>`,
/// which is the only synchronization the single-mutator design needs.
pub struct VoiceManager {
    sample_rate: f32,
    voices: HashMap<Note, SustainedVoice>,
    one_shots: Vec<OneShot>,
    last_triggered: HashMap<Note, Instant>,
}

impl VoiceManager {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            voices: HashMap::new(),
            one_shots: Vec::new(),
            last_triggered: HashMap::new(),
        }
    }

    /// The output device's rate may differ from the default; the audio setup
    /// calls this once the stream config is known.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    pub fn start_note(&mut self, instrument: Instrument, note: Note) {
        self.start_note_at(instrument, note, Instant::now());
    }

    pub fn stop_note(&mut self, note: &Note) {
        self.stop_note_at(note, Instant::now());
    }

    /// Clock-explicit variant of [`Self::start_note`]; tests drive this
    /// directly to exercise the debounce and release windows.
    pub fn start_note_at(&mut self, instrument: Instrument, note: Note, now: Instant) {
        // Duplicate hardware/UI events for one physical press arrive within
        // a couple of milliseconds; anything inside the window is the same press.
        if let Some(&last) = self.last_triggered.get(&note) {
            if now.duration_since(last) < DEBOUNCE {
                return;
            }
        }
        self.last_triggered.insert(note.clone(), now);

        if instrument == Instrument::Drums {
            match OneShot::from_label(&note) {
                Some(shot) => self.one_shots.push(shot),
                None => debug!("no drum recipe for label {note}"),
            }
            return;
        }

        // A voice whose release has run out may still be in the map if no
        // render pass has pruned it yet; treat it as gone.
        if let Some(existing) = self.voices.get(&note) {
            if existing.is_dead(now) {
                self.voices.remove(&note);
            } else {
                return;
            }
        }

        let Some(timbre) = instrument.timbre() else {
            return;
        };
        let voice = SustainedVoice::start(timbre, note.frequency());
        self.voices.insert(note, voice);
    }

    /// Clock-explicit variant of [`Self::stop_note`].
    pub fn stop_note_at(&mut self, note: &Note, now: Instant) {
        let Some(voice) = self.voices.get_mut(note) else {
            return;
        };
        if voice.is_releasing() {
            return;
        }
        voice.release(self.sample_rate, now);
    }

    /// Release every sustained voice, e.g. when the instrument switches.
    pub fn stop_all(&mut self) {
        let now = Instant::now();
        for voice in self.voices.values_mut() {
            voice.release(self.sample_rate, now);
        }
    }

    /// Mix all live voices into `out` (mono) and prune the finished ones.
    /// Runs on the audio callback.
    pub fn render_block(&mut self, out: &mut [f32]) {
        let sample_rate = self.sample_rate;
        out.fill(0.0);

        for voice in self.voices.values_mut() {
            for sample in out.iter_mut() {
                *sample += voice.next_sample(sample_rate);
            }
        }
        for shot in &mut self.one_shots {
            for sample in out.iter_mut() {
                *sample += shot.next_sample(sample_rate);
            }
        }

        for sample in out.iter_mut() {
            *sample *= MASTER_GAIN;
        }

        let now = Instant::now();
        self.voices.retain(|_, v| !v.is_dead(now));
        self.one_shots.retain(|s| !s.is_finished());
    }

    pub fn is_note_active(&self, note: &Note) -> bool {
        self.voices.contains_key(note)
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn active_one_shots(&self) -> usize {
        self.one_shots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn manager() -> VoiceManager {
        VoiceManager::new(SAMPLE_RATE)
    }

    fn c4() -> Note {
        Note::from("C4")
    }

    #[test]
    fn one_voice_per_note() {
        let mut vm = manager();
        let t0 = Instant::now();
        vm.start_note_at(Instrument::Piano, c4(), t0);
        vm.start_note_at(Instrument::Piano, c4(), t0 + Duration::from_millis(100));
        assert_eq!(vm.active_voices(), 1);
    }

    #[test]
    fn debounce_collapses_duplicate_triggers() {
        let mut vm = manager();
        let t0 = Instant::now();
        // Drums bypass the map, so the debounce alone must catch the duplicate.
        vm.start_note_at(Instrument::Drums, Note::from("kick"), t0);
        vm.start_note_at(
            Instrument::Drums,
            Note::from("kick"),
            t0 + Duration::from_millis(10),
        );
        assert_eq!(vm.active_one_shots(), 1);

        vm.start_note_at(
            Instrument::Drums,
            Note::from("kick"),
            t0 + Duration::from_millis(40),
        );
        assert_eq!(vm.active_one_shots(), 2);
    }

    #[test]
    fn stop_without_voice_is_noop() {
        let mut vm = manager();
        vm.stop_note(&c4());
        assert_eq!(vm.active_voices(), 0);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut vm = manager();
        let t0 = Instant::now();
        vm.start_note_at(Instrument::Piano, c4(), t0);
        vm.stop_note_at(&c4(), t0 + Duration::from_millis(50));
        vm.stop_note_at(&c4(), t0 + Duration::from_millis(60));
        assert_eq!(vm.active_voices(), 1); // still releasing, still singular
    }

    #[test]
    fn restart_after_release_window_makes_a_fresh_voice() {
        let mut vm = manager();
        let t0 = Instant::now();
        vm.start_note_at(Instrument::Piano, c4(), t0);
        vm.stop_note_at(&c4(), t0 + Duration::from_millis(30));

        // Inside the release window the note is still live: no new voice.
        vm.start_note_at(Instrument::Piano, c4(), t0 + Duration::from_millis(60));
        assert_eq!(vm.active_voices(), 1);

        // Past the window the old voice is dead and a new one replaces it.
        vm.start_note_at(Instrument::Piano, c4(), t0 + Duration::from_millis(300));
        assert_eq!(vm.active_voices(), 1);
        assert!(vm.is_note_active(&c4()));
        // The replacement is fresh, not the released one.
        let held = vm.voices.get(&c4()).unwrap();
        assert!(!held.is_releasing());
    }

    #[test]
    fn unknown_drum_label_is_ignored() {
        let mut vm = manager();
        vm.start_note(Instrument::Drums, Note::from("gong"));
        assert_eq!(vm.active_one_shots(), 0);
        assert_eq!(vm.active_voices(), 0);
    }

    #[test]
    fn unknown_pitch_still_sounds() {
        let mut vm = manager();
        vm.start_note(Instrument::Harp, Note::from("Z9"));
        assert_eq!(vm.active_voices(), 1);
    }

    #[test]
    fn render_prunes_finished_one_shots() {
        let mut vm = manager();
        vm.start_note(Instrument::Drums, Note::from("hihat"));
        assert_eq!(vm.active_one_shots(), 1);

        let mut block = vec![0.0f32; 1024];
        // 0.05 s decay at 48 kHz is 2400 samples; render past it.
        for _ in 0..4 {
            vm.render_block(&mut block);
        }
        assert_eq!(vm.active_one_shots(), 0);
    }

    #[test]
    fn render_output_is_bounded() {
        let mut vm = manager();
        vm.start_note(Instrument::Piano, c4());
        vm.start_note(Instrument::Drums, Note::from("kick"));
        let mut block = vec![0.0f32; 512];
        vm.render_block(&mut block);
        assert!(block.iter().any(|s| s.abs() > 0.0));
        assert!(block.iter().all(|s| s.abs() <= 2.0));
    }
}
