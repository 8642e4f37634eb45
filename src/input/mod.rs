// Purpose: normalize the three input origins (keyboard, pointer, hardware
// MIDI) into uniform (note, down/up) events for the voice manager and the
// session controller. Delivery is synchronous; last event wins, no replay.

pub mod midi;

use std::collections::HashSet;

use crate::instrument::Instrument;
use crate::notes::{midi_to_note, Note};

/// One normalized input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteInput {
    pub note: Note,
    pub is_down: bool,
}

impl NoteInput {
    fn down(note: Note) -> Self {
        Self {
            note,
            is_down: true,
        }
    }

    fn up(note: Note) -> Self {
        Self {
            note,
            is_down: false,
        }
    }
}

/// Static char → note bindings for an instrument's on-screen layout.
pub fn key_map(instrument: Instrument) -> &'static [(char, &'static str)] {
    match instrument {
        Instrument::Piano => &[
            // white keys, home row and below
            ('a', "C4"),
            ('s', "D4"),
            ('d', "E4"),
            ('f', "F4"),
            ('g', "G4"),
            ('h', "A4"),
            ('j', "B4"),
            ('k', "C5"),
            ('l', "D5"),
            (';', "E5"),
            ('\'', "F5"),
            ('z', "G5"),
            ('x', "A5"),
            ('c', "B5"),
            // black keys, row above
            ('w', "C#4"),
            ('e', "D#4"),
            ('t', "F#4"),
            ('y', "G#4"),
            ('u', "A#4"),
            ('o', "C#5"),
            ('p', "D#5"),
            ('[', "F#5"),
            (']', "G#5"),
            ('\\', "A#5"),
        ],
        Instrument::Drums => &[(' ', "kick"), ('s', "snare"), ('h', "hihat")],
        Instrument::Violin => &[('1', "G4"), ('2', "D4"), ('3', "A4"), ('4', "E5")],
        Instrument::Harp => &[
            ('1', "C4"),
            ('2', "D4"),
            ('3', "E4"),
            ('4', "F4"),
            ('5', "G4"),
            ('6', "A4"),
            ('7', "B4"),
            ('8', "C5"),
            ('9', "D5"),
            ('0', "E5"),
            ('-', "F5"),
            ('=', "G5"),
        ],
        Instrument::Chimes => &[
            ('1', "C5"),
            ('2', "E5"),
            ('3', "G5"),
            ('4', "B5"),
            ('5', "D5"),
            ('6', "F5"),
            ('7', "A5"),
        ],
    }
}

/// Routes raw input to normalized [`NoteInput`] events.
///
/// Keyboard repeats are suppressed through a held-keys set: a key fires once
/// per physical press and re-arms on release. MIDI arrives as raw status
/// bytes and is decoded here, with velocity-zero note-ons folded into
/// note-offs the way hardware has abused the message since the 80s.
pub struct InputRouter {
    instrument: Instrument,
    held_keys: HashSet<char>,
}

impl InputRouter {
    pub fn new(instrument: Instrument) -> Self {
        Self {
            instrument,
            held_keys: HashSet::new(),
        }
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    /// Switching instruments drops held state so stale releases from the old
    /// layout cannot fire on the new one.
    pub fn set_instrument(&mut self, instrument: Instrument) {
        self.instrument = instrument;
        self.held_keys.clear();
    }

    pub fn key_down(&mut self, key: char) -> Option<NoteInput> {
        let note = self.lookup(key)?;
        if !self.held_keys.insert(key) {
            return None; // key repeat: already down
        }
        Some(NoteInput::down(note))
    }

    pub fn key_up(&mut self, key: char) -> Option<NoteInput> {
        self.held_keys.remove(&key);
        let note = self.lookup(key)?;
        Some(NoteInput::up(note))
    }

    /// Decode a raw hardware message into a normalized event.
    pub fn midi_message(&mut self, status: u8, note_number: u8, velocity: u8) -> Option<NoteInput> {
        let note = midi_to_note(note_number);
        match status & 0xF0 {
            0x90 if velocity > 0 => Some(NoteInput::down(note)),
            // Note-on with velocity 0 is a note-off in disguise
            0x90 | 0x80 => Some(NoteInput::up(note)),
            _ => None,
        }
    }

    fn lookup(&self, key: char) -> Option<Note> {
        key_map(self.instrument)
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, n)| Note::from(*n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_down_fires_once_per_press() {
        let mut router = InputRouter::new(Instrument::Piano);
        let first = router.key_down('a');
        assert_eq!(first, Some(NoteInput::down(Note::from("C4"))));
        // OS auto-repeat delivers the same key again
        assert_eq!(router.key_down('a'), None);

        assert_eq!(router.key_up('a'), Some(NoteInput::up(Note::from("C4"))));
        assert!(router.key_down('a').is_some()); // re-armed
    }

    #[test]
    fn unbound_keys_produce_nothing() {
        let mut router = InputRouter::new(Instrument::Violin);
        assert_eq!(router.key_down('q'), None);
        assert_eq!(router.key_up('q'), None);
    }

    #[test]
    fn velocity_zero_note_on_is_note_off() {
        let mut router = InputRouter::new(Instrument::Piano);
        let on = router.midi_message(0x90, 60, 100).unwrap();
        assert!(on.is_down);
        assert_eq!(on.note, Note::from("C4"));

        let off = router.midi_message(0x90, 60, 0).unwrap();
        assert!(!off.is_down);
        assert_eq!(off.note, Note::from("C4"));

        let explicit_off = router.midi_message(0x80, 60, 64).unwrap();
        assert!(!explicit_off.is_down);
    }

    #[test]
    fn midi_channel_bits_are_ignored() {
        let mut router = InputRouter::new(Instrument::Piano);
        let on = router.midi_message(0x93, 69, 80).unwrap(); // channel 3
        assert_eq!(on.note, Note::from("A4"));
    }

    #[test]
    fn non_note_messages_are_dropped() {
        let mut router = InputRouter::new(Instrument::Piano);
        assert_eq!(router.midi_message(0xB0, 7, 100), None); // control change
        assert_eq!(router.midi_message(0xE0, 0, 64), None); // pitch bend
    }

    #[test]
    fn switching_instruments_clears_held_keys() {
        let mut router = InputRouter::new(Instrument::Piano);
        router.key_down('s'); // D4 on piano
        router.set_instrument(Instrument::Drums);
        // 's' is the snare now, and must fire fresh
        let hit = router.key_down('s').unwrap();
        assert_eq!(hit.note, Note::from("snare"));
    }
}
