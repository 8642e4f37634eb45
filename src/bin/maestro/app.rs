//! Event loop and audio stream wiring.
//!
//! One thread owns the terminal and all state mutation; the cpal callback
//! only renders, through a shared `Arc<Mutex<VoiceManager>>`. The audio
//! stream is created lazily on the first note, and a machine without an
//! output device only loses sound: recording, lessons, and chat keep
//! working silently.

use std::collections::{HashMap, HashSet};
use std::io::stdout;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
    KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{info, warn};
use ratatui::layout::Rect;
use ratatui::DefaultTerminal;
use rtrb::Consumer;

use maestro::input::midi::{MidiInputHandler, PortEvent, RawMidi};
use maestro::input::{InputRouter, NoteInput};
use maestro::notes::Note;
use maestro::session::{SessionController, TutorialState};
use maestro::tutor::{OfflineTutor, TutorService};
use maestro::voice::VoiceManager;
use maestro::MAX_BLOCK_SIZE;

use crate::ui::{self, LessonView, View};

const FRAME: Duration = Duration::from_millis(16);

/// Terminals without key-release reporting get a timed release instead: a
/// key press sounds for this long (extended by auto-repeat) and then lets go.
const HOLD_FALLBACK: Duration = Duration::from_millis(500);

const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;

/// How often to re-enumerate MIDI ports for hot-plug.
const MIDI_POLL: Duration = Duration::from_secs(2);

enum TextEntry {
    Song(String),
    Chat(String),
}

pub struct App {
    voices: Arc<Mutex<VoiceManager>>,
    stream: Option<cpal::Stream>,
    router: InputRouter,
    session: SessionController<TutorService>,
    midi: MidiInputHandler,
    midi_rx: Option<Consumer<RawMidi>>,
    midi_poll_at: Instant,

    /// Set after a failed stream open; triggers stay silent from then on.
    audio_failed: bool,

    /// Key-release emulation for legacy terminals: char -> release deadline.
    auto_release: HashMap<char, Instant>,
    release_events: bool,

    /// Note currently held by the pointer, if any.
    pointer_note: Option<Note>,
    hit_boxes: Vec<(Rect, Note)>,

    entry: Option<TextEntry>,
    should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        let mut midi = MidiInputHandler::new();
        let midi_rx = midi.try_connect();
        let session = SessionController::new(TutorService::spawn(OfflineTutor));

        Self {
            voices: Arc::new(Mutex::new(VoiceManager::new(DEFAULT_SAMPLE_RATE))),
            stream: None,
            audio_failed: false,
            router: InputRouter::new(session.instrument()),
            session,
            midi,
            midi_rx,
            midi_poll_at: Instant::now() + MIDI_POLL,
            auto_release: HashMap::new(),
            release_events: false,
            pointer_note: None,
            hit_boxes: Vec::new(),
            entry: None,
            should_quit: false,
        }
    }

    pub fn run(mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        self.release_events =
            crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.release_events {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        } else {
            info!("terminal lacks key-release events; using timed release");
        }
        execute!(stdout(), EnableMouseCapture)?;

        let result = self.event_loop(terminal);

        let _ = execute!(stdout(), DisableMouseCapture);
        if self.release_events {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        self.midi.disconnect();
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.watch_midi();
            self.drain_midi()?;
            self.session.poll();
            self.reap_auto_releases()?;

            let view = self.view();
            terminal.draw(|frame| {
                self.hit_boxes = ui::render(frame, &view);
            })?;

            if event::poll(FRAME)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key.code, key.kind)?,
                    Event::Mouse(mouse) => self.handle_mouse(mouse)?,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    // --- input -------------------------------------------------------------

    fn handle_key(&mut self, code: KeyCode, kind: KeyEventKind) -> EyreResult<()> {
        if self.entry.is_some() {
            if kind == KeyEventKind::Press {
                self.handle_entry_key(code);
            }
            return Ok(());
        }

        match (code, kind) {
            (KeyCode::Esc, KeyEventKind::Press) => {
                if self.session.review().is_some() {
                    self.session.dismiss_review();
                } else if *self.session.tutorial_state() != TutorialState::Inactive {
                    self.session.exit_tutorial();
                } else {
                    self.should_quit = true;
                }
            }
            (KeyCode::Tab, KeyEventKind::Press) => self.switch_instrument(),
            (KeyCode::Enter, KeyEventKind::Press) => self.session.toggle_recording(),
            (KeyCode::F(2), KeyEventKind::Press) => self.session.start_tutorial(None),
            (KeyCode::F(3), KeyEventKind::Press) => {
                self.entry = Some(TextEntry::Song(String::new()));
            }
            (KeyCode::F(4), KeyEventKind::Press) => {
                self.entry = Some(TextEntry::Chat(String::new()));
            }
            (KeyCode::F(6), KeyEventKind::Press) => self.session.cycle_genre(),
            (KeyCode::Char(c), KeyEventKind::Press) => self.handle_char_down(c)?,
            (KeyCode::Char(c), KeyEventKind::Release) => {
                if let Some(input) = self.router.key_up(c) {
                    self.apply(input)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_entry_key(&mut self, code: KeyCode) {
        let Some(entry) = &mut self.entry else { return };
        let buffer = match entry {
            TextEntry::Song(b) | TextEntry::Chat(b) => b,
        };
        match code {
            KeyCode::Char(c) => buffer.push(c),
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Esc => self.entry = None,
            KeyCode::Enter => {
                let entry = self.entry.take();
                match entry {
                    Some(TextEntry::Song(song)) if !song.trim().is_empty() => {
                        self.session.start_tutorial(Some(song.trim()));
                    }
                    Some(TextEntry::Chat(prompt)) if !prompt.trim().is_empty() => {
                        self.session.ask_tutor(prompt.trim());
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn handle_char_down(&mut self, c: char) -> EyreResult<()> {
        if self.release_events {
            if let Some(input) = self.router.key_down(c) {
                self.apply(input)?;
            }
            return Ok(());
        }

        // Legacy terminals only send presses. The first press sounds the
        // note; auto-repeat presses just push the release deadline out.
        let fresh = !self.auto_release.contains_key(&c);
        self.auto_release.insert(c, Instant::now() + HOLD_FALLBACK);
        if fresh {
            if let Some(input) = self.router.key_down(c) {
                self.apply(input)?;
            }
        }
        Ok(())
    }

    fn reap_auto_releases(&mut self) -> EyreResult<()> {
        if self.release_events {
            return Ok(());
        }
        let now = Instant::now();
        let expired: Vec<char> = self
            .auto_release
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(c, _)| *c)
            .collect();
        for c in expired {
            self.auto_release.remove(&c);
            if let Some(input) = self.router.key_up(c) {
                self.apply(input)?;
            }
        }
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> EyreResult<()> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(note) = self.hit_test(mouse.column, mouse.row) {
                    self.press_pointer(note)?;
                }
            }
            // Dragging off a note releases it; dragging onto one presses it.
            MouseEventKind::Drag(MouseButton::Left) => {
                let hit = self.hit_test(mouse.column, mouse.row);
                if hit != self.pointer_note {
                    self.release_pointer()?;
                    if let Some(note) = hit {
                        self.press_pointer(note)?;
                    }
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.release_pointer()?,
            _ => {}
        }
        Ok(())
    }

    fn hit_test(&self, column: u16, row: u16) -> Option<Note> {
        self.hit_boxes
            .iter()
            .find(|(rect, _)| {
                column >= rect.x
                    && column < rect.x + rect.width
                    && row >= rect.y
                    && row < rect.y + rect.height
            })
            .map(|(_, note)| note.clone())
    }

    fn press_pointer(&mut self, note: Note) -> EyreResult<()> {
        self.pointer_note = Some(note.clone());
        self.apply(NoteInput {
            note,
            is_down: true,
        })
    }

    fn release_pointer(&mut self) -> EyreResult<()> {
        if let Some(note) = self.pointer_note.take() {
            self.apply(NoteInput {
                note,
                is_down: false,
            })?;
        }
        Ok(())
    }

    /// Hot-plug: re-enumerate ports every couple of seconds so a keyboard
    /// plugged in after launch connects and an unplugged one stops being
    /// shown as present.
    fn watch_midi(&mut self) {
        let now = Instant::now();
        if now < self.midi_poll_at {
            return;
        }
        self.midi_poll_at = now + MIDI_POLL;
        match self.midi.watch() {
            PortEvent::Connected(rx) => self.midi_rx = Some(rx),
            PortEvent::Disconnected => self.midi_rx = None,
            PortEvent::Unchanged => {}
        }
    }

    fn drain_midi(&mut self) -> EyreResult<()> {
        let mut inputs = Vec::new();
        if let Some(rx) = &mut self.midi_rx {
            while let Ok(RawMidi {
                status,
                note,
                velocity,
            }) = rx.pop()
            {
                if let Some(input) = self.router.midi_message(status, note, velocity) {
                    inputs.push(input);
                }
            }
        }
        for input in inputs {
            self.apply(input)?;
        }
        Ok(())
    }

    /// The one funnel every input origin ends in.
    fn apply(&mut self, input: NoteInput) -> EyreResult<()> {
        if input.is_down {
            self.start_audio();
            self.lock_voices()?
                .start_note(self.session.instrument(), input.note.clone());
            self.session.note_down(&input.note);
        } else {
            self.lock_voices()?.stop_note(&input.note);
        }
        Ok(())
    }

    /// A machine without an output device costs sound, never the session:
    /// warn once, remember the failure, and keep going silently.
    fn start_audio(&mut self) {
        if self.audio_failed {
            return;
        }
        if let Err(e) = self.ensure_stream() {
            warn!("audio unavailable, playing silently: {e:#}");
            self.audio_failed = true;
        }
    }

    fn switch_instrument(&mut self) {
        let next = self.session.instrument().next();
        self.session.set_instrument(next);
        self.router.set_instrument(next);
        self.auto_release.clear();
        self.pointer_note = None;
        if let Ok(mut voices) = self.voices.lock() {
            voices.stop_all();
        }
    }

    fn lock_voices(&self) -> EyreResult<std::sync::MutexGuard<'_, VoiceManager>> {
        self.voices
            .lock()
            .map_err(|_| eyre!("voice manager poisoned by audio thread panic"))
    }

    // --- audio -------------------------------------------------------------

    /// Open the output stream on first use; later triggers just make sure it
    /// is running.
    fn ensure_stream(&mut self) -> EyreResult<()> {
        if let Some(stream) = &self.stream {
            stream.play()?;
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        self.lock_voices()?.set_sample_rate(sample_rate);

        let voices = Arc::clone(&self.voices);
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let Ok(mut voices) = voices.lock() else {
                    data.fill(0.0);
                    return;
                };
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames_to_render];
                    voices.render_block(block);

                    // Mono to all channels
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                    }
                    frames_written += frames_to_render;
                }
            },
            |err| warn!("audio stream error: {err}"),
            None,
        )?;

        stream.play()?;
        info!("audio stream open at {sample_rate} Hz, {channels} channel(s)");
        self.stream = Some(stream);
        Ok(())
    }

    // --- view --------------------------------------------------------------

    fn view(&self) -> View {
        let instrument = self.session.instrument();
        let active_notes: HashSet<Note> = match self.voices.lock() {
            Ok(voices) => instrument
                .palette_notes()
                .into_iter()
                .filter(|n| voices.is_note_active(n))
                .collect(),
            Err(_) => HashSet::new(),
        };

        let (lesson, pending_lesson) = match self.session.tutorial_state() {
            TutorialState::Inactive => (None, false),
            TutorialState::Pending => (None, true),
            TutorialState::Active { tutorial, step } => (
                Some(LessonView {
                    title: tutorial.title.clone(),
                    step: *step,
                    total: tutorial.steps.len(),
                    label: tutorial.steps.get(*step).and_then(|s| s.label.clone()),
                }),
                false,
            ),
        };

        let entry = match &self.entry {
            Some(TextEntry::Song(b)) => Some(("Song", b.clone())),
            Some(TextEntry::Chat(b)) => Some(("Ask", b.clone())),
            None => None,
        };

        View {
            instrument,
            genre: self.session.genre(),
            recording: self.session.is_recording(),
            takes: self.session.history().len(),
            active_notes,
            target: self.session.target_note().cloned(),
            lesson,
            pending_lesson,
            review: self.session.review().cloned(),
            chat_line: self.session.chat_reply().map(str::to_string),
            chat_waiting: self.session.chat_waiting(),
            midi_port: self.midi.port_name().map(str::to_string),
            entry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_keeps_working_when_audio_is_unavailable() {
        let mut app = App::new();
        // The state a failed stream open leaves behind.
        app.audio_failed = true;

        app.session.toggle_recording();
        let down = NoteInput {
            note: Note::from("C4"),
            is_down: true,
        };
        let up = NoteInput {
            note: Note::from("C4"),
            is_down: false,
        };
        app.apply(down).expect("note-down must not error without audio");
        app.apply(up).expect("note-up must not error without audio");
        app.session.toggle_recording();

        assert_eq!(app.session.history().len(), 1);
        assert_eq!(app.session.history()[0].notes[0].note, Note::from("C4"));
        // Still marked failed: no retry storm on every keypress.
        assert!(app.audio_failed);
    }
}
