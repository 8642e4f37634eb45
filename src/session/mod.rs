//! Recording and tutorial state machines.
//!
//! The [`SessionController`] owns everything above the audio layer: the
//! capture buffer, the recording history, tutorial progress, and the
//! conversation with the generative collaborator. It is deliberately
//! renderer-free and clock-explicit so the whole surface is testable without
//! a terminal or a sleep.
//!
//! Two rules shape the design:
//!
//! * recording and tutorial mode are mutually exclusive — entering either
//!   force-exits the other;
//! * collaborator replies are applied only when their generation matches the
//!   context that asked. A reply for an abandoned tutorial or a superseded
//!   chat is dropped, never shown.

mod types;

pub use types::{NoteEvent, Recording, Review, Tutorial, TutorialStep};

use std::time::Instant;

use log::{debug, warn};

use crate::instrument::Instrument;
use crate::notes::Note;
use crate::tutor::{Generation, TutorLink, TutorReply, TutorRequest, TutorResponse};

/// Genres offered for lesson generation.
pub const GENRES: [&str; 7] = [
    "Classical",
    "Pop",
    "Jazz",
    "Rock",
    "Lo-fi",
    "Folk",
    "Electronic",
];

/// Spacing used for the synthesized event timeline of a completed lesson,
/// where real press timestamps were never captured.
const LESSON_STEP_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq)]
pub enum TutorialState {
    Inactive,
    /// A lesson was requested; waiting on the collaborator.
    Pending,
    Active {
        tutorial: Tutorial,
        /// Index of the step the player must hit next.
        step: usize,
    },
}

pub struct SessionController<L: TutorLink> {
    link: L,
    instrument: Instrument,
    genre_index: usize,

    recording: bool,
    capture: Vec<NoteEvent>,
    capture_epoch: Option<Instant>,
    history: Vec<Recording>,

    review: Option<Review>,
    tutorial: TutorialState,
    chat_reply: Option<String>,
    chat_waiting: bool,

    generation: Generation,
    expected_review: Option<Generation>,
    expected_tutorial: Option<Generation>,
    expected_chat: Option<Generation>,
}

impl<L: TutorLink> SessionController<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            instrument: Instrument::Piano,
            genre_index: 0,
            recording: false,
            capture: Vec::new(),
            capture_epoch: None,
            history: Vec::new(),
            review: None,
            tutorial: TutorialState::Inactive,
            chat_reply: None,
            chat_waiting: false,
            generation: 0,
            expected_review: None,
            expected_tutorial: None,
            expected_chat: None,
        }
    }

    fn next_generation(&mut self) -> Generation {
        self.generation += 1;
        self.generation
    }

    // --- recording ---------------------------------------------------------

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn toggle_recording(&mut self) {
        self.toggle_recording_at(Instant::now());
    }

    pub fn toggle_recording_at(&mut self, now: Instant) {
        if self.recording {
            self.stop_recording();
        } else {
            // Starting a take leaves any lesson behind, answered or not.
            self.exit_tutorial();
            self.review = None;
            self.capture.clear();
            self.capture_epoch = Some(now);
            self.recording = true;
        }
    }

    fn stop_recording(&mut self) {
        self.recording = false;
        self.capture_epoch = None;
        if self.capture.is_empty() {
            return;
        }
        let recording = Recording::new(self.instrument, std::mem::take(&mut self.capture));
        self.request_review(&recording);
        self.history.insert(0, recording);
    }

    fn request_review(&mut self, recording: &Recording) {
        let generation = self.next_generation();
        self.expected_review = Some(generation);
        self.link.submit(TutorRequest::Review {
            generation,
            instrument: recording.instrument,
            notes: recording.notes.iter().map(|e| e.note.clone()).collect(),
        });
    }

    // --- note input --------------------------------------------------------

    pub fn note_down(&mut self, note: &Note) {
        self.note_down_at(note, Instant::now());
    }

    /// Feed one note-down through capture and tutorial matching. Note-ups
    /// never reach the session; only onsets matter here.
    pub fn note_down_at(&mut self, note: &Note, now: Instant) {
        if self.recording {
            let epoch = *self.capture_epoch.get_or_insert(now);
            self.capture.push(NoteEvent {
                note: note.clone(),
                timestamp_ms: now.duration_since(epoch).as_millis() as u64,
            });
        }

        let completed = match &mut self.tutorial {
            TutorialState::Active { tutorial, step } if tutorial.steps[*step].note == *note => {
                *step += 1;
                (*step >= tutorial.steps.len()).then(|| tutorial.clone())
            }
            // A miss is silent: the player keeps trying the same step.
            _ => None,
        };
        if let Some(finished) = completed {
            self.tutorial = TutorialState::Inactive;
            self.finish_lesson(finished);
        }
    }

    /// Seal a completed lesson as a recording and ask for a review, the same
    /// path a freehand take goes through.
    fn finish_lesson(&mut self, tutorial: Tutorial) {
        let notes = tutorial
            .steps
            .iter()
            .enumerate()
            .map(|(i, s)| NoteEvent {
                note: s.note.clone(),
                timestamp_ms: i as u64 * LESSON_STEP_MS,
            })
            .collect();
        let recording = Recording::new(self.instrument, notes);
        self.request_review(&recording);
        self.history.insert(0, recording);
    }

    // --- tutorials ---------------------------------------------------------

    pub fn tutorial_state(&self) -> &TutorialState {
        &self.tutorial
    }

    /// The note the player must hit next, while a lesson is active.
    pub fn target_note(&self) -> Option<&Note> {
        match &self.tutorial {
            TutorialState::Active { tutorial, step } => {
                tutorial.steps.get(*step).map(|s| &s.note)
            }
            _ => None,
        }
    }

    pub fn start_tutorial(&mut self, song: Option<&str>) {
        // A lesson displaces recording; a half-made take is discarded.
        if self.recording {
            self.recording = false;
            self.capture.clear();
            self.capture_epoch = None;
        }
        self.review = None;
        self.tutorial = TutorialState::Pending;

        let generation = self.next_generation();
        self.expected_tutorial = Some(generation);
        self.link.submit(TutorRequest::Tutorial {
            generation,
            instrument: self.instrument,
            song: song.map(str::to_string),
            genre: self.genre().to_string(),
        });
    }

    /// Leave tutorial mode. Also cancels a pending request: its reply will
    /// arrive with a stale generation and be dropped.
    pub fn exit_tutorial(&mut self) {
        self.tutorial = TutorialState::Inactive;
        self.expected_tutorial = None;
    }

    // --- chat --------------------------------------------------------------

    pub fn ask_tutor(&mut self, prompt: &str) {
        let generation = self.next_generation();
        self.expected_chat = Some(generation);
        self.chat_waiting = true;
        self.link.submit(TutorRequest::Chat {
            generation,
            prompt: prompt.to_string(),
            instrument: self.instrument,
        });
    }

    pub fn chat_reply(&self) -> Option<&str> {
        self.chat_reply.as_deref()
    }

    pub fn chat_waiting(&self) -> bool {
        self.chat_waiting
    }

    // --- instrument and genre ----------------------------------------------

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    /// Switching instruments ends any lesson (its targets no longer exist on
    /// screen) but leaves an in-flight recording running.
    pub fn set_instrument(&mut self, instrument: Instrument) {
        if instrument == self.instrument {
            return;
        }
        self.instrument = instrument;
        self.exit_tutorial();
    }

    pub fn genre(&self) -> &'static str {
        GENRES[self.genre_index]
    }

    pub fn cycle_genre(&mut self) {
        self.genre_index = (self.genre_index + 1) % GENRES.len();
    }

    // --- responses ---------------------------------------------------------

    pub fn review(&self) -> Option<&Review> {
        self.review.as_ref()
    }

    pub fn dismiss_review(&mut self) {
        self.review = None;
    }

    pub fn history(&self) -> &[Recording] {
        &self.history
    }

    /// Drain the link and apply every reply whose generation is still the one
    /// we are waiting for. Everything else is a leftover from an abandoned
    /// context and is discarded.
    pub fn poll(&mut self) {
        for response in self.link.poll() {
            self.apply(response);
        }
    }

    fn apply(&mut self, response: TutorResponse) {
        let TutorResponse { generation, reply } = response;
        match reply {
            TutorReply::Review(review) => {
                if self.expected_review.take_if(|g| *g == generation).is_some() {
                    self.review = Some(review);
                } else {
                    debug!("dropping stale review (generation {generation})");
                }
            }
            TutorReply::Tutorial(tutorial) => {
                if self
                    .expected_tutorial
                    .take_if(|g| *g == generation)
                    .is_some()
                {
                    if tutorial.steps.is_empty() {
                        warn!("collaborator returned an empty lesson; staying idle");
                        self.tutorial = TutorialState::Inactive;
                    } else {
                        self.tutorial = TutorialState::Active { tutorial, step: 0 };
                    }
                } else {
                    debug!("dropping stale tutorial (generation {generation})");
                }
            }
            TutorReply::Chat(text) => {
                if self.expected_chat.take_if(|g| *g == generation).is_some() {
                    self.chat_reply = Some(text);
                    self.chat_waiting = false;
                } else {
                    debug!("dropping stale chat reply (generation {generation})");
                }
            }
        }
    }
}
