//! Asynchronous delivery of collaborator replies.
//!
//! Tutor calls block (a real backend is a network round trip), so they run on
//! a worker thread and results come back through a polled channel. Every
//! request carries the caller's generation counter; the session controller
//! uses it to discard replies that arrive after the context that asked for
//! them is gone.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::warn;

use crate::instrument::Instrument;
use crate::notes::Note;
use crate::session::{Review, Tutorial};

use super::{fallback, Tutor};

/// Monotonic tag identifying which request context a reply belongs to.
pub type Generation = u64;

#[derive(Debug, Clone)]
pub enum TutorRequest {
    Review {
        generation: Generation,
        instrument: Instrument,
        notes: Vec<Note>,
    },
    Tutorial {
        generation: Generation,
        instrument: Instrument,
        song: Option<String>,
        genre: String,
    },
    Chat {
        generation: Generation,
        prompt: String,
        instrument: Instrument,
    },
}

impl TutorRequest {
    pub fn generation(&self) -> Generation {
        match self {
            TutorRequest::Review { generation, .. }
            | TutorRequest::Tutorial { generation, .. }
            | TutorRequest::Chat { generation, .. } => *generation,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TutorReply {
    Review(Review),
    Tutorial(Tutorial),
    Chat(String),
}

#[derive(Debug, Clone)]
pub struct TutorResponse {
    pub generation: Generation,
    pub reply: TutorReply,
}

/// How the session controller reaches the collaborator. Submitting never
/// blocks; replies surface later through `poll`.
pub trait TutorLink {
    fn submit(&mut self, request: TutorRequest);
    fn poll(&mut self) -> Vec<TutorResponse>;
}

/// Serve one request, substituting the fallback when the tutor fails. The
/// caller always gets a reply; a broken backend only costs personalization.
fn serve<T: Tutor>(tutor: &mut T, request: TutorRequest) -> TutorResponse {
    match request {
        TutorRequest::Review {
            generation,
            instrument,
            notes,
        } => {
            let review = tutor.review_recording(instrument, &notes).unwrap_or_else(|e| {
                warn!("review failed, using fallback: {e}");
                fallback::review()
            });
            TutorResponse {
                generation,
                reply: TutorReply::Review(review),
            }
        }
        TutorRequest::Tutorial {
            generation,
            instrument,
            song,
            genre,
        } => {
            let tutorial = tutor
                .generate_tutorial(instrument, song.as_deref(), &genre)
                .unwrap_or_else(|e| {
                    warn!("tutorial generation failed, using fallback: {e}");
                    fallback::tutorial(instrument, song.as_deref())
                });
            TutorResponse {
                generation,
                reply: TutorReply::Tutorial(tutorial),
            }
        }
        TutorRequest::Chat {
            generation,
            prompt,
            instrument,
        } => {
            let text = tutor.chat(&prompt, instrument).unwrap_or_else(|e| {
                warn!("chat failed, using fallback: {e}");
                fallback::chat_reply().to_string()
            });
            TutorResponse {
                generation,
                reply: TutorReply::Chat(text),
            }
        }
    }
}

/// Runs a [`Tutor`] on its own thread.
///
/// The worker exits when the request sender is dropped, so dropping the
/// service shuts it down cleanly.
pub struct TutorService {
    requests: Option<Sender<TutorRequest>>,
    responses: Receiver<TutorResponse>,
    worker: Option<JoinHandle<()>>,
}

impl TutorService {
    pub fn spawn<T: Tutor + 'static>(mut tutor: T) -> Self {
        let (req_tx, req_rx) = mpsc::channel::<TutorRequest>();
        let (resp_tx, resp_rx) = mpsc::channel::<TutorResponse>();

        let worker = thread::spawn(move || {
            while let Ok(request) = req_rx.recv() {
                let response = serve(&mut tutor, request);
                // The receiver is gone only during shutdown.
                if resp_tx.send(response).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: Some(req_tx),
            responses: resp_rx,
            worker: Some(worker),
        }
    }
}

impl TutorLink for TutorService {
    fn submit(&mut self, request: TutorRequest) {
        if let Some(tx) = &self.requests {
            if tx.send(request).is_err() {
                warn!("tutor worker is gone; request dropped");
            }
        }
    }

    fn poll(&mut self) -> Vec<TutorResponse> {
        self.responses.try_iter().collect()
    }
}

impl Drop for TutorService {
    fn drop(&mut self) {
        self.requests = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Synchronous link: serves each request on submit, delivers on the next
/// poll. Used when threading is unwanted (tests, offline mode).
pub struct DirectLink<T: Tutor> {
    tutor: T,
    pending: Vec<TutorResponse>,
}

impl<T: Tutor> DirectLink<T> {
    pub fn new(tutor: T) -> Self {
        Self {
            tutor,
            pending: Vec::new(),
        }
    }
}

impl<T: Tutor> TutorLink for DirectLink<T> {
    fn submit(&mut self, request: TutorRequest) {
        self.pending.push(serve(&mut self.tutor, request));
    }

    fn poll(&mut self) -> Vec<TutorResponse> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutor::{OfflineTutor, TutorError};

    struct FailingTutor;

    impl Tutor for FailingTutor {
        fn review_recording(
            &mut self,
            _instrument: Instrument,
            _notes: &[Note],
        ) -> Result<Review, TutorError> {
            Err(TutorError::Unavailable("down".into()))
        }

        fn generate_tutorial(
            &mut self,
            _instrument: Instrument,
            _song_name: Option<&str>,
            _genre: &str,
        ) -> Result<Tutorial, TutorError> {
            Err(TutorError::Unavailable("down".into()))
        }

        fn chat(&mut self, _prompt: &str, _instrument: Instrument) -> Result<String, TutorError> {
            Err(TutorError::Unavailable("down".into()))
        }
    }

    #[test]
    fn direct_link_round_trips_a_review() {
        let mut link = DirectLink::new(OfflineTutor);
        link.submit(TutorRequest::Review {
            generation: 7,
            instrument: Instrument::Piano,
            notes: vec![Note::from("C4")],
        });
        let responses = link.poll();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].generation, 7);
        assert!(matches!(responses[0].reply, TutorReply::Review(_)));
        assert!(link.poll().is_empty());
    }

    #[test]
    fn failures_degrade_to_fallbacks() {
        let mut link = DirectLink::new(FailingTutor);
        link.submit(TutorRequest::Tutorial {
            generation: 1,
            instrument: Instrument::Violin,
            song: None,
            genre: "Jazz".to_string(),
        });
        link.submit(TutorRequest::Chat {
            generation: 2,
            prompt: "help".to_string(),
            instrument: Instrument::Violin,
        });

        let responses = link.poll();
        assert_eq!(responses.len(), 2);
        match &responses[0].reply {
            TutorReply::Tutorial(t) => assert_eq!(t.title, "Simple Scale"),
            other => panic!("expected tutorial, got {other:?}"),
        }
        match &responses[1].reply {
            TutorReply::Chat(text) => assert_eq!(text, fallback::chat_reply()),
            other => panic!("expected chat, got {other:?}"),
        }
    }

    #[test]
    fn service_delivers_across_the_thread() {
        let mut service = TutorService::spawn(OfflineTutor);
        service.submit(TutorRequest::Chat {
            generation: 3,
            prompt: "hi".to_string(),
            instrument: Instrument::Harp,
        });

        let mut responses = Vec::new();
        for _ in 0..100 {
            responses = service.poll();
            if !responses.is_empty() {
                break;
            }
            thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].generation, 3);
    }

    #[test]
    fn request_reports_its_generation() {
        let request = TutorRequest::Review {
            generation: 42,
            instrument: Instrument::Drums,
            notes: Vec::new(),
        };
        assert_eq!(request.generation(), 42);
    }
}
