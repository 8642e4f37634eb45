//! End-to-end flow through the public API: keyboard input drives voices and
//! the session, a take gets reviewed, and a lesson runs to completion.

use maestro::input::InputRouter;
use maestro::instrument::Instrument;
use maestro::session::{SessionController, TutorialState};
use maestro::tutor::{DirectLink, OfflineTutor};
use maestro::voice::VoiceManager;

#[test]
fn record_play_and_review_a_take() {
    let mut router = InputRouter::new(Instrument::Piano);
    let mut voices = VoiceManager::new(48_000.0);
    let mut session = SessionController::new(DirectLink::new(OfflineTutor));

    session.toggle_recording();
    for key in ['a', 'd', 'g'] {
        let input = router.key_down(key).expect("bound key");
        assert!(input.is_down);
        voices.start_note(session.instrument(), input.note.clone());
        session.note_down(&input.note);
    }

    // All three keys are held: the mix is audible and bounded.
    let mut block = vec![0.0f32; 512];
    voices.render_block(&mut block);
    assert!(block.iter().any(|s| s.abs() > 0.0));
    assert!(block.iter().all(|s| s.abs() <= 1.0));

    for key in ['a', 'd', 'g'] {
        let up = router.key_up(key).expect("bound key");
        assert!(!up.is_down);
        voices.stop_note(&up.note);
    }
    session.toggle_recording();

    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history()[0].notes.len(), 3);

    // The offline tutor answers synchronously through the direct link.
    session.poll();
    let review = session.review().expect("review after a sealed take");
    assert_eq!(review.star_rating, 5);
}

#[test]
fn lesson_runs_to_completion_and_gets_reviewed() {
    let mut session = SessionController::new(DirectLink::new(OfflineTutor));
    session.set_instrument(Instrument::Chimes);

    session.start_tutorial(None);
    session.poll();

    let steps: Vec<_> = match session.tutorial_state() {
        TutorialState::Active { tutorial, .. } => {
            tutorial.steps.iter().map(|s| s.note.clone()).collect()
        }
        other => panic!("expected an active lesson, got {other:?}"),
    };

    for note in &steps {
        assert_eq!(session.target_note(), Some(note));
        session.note_down(note);
    }

    assert_eq!(*session.tutorial_state(), TutorialState::Inactive);
    assert_eq!(session.history().len(), 1);
    session.poll();
    assert!(session.review().is_some());
}
