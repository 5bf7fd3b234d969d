mod common;

use chrono::Utc;
use common::{rapid_spec, test_context, MockBackend};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use quizlane_attempt::services::attempt_timer::RapidPosition;
use quizlane_attempt::sessions::{load_session, AttemptSession, ConfirmOutcome};
use quizlane_attempt::RapidSession;

async fn load_rapid(backend: Arc<MockBackend>, limits: &[u32]) -> RapidSession {
    backend.serve(rapid_spec(limits), None);
    let context = test_context(backend, Utc::now());
    match load_session(&context, "att-1").await.unwrap() {
        AttemptSession::Rapid(session) => session,
        _ => panic!("expected a rapid session"),
    }
}

#[tokio::test(start_paused = true)]
async fn confirm_saves_only_the_current_item() {
    let backend = MockBackend::new();
    let session = load_rapid(backend.clone(), &[10, 10, 10]).await;

    let outcome = session.confirm("a").await;
    assert!(matches!(outcome, ConfirmOutcome::Advanced { next_index: 1 }));
    assert_eq!(session.current_index(), 1);

    assert_eq!(backend.save_count(), 1);
    let saved = backend.last_save().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved["r1"].selection().unwrap(), ["a".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn backgrounding_cannot_stop_the_clock() {
    let backend = MockBackend::new();
    let session = load_rapid(backend.clone(), &[10, 10, 10]).await;

    // App backgrounded at 15s, resumed at 25s: the schedule owns the
    // elapsed time either way.
    tokio::time::advance(Duration::from_secs(25)).await;

    assert_eq!(
        session.scheduled_position(),
        RapidPosition::Active {
            index: 2,
            remaining_seconds: 5
        }
    );

    let outcome = session.resync().await;
    assert!(matches!(outcome, ConfirmOutcome::Advanced { next_index: 2 }));
    assert_eq!(session.current_index(), 2);
    assert_eq!(session.question_remaining_seconds(), 5);
}

#[tokio::test(start_paused = true)]
async fn exhausted_schedule_finishes_the_attempt() {
    let backend = MockBackend::new();
    let session = load_rapid(backend.clone(), &[10, 10, 10]).await;

    tokio::time::advance(Duration::from_secs(31)).await;

    match session.resync().await {
        ConfirmOutcome::Finished(route) => assert!(route.is_some()),
        other => panic!("expected finish, got {:?}", other),
    }
    assert_eq!(backend.finish_calls.load(Ordering::SeqCst), 1);

    // Everything after the finish is a no-op
    assert!(matches!(session.resync().await, ConfirmOutcome::Ignored));
    assert!(matches!(session.confirm("a").await, ConfirmOutcome::Ignored));
    assert_eq!(backend.finish_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn auto_advance_cannot_race_a_manual_confirm() {
    let backend = MockBackend::new();
    backend.set_save_delay(Duration::from_millis(200));
    let session = load_rapid(backend.clone(), &[10, 10, 10]).await;

    let confirming = session.clone();
    let handle = tokio::spawn(async move { confirming.confirm("a").await });
    tokio::task::yield_now().await;

    // The confirm is mid-save and holds the transition guard
    assert!(matches!(session.resync().await, ConfirmOutcome::Ignored));

    let outcome = handle.await.unwrap();
    assert!(matches!(outcome, ConfirmOutcome::Advanced { next_index: 1 }));
}

#[tokio::test(start_paused = true)]
async fn expiry_watcher_advances_past_stale_questions() {
    let backend = MockBackend::new();
    let session = load_rapid(backend.clone(), &[10, 10, 10]).await;

    assert!(session.spawn_timer());

    tokio::time::sleep(Duration::from_secs(12)).await;
    assert_eq!(session.current_index(), 1);
    // Skipped questions record no answer
    assert_eq!(backend.save_count(), 0);

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert!(session.is_finishing());
    assert_eq!(backend.finish_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn last_confirm_finishes_and_saves_every_item() {
    let backend = MockBackend::new();
    let session = load_rapid(backend.clone(), &[10, 10, 10]).await;

    assert!(matches!(
        session.confirm("a").await,
        ConfirmOutcome::Advanced { next_index: 1 }
    ));
    assert!(matches!(
        session.confirm("b").await,
        ConfirmOutcome::Advanced { next_index: 2 }
    ));
    match session.confirm("a").await {
        ConfirmOutcome::Finished(route) => {
            let route = route.expect("confirm should win the finish");
            assert_eq!(route.quiz_name, "Rapid Demo");
        }
        other => panic!("expected finish, got {:?}", other),
    }

    assert_eq!(backend.save_count(), 3);
    assert_eq!(backend.finish_calls.load(Ordering::SeqCst), 1);
}
