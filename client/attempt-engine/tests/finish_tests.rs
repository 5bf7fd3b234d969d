mod common;

use chrono::Utc;
use common::{basic_spec, choice_item, test_context, MockBackend};
use std::sync::atomic::Ordering;
use std::time::Duration;

use quizlane_attempt::models::FinishSummary;
use quizlane_attempt::sessions::{load_session, AttemptSession};

async fn load_basic(
    backend: std::sync::Arc<MockBackend>,
    total_time_limit_seconds: Option<u32>,
) -> quizlane_attempt::BasicSession {
    let anchor = Utc::now();
    backend.serve(
        basic_spec(vec![choice_item("q1", false)], total_time_limit_seconds),
        None,
    );
    let context = test_context(backend, anchor);
    match load_session(&context, "att-1").await.unwrap() {
        AttemptSession::Basic(session) => session,
        _ => panic!("expected a basic session"),
    }
}

#[tokio::test(start_paused = true)]
async fn timer_expiry_finalizes_exactly_once() {
    let backend = MockBackend::new();
    let session = load_basic(backend.clone(), Some(60)).await;

    assert!(session.spawn_timer());
    // Well past expiry: several ticks land at remaining = 0
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert!(session.is_finishing());
    assert_eq!(backend.finish_calls.load(Ordering::SeqCst), 1);

    // A late user press is a no-op
    assert!(session.finish().await.is_none());
    assert_eq!(backend.finish_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn user_press_beats_timer_without_double_finalize() {
    let backend = MockBackend::new();
    let session = load_basic(backend.clone(), Some(60)).await;

    assert!(session.spawn_timer());
    let route = session.finish().await.expect("user press should finish");
    assert_eq!(route.attempt_id, "att-1");

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(backend.finish_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn finalize_failure_yields_default_route() {
    let backend = MockBackend::new();
    backend.fail_finish.store(true, Ordering::SeqCst);
    let session = load_basic(backend.clone(), None).await;

    let route = session.finish().await.expect("finish should proceed");
    assert_eq!(route.score, 0);
    assert_eq!(route.max_score, 0);
    assert_eq!(route.quiz_name, "Demo Quiz");
    assert_eq!(route.schedule_id, "sched-1");
    assert!(!route.answers_available);
    assert_eq!(backend.finish_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn finalize_summary_flows_into_route() {
    let backend = MockBackend::new();
    *backend.finish_summary.lock().unwrap() = Some(FinishSummary {
        score: Some(7),
        max_score: Some(10),
        schedule_id: Some("sched-9".to_string()),
        answers_available: Some(true),
    });
    let session = load_basic(backend.clone(), None).await;

    let route = session.finish().await.unwrap();
    assert_eq!(route.score, 7);
    assert_eq!(route.max_score, 10);
    assert_eq!(route.schedule_id, "sched-9");
    assert!(route.answers_available);
}

#[tokio::test(start_paused = true)]
async fn finish_flushes_pending_save_first() {
    let backend = MockBackend::new();
    let session = load_basic(backend.clone(), None).await;

    session.toggle_choice("q1", "b");
    let route = session.finish().await.unwrap();

    assert_eq!(backend.save_count(), 1);
    let saved = backend.last_save().unwrap();
    assert_eq!(saved["q1"].selection().unwrap(), ["b".to_string()]);
    assert_eq!(backend.finish_calls.load(Ordering::SeqCst), 1);
    assert_eq!(route.attempt_id, "att-1");
}

#[tokio::test(start_paused = true)]
async fn untimed_quiz_has_no_timer() {
    let backend = MockBackend::new();
    let session = load_basic(backend.clone(), None).await;
    assert!(!session.spawn_timer());
    assert_eq!(session.remaining_seconds(), None);

    // Zero limit counts as untimed too
    let session = load_basic(MockBackend::new(), Some(0)).await;
    assert!(!session.spawn_timer());
}
