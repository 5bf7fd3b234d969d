use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::backend::AttemptBackend;
use crate::metrics::{ATTEMPTS_FINISHED_TOTAL, FINALIZE_FAILURES_TOTAL};
use crate::models::{AnswersPayload, AttemptSpec, ResultsRoute};
use crate::services::attempt_timer::{countdown_stream, ActiveTimerGuard};
use crate::services::save_dispatcher::SaveDispatcher;
use crate::services::SessionContext;
use crate::utils::clock::Clock;
use crate::utils::retry::{retry_with_backoff, RetryConfig};

pub mod basic;
pub mod crossword;
pub mod rapid;

pub use basic::BasicSession;
pub use crossword::CrosswordSession;
pub use rapid::{ConfirmOutcome, RapidSession};

/// State shared by every play-screen session: identity, the save pipeline,
/// and the guarded one-shot finish transition.
pub struct SessionCore {
    pub attempt_id: String,
    pub quiz_name: String,
    pub schedule_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub backend: Arc<dyn AttemptBackend>,
    pub clock: Arc<dyn Clock>,
    pub dispatcher: SaveDispatcher,
    finishing: AtomicBool,
    quiz_type: &'static str,
}

impl SessionCore {
    #[allow(clippy::too_many_arguments)]
    fn new(
        context: &SessionContext,
        attempt_id: &str,
        quiz_name: String,
        schedule_id: Option<String>,
        started_at: DateTime<Utc>,
        initial_version: Option<i64>,
        quiz_type: &'static str,
    ) -> Self {
        let dispatcher = SaveDispatcher::new(
            context.backend.clone(),
            context.clock.clone(),
            attempt_id,
            context.debounce(),
            initial_version,
        );

        Self {
            attempt_id: attempt_id.to_string(),
            quiz_name,
            schedule_id,
            started_at,
            backend: context.backend.clone(),
            clock: context.clock.clone(),
            dispatcher,
            finishing: AtomicBool::new(false),
            quiz_type,
        }
    }

    pub fn elapsed_seconds(&self) -> u64 {
        (self.clock.now() - self.started_at).num_seconds().max(0) as u64
    }

    pub fn is_finishing(&self) -> bool {
        self.finishing.load(Ordering::SeqCst)
    }

    /// One-shot finish transition shared by timer expiry and the user's
    /// Finish press: flush pending saves, finalize best-effort, build the
    /// results route. The losing trigger gets `None`; there is no way back
    /// out of the finishing state.
    pub async fn finish(&self) -> Option<ResultsRoute> {
        if self.finishing.swap(true, Ordering::SeqCst) {
            tracing::debug!("Finish already in progress for attempt {}", self.attempt_id);
            return None;
        }

        tracing::info!("Finishing attempt {}", self.attempt_id);
        self.dispatcher.flush().await;

        let summary = match self.backend.finish_attempt(&self.attempt_id).await {
            Ok(summary) => summary,
            Err(e) => {
                // Treated as "no score data available", never as a blocker.
                FINALIZE_FAILURES_TOTAL
                    .with_label_values(&[self.quiz_type])
                    .inc();
                tracing::warn!("Finalize failed for attempt {}: {}", self.attempt_id, e);
                None
            }
        };

        let outcome = if summary.is_some() { "scored" } else { "unscored" };
        ATTEMPTS_FINISHED_TOTAL.with_label_values(&[outcome]).inc();

        Some(ResultsRoute::from_summary(
            &self.attempt_id,
            &self.quiz_name,
            self.schedule_id.as_deref(),
            summary.as_ref(),
        ))
    }
}

/// Zero time limits mean untimed.
pub(crate) fn effective_limit(limit: Option<u32>) -> Option<u32> {
    limit.filter(|v| *v > 0)
}

/// Drive a countdown to expiry on a background task, then run the expiry
/// action once. The stream ends right after the expiry event, so the task
/// finishes on its own; sessions abort it on close.
pub(crate) fn spawn_countdown<F, Fut>(
    clock: Arc<dyn Clock>,
    attempt_id: String,
    limit_seconds: u32,
    started_at: DateTime<Utc>,
    tick_interval: Duration,
    on_expired: F,
) -> JoinHandle<()>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let stream = countdown_stream(clock, attempt_id, limit_seconds, started_at, tick_interval);

    tokio::spawn(async move {
        let _guard = ActiveTimerGuard::new();
        let mut on_expired = Some(on_expired);
        futures::pin_mut!(stream);
        while let Some(event) = stream.next().await {
            if event.is_expired() {
                if let Some(action) = on_expired.take() {
                    action().await;
                }
            }
        }
    })
}

/// A loaded play-screen session, one variant per quiz type.
pub enum AttemptSession {
    Basic(BasicSession),
    Rapid(RapidSession),
    Crossword(CrosswordSession),
}

impl AttemptSession {
    pub fn quiz_name(&self) -> &str {
        match self {
            AttemptSession::Basic(s) => &s.spec().quiz_name,
            AttemptSession::Rapid(s) => &s.spec().quiz_name,
            AttemptSession::Crossword(s) => &s.spec().quiz_name,
        }
    }
}

/// Fetch the attempt (spec plus optional resume document) and build the
/// matching session. The fetch is retried; an existing document restores
/// prior answers and keeps the server's `started_at` and version.
pub async fn load_session(
    context: &SessionContext,
    attempt_id: &str,
) -> anyhow::Result<AttemptSession> {
    let fetch = retry_with_backoff(RetryConfig::default(), || async {
        context.backend.fetch_attempt(attempt_id).await
    })
    .await
    .with_context(|| format!("Failed to fetch attempt {}", attempt_id))?;

    let started_at = fetch
        .doc
        .as_ref()
        .map(|doc| doc.started_at)
        .unwrap_or_else(|| context.clock.now());
    let initial_version = fetch.doc.as_ref().map(|doc| doc.attempt_version);
    let answers: AnswersPayload = fetch.doc.map(|doc| doc.answers).unwrap_or_default();

    tracing::info!(
        "Loaded attempt {}: quiz={}, resumed={}",
        attempt_id,
        fetch.spec.quiz_name(),
        initial_version.is_some()
    );

    let session = match fetch.spec {
        AttemptSpec::Basic(spec) => AttemptSession::Basic(BasicSession::new(
            context,
            attempt_id,
            spec,
            fetch.schedule_id,
            started_at,
            initial_version,
            answers,
        )),
        AttemptSpec::Rapid(spec) => AttemptSession::Rapid(RapidSession::new(
            context,
            attempt_id,
            spec,
            fetch.schedule_id,
            started_at,
            initial_version,
            answers,
        )),
        AttemptSpec::Crossword(spec) => AttemptSession::Crossword(CrosswordSession::new(
            context,
            attempt_id,
            spec,
            fetch.schedule_id,
            started_at,
            initial_version,
            answers,
        )),
    };

    Ok(session)
}
