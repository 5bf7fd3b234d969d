use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::SessionCore;
use crate::models::{AnswerValue, AnswersPayload, RapidSpec, ResultsRoute};
use crate::services::answer_store::AnswerStore;
use crate::services::attempt_timer::{rapid_position, RapidPosition};
use crate::services::save_dispatcher::SaveStatus;
use crate::services::SessionContext;

/// Result of a confirm/resync transition.
#[derive(Debug)]
pub enum ConfirmOutcome {
    Advanced { next_index: usize },
    Finished(Option<ResultsRoute>),
    /// Another transition was in flight, or no jump was needed.
    Ignored,
}

/// Play-screen session for a rapid-fire quiz. Each question owns a wall
/// clock window equal to the sum of all prior limits plus its own; the
/// active index is always recomputed from elapsed time, so backgrounding
/// the app cannot stop the clock.
#[derive(Clone)]
pub struct RapidSession {
    inner: Arc<RapidInner>,
}

struct RapidInner {
    core: SessionCore,
    spec: RapidSpec,
    limits: Vec<u32>,
    store: AnswerStore,
    current_index: AtomicUsize,
    /// Guards question transitions so a timer-expiry auto-advance cannot
    /// race a manual confirm.
    transitioning: AtomicBool,
    timer_task: Mutex<Option<JoinHandle<()>>>,
    tick_interval: std::time::Duration,
}

impl RapidSession {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        context: &SessionContext,
        attempt_id: &str,
        spec: RapidSpec,
        schedule_id: Option<String>,
        started_at: DateTime<Utc>,
        initial_version: Option<i64>,
        answers: AnswersPayload,
    ) -> Self {
        let core = SessionCore::new(
            context,
            attempt_id,
            spec.quiz_name.clone(),
            schedule_id,
            started_at,
            initial_version,
            "rapid",
        );
        let limits = spec.time_limits();
        let store = AnswerStore::new();
        store.restore(answers);

        let session = Self {
            inner: Arc::new(RapidInner {
                core,
                spec,
                limits,
                store,
                current_index: AtomicUsize::new(0),
                transitioning: AtomicBool::new(false),
                timer_task: Mutex::new(None),
                tick_interval: context.tick_interval(),
            }),
        };

        // Resume lands on whichever question the wall clock says is active.
        if let RapidPosition::Active { index, .. } = session.scheduled_position() {
            session.inner.current_index.store(index, Ordering::SeqCst);
        }

        session
    }

    pub fn spec(&self) -> &RapidSpec {
        &self.inner.spec
    }

    pub fn current_index(&self) -> usize {
        self.inner.current_index.load(Ordering::SeqCst)
    }

    pub fn answers(&self) -> AnswersPayload {
        self.inner.store.snapshot()
    }

    pub fn save_status(&self) -> watch::Receiver<SaveStatus> {
        self.inner.core.dispatcher.status()
    }

    pub fn is_finishing(&self) -> bool {
        self.inner.core.is_finishing()
    }

    /// Where the wall clock says the attempt should be.
    pub fn scheduled_position(&self) -> RapidPosition {
        rapid_position(&self.inner.limits, self.inner.core.elapsed_seconds())
    }

    /// Seconds left in the current question's window. When the student is
    /// ahead of schedule this keeps counting against the scheduled window,
    /// never against a restarted local countdown.
    pub fn question_remaining_seconds(&self) -> u32 {
        if self.inner.limits.is_empty() {
            return 0;
        }
        let index = self.current_index().min(self.inner.limits.len() - 1);
        let window_end: u64 = self.inner.limits[..=index]
            .iter()
            .map(|limit| u64::from(*limit))
            .sum();
        window_end.saturating_sub(self.inner.core.elapsed_seconds()) as u32
    }

    /// Confirm the selected option for the current question: save this item
    /// only, then advance (or finish after the last question).
    pub async fn confirm(&self, option_id: &str) -> ConfirmOutcome {
        if self.inner.core.is_finishing() {
            return ConfirmOutcome::Ignored;
        }
        if self.inner.transitioning.swap(true, Ordering::SeqCst) {
            return ConfirmOutcome::Ignored;
        }

        let index = self.current_index();
        let Some(item) = self.inner.spec.items.get(index) else {
            self.inner.transitioning.store(false, Ordering::SeqCst);
            return ConfirmOutcome::Ignored;
        };

        self.inner
            .store
            .set_selection(&item.id, vec![option_id.to_string()]);

        let mut partial = AnswersPayload::new();
        partial.insert(
            item.id.clone(),
            AnswerValue::Selection(vec![option_id.to_string()]),
        );
        self.inner.core.dispatcher.enqueue_now(partial).await;

        let outcome = self.advance_from(index).await;
        self.inner.transitioning.store(false, Ordering::SeqCst);
        outcome
    }

    /// Wall-clock resync, used on app-foreground and by the expiry watcher.
    /// Jumps forward only; an exhausted schedule finishes the attempt. No
    /// answer is recorded for questions skipped by the clock.
    pub async fn resync(&self) -> ConfirmOutcome {
        if self.inner.core.is_finishing() {
            return ConfirmOutcome::Ignored;
        }
        if self.inner.transitioning.swap(true, Ordering::SeqCst) {
            return ConfirmOutcome::Ignored;
        }

        let outcome = match self.scheduled_position() {
            RapidPosition::Exhausted => ConfirmOutcome::Finished(self.inner.core.finish().await),
            RapidPosition::Active { index, .. } => {
                let current = self.current_index();
                if index > current {
                    self.inner.current_index.store(index, Ordering::SeqCst);
                    tracing::info!(
                        "Resynced attempt {}: question {} -> {}",
                        self.inner.core.attempt_id,
                        current,
                        index
                    );
                    ConfirmOutcome::Advanced { next_index: index }
                } else {
                    ConfirmOutcome::Ignored
                }
            }
        };

        self.inner.transitioning.store(false, Ordering::SeqCst);
        outcome
    }

    /// Watch the schedule once per tick and resync when the current
    /// question's window runs out.
    pub fn spawn_timer(&self) -> bool {
        let mut slot = self.lock_timer();
        if slot.is_some() {
            return false;
        }

        let session = self.clone();
        *slot = Some(tokio::spawn(async move {
            let _guard = crate::services::attempt_timer::ActiveTimerGuard::new();
            loop {
                session
                    .inner
                    .core
                    .clock
                    .sleep(session.inner.tick_interval)
                    .await;
                if session.inner.core.is_finishing() {
                    break;
                }
                if let ConfirmOutcome::Finished(_) = session.resync().await {
                    break;
                }
            }
        }));
        true
    }

    pub async fn finish(&self) -> Option<ResultsRoute> {
        self.inner.core.finish().await
    }

    pub async fn close(&self) {
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
        }
        self.inner.core.dispatcher.flush().await;
    }

    async fn advance_from(&self, index: usize) -> ConfirmOutcome {
        let next = index + 1;
        if next >= self.inner.spec.items.len() {
            ConfirmOutcome::Finished(self.inner.core.finish().await)
        } else {
            self.inner.current_index.store(next, Ordering::SeqCst);
            ConfirmOutcome::Advanced { next_index: next }
        }
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .timer_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
