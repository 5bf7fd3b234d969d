use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{effective_limit, spawn_countdown, SessionCore};
use crate::models::{AnswersPayload, BasicSpec, ItemKind, ResultsRoute};
use crate::services::answer_store::AnswerStore;
use crate::services::attempt_timer;
use crate::services::save_dispatcher::SaveStatus;
use crate::services::SessionContext;

/// Play-screen session for a basic Q&A quiz: multiple-choice taps are
/// debounced into the save pipeline, open-text edits stay local until the
/// field commits, and an optional total-quiz countdown drives the finish.
#[derive(Clone)]
pub struct BasicSession {
    inner: Arc<BasicInner>,
}

struct BasicInner {
    core: SessionCore,
    spec: BasicSpec,
    store: AnswerStore,
    timer_task: Mutex<Option<JoinHandle<()>>>,
    tick_interval: std::time::Duration,
}

impl BasicSession {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        context: &SessionContext,
        attempt_id: &str,
        spec: BasicSpec,
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
            "basic",
        );
        let store = AnswerStore::new();
        store.restore(answers);

        Self {
            inner: Arc::new(BasicInner {
                core,
                spec,
                store,
                timer_task: Mutex::new(None),
                tick_interval: context.tick_interval(),
            }),
        }
    }

    pub fn spec(&self) -> &BasicSpec {
        &self.inner.spec
    }

    pub fn answers(&self) -> AnswersPayload {
        self.inner.store.snapshot()
    }

    pub fn save_status(&self) -> watch::Receiver<SaveStatus> {
        self.inner.core.dispatcher.status()
    }

    pub fn attempt_version(&self) -> Option<i64> {
        self.inner.core.dispatcher.attempt_version()
    }

    pub fn is_finishing(&self) -> bool {
        self.inner.core.is_finishing()
    }

    /// Toggle a multiple-choice option and schedule a debounced save of the
    /// full snapshot.
    pub fn toggle_choice(&self, item_id: &str, option_id: &str) {
        let Some(multi_select) = self.multi_select_for(item_id) else {
            tracing::warn!("Ignoring toggle for unknown choice item {}", item_id);
            return;
        };
        self.inner.store.toggle_choice(item_id, option_id, multi_select);
        self.inner
            .core
            .dispatcher
            .schedule_debounced(self.inner.store.snapshot());
    }

    /// Update an open-text answer locally. Typing never saves.
    pub fn set_text(&self, item_id: &str, text: &str) {
        if !self.is_open_text(item_id) {
            tracing::warn!("Ignoring text edit for unknown open item {}", item_id);
            return;
        }
        self.inner.store.set_text(item_id, text);
    }

    /// Commit an open-text field (blur/submit): exactly one immediate save
    /// of the full snapshot.
    pub async fn commit_text(&self, item_id: &str) {
        if !self.is_open_text(item_id) {
            tracing::warn!("Ignoring text commit for unknown open item {}", item_id);
            return;
        }
        self.inner
            .core
            .dispatcher
            .enqueue_now(self.inner.store.snapshot())
            .await;
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        let limit = effective_limit(self.inner.spec.total_time_limit_seconds)?;
        Some(attempt_timer::remaining_seconds(
            limit,
            self.inner.core.started_at,
            self.inner.core.clock.now(),
        ))
    }

    /// Start the total-quiz countdown; expiry triggers the one-shot finish.
    /// Returns false for untimed quizzes or if the timer already runs.
    pub fn spawn_timer(&self) -> bool {
        let Some(limit) = effective_limit(self.inner.spec.total_time_limit_seconds) else {
            return false;
        };

        let mut slot = self.lock_timer();
        if slot.is_some() {
            return false;
        }

        let session = self.clone();
        *slot = Some(spawn_countdown(
            self.inner.core.clock.clone(),
            self.inner.core.attempt_id.clone(),
            limit,
            self.inner.core.started_at,
            self.inner.tick_interval,
            move || async move {
                let _ = session.finish().await;
            },
        ));
        true
    }

    pub async fn finish(&self) -> Option<ResultsRoute> {
        self.inner.core.finish().await
    }

    /// Unmount: stop the countdown and flush unsaved state best-effort.
    pub async fn close(&self) {
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
        }
        self.inner.core.dispatcher.flush().await;
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .timer_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn multi_select_for(&self, item_id: &str) -> Option<bool> {
        self.inner
            .spec
            .items
            .iter()
            .find(|item| item.id == item_id)
            .and_then(|item| match item.kind {
                ItemKind::MultipleChoice { multi_select, .. } => Some(multi_select),
                ItemKind::OpenText => None,
            })
    }

    fn is_open_text(&self, item_id: &str) -> bool {
        self.inner
            .spec
            .items
            .iter()
            .any(|item| item.id == item_id && matches!(item.kind, ItemKind::OpenText))
    }
}
