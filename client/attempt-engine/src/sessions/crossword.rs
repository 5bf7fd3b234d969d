use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{effective_limit, spawn_countdown, SessionCore};
use crate::models::{AnswerValue, AnswersPayload, CrosswordSpec, ResultsRoute};
use crate::services::attempt_timer;
use crate::services::crossword::CrosswordGrid;
use crate::services::save_dispatcher::SaveStatus;
use crate::services::SessionContext;

/// Play-screen session for a crossword. The letter grid is the source of
/// truth; every save re-derives the per-entry strings from it and ships
/// them as one nested answers map under the crossword's item id.
#[derive(Clone)]
pub struct CrosswordSession {
    inner: Arc<CrosswordInner>,
}

struct CrosswordInner {
    core: SessionCore,
    spec: CrosswordSpec,
    grid: Mutex<CrosswordGrid>,
    timer_task: Mutex<Option<JoinHandle<()>>>,
    tick_interval: std::time::Duration,
}

impl CrosswordSession {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        context: &SessionContext,
        attempt_id: &str,
        spec: CrosswordSpec,
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
            "crossword",
        );

        let mut grid = CrosswordGrid::new(&spec);
        if let Some(AnswerValue::Crossword(entries)) = answers.get(&spec.id) {
            grid.apply_answers(entries);
        }

        Self {
            inner: Arc::new(CrosswordInner {
                core,
                spec,
                grid: Mutex::new(grid),
                timer_task: Mutex::new(None),
                tick_interval: context.tick_interval(),
            }),
        }
    }

    pub fn spec(&self) -> &CrosswordSpec {
        &self.inner.spec
    }

    pub fn save_status(&self) -> watch::Receiver<SaveStatus> {
        self.inner.core.dispatcher.status()
    }

    pub fn is_finishing(&self) -> bool {
        self.inner.core.is_finishing()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<char> {
        self.lock_grid().cell(row, col)
    }

    pub fn entry_answer(&self, entry_id: &str) -> Option<String> {
        self.lock_grid().entry_answers().remove(entry_id)
    }

    /// Type a letter into a cell and schedule a debounced save.
    pub fn set_cell(&self, row: usize, col: usize, letter: char) {
        if !self.lock_grid().set_cell(row, col, letter) {
            return;
        }
        self.schedule_save();
    }

    /// Erase a cell and schedule a debounced save.
    pub fn clear_cell(&self, row: usize, col: usize) {
        if !self.lock_grid().clear_cell(row, col) {
            return;
        }
        self.schedule_save();
    }

    pub fn answers(&self) -> AnswersPayload {
        self.snapshot_payload()
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        let limit = effective_limit(self.inner.spec.total_time_limit_seconds)?;
        Some(attempt_timer::remaining_seconds(
            limit,
            self.inner.core.started_at,
            self.inner.core.clock.now(),
        ))
    }

    /// Start the total countdown; expiry triggers the one-shot finish.
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

    pub async fn close(&self) {
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
        }
        self.inner.core.dispatcher.flush().await;
    }

    fn schedule_save(&self) {
        self.inner
            .core
            .dispatcher
            .schedule_debounced(self.snapshot_payload());
    }

    fn snapshot_payload(&self) -> AnswersPayload {
        let entries = self.lock_grid().entry_answers();
        let mut payload = AnswersPayload::new();
        payload.insert(self.inner.spec.id.clone(), AnswerValue::Crossword(entries));
        payload
    }

    fn lock_grid(&self) -> MutexGuard<'_, CrosswordGrid> {
        self.inner
            .grid
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .timer_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
