use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, Mutex as AsyncMutex};

use crate::backend::AttemptBackend;
use crate::metrics::{record_save_outcome, SAVES_COALESCED_TOTAL};
use crate::models::AnswersPayload;
use crate::utils::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Idle,
    Saving,
    Error,
}

/// Serialized save pipeline for one attempt.
///
/// Every save funnels through a single FIFO gate, so a second save enqueued
/// while one is in flight waits for the first to settle, and a slow earlier
/// save can never overwrite a later one. The snapshot to send is taken at
/// the gate, which also coalesces overlapping triggers into the latest
/// state. Outgoing requests never carry a client-side `attempt_version`;
/// the server's returned version is recorded as-is.
#[derive(Clone)]
pub struct SaveDispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    backend: Arc<dyn AttemptBackend>,
    clock: Arc<dyn Clock>,
    attempt_id: String,
    debounce: Duration,
    pending: Mutex<PendingSlot>,
    send_gate: AsyncMutex<()>,
    status_tx: watch::Sender<SaveStatus>,
    version_tx: watch::Sender<Option<i64>>,
}

#[derive(Default)]
struct PendingSlot {
    payload: Option<AnswersPayload>,
    /// Bumped on every stage/cancel; a debounce sleeper only fires if its
    /// generation is still current.
    generation: u64,
}

impl SaveDispatcher {
    pub fn new(
        backend: Arc<dyn AttemptBackend>,
        clock: Arc<dyn Clock>,
        attempt_id: &str,
        debounce: Duration,
        initial_version: Option<i64>,
    ) -> Self {
        let (status_tx, _) = watch::channel(SaveStatus::Idle);
        let (version_tx, _) = watch::channel(initial_version);

        Self {
            inner: Arc::new(DispatcherInner {
                backend,
                clock,
                attempt_id: attempt_id.to_string(),
                debounce,
                pending: Mutex::new(PendingSlot::default()),
                send_gate: AsyncMutex::new(()),
                status_tx,
                version_tx,
            }),
        }
    }

    /// Stage a snapshot and dispatch it after a quiet period. Re-scheduling
    /// before the period elapses replaces the snapshot and restarts the
    /// wait, so bursts of mutations collapse into one network call.
    pub fn schedule_debounced(&self, payload: AnswersPayload) {
        let generation = {
            let mut slot = self.inner.lock_pending();
            if slot.payload.is_some() {
                SAVES_COALESCED_TOTAL.with_label_values(&["debounced"]).inc();
            }
            slot.payload = Some(payload);
            slot.generation += 1;
            slot.generation
        };

        let inner = self.inner.clone();
        tokio::spawn(async move {
            inner.clock.sleep(inner.debounce).await;
            let still_current = inner.lock_pending().generation == generation;
            if still_current {
                inner.drain().await;
            }
        });
    }

    /// Stage a snapshot and dispatch it immediately, superseding any
    /// pending debounce. Resolves once the save settles.
    pub async fn enqueue_now(&self, payload: AnswersPayload) {
        {
            let mut slot = self.inner.lock_pending();
            slot.payload = Some(payload);
            slot.generation += 1;
        }
        self.inner.drain().await;
    }

    /// Cancel any pending debounce timer and await the latest enqueued
    /// save. Always resolves: a failed save is recorded in the status and
    /// swallowed so navigation/finish can proceed.
    pub async fn flush(&self) {
        {
            self.inner.lock_pending().generation += 1;
        }
        self.inner.drain().await;
    }

    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.inner.status_tx.subscribe()
    }

    pub fn current_status(&self) -> SaveStatus {
        *self.inner.status_tx.subscribe().borrow()
    }

    /// Latest version acked by the server, if any save has succeeded (or a
    /// resume document seeded one).
    pub fn attempt_version(&self) -> Option<i64> {
        *self.inner.version_tx.subscribe().borrow()
    }

    pub fn version_watch(&self) -> watch::Receiver<Option<i64>> {
        self.inner.version_tx.subscribe()
    }
}

impl DispatcherInner {
    fn lock_pending(&self) -> MutexGuard<'_, PendingSlot> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the staged snapshot behind the FIFO gate and send it. Entering
    /// the gate waits out any in-flight save first, so callers that staged
    /// nothing new still observe "latest save settled" on return.
    async fn drain(&self) {
        let _gate = self.send_gate.lock().await;

        let payload = self.lock_pending().payload.take();
        let Some(payload) = payload else {
            return;
        };

        let _ = self.status_tx.send_replace(SaveStatus::Saving);

        match self.backend.save_answers(&self.attempt_id, &payload).await {
            Ok(ack) => {
                record_save_outcome(true);
                if let Some(version) = ack.attempt_version {
                    let _ = self.version_tx.send_replace(Some(version));
                }
                let _ = self.status_tx.send_replace(SaveStatus::Idle);
                tracing::debug!(
                    "Saved {} answer(s) for attempt {}",
                    payload.len(),
                    self.attempt_id
                );
            }
            Err(e) => {
                record_save_outcome(false);
                // No automatic retry; the next save (debounced or flushed)
                // clears the error state.
                let _ = self.status_tx.send_replace(SaveStatus::Error);
                tracing::warn!("Save failed for attempt {}: {}", self.attempt_id, e);
            }
        }
    }
}
