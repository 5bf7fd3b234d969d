use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::{AnswerValue, AnswersPayload};

/// In-memory answers for one attempt, keyed by item id. Mutated only from
/// engine callbacks on the runtime's event loop; the mutex is for interior
/// mutability, not contention.
#[derive(Default)]
pub struct AnswerStore {
    entries: Mutex<AnswersPayload>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AnswersPayload> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace all local state, e.g. when resuming from a server document.
    pub fn restore(&self, payload: AnswersPayload) {
        *self.lock() = payload;
    }

    /// Toggle a multiple-choice option. Single-select keeps at most one id
    /// (re-tapping the selected option clears it); multi-select toggles
    /// membership. An emptied selection drops the item key entirely.
    pub fn toggle_choice(&self, item_id: &str, option_id: &str, multi_select: bool) {
        let mut entries = self.lock();

        let mut selection = match entries.remove(item_id) {
            Some(AnswerValue::Selection(ids)) => ids,
            _ => Vec::new(),
        };

        if multi_select {
            if let Some(pos) = selection.iter().position(|id| id == option_id) {
                selection.remove(pos);
            } else {
                selection.push(option_id.to_string());
            }
        } else if selection.len() == 1 && selection[0] == option_id {
            selection.clear();
        } else {
            selection = vec![option_id.to_string()];
        }

        if !selection.is_empty() {
            entries.insert(item_id.to_string(), AnswerValue::Selection(selection));
        }
    }

    /// Replace a single-selection outright (rapid confirm).
    pub fn set_selection(&self, item_id: &str, option_ids: Vec<String>) {
        self.lock()
            .insert(item_id.to_string(), AnswerValue::Selection(option_ids));
    }

    /// Replace an open-text answer. No save side effect; persistence
    /// happens when the field commits (blur/submit).
    pub fn set_text(&self, item_id: &str, text: &str) {
        self.lock()
            .insert(item_id.to_string(), AnswerValue::Text(text.to_string()));
    }

    pub fn get(&self, item_id: &str) -> Option<AnswerValue> {
        self.lock().get(item_id).cloned()
    }

    /// Full payload rebuilt from current state.
    pub fn snapshot(&self) -> AnswersPayload {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
