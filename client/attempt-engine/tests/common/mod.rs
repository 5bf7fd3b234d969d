#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quizlane_attempt::backend::{AttemptBackend, BackendError};
use quizlane_attempt::config::Config;
use quizlane_attempt::models::{
    AnswersPayload, AttemptDoc, AttemptFetch, AttemptSpec, BasicSpec, CellRef, ChoiceOption,
    CrosswordEntry, CrosswordSpec, FinishSummary, ItemKind, QuizItem, RapidItem, RapidSpec,
    SaveAck,
};
use quizlane_attempt::services::SessionContext;
use quizlane_attempt::utils::clock::VirtualClock;

/// In-memory stand-in for the attempt API. Records every save payload,
/// counts finalize calls, and can inject latency and failures.
pub struct MockBackend {
    pub saves: Mutex<Vec<AnswersPayload>>,
    pub finish_calls: AtomicUsize,
    pub fail_saves: AtomicBool,
    pub fail_finish: AtomicBool,
    pub save_delay: Mutex<Duration>,
    pub fetch_response: Mutex<Option<AttemptFetch>>,
    pub finish_summary: Mutex<Option<FinishSummary>>,
    pub max_in_flight: AtomicUsize,
    in_flight: AtomicUsize,
    version: AtomicI64,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            saves: Mutex::new(Vec::new()),
            finish_calls: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
            fail_finish: AtomicBool::new(false),
            save_delay: Mutex::new(Duration::ZERO),
            fetch_response: Mutex::new(None),
            finish_summary: Mutex::new(None),
            max_in_flight: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            version: AtomicI64::new(0),
        })
    }

    pub fn serve(&self, spec: AttemptSpec, doc: Option<AttemptDoc>) {
        *self.fetch_response.lock().unwrap() = Some(AttemptFetch {
            spec,
            doc,
            schedule_id: Some("sched-1".to_string()),
        });
    }

    pub fn set_save_delay(&self, delay: Duration) {
        *self.save_delay.lock().unwrap() = delay;
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }

    pub fn last_save(&self) -> Option<AnswersPayload> {
        self.saves.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AttemptBackend for MockBackend {
    async fn fetch_attempt(&self, _attempt_id: &str) -> Result<AttemptFetch, BackendError> {
        self.fetch_response
            .lock()
            .unwrap()
            .clone()
            .ok_or(BackendError::MissingToken)
    }

    async fn save_answers(
        &self,
        _attempt_id: &str,
        answers: &AnswersPayload,
    ) -> Result<SaveAck, BackendError> {
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let delay = *self.save_delay.lock().unwrap();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: 500,
                body: "save rejected".to_string(),
            });
        }

        self.saves.lock().unwrap().push(answers.clone());
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SaveAck {
            attempt_version: Some(version),
        })
    }

    async fn finish_attempt(
        &self,
        _attempt_id: &str,
    ) -> Result<Option<FinishSummary>, BackendError> {
        self.finish_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_finish.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: 502,
                body: "finalize unavailable".to_string(),
            });
        }
        Ok(self.finish_summary.lock().unwrap().clone())
    }
}

pub fn test_config() -> Config {
    Config {
        api_base_url: "http://localhost:0".to_string(),
        auth_token: Some("test-token".to_string()),
        debounce_ms: 300,
        tick_interval_ms: 1000,
        request_timeout_seconds: 5,
    }
}

/// Context wired to the mock backend and a virtual clock anchored at
/// `anchor`; pair with `#[tokio::test(start_paused = true)]`.
pub fn test_context(backend: Arc<MockBackend>, anchor: DateTime<Utc>) -> SessionContext {
    SessionContext::with_parts(test_config(), backend, Arc::new(VirtualClock::new(anchor)))
}

pub fn choice_item(id: &str, multi_select: bool) -> QuizItem {
    QuizItem {
        id: id.to_string(),
        prompt: format!("Question {}", id),
        kind: ItemKind::MultipleChoice {
            options: vec![
                ChoiceOption {
                    id: "a".to_string(),
                    label: "Option A".to_string(),
                },
                ChoiceOption {
                    id: "b".to_string(),
                    label: "Option B".to_string(),
                },
                ChoiceOption {
                    id: "c".to_string(),
                    label: "Option C".to_string(),
                },
            ],
            multi_select,
        },
    }
}

pub fn open_item(id: &str) -> QuizItem {
    QuizItem {
        id: id.to_string(),
        prompt: format!("Question {}", id),
        kind: ItemKind::OpenText,
    }
}

pub fn basic_spec(items: Vec<QuizItem>, total_time_limit_seconds: Option<u32>) -> AttemptSpec {
    AttemptSpec::Basic(BasicSpec {
        quiz_name: "Demo Quiz".to_string(),
        items,
        total_time_limit_seconds,
    })
}

pub fn rapid_spec(limits: &[u32]) -> AttemptSpec {
    let items = limits
        .iter()
        .enumerate()
        .map(|(i, limit)| RapidItem {
            id: format!("r{}", i + 1),
            prompt: format!("Rapid question {}", i + 1),
            options: vec![
                ChoiceOption {
                    id: "a".to_string(),
                    label: "Option A".to_string(),
                },
                ChoiceOption {
                    id: "b".to_string(),
                    label: "Option B".to_string(),
                },
            ],
            time_limit_seconds: *limit,
        })
        .collect();
    AttemptSpec::Rapid(RapidSpec {
        quiz_name: "Rapid Demo".to_string(),
        items,
    })
}

/// 3x3 grid with one across entry (row 0) and one down entry (col 0),
/// crossing at (0, 0).
pub fn crossword_spec(total_time_limit_seconds: Option<u32>) -> AttemptSpec {
    AttemptSpec::Crossword(CrosswordSpec {
        id: "cw-1".to_string(),
        quiz_name: "Crossword Demo".to_string(),
        rows: 3,
        cols: 3,
        entries: vec![
            CrosswordEntry {
                id: "across-1".to_string(),
                clue: "Feline".to_string(),
                cells: vec![
                    CellRef { row: 0, col: 0 },
                    CellRef { row: 0, col: 1 },
                    CellRef { row: 0, col: 2 },
                ],
            },
            CrosswordEntry {
                id: "down-1".to_string(),
                clue: "Taxi".to_string(),
                cells: vec![
                    CellRef { row: 0, col: 0 },
                    CellRef { row: 1, col: 0 },
                    CellRef { row: 2, col: 0 },
                ],
            },
        ],
        total_time_limit_seconds,
    })
}

pub fn resume_doc(
    attempt_id: &str,
    started_at: DateTime<Utc>,
    attempt_version: i64,
    answers: AnswersPayload,
) -> AttemptDoc {
    AttemptDoc {
        id: attempt_id.to_string(),
        started_at,
        attempt_version,
        answers,
    }
}
