use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::answers::AnswersPayload;

/// Quiz snapshot served for one attempt, discriminated by quiz type.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AttemptSpec {
    Basic(BasicSpec),
    Rapid(RapidSpec),
    Crossword(CrosswordSpec),
}

impl AttemptSpec {
    pub fn quiz_name(&self) -> &str {
        match self {
            AttemptSpec::Basic(spec) => &spec.quiz_name,
            AttemptSpec::Rapid(spec) => &spec.quiz_name,
            AttemptSpec::Crossword(spec) => &spec.quiz_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BasicSpec {
    pub quiz_name: String,
    pub items: Vec<QuizItem>,
    /// Zero or missing means untimed.
    pub total_time_limit_seconds: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RapidSpec {
    pub quiz_name: String,
    pub items: Vec<RapidItem>,
}

impl RapidSpec {
    pub fn time_limits(&self) -> Vec<u32> {
        self.items.iter().map(|item| item.time_limit_seconds).collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CrosswordSpec {
    /// Item id the per-entry answers map is stored under.
    pub id: String,
    pub quiz_name: String,
    pub rows: usize,
    pub cols: usize,
    pub entries: Vec<CrosswordEntry>,
    pub total_time_limit_seconds: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuizItem {
    pub id: String,
    pub prompt: String,
    #[serde(flatten)]
    pub kind: ItemKind,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ItemKind {
    MultipleChoice {
        options: Vec<ChoiceOption>,
        multi_select: bool,
    },
    OpenText,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RapidItem {
    pub id: String,
    pub prompt: String,
    pub options: Vec<ChoiceOption>,
    pub time_limit_seconds: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CrosswordEntry {
    pub id: String,
    pub clue: String,
    /// Ordered cell positions; the entry's answer string follows this order.
    pub cells: Vec<CellRef>,
}

/// Server-side attempt document returned for resume. `started_at` and
/// `attempt_version` are server-authoritative, never generated locally.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AttemptDoc {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub attempt_version: i64,
    #[serde(default)]
    pub answers: AnswersPayload,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AttemptFetch {
    pub spec: AttemptSpec,
    pub doc: Option<AttemptDoc>,
    pub schedule_id: Option<String>,
}
