use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One item's answer on the wire. Untagged: selections serialize as a JSON
/// array, open text as a string, crossword entries as a nested object.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum AnswerValue {
    Selection(Vec<String>),
    Text(String),
    Crossword(BTreeMap<String, String>),
}

/// Full answers map keyed by item id. Keys are a subset of the quiz's
/// item/entry ids; values are rebuilt from local state on every save,
/// never diffed.
pub type AnswersPayload = BTreeMap<String, AnswerValue>;

impl AnswerValue {
    pub fn selection(&self) -> Option<&[String]> {
        match self {
            AnswerValue::Selection(ids) => Some(ids),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn crossword(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            AnswerValue::Crossword(entries) => Some(entries),
            _ => None,
        }
    }
}
