use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Acknowledgement of a save. The server owns concurrency versioning; the
/// client never sends a version back, it only records the latest one seen.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SaveAck {
    pub attempt_version: Option<i64>,
}

/// Whatever the finalize endpoint managed to return. All fields optional;
/// parsing is lenient because the endpoint may answer with partial JSON,
/// numbers-as-strings, or nothing at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinishSummary {
    pub score: Option<i64>,
    pub max_score: Option<i64>,
    pub schedule_id: Option<String>,
    pub answers_available: Option<bool>,
}

impl FinishSummary {
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            score: coerce_i64(obj.get("score")),
            max_score: coerce_i64(obj.get("maxScore")),
            schedule_id: obj
                .get("scheduleId")
                .and_then(Value::as_str)
                .map(str::to_string),
            answers_available: obj.get("answersAvailable").and_then(Value::as_bool),
        })
    }
}

fn coerce_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parameters for the results view. Every field is coerced to a safe
/// default so the view renders even when finalize returned nothing.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ResultsRoute {
    pub attempt_id: String,
    pub schedule_id: String,
    pub score: i64,
    pub max_score: i64,
    pub quiz_name: String,
    pub answers_available: bool,
}

impl ResultsRoute {
    pub fn from_summary(
        attempt_id: &str,
        quiz_name: &str,
        schedule_id: Option<&str>,
        summary: Option<&FinishSummary>,
    ) -> Self {
        let score = summary.and_then(|s| s.score).unwrap_or(0);
        let max_score = summary.and_then(|s| s.max_score).unwrap_or(0);
        let answers_available = summary.and_then(|s| s.answers_available).unwrap_or(false);
        let schedule_id = summary
            .and_then(|s| s.schedule_id.as_deref())
            .or(schedule_id)
            .unwrap_or_default()
            .to_string();
        let quiz_name = if quiz_name.trim().is_empty() {
            "Quiz".to_string()
        } else {
            quiz_name.to_string()
        };

        Self {
            attempt_id: attempt_id.to_string(),
            schedule_id,
            score,
            max_score,
            quiz_name,
            answers_available,
        }
    }
}
