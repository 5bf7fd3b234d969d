use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AnswersPayload, AttemptFetch, FinishSummary, SaveAck};

pub mod http;

pub use http::HttpBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("no auth token configured")]
    MissingToken,
}

/// The attempt API as seen from the engine. Saving accepts a partial or
/// full answers map; the server is responsible for merging.
#[async_trait]
pub trait AttemptBackend: Send + Sync + 'static {
    async fn fetch_attempt(&self, attempt_id: &str) -> Result<AttemptFetch, BackendError>;

    async fn save_answers(
        &self,
        attempt_id: &str,
        answers: &AnswersPayload,
    ) -> Result<SaveAck, BackendError>;

    async fn finish_attempt(
        &self,
        attempt_id: &str,
    ) -> Result<Option<FinishSummary>, BackendError>;
}
