use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::{AttemptBackend, BackendError};
use crate::models::{AnswersPayload, AttemptFetch, FinishSummary, SaveAck};

/// HTTP client for the attempt API.
///
/// Without an auth token, saves and finalize degrade to successful no-ops:
/// the play screens keep working locally and simply lose persistence.
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
    request_timeout: Duration,
}

impl HttpBackend {
    pub fn new(
        base_url: &str,
        auth_token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            client: Client::new(),
            base_url: Url::parse(base_url)?,
            auth_token,
            request_timeout,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base_url.join(path)?)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(BackendError::Status { status, body })
    }
}

#[async_trait]
impl AttemptBackend for HttpBackend {
    async fn fetch_attempt(&self, attempt_id: &str) -> Result<AttemptFetch, BackendError> {
        if self.auth_token.is_none() {
            return Err(BackendError::MissingToken);
        }

        let url = self.endpoint(&format!("api/v1/attempts/{}", attempt_id))?;
        tracing::debug!("Fetching attempt {} from {}", attempt_id, url);

        let response = self
            .authorized(self.client.get(url))
            .timeout(self.request_timeout)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let fetch: AttemptFetch = response.json().await?;
        Ok(fetch)
    }

    async fn save_answers(
        &self,
        attempt_id: &str,
        answers: &AnswersPayload,
    ) -> Result<SaveAck, BackendError> {
        if self.auth_token.is_none() {
            tracing::debug!("No auth token, skipping save for attempt {}", attempt_id);
            return Ok(SaveAck::default());
        }

        let url = self.endpoint(&format!("api/v1/attempts/{}/answers", attempt_id))?;
        let response = self
            .authorized(self.client.put(url))
            .json(answers)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let ack: SaveAck = response.json().await.unwrap_or_default();
        Ok(ack)
    }

    async fn finish_attempt(
        &self,
        attempt_id: &str,
    ) -> Result<Option<FinishSummary>, BackendError> {
        if self.auth_token.is_none() {
            tracing::debug!("No auth token, skipping finalize for attempt {}", attempt_id);
            return Ok(None);
        }

        let url = self.endpoint(&format!("api/v1/attempts/{}/finish", attempt_id))?;
        let response = self
            .authorized(self.client.post(url))
            .timeout(self.request_timeout)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        // The endpoint may return null, partial JSON, or nothing at all.
        let value: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
        Ok(FinishSummary::from_value(&value))
    }
}
