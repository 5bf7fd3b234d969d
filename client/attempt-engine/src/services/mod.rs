use crate::backend::{AttemptBackend, HttpBackend};
use crate::config::Config;
use crate::utils::clock::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// Shared dependencies for every session: configuration, the attempt API
/// client, and the clock. Tests swap in a mock backend and a virtual clock.
pub struct SessionContext {
    pub config: Config,
    pub backend: Arc<dyn AttemptBackend>,
    pub clock: Arc<dyn Clock>,
}

impl SessionContext {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let backend = HttpBackend::new(
            &config.api_base_url,
            config.auth_token.clone(),
            Duration::from_secs(config.request_timeout_seconds),
        )?;

        Ok(Self {
            backend: Arc::new(backend),
            clock: Arc::new(SystemClock),
            config,
        })
    }

    pub fn with_parts(
        config: Config,
        backend: Arc<dyn AttemptBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            backend,
            clock,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.config.debounce_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.config.tick_interval_ms)
    }
}

pub mod answer_store;
pub mod attempt_timer;
pub mod crossword;
pub mod save_dispatcher;
