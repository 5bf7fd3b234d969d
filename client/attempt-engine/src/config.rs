use serde::Deserialize;
use std::env;

const DEBOUNCE_MIN_MS: u64 = 250;
const DEBOUNCE_MAX_MS: u64 = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    pub auth_token: Option<String>,
    pub debounce_ms: u64,
    pub tick_interval_ms: u64,
    pub request_timeout_seconds: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let api_base_url = settings
            .get_string("api.base_url")
            .or_else(|_| env::var("API_BASE_URL"))
            .unwrap_or_else(|_| "http://localhost:8081".to_string());

        let auth_token = settings
            .get_string("api.auth_token")
            .or_else(|_| env::var("API_AUTH_TOKEN"))
            .ok()
            .filter(|token| !token.trim().is_empty());

        if auth_token.is_none() {
            eprintln!("WARNING: No API_AUTH_TOKEN set; saves and finalize will be skipped");
        }

        let debounce_ms = settings
            .get_int("engine.debounce_ms")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .or_else(|| {
                env::var("ENGINE_DEBOUNCE_MS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
            })
            .filter(|v| (DEBOUNCE_MIN_MS..=DEBOUNCE_MAX_MS).contains(v))
            .unwrap_or(300);

        let tick_interval_ms = settings
            .get_int("engine.tick_interval_ms")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .or_else(|| {
                env::var("ENGINE_TICK_INTERVAL_MS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
            })
            .filter(|v| *v > 0)
            .unwrap_or(1000);

        let request_timeout_seconds = settings
            .get_int("api.request_timeout_seconds")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(5);

        Ok(Config {
            api_base_url,
            auth_token,
            debounce_ms,
            tick_interval_ms,
            request_timeout_seconds,
        })
    }
}
