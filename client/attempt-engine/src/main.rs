#![allow(dead_code)]

use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use quizlane_attempt::{config::Config, load_session, services::SessionContext, AttemptSession};

/// Headless smoke player: loads one attempt, optionally waits out its
/// timer, finishes it, and prints the results route plus engine metrics.
#[tokio::main]
async fn main() {
    // Initialize OpenTelemetry tracer (optional, can be disabled)
    let _tracer = init_telemetry();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizlane_attempt=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_opentelemetry::layer())
        .init();

    tracing::info!("Starting QuizLane attempt player");

    let config = Config::load().expect("Failed to load configuration");

    let mut args = std::env::args().skip(1);
    let attempt_id = args
        .next()
        .filter(|arg| !arg.starts_with("--"))
        .or_else(|| std::env::var("ATTEMPT_ID").ok())
        .expect("Usage: quizlane-player <attempt-id> [--wait-timer]");
    let wait_for_timer = std::env::args().any(|arg| arg == "--wait-timer");

    let run_id = Uuid::new_v4();
    tracing::info!("Player run {} for attempt {}", run_id, attempt_id);

    let context = SessionContext::new(config).expect("Failed to initialize session context");
    let session = load_session(&context, &attempt_id)
        .await
        .expect("Failed to load attempt");

    tracing::info!("Playing quiz: {}", session.quiz_name());

    let route = match session {
        AttemptSession::Basic(session) => {
            if wait_for_timer {
                wait_out_timer(session.remaining_seconds()).await;
            }
            session.finish().await
        }
        AttemptSession::Crossword(session) => {
            if wait_for_timer {
                wait_out_timer(session.remaining_seconds()).await;
            }
            session.finish().await
        }
        // Rapid smoke runs finish straight away; the per-question schedule
        // is exercised by the engine tests.
        AttemptSession::Rapid(session) => session.finish().await,
    };

    match route {
        Some(route) => {
            let json = serde_json::to_string_pretty(&route)
                .unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
        None => tracing::warn!("Attempt {} was already finishing", attempt_id),
    }

    println!("{}", quizlane_attempt::metrics::render_metrics());

    shutdown_telemetry();
}

async fn wait_out_timer(remaining: Option<u32>) {
    let Some(remaining) = remaining.filter(|r| *r > 0) else {
        return;
    };
    tracing::info!("Waiting {}s for the attempt timer to expire", remaining);
    tokio::time::sleep(Duration::from_secs(u64::from(remaining) + 1)).await;
}

fn init_telemetry() -> opentelemetry_sdk::trace::Tracer {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::SdkTracerProvider;
    use opentelemetry_sdk::Resource;

    // Check if OTLP endpoint is configured
    let otlp_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4318".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(otlp_endpoint)
        .build()
        .expect("Failed to create OTLP exporter");

    let resource = Resource::builder_empty()
        .with_service_name("quizlane-player")
        .with_attributes(vec![KeyValue::new(
            "service.version",
            env!("CARGO_PKG_VERSION"),
        )])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();

    let tracer = provider.tracer("quizlane-player");

    opentelemetry::global::set_tracer_provider(provider);

    tracer
}

fn shutdown_telemetry() {
    tracing::info!("Shutting down OpenTelemetry");
    // In opentelemetry 0.31, shutdown is handled by dropping the provider
}
