use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use voxbridge_provider::{ConversationSource, ElevenLabsClient, VapiClient};
use voxbridge_scheduler::{RetryPolicy, SchedulerConfig, SyncScheduler};
use voxbridge_schema::Provider;
use voxbridge_server::config::AppConfig;
use voxbridge_server::signature::SignatureVerifier;
use voxbridge_server::state::AppState;
use voxbridge_store::CallStore;
use voxbridge_sync::SyncOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let log_dir = PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "voxbridge-server.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("voxbridge=info,voxbridge_server=info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    let config_path = std::env::var("VOXBRIDGE_CONFIG")
        .unwrap_or_else(|_| "config/voxbridge.yaml".to_string());
    let config = AppConfig::load_or_default(Path::new(&config_path))?;

    if let Some(parent) = Path::new(&config.server.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = CallStore::open(&config.server.db_path)?;

    let mut state = AppState::new(store.clone());
    let cancel = CancellationToken::new();

    let scheduler_config = SchedulerConfig {
        interval: Duration::from_secs(config.sync.interval_secs),
        startup_delay: Duration::from_secs(config.sync.startup_delay_secs),
        retry: RetryPolicy::new(config.sync.max_attempts, config.sync.backoff_ms.clone()),
    };

    if let Some(settings) = config.vapi.as_ref().filter(|s| s.enabled) {
        let client = VapiClient::new(settings.api_key.clone(), config.vapi_base_url());
        let source: Arc<dyn ConversationSource> = Arc::new(client);
        let orchestrator = Arc::new(SyncOrchestrator::new(source, store.clone()));
        state = state.with_orchestrator(Provider::Vapi, orchestrator);

        if let Some(secret) = settings.webhook_secret.as_deref() {
            state = state.with_verifier(Provider::Vapi, SignatureVerifier::new(secret));
        }
    }

    if let Some(settings) = config.elevenlabs.as_ref().filter(|s| s.enabled) {
        let client = ElevenLabsClient::new(settings.api_key.clone(), config.elevenlabs_base_url());
        let source: Arc<dyn ConversationSource> = Arc::new(client);
        let orchestrator = Arc::new(SyncOrchestrator::new(source, store.clone()));
        state = state.with_orchestrator(Provider::ElevenLabs, orchestrator.clone());

        if let Some(secret) = settings.webhook_secret.as_deref() {
            state = state.with_verifier(Provider::ElevenLabs, SignatureVerifier::new(secret));
        }

        // ElevenLabs is the polled provider: one scheduler loop, started
        // after the configured delay, retrying failed runs with backoff.
        let scheduler = SyncScheduler::new(orchestrator, scheduler_config.clone());
        tokio::spawn(scheduler.run(cancel.clone()));
    }

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            shutdown.cancel();
        }
    });

    let bind = std::env::var("VOXBRIDGE_BIND").unwrap_or_else(|_| config.server.bind.clone());
    let result = voxbridge_server::serve(state, &bind).await;
    cancel.cancel();
    result
}
