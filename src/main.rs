use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use synapse::api::{self, app_state::AppState};
use synapse::config::loader::ConfigLoader;
use synapse::inference::{IntentClassifier, load_model_document};
use synapse::observability::{
    AppMetrics, HealthCheckResult, ObservabilityState, create_observability_router, init_tracing,
    spawn_status_reporter,
};
use synapse::security::validation::QueryValidator;
use synapse::services::{
    ExternalResolver, MemoizationStore, Resolver, ResolverOptions, create_external_resolver,
};
use synapse::storage::JsonFileRepository;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    ConfigLoader::validate(&config).context("invalid configuration")?;

    let _log_guard = init_tracing(&config.logging, &config.app_name)?;
    info!(
        "Starting {} ({} environment)...",
        config.app_name, config.environment
    );

    let document = load_model_document(&config.model.path).await?;
    let classifier = IntentClassifier::from_document(&document, &config.model)
        .context("model is not servable")?;
    info!(
        "Classifier ready: {} inputs, {} layers, {} multiply-accumulates per query",
        classifier.network().input_size(),
        classifier.network().layers().len(),
        classifier.network().multiply_accumulates()
    );

    let repository = Arc::new(JsonFileRepository::new(config.memory.path.clone()));
    let memory = Arc::new(MemoizationStore::open(repository, config.memory.capacity).await?);
    info!(
        "Memory store loaded from {}",
        config.memory.path.display()
    );

    let external: Option<Arc<dyn ExternalResolver>> =
        create_external_resolver(&config.search)?.map(Arc::from);
    if external.is_none() {
        info!("External search disabled");
    }

    let metrics = Arc::new(AppMetrics::default());
    let resolver = Arc::new(Resolver::new(
        Arc::new(classifier),
        memory.clone(),
        external,
        metrics.clone(),
        ResolverOptions::from_config(&config),
    ));

    let app_state = AppState::new(
        resolver,
        QueryValidator::new(config.server.max_query_length),
        metrics.clone(),
    );

    let observability_state = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        metrics.clone(),
    ));
    observability_state
        .add_health_check(HealthCheckResult {
            name: "model".into(),
            healthy: true,
            message: format!("{} intents", document.intents.len()),
        })
        .await;
    observability_state
        .add_health_check(HealthCheckResult {
            name: "memory".into(),
            healthy: true,
            message: format!("{} entries", memory.len().await),
        })
        .await;

    let _reporter = spawn_status_reporter(
        metrics,
        Duration::from_secs(config.logging.status_interval_secs),
    );

    let router = create_observability_router(observability_state)
        .merge(api::create_router(app_state, &config.server.cors_origins));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
