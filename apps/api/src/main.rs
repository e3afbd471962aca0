mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod providers;
mod routes;
mod screening;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{LlmClassifier, LlmClient};
use crate::providers::http::HttpProvider;
use crate::providers::local::LocalDocumentReader;
use crate::providers::{ClassificationProvider, ExtractionProvider, ScoringProvider};
use crate::routes::build_router;
use crate::screening::estimator::FitScoreEstimator;
use crate::screening::extractor::DocumentExtractor;
use crate::screening::orchestrator::{BatchOrchestrator, OrchestratorConfig};
use crate::screening::store::PgCandidateStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgCandidateStore::new(db));

    // One HTTP client shared by every outbound provider
    let http = reqwest::Client::builder().build()?;

    let llm = LlmClient::new(config.anthropic_api_key.clone(), http.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Extraction chain: remote primary, then remote or in-process secondary
    let primary: Arc<dyn ExtractionProvider> = Arc::new(HttpProvider::new(
        "primary-extractor",
        config.extraction_primary_url.clone(),
        http.clone(),
    ));
    let secondary: Arc<dyn ExtractionProvider> = match &config.extraction_secondary_url {
        Some(url) => Arc::new(HttpProvider::new("secondary-extractor", url.clone(), http.clone())),
        None => Arc::new(LocalDocumentReader::new(config.resume_root.clone())),
    };
    info!(
        primary = primary.name(),
        secondary = secondary.name(),
        "Extraction chain configured"
    );
    let extractor = DocumentExtractor::new(vec![primary, secondary], config.provider_timeout);

    // Fit scoring: LLM first, optional fallback endpoint
    let scoring_fallback: Option<Arc<dyn ScoringProvider>> =
        config.scoring_fallback_url.as_ref().map(|url| {
            Arc::new(HttpProvider::new("scoring-fallback", url.clone(), http.clone()))
                as Arc<dyn ScoringProvider>
        });
    let estimator = FitScoreEstimator::new(
        Arc::new(llm.clone()),
        scoring_fallback,
        config.provider_timeout,
    );

    // Batch classification
    let classifier: Arc<dyn ClassificationProvider> = match &config.classifier_url {
        Some(url) => Arc::new(HttpProvider::new("classifier", url.clone(), http.clone())),
        None => Arc::new(LlmClassifier(llm)),
    };
    info!(
        classifier = classifier.name(),
        batch_size = config.batch_size,
        "Batch orchestrator configured"
    );
    let orchestrator = BatchOrchestrator::new(
        classifier,
        OrchestratorConfig {
            batch_size: config.batch_size,
            batch_delay: config.batch_delay,
            call_timeout: config.provider_timeout,
        },
    );

    // Build app state
    let state = AppState {
        store,
        extractor: Arc::new(extractor),
        estimator: Arc::new(estimator),
        orchestrator: Arc::new(orchestrator),
        run_guard: Arc::new(Mutex::new(())),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
