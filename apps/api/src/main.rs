mod checkpoint;
mod config;
mod db;
mod documents;
mod errors;
mod llm_client;
mod models;
mod routes;
mod stages;
mod state;
#[cfg(test)]
mod test_support;
mod workflow;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::checkpoint::postgres::PgCheckpointStore;
use crate::checkpoint::redis_store::RedisCheckpointStore;
use crate::checkpoint::{CheckpointStore, MemoryCheckpointStore};
use crate::config::{CheckpointBackend, Config, ScorerBackend, ShareAccess};
use crate::db::{create_pool, ensure_checkpoint_schema};
use crate::documents::s3::S3Publisher;
use crate::llm_client::{LanguageModel, LlmClient};
use crate::routes::build_router;
use crate::stages::scoring::{KeywordRelevanceScorer, LlmRelevanceScorer, RelevanceScorer};
use crate::state::AppState;
use crate::workflow::build_workflow;

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

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm.clone())?;
    info!("LLM client initialized (model: {})", llm.settings().model);
    let model: Arc<dyn LanguageModel> = Arc::new(llm);

    let scorer: Arc<dyn RelevanceScorer> = match config.relevance_scorer {
        ScorerBackend::Llm => Arc::new(LlmRelevanceScorer::new(model.clone())),
        ScorerBackend::Keyword => Arc::new(KeywordRelevanceScorer),
    };
    info!("Relevance scorer: {}", scorer.backend());

    // Initialize S3 / MinIO document publisher
    let s3 = build_s3_client(&config).await;
    if config.share_access == ShareAccess::ReadWrite {
        warn!("Published documents are world-writable (DOCUMENT_SHARE_ACCESS=read_write)");
    }
    let publisher = Arc::new(S3Publisher::new(
        s3,
        config.s3_bucket.clone(),
        config.public_base_url.clone(),
        config.share_access,
    ));
    info!("S3 document publisher initialized (bucket: {})", config.s3_bucket);

    let store = build_checkpoint_store(&config.checkpoint_backend).await?;

    let engine = build_workflow(model, scorer, publisher, store)?;
    let state = AppState {
        engine: Arc::new(engine),
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

async fn build_checkpoint_store(backend: &CheckpointBackend) -> Result<Arc<dyn CheckpointStore>> {
    let store: Arc<dyn CheckpointStore> = match backend {
        CheckpointBackend::Memory => {
            info!("Checkpoints kept in memory; interrupted runs are lost on restart");
            Arc::new(MemoryCheckpointStore::new())
        }
        CheckpointBackend::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            ensure_checkpoint_schema(&pool).await?;
            Arc::new(PgCheckpointStore::new(pool))
        }
        CheckpointBackend::Redis { redis_url } => {
            Arc::new(RedisCheckpointStore::connect(redis_url).await?)
        }
    };
    Ok(store)
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "tailor-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
