//! CodeMate API Server
//!
//! HTTP gateway answering natural-language questions about an indexed
//! codebase via retrieval-augmented generation.

use codemate_api::{create_router, state::AppState};
use codemate_core::config::AppConfig;
use codemate_rag::{create_llm_client, QueryPipeline};
use codemate_vector::{create_embedding_client, QdrantIndex};
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration: optional TOML file, env vars take precedence
    let config = match std::env::var("CODEMATE_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };

    init_tracing(&config);

    // One HTTP pool shared by the embedding and generation backends,
    // torn down with the process.
    let http = reqwest::Client::builder()
        .connect_timeout(config.llm.connect_timeout())
        .build()?;

    let index = QdrantIndex::new(&config.database)?;
    if let Err(e) = index.ensure_collection().await {
        // The index may come up after us; queries fail upstream until then
        // and readiness reports the gap.
        tracing::warn!(error = %e, "vector index not reachable at startup");
    }

    let embedding = create_embedding_client(http.clone(), &config.llm)?;
    let llm = create_llm_client(http, &config.llm)?;

    let pipeline = Arc::new(QueryPipeline::new(
        Arc::from(embedding),
        Arc::new(index),
        Arc::from(llm),
        config.pipeline.clone(),
    ));

    let state = Arc::new(AppState::new(config.clone()));
    state.set_pipeline(pipeline).await;

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("CodeMate gateway listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json_format {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Resolves when SIGINT or SIGTERM arrives
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
