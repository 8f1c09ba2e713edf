//! Application state management

use codemate_core::config::AppConfig;
use codemate_rag::QueryPipeline;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Query pipeline (set once collaborators are constructed)
    pipeline: RwLock<Option<Arc<QueryPipeline>>>,
}

impl AppState {
    /// Create new application state with config
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            pipeline: RwLock::new(None),
        }
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Install the query pipeline
    pub async fn set_pipeline(&self, pipeline: Arc<QueryPipeline>) {
        *self.pipeline.write().await = Some(pipeline);
    }

    /// Get the query pipeline if initialized
    pub async fn pipeline(&self) -> Option<Arc<QueryPipeline>> {
        self.pipeline.read().await.clone()
    }

    /// Whether the service can answer queries
    pub async fn is_ready(&self) -> bool {
        self.pipeline.read().await.is_some()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
