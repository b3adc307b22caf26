use std::sync::Arc;

use recruitflow_events::{MessageTransport, RetryPolicy};
use recruitflow_worker::{Engine, EngineConfig, RuleStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything heavy sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: recruitflow_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub engine_config: Arc<EngineConfig>,
    /// Engine used by the inline event path.
    pub engine: Arc<Engine>,
    /// Read access for previews.
    pub store: Arc<dyn RuleStore>,
    /// Transport used when an operator approves a reviewed message.
    pub transport: Arc<dyn MessageTransport>,
}

impl AppState {
    pub fn new(
        pool: recruitflow_db::DbPool,
        config: ServerConfig,
        engine_config: EngineConfig,
        store: Arc<dyn RuleStore>,
        transport: Arc<dyn MessageTransport>,
    ) -> Self {
        let engine = Arc::new(Engine::new(
            Arc::clone(&store),
            Arc::clone(&transport),
            &engine_config,
        ));
        Self {
            pool,
            config: Arc::new(config),
            engine_config: Arc::new(engine_config),
            engine,
            store,
            transport,
        }
    }

    pub fn retry(&self) -> RetryPolicy {
        self.engine_config.retry
    }
}
