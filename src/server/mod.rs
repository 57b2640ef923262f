//! HTTP front end - start refinement sessions and poll their progress.
//!
//! Routes:
//! - `GET /` - single-page UI
//! - `POST /start_task` - start a background session
//! - `GET /get_status/:session_id` - session snapshot
//! - `POST /cancel/:session_id` - request cancellation
//! - `GET /sessions` - all known sessions
//! - `GET /list_models` - models the backend can serve
//! - `GET /test_connection` - connectivity check
//! - `GET /health` - liveness

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{CancelResponse, StartTaskRequest, StartTaskResponse};

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use eyre::{Context, Result};
use log::info;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::llm::LlmClient;
use crate::refine::RefinementLoop;
use crate::session::{SessionManager, SessionRegistry};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub client: Arc<dyn LlmClient>,
    pub default_max_rounds: u32,
}

impl AppState {
    /// Build state for web sessions from the loaded configuration.
    pub fn new(config: &Config, client: Arc<dyn LlmClient>) -> Self {
        let runner = Arc::new(RefinementLoop::new(Arc::clone(&client), config.server_refinement()));
        let registry = SessionRegistry::new(
            config.server.max_sessions,
            Duration::from_secs(config.server.session_ttl_secs),
        );
        Self {
            sessions: SessionManager::new(runner, registry),
            client,
            default_max_rounds: config.refinement.max_rounds,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/start_task", post(handlers::start_task))
        .route("/get_status/:session_id", get(handlers::get_status))
        .route("/cancel/:session_id", post(handlers::cancel_session))
        .route("/sessions", get(handlers::list_sessions))
        .route("/list_models", get(handlers::list_models))
        .route("/test_connection", get(handlers::test_connection))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &Config, client: Arc<dyn LlmClient>) -> Result<()> {
    let state = AppState::new(config, client);
    let sweeper = state
        .sessions
        .spawn_sweeper(Duration::from_secs(config.server.sweep_interval_secs.max(1)));
    let app = create_router(state);

    let addr = &config.server.bind_address;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .context("Server error")?;

    sweeper.abort();
    Ok(())
}
