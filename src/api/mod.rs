//! HTTP API server for the Lector gateway
//!
//! Serves the embedded browser player at `/`, the streaming websocket
//! at `/ws`, and a liveness probe at `/healthz`.

pub mod health;
pub mod websocket;

use std::sync::Arc;

use axum::{Router, response::Html, routing::get};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::audio::AudioSettings;
use crate::providers::ResultProvider;

/// The browser player page, compiled into the binary
const PLAYER_PAGE: &str = include_str!("../../static/player.html");

/// Shared state for API handlers
pub struct ApiState {
    /// Process-wide audio framing parameters
    pub audio: AudioSettings,

    /// Provider bound to button 1 (read aloud)
    pub read_aloud: Arc<dyn ResultProvider>,

    /// Provider bound to button 2 (repeat)
    pub repeat: Arc<dyn ResultProvider>,
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server for the given providers
    #[must_use]
    pub fn new(
        audio: AudioSettings,
        read_aloud: Arc<dyn ResultProvider>,
        repeat: Arc<dyn ResultProvider>,
        port: u16,
    ) -> Self {
        Self {
            state: Arc::new(ApiState {
                audio,
                read_aloud,
                repeat,
            }),
            port,
        }
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        // CORS layer for cross-origin requests from frontend
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/", get(player_page))
            .merge(websocket::router(self.state.clone()))
            .merge(health::router())
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

/// Serve the embedded player page
async fn player_page() -> Html<&'static str> {
    Html(PLAYER_PAGE)
}
