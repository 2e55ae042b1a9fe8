//! bup-api: chat proxy and image upload relay for the bup issue reporter
//!
//! The issue backend itself lives elsewhere; this server only fronts the two
//! third-party services the clients must not hold credentials for.

mod chat;
mod config;
mod media;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chat::{GeminiClient, GenerativeModel};
use config::ServerConfig;
use media::{Cloudinary, MediaHost};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn GenerativeModel>,
    pub media: Arc<dyn MediaHost>,
}

/// `{"error": ...}` body used by every failure response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

impl ErrorBody {
    pub fn response(status: StatusCode, error: &'static str) -> Response {
        (status, Json(ErrorBody { error })).into_response()
    }
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat::chat))
        .route(
            "/upload",
            post(media::upload).layer(DefaultBodyLimit::max(media::MAX_UPLOAD_BYTES)),
        )
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) fn test_router(
    model: Arc<dyn GenerativeModel>,
    media: Option<Arc<dyn MediaHost>>,
) -> Router {
    build_router(AppState {
        model,
        media: media.unwrap_or_else(|| Arc::new(Cloudinary::new(None))),
    })
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_env();
    let state = AppState {
        model: Arc::new(GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        )),
        media: Arc::new(Cloudinary::new(config.cloudinary.clone())),
    };
    let app = build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting bup-api on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chat::ChatError;
    use tower::ServiceExt;

    struct Silent;

    #[async_trait::async_trait]
    impl GenerativeModel for Silent {
        async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
            Err(ChatError::EmptyReply)
        }
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router(Arc::new(Silent), None)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = test_router(Arc::new(Silent), None)
            .oneshot(Request::builder().uri("/issues").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
