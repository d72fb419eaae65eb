//! HTTP ingress: the email webhook posts events here.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::config::ServiceConfig;
use crate::error::{HandlerError, Result};
use crate::llm::create_provider;
use crate::pipeline::{InboundEvent, RequestHandler};
use crate::tasks::{LlmTaskExtractor, TodoistSink};

/// Wire the production handler from configuration.
pub fn build_handler(config: &ServiceConfig) -> Result<RequestHandler> {
    let client = config.http_client()?;
    let llm = create_provider(client.clone(), &config.llm);
    let extractor = Arc::new(LlmTaskExtractor::new(llm));
    let sink = Arc::new(TodoistSink::new(client, &config.sink));
    Ok(RequestHandler::new(
        extractor,
        sink,
        Arc::new(config.credentials.clone()),
    ))
}

/// POST /inbound
///
/// Replies with `{"statusCode", "body"}` and the matching HTTP status.
async fn inbound(
    State(handler): State<Arc<RequestHandler>>,
    Json(event): Json<InboundEvent>,
) -> Response {
    match handler.handle_event(&event).await {
        Ok(resp) => {
            let status =
                StatusCode::from_u16(resp.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(resp)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to handle inbound email");
            let status = match &e {
                HandlerError::Inbound(_) => StatusCode::BAD_REQUEST,
                HandlerError::Extract(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(serde_json::json!({"error": e.to_string()}))).into_response()
        }
    }
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// Build the HTTP routes.
pub fn routes(handler: Arc<RequestHandler>) -> Router {
    Router::new()
        .route("/inbound", post(inbound))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}
