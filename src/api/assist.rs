//! Utterance endpoint used by the web UI

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::dispatch::Response;
use crate::video::VideoLink;

/// Build the assist router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/gemini", post(assist))
        .with_state(state)
}

/// Request body
#[derive(Debug, Default, Deserialize)]
pub struct AssistRequest {
    #[serde(default)]
    pub query: String,
}

/// Reply payload: display text, or a structured video reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyBody {
    Text(String),
    Video(VideoLink),
}

impl From<&Response> for ReplyBody {
    fn from(response: &Response) -> Self {
        response
            .video_link()
            .map_or_else(|| Self::Text(response.to_string()), |link| Self::Video(link.clone()))
    }
}

/// Response body
#[derive(Debug, Serialize)]
pub struct AssistResponse {
    pub response: ReplyBody,
}

impl AssistResponse {
    fn failed(detail: impl std::fmt::Display) -> Self {
        Self {
            response: ReplyBody::Text(format!("Sorry, I encountered an error: {detail}")),
        }
    }
}

/// Dispatch one utterance
///
/// Collaborator failures are rendered into a 200 reply. Only a panicked or
/// timed-out dispatch produces a 500.
async fn assist(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<AssistRequest>,
) -> (StatusCode, Json<AssistResponse>) {
    tracing::debug!(query = %request.query, "assist request");

    let assistant = Arc::clone(&state.assistant);
    let mut task = tokio::spawn(async move {
        let response = assistant.dispatch(&request.query).await;
        if let Some(e) = response.error() {
            tracing::warn!(kind = ?e.kind(), error = %e, "handler failed");
        }
        ReplyBody::from(&response)
    });

    let joined = match state.request_timeout {
        Some(limit) => {
            if let Ok(joined) = tokio::time::timeout(limit, &mut task).await {
                joined
            } else {
                task.abort();
                tracing::error!(timeout_secs = limit.as_secs(), "dispatch timed out");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(AssistResponse::failed(format!(
                        "request timed out after {}s",
                        limit.as_secs()
                    ))),
                );
            }
        }
        None => task.await,
    };

    match joined {
        Ok(body) => (StatusCode::OK, Json(AssistResponse { response: body })),
        Err(e) => {
            tracing::error!(error = %e, "dispatch task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AssistResponse::failed(e)),
            )
        }
    }
}
