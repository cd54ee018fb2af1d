//! Session provider webhook intake
//!
//! The session provider posts lifecycle events to `/internal/webhook`. The
//! only event acted on is `sessionDestroyed`, which drops the room's MOTD so
//! a future session of the same room starts clean. Deliveries must carry the
//! shared webhook secret verbatim in the `Authorization` header; the body
//! stays raw bytes until that check passes.

use crate::api::{error_reply, ErrorResponse};
use crate::cache::RoomCache;
use crate::error::Error;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

/// Shared state for the webhook route
#[derive(Clone)]
pub struct WebhookState {
    pub cache: RoomCache,
    pub secret: String,
}

/// Build the webhook router
pub fn webhook_router(state: WebhookState) -> Router {
    Router::new()
        .route("/internal/webhook", post(receive_event))
        .with_state(state)
}

/// POST /internal/webhook
async fn receive_event(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ErrorResponse> {
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if !constant_time_eq(provided.as_bytes(), state.secret.as_bytes()) {
        tracing::warn!("Rejected webhook delivery with invalid credentials");
        return Err(error_reply(Error::Unauthorized));
    }

    // The provider emits many event types; anything this service does not
    // act on (non-JSON bodies included) is still acknowledged so the
    // provider stops redelivering.
    let event: ProviderEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(_) => return Ok(StatusCode::OK),
    };

    if event.event.as_deref() == Some("sessionDestroyed") {
        if let Some(room) = event.session_id.as_deref() {
            state.cache.clear_motd(room).await.map_err(error_reply)?;
            tracing::info!("Cleared motd for destroyed room '{}'", room);
        }
    }

    Ok(StatusCode::OK)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }

    diff == 0
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ProviderEvent {
    event: Option<String>,
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}
