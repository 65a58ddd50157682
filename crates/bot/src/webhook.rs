//! Webhook the bridge posts connection events to.
//!
//! Handlers only validate and enqueue; the single notifier task drains the
//! queue, so no two events are ever processed at once.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use subtle::ConstantTimeEq;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use subbot_common::error::AppError;
use subbot_common::types::GroupEvent;

/// Header carrying the shared webhook secret.
pub const SECRET_HEADER: &str = "x-subbot-secret";

/// State shared by the webhook handlers.
#[derive(Clone)]
pub struct WebhookState {
    pub events: mpsc::Sender<GroupEvent>,
    pub secret: Option<String>,
}

impl WebhookState {
    pub fn new(events: mpsc::Sender<GroupEvent>, secret: Option<String>) -> Self {
        Self { events, secret }
    }
}

/// Build the webhook router.
pub fn create_router(state: WebhookState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/events", post(receive_event))
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "subbot",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// POST /events — Queue a bridge event for the notifier.
async fn receive_event(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    payload: Result<Json<GroupEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    if let Some(expected) = &state.secret {
        let provided = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
            return Err(AppError::Auth("invalid webhook secret".into()));
        }
    }

    let Json(event) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let kind = event.to_string();

    // Never wait on a full queue; the bridge retries on 503.
    state.events.try_send(event).map_err(|e| match e {
        TrySendError::Full(_) => AppError::Unavailable("event queue is full".into()),
        TrySendError::Closed(_) => AppError::Unavailable("notifier is not running".into()),
    })?;

    tracing::debug!(event = %kind, "Event queued");
    Ok((StatusCode::ACCEPTED, Json(json!({ "queued": kind }))))
}
