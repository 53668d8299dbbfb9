//! HTTP intake handler
//!
//! `POST /webhook` decodes the body into a `FlatEvent` and hands it to the
//! intake queue. The caller only ever learns whether the body decoded and
//! whether the queue accepted it; delivery happens later.

use std::io;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use contracts::FlatEvent;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::EnqueueError;
use crate::queue::IntakeQueue;

/// Exact body returned for an accepted event
pub const SUCCESS_BODY: &str = r#"{"status":"success"}"#;

const HEALTH_BODY: &str = r#"{"status":"ok"}"#;
const QUEUE_FULL_BODY: &str = r#"{"status":"queue_full"}"#;
const SHUTTING_DOWN_BODY: &str = r#"{"status":"shutting_down"}"#;

/// State shared by the intake handlers
#[derive(Debug, Clone)]
pub struct IntakeState {
    queue: IntakeQueue,
    max_body_bytes: Option<usize>,
}

impl IntakeState {
    /// `max_body_bytes` of `None` accepts bodies of any size
    pub fn new(queue: IntakeQueue, max_body_bytes: Option<usize>) -> Self {
        Self {
            queue,
            max_body_bytes,
        }
    }

    pub fn queue(&self) -> &IntakeQueue {
        &self.queue
    }
}

/// Build the intake router
pub fn intake_router(state: IntakeState) -> Router {
    let body_limit = match state.max_body_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/health", get(handle_health))
        .layer(body_limit)
        .with_state(state)
}

/// Serve the intake router until `shutdown` is cancelled
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Intake server listening");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

// --- POST /webhook ---

async fn handle_webhook(State(state): State<IntakeState>, body: Bytes) -> Response {
    let event = match FlatEvent::from_json_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            state.queue.metrics().record_decode_error();
            warn!(error = %e, bytes = body.len(), "Rejected malformed webhook body");
            return (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                e.to_string(),
            )
                .into_response();
        }
    };

    debug!(event = %event.ev, event_type = %event.et, "Webhook decoded");

    match state.queue.enqueue(event).await {
        Ok(()) => json_response(StatusCode::OK, SUCCESS_BODY),
        Err(EnqueueError::Full { .. }) => {
            json_response(StatusCode::SERVICE_UNAVAILABLE, QUEUE_FULL_BODY)
        }
        Err(EnqueueError::Closed) => {
            json_response(StatusCode::SERVICE_UNAVAILABLE, SHUTTING_DOWN_BODY)
        }
    }
}

// --- GET /health ---

async fn handle_health() -> Response {
    json_response(StatusCode::OK, HEALTH_BODY)
}

fn json_response(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
