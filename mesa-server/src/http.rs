//! Mesa HTTP API
//!
//! Axum-based HTTP server for the inbound-email webhook. The caller is an
//! email-automation layer that fires one POST per received email and sends
//! whatever reply body comes back — so the webhook must always answer with a
//! usable reply, even when the triage oracle is down.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a
//! testable inner function returning `(StatusCode, serde_json::Value)`.
//!
//! Endpoints:
//! - GET  /health          — health check with DB status
//! - GET  /version         — server version info
//! - POST /procesar_email  — triage one inbound email

use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use mesa_core::{InboundEmail, MesaConfig, OracleBackend};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::subsystems::{oracle, triage};
use crate::subsystems::triage::{TriageKind, TriageOutcome};

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub pool: PgPool,
    pub config: MesaConfig,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/procesar_email", post(process_email_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    pool: PgPool,
    config: MesaConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { pool, config });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Mesa HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner health check — queries DB and returns (status_code, json_body).
pub async fn health_inner(pool: &PgPool) -> (StatusCode, serde_json::Value) {
    match mesa_core::db::health_check(pool).await {
        Ok(pg_ver) => (
            StatusCode::OK,
            serde_json::json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "postgresql": pg_ver,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({
                "status": "unhealthy",
                "error": e.to_string(),
            }),
        ),
    }
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "mesa/1",
    })
}

/// Required inbound fields must be present and non-blank.
pub fn validate_email(email: &InboundEmail) -> std::result::Result<(), String> {
    if email.message.trim().is_empty() {
        return Err("mensaje field is required".to_string());
    }
    if email.customer.trim().is_empty() {
        return Err("cliente field is required".to_string());
    }
    if email.subject.trim().is_empty() {
        return Err("asunto field is required".to_string());
    }
    Ok(())
}

/// Response body for a successful triage, in the field names the
/// email-automation caller expects.
pub fn outcome_to_json(outcome: &TriageOutcome) -> serde_json::Value {
    let status = match outcome.kind {
        TriageKind::New => "Ticket Creado",
        TriageKind::Update => "Ticket Actualizado",
    };
    serde_json::json!({
        "status": status,
        "tipo": outcome.kind,
        "id_ticket": outcome.ticket_id,
        "asunto_para_responder": outcome.reply_subject,
        "cuerpo_email_respuesta": outcome.reply_body,
    })
}

/// Inner email processing — builds the oracle from config and runs triage.
pub async fn process_email_inner(
    pool: &PgPool,
    config: &MesaConfig,
    email: InboundEmail,
) -> (StatusCode, serde_json::Value) {
    let client = match oracle::create_oracle_from_config(config) {
        Ok(c) => Some(c),
        Err(e) => {
            tracing::warn!(error = %e, "Oracle unavailable, running fallback-only triage");
            None
        }
    };
    let backend = client.as_ref().map(|c| c as &dyn OracleBackend);

    process_email_with_oracle(pool, backend, email).await
}

/// Same as [`process_email_inner`] but with an injected oracle backend, so
/// tests can point it at a mock server.
pub async fn process_email_with_oracle(
    pool: &PgPool,
    oracle: Option<&dyn OracleBackend>,
    email: InboundEmail,
) -> (StatusCode, serde_json::Value) {
    if let Err(msg) = validate_email(&email) {
        return (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": msg,
                "status": "error",
            }),
        );
    }

    match triage::process_email(&email, pool, oracle).await {
        Ok(outcome) => (StatusCode::OK, outcome_to_json(&outcome)),
        // Only datastore write failures end up here; the caller gets a hard
        // error and can retry the webhook delivery.
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({
                "error": e.to_string(),
                "status": "error",
            }),
        ),
    }
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.pool).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn process_email_handler(
    State(state): State<Arc<HttpState>>,
    Json(email): Json<InboundEmail>,
) -> impl IntoResponse {
    let (status, body) = process_email_inner(&state.pool, &state.config, email).await;
    (status, Json(body))
}

// ============================================================================
// Unit Tests — pure pieces only; DB-backed paths live in tests/
// ============================================================================
