//! Huddle HTTP API.
//!
//! Axum server exposing the agent and meeting procedures. Each endpoint is a
//! thin axum handler that delegates to a procedure function in
//! `crate::procedures`; the procedures are directly testable without axum
//! dispatch machinery.
//!
//! Endpoints:
//! - GET  /health                 — health check with DB status
//! - GET  /version                — server version info
//! - GET/POST /agents, GET/PATCH/DELETE /agents/:id
//! - GET/POST /meetings, GET/PATCH/DELETE /meetings/:id
//! - POST /meetings/token         — vendor session token for the caller
//! - POST /meetings/:id/join      — pre-join guard
//! - POST /meetings/:id/events    — apply an observed call event
//! - POST /meetings/:id/cancel    — cancel an upcoming meeting

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use uuid::Uuid;

use huddle_core::lifecycle::CallEvent;
use huddle_core::schema::{
    CreateAgentInput, CreateMeetingInput, ListParams, UpdateAgentInput, UpdateMeetingInput,
};
use huddle_core::{HuddleConfig, VideoService};

use crate::auth::Session;
use crate::procedures::{agents, meetings, ProcedureError};

/// Shared state for all HTTP handlers.
pub struct HttpState {
    pub pool: PgPool,
    pub config: HuddleConfig,
    pub session_secret: String,
    pub video: Arc<dyn VideoService>,
}

/// Build the Axum router with all endpoints.
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/agents", get(list_agents_handler).post(create_agent_handler))
        .route(
            "/agents/:id",
            get(get_agent_handler)
                .patch(update_agent_handler)
                .delete(remove_agent_handler),
        )
        .route(
            "/meetings",
            get(list_meetings_handler).post(create_meeting_handler),
        )
        .route("/meetings/token", post(generate_token_handler))
        .route(
            "/meetings/:id",
            get(get_meeting_handler)
                .patch(update_meeting_handler)
                .delete(remove_meeting_handler),
        )
        .route("/meetings/:id/join", post(join_meeting_handler))
        .route("/meetings/:id/events", post(meeting_event_handler))
        .route("/meetings/:id/cancel", post(cancel_meeting_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: Arc<HttpState>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", state.config.http.host, state.config.http.port);
    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Huddle HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Health / version
// ============================================================================

/// Inner health check — queries DB and returns (status_code, json_body).
pub async fn health_inner(pool: &PgPool) -> (StatusCode, serde_json::Value) {
    let pg_ver = match huddle_core::db::health_check(pool).await {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                }),
            );
        }
    };

    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "postgresql": pg_ver,
        }),
    )
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "service": "huddle",
    })
}

async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.pool).await;
    (status, Json(body))
}

async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

// ============================================================================
// Agent handlers
// ============================================================================

async fn list_agents_handler(
    State(state): State<Arc<HttpState>>,
    Session(session): Session,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ProcedureError> {
    let page = agents::get_many(&state.pool, &state.config.pagination, &session.user, params).await?;
    Ok(Json(page))
}

async fn get_agent_handler(
    State(state): State<Arc<HttpState>>,
    Session(session): Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ProcedureError> {
    Ok(Json(agents::get_one(&state.pool, &session.user, id).await?))
}

async fn create_agent_handler(
    State(state): State<Arc<HttpState>>,
    Session(session): Session,
    Json(input): Json<CreateAgentInput>,
) -> Result<impl IntoResponse, ProcedureError> {
    let agent = agents::create(&state.pool, &session.user, input).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

async fn update_agent_handler(
    State(state): State<Arc<HttpState>>,
    Session(session): Session,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateAgentInput>,
) -> Result<impl IntoResponse, ProcedureError> {
    Ok(Json(agents::update(&state.pool, &session.user, id, input).await?))
}

async fn remove_agent_handler(
    State(state): State<Arc<HttpState>>,
    Session(session): Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ProcedureError> {
    Ok(Json(agents::remove(&state.pool, &session.user, id).await?))
}

// ============================================================================
// Meeting handlers
// ============================================================================

async fn list_meetings_handler(
    State(state): State<Arc<HttpState>>,
    Session(session): Session,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ProcedureError> {
    let page =
        meetings::get_many(&state.pool, &state.config.pagination, &session.user, params).await?;
    Ok(Json(page))
}

async fn get_meeting_handler(
    State(state): State<Arc<HttpState>>,
    Session(session): Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ProcedureError> {
    Ok(Json(meetings::get_one(&state.pool, &session.user, id).await?))
}

async fn create_meeting_handler(
    State(state): State<Arc<HttpState>>,
    Session(session): Session,
    Json(input): Json<CreateMeetingInput>,
) -> Result<impl IntoResponse, ProcedureError> {
    let meeting =
        meetings::create(&state.pool, state.video.as_ref(), &session.user, input).await?;
    Ok((StatusCode::CREATED, Json(meeting)))
}

async fn update_meeting_handler(
    State(state): State<Arc<HttpState>>,
    Session(session): Session,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateMeetingInput>,
) -> Result<impl IntoResponse, ProcedureError> {
    Ok(Json(meetings::update(&state.pool, &session.user, id, input).await?))
}

async fn remove_meeting_handler(
    State(state): State<Arc<HttpState>>,
    Session(session): Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ProcedureError> {
    Ok(Json(meetings::remove(&state.pool, &session.user, id).await?))
}

async fn generate_token_handler(
    State(state): State<Arc<HttpState>>,
    Session(session): Session,
) -> Result<impl IntoResponse, ProcedureError> {
    Ok(Json(
        meetings::generate_token(state.video.as_ref(), &session.user).await?,
    ))
}

async fn join_meeting_handler(
    State(state): State<Arc<HttpState>>,
    Session(session): Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ProcedureError> {
    Ok(Json(meetings::join(&state.pool, &session.user, id).await?))
}

async fn meeting_event_handler(
    State(state): State<Arc<HttpState>>,
    Session(session): Session,
    Path(id): Path<Uuid>,
    Json(event): Json<CallEvent>,
) -> Result<impl IntoResponse, ProcedureError> {
    Ok(Json(
        meetings::apply_event(&state.pool, &session.user, id, event).await?,
    ))
}

async fn cancel_meeting_handler(
    State(state): State<Arc<HttpState>>,
    Session(session): Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ProcedureError> {
    Ok(Json(meetings::cancel(&state.pool, &session.user, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_inner_pure() {
        let v = version_inner();
        assert!(v["version"].is_string(), "version must be string");
        assert_eq!(v["service"], "huddle");
    }
}
