use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use reno_core::{Message, RenovationRequest, Visit};
use reno_engine::{Marketplace, MatchView, MessageThread};

use crate::{ApiError, CurrentCaller};

type ApiResult<T> = Result<T, ApiError>;

// Request body structs
#[derive(Deserialize)]
struct CreateRequestBody {
    template_ids: Vec<String>,
    #[serde(default)]
    scope: Vec<String>,
}

#[derive(Deserialize)]
struct CreateMatchesBody {
    request_id: String,
    contractor_ids: Vec<String>,
}

#[derive(Deserialize)]
struct SendMessageBody {
    content: String,
}

#[derive(Deserialize)]
struct ProposeVisitBody {
    match_id: String,
    #[serde(with = "reno_core::visit::slots")]
    slots: Vec<OffsetDateTime>,
}

#[derive(Deserialize)]
struct AcceptVisitBody {
    visit_id: String,
    #[serde(with = "time::serde::timestamp")]
    slot: OffsetDateTime,
}

#[derive(Deserialize)]
struct CheckBody {
    content: String,
}

#[derive(Clone)]
struct AppState {
    market: Arc<Marketplace>,
}

pub struct ApiServer;

impl ApiServer {
    pub async fn serve(market: Arc<Marketplace>, host: &str, port: u16) -> anyhow::Result<()> {
        let app = router(market);

        let addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&addr).await?;

        info!("API server listening on {}", addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}

pub fn router(market: Arc<Marketplace>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(api_health))
        .route("/api/requests", post(api_create_request))
        .route("/api/matches", get(api_list_matches).post(api_create_matches))
        .route("/api/matches/:id", get(api_get_match))
        .route("/api/matches/:id/decline", post(api_decline_match))
        .route("/api/matches/:id/complete", post(api_complete_match))
        .route(
            "/api/chat/:match_id/messages",
            get(api_list_messages).post(api_send_message),
        )
        .route("/api/visits/propose", post(api_propose_visit))
        .route("/api/visits/accept", post(api_accept_visit))
        .route("/api/sanitize/check", post(api_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { market })
}

/// GET /api/health - Store reachability
async fn api_health(State(state): State<AppState>) -> Response {
    match state.market.health().await {
        Ok(health) => Json(serde_json::json!({
            "status": health.status,
            "database": "connected",
            "latency_ms": health.latency_ms,
            "version": env!("CARGO_PKG_VERSION"),
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "database": "disconnected",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// POST /api/requests - Create a renovation request
async fn api_create_request(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Json(body): Json<CreateRequestBody>,
) -> ApiResult<(StatusCode, Json<RenovationRequest>)> {
    let request = state
        .market
        .create_request(&caller, body.template_ids, body.scope)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/matches - Matches the caller takes part in
async fn api_list_matches(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
) -> ApiResult<Json<Vec<MatchView>>> {
    Ok(Json(state.market.list_matches(&caller).await?))
}

/// POST /api/matches - Pair a request with three contractors
async fn api_create_matches(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Json(body): Json<CreateMatchesBody>,
) -> ApiResult<(StatusCode, Json<Vec<MatchView>>)> {
    let matches = state
        .market
        .create_matches(&caller, &body.request_id, &body.contractor_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(matches)))
}

/// GET /api/matches/:id - Public match view
async fn api_get_match(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<MatchView>> {
    Ok(Json(state.market.get_match(&caller, &id).await?))
}

/// POST /api/matches/:id/decline
async fn api_decline_match(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<MatchView>> {
    Ok(Json(state.market.decline_match(&caller, &id).await?))
}

/// POST /api/matches/:id/complete
async fn api_complete_match(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<MatchView>> {
    Ok(Json(state.market.complete_match(&caller, &id).await?))
}

/// GET /api/chat/:match_id/messages - Thread in creation order
async fn api_list_messages(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(match_id): Path<String>,
) -> ApiResult<Json<MessageThread>> {
    Ok(Json(state.market.list_messages(&caller, &match_id).await?))
}

/// POST /api/chat/:match_id/messages - Send one message
async fn api_send_message(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(match_id): Path<String>,
    Json(body): Json<SendMessageBody>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let message = state
        .market
        .send_message(&caller, &match_id, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// POST /api/visits/propose - Offer visit slots
async fn api_propose_visit(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Json(body): Json<ProposeVisitBody>,
) -> ApiResult<(StatusCode, Json<Visit>)> {
    let visit = state
        .market
        .propose_visit(&caller, &body.match_id, body.slots)
        .await?;
    Ok((StatusCode::CREATED, Json(visit)))
}

/// POST /api/visits/accept - Confirm one slot and reveal identities
async fn api_accept_visit(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Json(body): Json<AcceptVisitBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let (visit, view) = state
        .market
        .accept_visit(&caller, &body.visit_id, body.slot)
        .await?;
    Ok(Json(serde_json::json!({ "visit": visit, "match": view })))
}

/// POST /api/sanitize/check - Pre-send warning for clients
async fn api_check(
    State(state): State<AppState>,
    CurrentCaller(_caller): CurrentCaller,
    Json(body): Json<CheckBody>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "contains_personal_info": state.market.sanitizer().contains_personal_info(&body.content),
    }))
}
