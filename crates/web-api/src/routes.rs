use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, DefaultBodyLimit, Query, State},
    http::{HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use application::PostMessageRequest;

use crate::{error::ApiError, sse::stream_events, state::AppState};

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.settings.max_body_bytes;
    let cors = cors_layer(&state.settings.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", get(get_history).post(post_message))
        .route("/events", get(stream_events))
        .route("/stats", get(get_stats))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(origin = %origin, error = %err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = state.chat_service.archive_status().await;
    Json(json!({
        "status": "ok",
        "timestamp": domain::format_timestamp(&chrono::Utc::now()),
        "connections": state.chat_service.connection_count(),
        "database": database,
    }))
}

async fn post_message(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let request = PostMessageRequest::from_slice(&body)?;
    let posted = state.chat_service.post_message(request).await?;

    tracing::debug!(
        message_id = %posted.message.id,
        delivered = posted.delivery.success_count,
        failed = posted.delivery.failure_count,
        "message posted"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Message sent successfully",
            "data": posted.message,
        })),
    ))
}

async fn get_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) =
        query.map_err(|rejection| ApiError::invalid_query(vec![rejection.body_text()]))?;
    let limit = query.limit.unwrap_or(state.settings.history_limit);
    let messages = state.chat_service.recent_messages(limit).await?;

    Ok(Json(json!({
        "success": true,
        "count": messages.len(),
        "data": messages,
    })))
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let stats = state.chat_service.stats().await?;
    Ok(Json(json!({
        "success": true,
        "data": stats,
    })))
}
