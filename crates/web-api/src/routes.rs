use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use domain::StoredMessage;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{error::ApiError, state::AppState, ws_connection::WebSocketConnection};

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    messages: Vec<StoredMessage>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", get(history))
        .route("/ws", get(websocket_upgrade))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// 最近的聊天记录（作者资料为当前资料）
async fn history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<HistoryResponse>, ApiError> {
    let identity = state.jwt_service.identity_from_headers(&headers)?;
    let messages = state.chat.messages.list().await?;
    tracing::debug!(user = %identity.name, count = messages.len(), "返回历史消息");
    Ok(Json(HistoryResponse { messages }))
}

/// 令牌缺失或无效时仍完成握手，但连接不会被接纳
async fn websocket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let identity = query.token.as_deref().and_then(|token| {
        state
            .jwt_service
            .verify(token)
            .map(|claims| claims.into_identity())
            .map_err(|err| tracing::debug!(error = ?err, "WebSocket 会话令牌无效"))
            .ok()
    });

    ws.on_upgrade(move |socket| WebSocketConnection::new(socket, state, identity).run())
}
