//! Web API 层。
//!
//! 提供 Axum 路由：健康检查、历史消息查询，以及承载聊天事件的 WebSocket 端点。

mod auth;
mod error;
mod routes;
mod state;
mod ws_connection;

pub use auth::{Claims, JwtService};
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
