use async_trait::async_trait;
use domain::{ConnectionId, ServerEvent};

/// 连接中心：按连接句柄定向发送或向所有连接广播
///
/// 发往已断开或未知句柄的事件直接丢弃。
#[async_trait]
pub trait ConnectionHub: Send + Sync {
    async fn send_to(&self, connection: ConnectionId, event: ServerEvent);

    async fn broadcast(&self, event: ServerEvent);

    async fn broadcast_except(&self, excluded: ConnectionId, event: ServerEvent);
}
