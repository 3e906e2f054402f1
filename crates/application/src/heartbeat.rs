use std::sync::Arc;
use std::time::Duration;

use domain::ServerEvent;
use tokio::task::JoinHandle;

use crate::broadcaster::ConnectionHub;

/// 周期性向所有连接广播 `ping`，首次发送在一个周期之后，不等待客户端应答
pub fn spawn_heartbeat(hub: Arc<dyn ConnectionHub>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            hub.broadcast(ServerEvent::heartbeat()).await;
            tracing::trace!("heartbeat sent");
        }
    })
}
