// 单进程连接中心实现
use std::collections::HashMap;

use async_trait::async_trait;
use domain::{ConnectionId, ServerEvent};
use tokio::sync::{mpsc, RwLock};

use crate::broadcaster::ConnectionHub;

/// 每个连接一条无界队列，写任务从队列取事件发往 socket
#[derive(Default)]
pub struct LocalConnectionHub {
    senders: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>>,
}

impl LocalConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection: ConnectionId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.senders.write().await.insert(connection, sender);
        receiver
    }

    pub async fn unregister(&self, connection: ConnectionId) {
        self.senders.write().await.remove(&connection);
    }

    pub async fn connection_count(&self) -> usize {
        self.senders.read().await.len()
    }

    fn deliver(
        connection: &ConnectionId,
        sender: &mpsc::UnboundedSender<ServerEvent>,
        event: ServerEvent,
    ) {
        if sender.send(event).is_err() {
            tracing::debug!(connection = %connection, "连接已关闭，丢弃事件");
        }
    }
}

#[async_trait]
impl ConnectionHub for LocalConnectionHub {
    async fn send_to(&self, connection: ConnectionId, event: ServerEvent) {
        let senders = self.senders.read().await;
        match senders.get(&connection) {
            Some(sender) => Self::deliver(&connection, sender, event),
            None => tracing::debug!(connection = %connection, event = event.name(), "未知连接，丢弃事件"),
        }
    }

    async fn broadcast(&self, event: ServerEvent) {
        let senders = self.senders.read().await;
        for (connection, sender) in senders.iter() {
            Self::deliver(connection, sender, event.clone());
        }
    }

    async fn broadcast_except(&self, excluded: ConnectionId, event: ServerEvent) {
        let senders = self.senders.read().await;
        for (connection, sender) in senders.iter().filter(|(id, _)| **id != excluded) {
            Self::deliver(connection, sender, event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_every_registered_connection() {
        let hub = LocalConnectionHub::new();
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let mut rx_a = hub.register(a).await;
        let mut rx_b = hub.register(b).await;

        hub.broadcast(ServerEvent::heartbeat()).await;

        assert_eq!(rx_a.recv().await, Some(ServerEvent::heartbeat()));
        assert_eq!(rx_b.recv().await, Some(ServerEvent::heartbeat()));
    }

    #[tokio::test]
    async fn broadcast_except_skips_origin() {
        let hub = LocalConnectionHub::new();
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let mut rx_a = hub.register(a).await;
        let mut rx_b = hub.register(b).await;

        hub.broadcast_except(a, ServerEvent::AlreadyConnected).await;

        assert_eq!(rx_b.recv().await, Some(ServerEvent::AlreadyConnected));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn sends_to_unknown_or_closed_connections_are_dropped() {
        let hub = LocalConnectionHub::new();
        let gone = ConnectionId::new();
        drop(hub.register(gone).await);

        hub.send_to(gone, ServerEvent::Ban).await;
        hub.send_to(ConnectionId::new(), ServerEvent::Ban).await;

        hub.unregister(gone).await;
        assert_eq!(hub.connection_count().await, 0);
    }
}
