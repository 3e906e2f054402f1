use application::ChatSession;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use domain::{ClientEvent, ConnectionId, Identity, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::state::AppState;

/// WebSocket 连接
///
/// 写任务从连接中心的队列取事件发往客户端；读循环按到达顺序把客户端事件交给会话。
/// 任一方向结束（客户端关闭、写失败或被封禁）都会触发断开清理。
pub struct WebSocketConnection {
    socket: WebSocket,
    state: AppState,
    identity: Option<Identity>,
    connection: ConnectionId,
}

impl WebSocketConnection {
    pub fn new(socket: WebSocket, state: AppState, identity: Option<Identity>) -> Self {
        Self {
            socket,
            state,
            identity,
            connection: ConnectionId::new(),
        }
    }

    pub async fn run(self) {
        let Self {
            socket,
            state,
            identity,
            connection,
        } = self;

        // 先注册再准入，保证准入广播能送达本连接
        let events = state.hub.register(connection).await;

        let mut session =
            match ChatSession::connect(state.chat.clone(), connection, identity).await {
                Ok(Some(session)) => session,
                Ok(None) => {
                    state.hub.unregister(connection).await;
                    return;
                }
                Err(err) => {
                    tracing::error!(connection = %connection, error = %err, "准入失败");
                    state.hub.unregister(connection).await;
                    return;
                }
            };

        let (sender, mut incoming) = socket.split();
        let mut send_task = tokio::spawn(Self::write_events(connection, sender, events));

        loop {
            tokio::select! {
                _ = &mut send_task => {
                    tracing::debug!(connection = %connection, "WebSocket发送任务结束");
                    break;
                }
                frame = incoming.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        if !Self::dispatch(&mut session, text.as_str()).await {
                            break;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        tracing::debug!(connection = %connection, "WebSocket收到关闭消息");
                        break;
                    }
                    Some(Err(err)) => {
                        tracing::debug!(connection = %connection, error = %err, "WebSocket读取失败");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }

        if let Err(err) = session.disconnect().await {
            tracing::error!(connection = %connection, error = %err, "断开清理失败");
        }
        state.hub.unregister(connection).await;
        send_task.abort();
        tracing::info!(connection = %connection, "WebSocket连接已断开");
    }

    /// 处理一个文本帧，返回 `false` 表示应结束连接
    async fn dispatch(session: &mut ChatSession, text: &str) -> bool {
        let event = match ClientEvent::parse(text) {
            Ok(event) => event,
            Err(err) => {
                tracing::debug!(connection = %session.connection(), error = %err, "忽略无法识别的帧");
                return true;
            }
        };

        let closing = matches!(event, ClientEvent::Disconnect);
        let name = event.name();
        if let Err(err) = session.handle(event).await {
            tracing::warn!(
                connection = %session.connection(),
                user = %session.identity().name,
                event = name,
                error = %err,
                "事件处理失败"
            );
        }
        !closing
    }

    async fn write_events(
        connection: ConnectionId,
        mut sender: futures_util::stream::SplitSink<WebSocket, WsMessage>,
        mut events: mpsc::UnboundedReceiver<ServerEvent>,
    ) {
        while let Some(event) = events.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to serialize websocket payload");
                    continue;
                }
            };
            if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
            if event.closes_connection() {
                tracing::info!(connection = %connection, "连接被封禁，关闭");
                let _ = sender.send(WsMessage::Close(None)).await;
                break;
            }
        }
    }
}
