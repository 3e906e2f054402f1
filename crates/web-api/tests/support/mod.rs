use std::{net::SocketAddr, sync::Arc, time::Duration};

use application::{
    ChatContext, ChatDependencies, ChatSettings, DefaultSentences, EscapingRenderer,
    LocalConnectionHub, MemoryKeyValueStore, ScriptedRandomizer, SystemClock,
};
use config::SessionConfig;
use domain::Identity;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use web_api::{router, AppState, JwtService};

pub type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    pub jwt: Arc<JwtService>,
    pub chat: Arc<ChatContext>,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    /// 内存存储 + 本地连接中心；随机数不预设值，机器人永远不会插话
    pub async fn spawn() -> Self {
        let hub = Arc::new(LocalConnectionHub::new());
        let chat = Arc::new(ChatContext::new(ChatDependencies {
            store: Arc::new(MemoryKeyValueStore::new()),
            hub: hub.clone(),
            clock: Arc::new(SystemClock),
            randomizer: Arc::new(ScriptedRandomizer::default()),
            renderer: Arc::new(EscapingRenderer),
            sentences: Arc::new(DefaultSentences),
            settings: ChatSettings {
                rejection_delay: Duration::from_millis(50),
                ..ChatSettings::default()
            },
        }));
        let jwt = Arc::new(JwtService::new(SessionConfig {
            secret: "test-secret-key-with-at-least-32-chars".to_string(),
            expiration_hours: 1,
        }));

        let app = router(AppState::new(chat.clone(), hub, jwt.clone()));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Self {
            addr,
            jwt,
            chat,
            _shutdown: shutdown_tx,
        }
    }

    pub fn http(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn token(&self, identity: &Identity) -> String {
        self.jwt.issue(identity).expect("issue token")
    }

    pub async fn connect_raw(&self, token: &str) -> WsStream {
        let url = format!("ws://{}/api/v1/ws?token={}", self.addr, token);
        let (stream, _) = connect_async(url).await.expect("websocket connect");
        stream
    }

    /// 连接并等待自己的 `user_new`，确认已被接纳
    pub async fn join(&self, identity: &Identity) -> WsStream {
        let mut ws = self.connect_raw(&self.token(identity)).await;
        loop {
            let (event, data) = next_event(&mut ws).await.expect("admission events");
            if event == "user_new" && data["name"] == identity.name.as_str() {
                return ws;
            }
        }
    }
}

pub async fn send_event(ws: &mut WsStream, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data }).to_string();
    ws.send(Message::text(frame)).await.expect("send frame");
}

/// 下一个事件；连接关闭或超时返回 `None`
pub async fn next_event(ws: &mut WsStream) -> Option<(String, Value)> {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .ok()??;
        match frame.ok()? {
            Message::Text(text) => {
                let value: Value = serde_json::from_str(text.as_str()).expect("json frame");
                let event = value["event"].as_str().expect("event name").to_string();
                return Some((event, value["data"].clone()));
            }
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

/// 跳过其他事件，直到收到指定事件
pub async fn expect_event(ws: &mut WsStream, name: &str) -> Value {
    loop {
        match next_event(ws).await {
            Some((event, data)) if event == name => return data,
            Some(_) => continue,
            None => panic!("connection ended before {name}"),
        }
    }
}
