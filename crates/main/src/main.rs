//! 主应用程序入口
//!
//! 加载配置、连接 Redis、启动心跳并运行 Axum Web 服务。

use std::sync::Arc;

use application::{
    spawn_heartbeat, ChatContext, ChatDependencies, ChatSettings, DefaultSentences,
    EscapingRenderer, LocalConnectionHub, SystemClock, ThreadRandomizer,
};
use config::AppConfig;
use infrastructure::Infrastructure;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志，默认 info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    let settings = ChatSettings::from_config(&config.chat)?;

    tracing::info!(redis = %config.redis.url, "连接 Redis");
    let infrastructure = Infrastructure::connect(&config.redis).await?;

    let hub = Arc::new(LocalConnectionHub::new());
    let chat = Arc::new(ChatContext::new(ChatDependencies {
        store: infrastructure.store_trait(),
        hub: hub.clone(),
        clock: Arc::new(SystemClock),
        randomizer: Arc::new(ThreadRandomizer),
        renderer: Arc::new(EscapingRenderer),
        sentences: Arc::new(DefaultSentences),
        settings,
    }));

    let _heartbeat = spawn_heartbeat(hub.clone(), config.chat.heartbeat_interval());

    let jwt_service = Arc::new(JwtService::new(config.session.clone()));
    let state = AppState::new(chat, hub, jwt_service);

    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("聊天室服务器启动在 http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
