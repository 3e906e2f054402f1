//! 连接生命周期与事件路由
//!
//! 每个 WebSocket 连接对应一个 [`ChatSession`]：建立时做准入检查，
//! 之后按到达顺序逐个处理客户端事件，断开时清理在线记录。

use std::sync::Arc;

use domain::{ClientEvent, ConnectionId, DiceSpec, Identity, PresenceStatus, ServerEvent};

use crate::chatbot::interjection_odds;
use crate::context::{spawn_delayed, ChatContext};
use crate::error::ApplicationError;
use crate::notifier::{PrivateCopies, SystemMessageOptions};
use crate::presence::PresenceDirectory;
use crate::random::{roll_dice, RandomRange};
use crate::render::html_escape;

/// 定向掷骰的抽取范围 `[0, 200)`
const ROLL_USER_SPAN: i64 = 200;

/// 准入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    AlreadyConnected,
    Banned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Admitting,
    Active,
    Disconnected,
    /// 准入被拒，之后的事件全部忽略
    Rejected(Admission),
}

/// 准入检查：先查重名，再查封禁，命中即返回
pub async fn admit(
    presence: &PresenceDirectory,
    name: &str,
) -> Result<Admission, ApplicationError> {
    if presence.exists(name).await? {
        return Ok(Admission::AlreadyConnected);
    }
    if presence.is_banned(name).await? {
        return Ok(Admission::Banned);
    }
    Ok(Admission::Admitted)
}

pub struct ChatSession {
    ctx: Arc<ChatContext>,
    identity: Identity,
    connection: ConnectionId,
    state: ConnectionState,
}

impl ChatSession {
    /// 建立会话
    ///
    /// 没有身份时返回 `None`，连接不做任何处理。
    /// 被拒绝的连接仍返回会话（状态为 `Rejected`），拒绝通知在延迟后单独发送。
    pub async fn connect(
        ctx: Arc<ChatContext>,
        connection: ConnectionId,
        identity: Option<Identity>,
    ) -> Result<Option<Self>, ApplicationError> {
        let Some(mut identity) = identity else {
            tracing::debug!(connection = %connection, "连接没有会话身份，忽略");
            return Ok(None);
        };
        identity.socket = Some(connection);
        identity.status = PresenceStatus::Online;

        let mut session = Self {
            ctx,
            identity,
            connection,
            state: ConnectionState::Admitting,
        };

        match admit(&session.ctx.presence, &session.identity.name).await? {
            Admission::Admitted => session.activate().await?,
            rejection => session.reject(rejection),
        }
        Ok(Some(session))
    }

    async fn activate(&mut self) -> Result<(), ApplicationError> {
        let ctx = &self.ctx;
        ctx.presence.admit(&self.identity).await?;
        ctx.hub
            .broadcast(ServerEvent::UserNew {
                time: ctx.notifier.stamp(),
                name: self.identity.name.clone(),
            })
            .await;
        for user in ctx.presence.list().await? {
            ctx.hub.broadcast(ServerEvent::UserConnected(user)).await;
        }
        self.state = ConnectionState::Active;
        tracing::info!(connection = %self.connection, user = %self.identity.name, "用户已加入聊天");
        Ok(())
    }

    fn reject(&mut self, admission: Admission) {
        let event = match admission {
            Admission::Banned => ServerEvent::UserBanned,
            _ => ServerEvent::AlreadyConnected,
        };
        tracing::info!(
            connection = %self.connection,
            user = %self.identity.name,
            reason = event.name(),
            "拒绝连接"
        );

        let hub = self.ctx.hub.clone();
        let connection = self.connection;
        spawn_delayed(self.ctx.settings.rejection_delay, "rejection", async move {
            hub.send_to(connection, event).await;
            Ok(())
        });
        self.state = ConnectionState::Rejected(admission);
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn is_active(&self) -> bool {
        self.state == ConnectionState::Active
    }

    /// 处理一个客户端事件；非活跃连接上的事件直接忽略
    pub async fn handle(&mut self, event: ClientEvent) -> Result<(), ApplicationError> {
        if !self.is_active() {
            tracing::debug!(connection = %self.connection, event = event.name(), "非活跃连接，忽略事件");
            return Ok(());
        }

        match event {
            ClientEvent::Pong => {
                tracing::debug!(connection = %self.connection, "pong received");
                Ok(())
            }
            ClientEvent::Message(text) => self.on_message(text).await,
            ClientEvent::Typing(is_typing) => {
                self.ctx
                    .hub
                    .broadcast_except(
                        self.connection,
                        ServerEvent::IsTyping {
                            is_typing,
                            user: self.identity.name.clone(),
                        },
                    )
                    .await;
                Ok(())
            }
            ClientEvent::RemoveMessage(id) => {
                self.ctx.hub.broadcast(ServerEvent::RemoveMessage { id }).await;
                Ok(())
            }
            ClientEvent::Disconnect => self.disconnect().await,
            ClientEvent::Ban(name) => self.on_ban(name).await,
            ClientEvent::Unban(name) => self.on_unban(name).await,
            ClientEvent::BanList => self.on_ban_list().await,
            ClientEvent::Unlock(name) => self.on_unlock(name).await,
            ClientEvent::Afk => self.on_status(PresenceStatus::Afk).await,
            ClientEvent::Unafk => self.on_status(PresenceStatus::Online).await,
            ClientEvent::PrivateMessage { name, text } => {
                self.on_private_message(name, text).await
            }
            ClientEvent::Highlight(name) => {
                self.ctx.notifier.highlight(&self.identity, &name).await?;
                Ok(())
            }
            ClientEvent::Roll(pattern) => self.on_roll(pattern).await,
            ClientEvent::RollUser(name) => self.on_roll_user(name).await,
        }
    }

    /// 清理在线记录并广播离开；只对活跃连接生效，重复调用无操作
    pub async fn disconnect(&mut self) -> Result<(), ApplicationError> {
        if !self.is_active() {
            return Ok(());
        }
        self.state = ConnectionState::Disconnected;

        let ctx = &self.ctx;
        ctx.presence.remove(&self.identity.name).await?;
        ctx.hub
            .broadcast(ServerEvent::UserDisconnected {
                time: ctx.notifier.stamp(),
                user: self.identity.clone(),
            })
            .await;
        tracing::info!(connection = %self.connection, user = %self.identity.name, "用户已离开聊天");
        Ok(())
    }

    fn accepts(&self, text: &str) -> bool {
        !text.trim().is_empty() && text.chars().count() <= self.ctx.settings.max_message_length
    }

    async fn on_message(&mut self, text: String) -> Result<(), ApplicationError> {
        if !self.accepts(&text) {
            tracing::debug!(connection = %self.connection, length = text.len(), "丢弃空消息或超长消息");
            return Ok(());
        }

        let body = self.ctx.renderer.render(&text);
        self.ctx.notifier.broadcast_message(&self.identity, body).await?;

        let odds = interjection_odds(&text);
        if self.ctx.randomizer.random_int(RandomRange::below(odds)) == 0 {
            let (min, max) = self.ctx.settings.chatbot_delay_secs;
            let secs = self
                .ctx
                .randomizer
                .random_int(RandomRange::inclusive(min as i64, max as i64));
            let delay = std::time::Duration::from_secs(secs.max(0) as u64);
            let ctx = self.ctx.clone();
            let user = self.identity.name.clone();
            tracing::debug!(user = %user, delay_secs = secs, "机器人准备插话");
            spawn_delayed(delay, "chatbot", async move { ctx.chatbot_speech(&user).await });
        }
        Ok(())
    }

    fn is_self(&self, name: &str) -> bool {
        self.identity.is_named(name)
    }

    async fn on_ban(&mut self, name: String) -> Result<(), ApplicationError> {
        if !self.identity.is_admin || self.is_self(&name) {
            return Ok(());
        }
        self.ctx.ban_user(self.connection, &name).await
    }

    async fn on_unban(&mut self, name: String) -> Result<(), ApplicationError> {
        if !self.identity.is_admin {
            return Ok(());
        }
        self.ctx.presence.unban(&name).await?;
        self.ctx
            .notifier
            .system_message(
                format!("A second chance was offered to {name}"),
                SystemMessageOptions::stored(),
            )
            .await
    }

    async fn on_ban_list(&mut self) -> Result<(), ApplicationError> {
        if !self.identity.is_admin {
            return Ok(());
        }
        let banned = self.ctx.presence.ban_list().await?;
        let body = if banned.is_empty() {
            "Nobody has been banned :)".to_string()
        } else {
            format!("Banned ({}): {}", banned.len(), banned.join(","))
        };
        self.ctx
            .notifier
            .system_message(body, SystemMessageOptions::to(self.connection))
            .await
    }

    async fn on_unlock(&mut self, name: String) -> Result<(), ApplicationError> {
        if !self.identity.is_admin {
            return Ok(());
        }
        self.ctx.presence.remove(&name).await?;
        self.ctx
            .notifier
            .system_message(
                format!("{name} has been unlocked"),
                SystemMessageOptions::to(self.connection),
            )
            .await
    }

    async fn on_status(&mut self, status: PresenceStatus) -> Result<(), ApplicationError> {
        self.ctx.presence.set_status(&self.identity.name, status).await?;
        self.identity.status = status;

        let time = self.ctx.notifier.stamp();
        let name = self.identity.name.clone();
        let event = match status {
            PresenceStatus::Afk => ServerEvent::UserAfk { time, name },
            PresenceStatus::Online => ServerEvent::UserUnafk { time, name },
        };
        self.ctx.hub.broadcast(event).await;
        Ok(())
    }

    async fn on_private_message(
        &mut self,
        name: String,
        text: String,
    ) -> Result<(), ApplicationError> {
        let copies = self.accepts(&text).then(|| {
            let body = self.ctx.renderer.render(&text);
            PrivateCopies::new(
                format!(
                    "<em>(whispers to <strong>{}</strong>)</em> {}",
                    html_escape(&name),
                    body
                ),
                format!("<em>(whisper)</em> {body}"),
            )
        });
        self.ctx
            .notifier
            .private_message(&self.identity, &name, copies)
            .await?;
        Ok(())
    }

    async fn on_roll(&mut self, pattern: Option<String>) -> Result<(), ApplicationError> {
        let spec = DiceSpec::parse(pattern.as_deref());
        let results: Vec<String> = roll_dice(spec, self.ctx.randomizer.as_ref())
            .iter()
            .map(ToString::to_string)
            .collect();
        self.ctx
            .notifier
            .system_message(
                format!("{} rolls {} and gets {}", self.identity.name, spec, results.join(",")),
                SystemMessageOptions::stored(),
            )
            .await
    }

    /// 定向掷骰：抽到 0 封禁发起者，抽到 199 封禁目标，其余为失败
    async fn on_roll_user(&mut self, target: String) -> Result<(), ApplicationError> {
        let ctx = self.ctx.clone();
        if let Err(err) = ctx.presence.connection_for(&target).await {
            if !err.is_not_found() {
                return Err(err);
            }
            return ctx
                .notifier
                .system_message(
                    format!("({target}) user not found..."),
                    SystemMessageOptions::to(self.connection),
                )
                .await;
        }

        let lucky = ctx.randomizer.random_int(RandomRange::below(ROLL_USER_SPAN));
        let (outcome, options) = match lucky {
            0 => {
                ctx.ban_user(self.connection, &self.identity.name).await?;
                ("Too bad, the troller got trolled :D".to_string(), SystemMessageOptions::stored())
            }
            n if n == ROLL_USER_SPAN - 1 => {
                ctx.ban_user(self.connection, &target).await?;
                ("Mouhahaha :evil:".to_string(), SystemMessageOptions::stored())
            }
            _ => (
                "... the attempt failed, maybe next time :3".to_string(),
                SystemMessageOptions::broadcast(),
            ),
        };
        tracing::info!(user = %self.identity.name, target = %target, lucky, "定向掷骰");

        ctx.notifier
            .system_message(format!("Someone attempted a roll on {target}..."), options)
            .await?;

        let notifier = ctx.notifier.clone();
        spawn_delayed(ctx.settings.roll_delay, "roll outcome", async move {
            notifier.system_message(outcome, options).await
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chatbot::DefaultSentences;
    use crate::clock::SystemClock;
    use crate::context::{ChatDependencies, ChatSettings};
    use crate::error::StoreError;
    use crate::local_broadcast::LocalConnectionHub;
    use crate::random::ThreadRandomizer;
    use crate::render::EscapingRenderer;
    use crate::store::MockKeyValueStore;

    fn context_with(store: MockKeyValueStore) -> (Arc<ChatContext>, Arc<LocalConnectionHub>) {
        let hub = Arc::new(LocalConnectionHub::new());
        let ctx = ChatContext::new(ChatDependencies {
            store: Arc::new(store),
            hub: hub.clone(),
            clock: Arc::new(SystemClock),
            randomizer: Arc::new(ThreadRandomizer),
            renderer: Arc::new(EscapingRenderer),
            sentences: Arc::new(DefaultSentences),
            settings: ChatSettings::default(),
        });
        (Arc::new(ctx), hub)
    }

    #[tokio::test]
    async fn store_failure_during_admission_is_propagated() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_hget()
            .returning(|_, _| Err(StoreError::Connection("refused".into())));
        store.expect_hset().never();
        let (ctx, _) = context_with(store);

        let alice = Some(Identity::new("1", "Alice"));
        let result = ChatSession::connect(ctx, ConnectionId::new(), alice).await;
        assert!(matches!(result, Err(ApplicationError::Store(_))));
    }

    #[tokio::test]
    async fn missing_session_is_abandoned_without_store_access() {
        let mut store = MockKeyValueStore::new();
        store.expect_hget().never();
        let (ctx, _) = context_with(store);

        let session = ChatSession::connect(ctx, ConnectionId::new(), None).await.unwrap();
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn admin_checks_short_circuit_before_store_access() {
        let mut store = MockKeyValueStore::new();
        // 准入：不在线、未封禁
        store.expect_hget().times(2).returning(|_, _| Ok(None));
        store.expect_hset().times(1).returning(|_, _, _| Ok(()));
        store.expect_hset_multiple().times(1).returning(|_, _| Ok(()));
        store.expect_hgetall().times(1).returning(|_| Ok(Default::default()));
        store.expect_hdel().never();
        let (ctx, _) = context_with(store);

        let alice = Some(Identity::new("1", "Alice"));
        let mut session = ChatSession::connect(ctx, ConnectionId::new(), alice)
            .await
            .unwrap()
            .unwrap();
        assert!(session.is_active());

        session.handle(ClientEvent::Ban("bob".into())).await.unwrap();
        session.handle(ClientEvent::Unban("bob".into())).await.unwrap();
        session.handle(ClientEvent::BanList).await.unwrap();
        session.handle(ClientEvent::Unlock("bob".into())).await.unwrap();
    }

    #[tokio::test]
    async fn admission_checks_existence_before_ban() {
        let store = crate::store::memory::MemoryKeyValueStore::new();
        let presence = PresenceDirectory::new(Arc::new(store));
        presence
            .admit(&Identity::new("1", "Alice").with_connection(ConnectionId::new()))
            .await
            .unwrap();
        presence.ban("alice").await.unwrap();
        presence.ban("bob").await.unwrap();

        assert_eq!(admit(&presence, "ALICE").await.unwrap(), Admission::AlreadyConnected);
        assert_eq!(admit(&presence, "Bob").await.unwrap(), Admission::Banned);
        assert_eq!(admit(&presence, "carol").await.unwrap(), Admission::Admitted);
    }
}
