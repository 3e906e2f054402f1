//! 聊天上下文
//!
//! 所有连接共享的依赖与行为参数。会话处理器和延迟任务都通过它访问存储和连接中心。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use config::{ChatConfig, ConfigError};
use domain::ConnectionId;

use crate::broadcaster::ConnectionHub;
use crate::chatbot::{compose_line, Sentences};
use crate::clock::{Clock, DisplayClock};
use crate::error::ApplicationError;
use crate::message_store::MessageStore;
use crate::notifier::{Notifier, SystemMessageOptions};
use crate::presence::PresenceDirectory;
use crate::random::{RandomRange, Randomizer};
use crate::render::TextRenderer;
use crate::store::KeyValueStore;

/// 运行时行为参数
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub timezone: Tz,
    pub time_format: String,
    pub rejection_delay: Duration,
    pub roll_delay: Duration,
    pub max_message_length: usize,
    pub history_limit: usize,
    /// 机器人插话延迟（秒，闭区间）
    pub chatbot_delay_secs: (u64, u64),
}

impl ChatSettings {
    pub fn from_config(config: &ChatConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            timezone: config.tz()?,
            time_format: config.time_format.clone(),
            rejection_delay: config.rejection_delay(),
            roll_delay: config.roll_delay(),
            max_message_length: config.max_message_length,
            history_limit: config.history_limit,
            chatbot_delay_secs: (config.chatbot_delay_min_secs, config.chatbot_delay_max_secs),
        })
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        let config = ChatConfig::default();
        Self {
            timezone: chrono_tz::Europe::Paris,
            time_format: config.time_format.clone(),
            rejection_delay: config.rejection_delay(),
            roll_delay: config.roll_delay(),
            max_message_length: config.max_message_length,
            history_limit: config.history_limit,
            chatbot_delay_secs: (config.chatbot_delay_min_secs, config.chatbot_delay_max_secs),
        }
    }
}

pub struct ChatDependencies {
    pub store: Arc<dyn KeyValueStore>,
    pub hub: Arc<dyn ConnectionHub>,
    pub clock: Arc<dyn Clock>,
    pub randomizer: Arc<dyn Randomizer>,
    pub renderer: Arc<dyn TextRenderer>,
    pub sentences: Arc<dyn Sentences>,
    pub settings: ChatSettings,
}

pub struct ChatContext {
    pub presence: Arc<PresenceDirectory>,
    pub messages: Arc<MessageStore>,
    pub notifier: Arc<Notifier>,
    pub hub: Arc<dyn ConnectionHub>,
    pub randomizer: Arc<dyn Randomizer>,
    pub renderer: Arc<dyn TextRenderer>,
    pub sentences: Arc<dyn Sentences>,
    pub settings: ChatSettings,
}

impl ChatContext {
    pub fn new(deps: ChatDependencies) -> Self {
        let settings = deps.settings;
        let clock = DisplayClock::new(deps.clock, settings.timezone, settings.time_format.clone());
        let presence = Arc::new(PresenceDirectory::new(deps.store.clone()));
        let messages = Arc::new(MessageStore::new(deps.store, settings.history_limit));
        let notifier = Arc::new(Notifier::new(
            deps.hub.clone(),
            presence.clone(),
            messages.clone(),
            clock,
        ));

        Self {
            presence,
            messages,
            notifier,
            hub: deps.hub,
            randomizer: deps.randomizer,
            renderer: deps.renderer,
            sentences: deps.sentences,
            settings,
        }
    }

    /// 封禁在线身份：记入封禁名单、向其连接发送 `ban` 并公告
    ///
    /// 目标不在线时只通知请求者，名单不变。
    pub async fn ban_user(
        &self,
        requester: ConnectionId,
        target: &str,
    ) -> Result<(), ApplicationError> {
        match self.presence.connection_for(target).await {
            Ok(connection) => {
                self.presence.ban(target).await?;
                self.hub.send_to(connection, domain::ServerEvent::Ban).await;
                self.notifier
                    .system_message(
                        format!("{target} was kicked from the chat"),
                        SystemMessageOptions::stored(),
                    )
                    .await
            }
            Err(err) if err.is_not_found() => {
                self.notifier
                    .system_message(
                        format!("({target}) user not found..."),
                        SystemMessageOptions::to(requester),
                    )
                    .await
            }
            Err(err) => Err(err),
        }
    }

    /// 机器人随机说一句台词，写入历史并广播
    pub async fn chatbot_speech(&self, user: &str) -> Result<(), ApplicationError> {
        let sentences = self.sentences.sentences();
        if sentences.is_empty() {
            return Ok(());
        }
        let drawn = self
            .randomizer
            .random_int(RandomRange::below(sentences.len() as i64));
        let index = usize::try_from(drawn).unwrap_or(0).min(sentences.len() - 1);
        let line = compose_line(&sentences[index], user);
        self.notifier
            .system_message(line, SystemMessageOptions::stored())
            .await
    }
}

/// 延迟执行一个副作用，失败只记录日志
pub(crate) fn spawn_delayed<F>(delay: Duration, label: &'static str, task: F)
where
    F: Future<Output = Result<(), ApplicationError>> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(err) = task.await {
            tracing::warn!(task = label, error = %err, "延迟任务失败");
        }
    });
}
