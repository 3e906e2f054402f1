//! 消息投递
//!
//! 聊天消息、机器人消息、私聊和提醒的统一出口。

use std::sync::Arc;

use domain::{ConnectionId, Identity, MessageId, MessagePayload, ServerEvent};

use crate::broadcaster::ConnectionHub;
use crate::clock::DisplayClock;
use crate::error::ApplicationError;
use crate::message_store::MessageStore;
use crate::presence::PresenceDirectory;

/// 机器人消息的投递方式
///
/// `storage` 决定是否写入历史，`socket` 决定只发给一个连接还是广播，两者互不影响。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemMessageOptions {
    pub storage: bool,
    pub socket: Option<ConnectionId>,
}

impl SystemMessageOptions {
    /// 广播，不持久化
    pub fn broadcast() -> Self {
        Self::default()
    }

    /// 广播并写入历史
    pub fn stored() -> Self {
        Self {
            storage: true,
            socket: None,
        }
    }

    /// 只发给一个连接
    pub fn to(connection: ConnectionId) -> Self {
        Self {
            storage: false,
            socket: Some(connection),
        }
    }
}

/// 定向投递的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// 目标就是发送者本人，改为广播一条机器人消息
    SelfTargeted,
    /// 目标不在线，已通知发送者
    NotFound,
    /// 目标在线但内容不合法，静默丢弃
    Discarded,
}

/// 私聊的两份副本：发送者看到的和目标看到的
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateCopies {
    pub sender: String,
    pub target: String,
}

impl PrivateCopies {
    pub fn new(sender: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            target: target.into(),
        }
    }
}

pub struct Notifier {
    hub: Arc<dyn ConnectionHub>,
    presence: Arc<PresenceDirectory>,
    messages: Arc<MessageStore>,
    clock: DisplayClock,
}

impl Notifier {
    pub fn new(
        hub: Arc<dyn ConnectionHub>,
        presence: Arc<PresenceDirectory>,
        messages: Arc<MessageStore>,
        clock: DisplayClock,
    ) -> Self {
        Self {
            hub,
            presence,
            messages,
            clock,
        }
    }

    pub fn stamp(&self) -> String {
        self.clock.stamp()
    }

    /// 持久化并广播一条聊天消息，返回分配的序列号
    pub async fn broadcast_message(
        &self,
        author: &Identity,
        body: String,
    ) -> Result<MessageId, ApplicationError> {
        let time = self.stamp();
        let id = self.messages.append(&time, Some(&author.name), &body).await?;
        self.hub
            .broadcast(ServerEvent::Message(MessagePayload::chat(
                id,
                time,
                author.profile(),
                body,
            )))
            .await;
        Ok(id)
    }

    pub async fn system_message(
        &self,
        body: impl Into<String>,
        options: SystemMessageOptions,
    ) -> Result<(), ApplicationError> {
        let body = body.into();
        let time = self.stamp();

        if options.storage {
            self.messages.append(&time, None, &body).await?;
        }

        let event = ServerEvent::Message(MessagePayload::bot(time, body));
        match options.socket {
            Some(connection) => self.hub.send_to(connection, event).await,
            None => self.hub.broadcast(event).await,
        }
        Ok(())
    }

    /// 私聊：发送者和目标各收到一份不同措辞的副本，目标另收一条通知
    ///
    /// 自言自语和目标不在线的判断先于内容检查；`copies` 为 `None` 表示内容不合法，
    /// 只在目标在线时才会被丢弃。
    pub async fn private_message(
        &self,
        sender: &Identity,
        target: &str,
        copies: Option<PrivateCopies>,
    ) -> Result<Delivery, ApplicationError> {
        let origin = origin(sender)?;

        if sender.is_named(target) {
            self.system_message(
                format!("WTF, {} is talking to themselves oO ...", sender.name),
                SystemMessageOptions::stored(),
            )
            .await?;
            return Ok(Delivery::SelfTargeted);
        }

        let Some(destination) = self.resolve(target).await? else {
            self.system_message(
                format!("({target}) user not found, message could not be delivered..."),
                SystemMessageOptions::to(origin),
            )
            .await?;
            return Ok(Delivery::NotFound);
        };

        let Some(copies) = copies else {
            tracing::debug!(from = %sender.name, to = %target, "私聊内容为空或超长，丢弃");
            return Ok(Delivery::Discarded);
        };

        let time = self.stamp();
        let profile = sender.profile();
        self.hub
            .send_to(
                origin,
                ServerEvent::Message(MessagePayload::private(
                    time.clone(),
                    profile.clone(),
                    copies.sender,
                )),
            )
            .await;
        self.hub
            .send_to(
                destination,
                ServerEvent::Message(MessagePayload::private(time, profile, copies.target)),
            )
            .await;
        self.hub
            .send_to(
                destination,
                ServerEvent::PrivateNotification {
                    name: sender.name.clone(),
                },
            )
            .await;

        tracing::debug!(from = %sender.name, to = %target, "私聊已投递");
        Ok(Delivery::Delivered)
    }

    /// 提醒：目标收到 `user_highlight`，发送者收到确认
    pub async fn highlight(
        &self,
        sender: &Identity,
        target: &str,
    ) -> Result<Delivery, ApplicationError> {
        let origin = origin(sender)?;

        if sender.is_named(target) {
            self.system_message(
                format!("WTF, {} pokes themselves oO ...", sender.name),
                SystemMessageOptions::stored(),
            )
            .await?;
            return Ok(Delivery::SelfTargeted);
        }

        let Some(destination) = self.resolve(target).await? else {
            self.system_message(
                format!("({target}) user not found..."),
                SystemMessageOptions::to(origin),
            )
            .await?;
            return Ok(Delivery::NotFound);
        };

        self.system_message(format!("You poked @{target}"), SystemMessageOptions::to(origin))
            .await?;
        self.hub
            .send_to(
                destination,
                ServerEvent::UserHighlight {
                    time: self.stamp(),
                    name: sender.name.clone(),
                },
            )
            .await;
        Ok(Delivery::Delivered)
    }

    async fn resolve(&self, name: &str) -> Result<Option<ConnectionId>, ApplicationError> {
        match self.presence.connection_for(name).await {
            Ok(connection) => Ok(Some(connection)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

fn origin(sender: &Identity) -> Result<ConnectionId, ApplicationError> {
    sender
        .socket
        .ok_or_else(|| ApplicationError::not_found(sender.name.clone()))
}
