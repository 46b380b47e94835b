//! Telegram adapter (teloxide).
//!
//! Implements the `savebot-core` messaging and membership ports over the
//! Telegram Bot API, plus the dispatcher wiring and update handlers.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{ChatMemberKind, InlineKeyboardButton, InlineKeyboardMarkup, Recipient},
};

use tokio::time::sleep;
use tracing::warn;

pub mod handlers;
pub mod router;

use savebot_core::{
    domain::{ChannelId, ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    messaging::{
        port::{MembershipPort, MessagingPort},
        types::{ButtonAction, InlineKeyboard, MembershipStatus},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    /// Sends honour one `RetryAfter`; everything else is returned as-is.
    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

/// Where to send a membership query for a configured channel.
pub fn channel_recipient(channel: &ChannelId) -> Recipient {
    match channel.numeric_id() {
        Some(id) => Recipient::Id(teloxide::types::ChatId(id)),
        None => Recipient::ChannelUsername(channel.as_str().to_string()),
    }
}

pub fn membership_status(kind: &ChatMemberKind) -> MembershipStatus {
    match kind {
        ChatMemberKind::Owner(_) => MembershipStatus::Creator,
        ChatMemberKind::Administrator(_) => MembershipStatus::Administrator,
        ChatMemberKind::Member => MembershipStatus::Member,
        ChatMemberKind::Restricted(_) => MembershipStatus::Restricted,
        ChatMemberKind::Left => MembershipStatus::Left,
        ChatMemberKind::Banned(_) => MembershipStatus::Kicked,
    }
}

pub fn tg_keyboard(keyboard: InlineKeyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .filter_map(|b| match b.action {
                    ButtonAction::Callback(data) => {
                        Some(InlineKeyboardButton::callback(b.label, data))
                    }
                    ButtonAction::Url(raw) => match raw.parse() {
                        Ok(url) => Some(InlineKeyboardButton::url(b.label, url)),
                        Err(e) => {
                            warn!("dropping button with invalid url {raw}: {e}");
                            None
                        }
                    },
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect();
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| self.bot.send_message(Self::tg_chat(chat_id), text.to_string()))
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        let markup = tg_keyboard(keyboard);

        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
                    .reply_markup(markup.clone())
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MembershipPort for TelegramMessenger {
    // No retry here: a failed lookup is the gate's problem, and it fails closed.
    async fn channel_membership(
        &self,
        channel: &ChannelId,
        user_id: UserId,
    ) -> Result<MembershipStatus> {
        let tg_user = teloxide::types::UserId(user_id.0 as u64);
        let member = self
            .bot
            .get_chat_member(channel_recipient(channel), tg_user)
            .await
            .map_err(Self::map_err)?;
        Ok(membership_status(&member.kind))
    }
}
