use async_trait::async_trait;

use crate::{
    domain::{ChannelId, ChatId, MessageRef, UserId},
    messaging::types::{InlineKeyboard, MembershipStatus},
    Result,
};

/// Outbound messaging port.
///
/// Telegram is the only implementation; handlers go through this trait so the
/// reply flows don't depend on teloxide request builders.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}

/// Channel membership lookup used by the subscription gate.
#[async_trait]
pub trait MembershipPort: Send + Sync {
    async fn channel_membership(
        &self,
        channel: &ChannelId,
        user_id: UserId,
    ) -> Result<MembershipStatus>;
}
