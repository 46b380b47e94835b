//! Telegram update handlers.
//!
//! Each handler is a small adapter that:
//! - runs the membership gate explicitly where the operation is gated
//! - converts the teloxide update into core types
//! - calls into `savebot-core` and reports the outcome

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, InlineQuery, Message, MessageEntityKind, User},
};
use tracing::{error, warn};

use savebot_core::{
    domain::{ChatId, UserId},
    texts,
    utils::AuditEvent,
};

use crate::router::AppState;

mod callback;
mod commands;
mod content;
mod gate;
mod inline;
#[cfg(test)]
mod testing;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_inline_query(
    bot: Bot,
    q: InlineQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    inline::handle_inline_query(bot, q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if is_command(&msg) {
        return commands::handle_command(bot, msg, state).await;
    }

    content::handle_content(msg, state).await
}

/// Typed here (not forwarded) and opening with a `bot_command` entity.
/// Forwarded text that merely starts with `/` is content.
fn is_command(msg: &Message) -> bool {
    if msg.forward_date().is_some() {
        return false;
    }
    msg.entities()
        .and_then(|entities| entities.first())
        .is_some_and(|e| e.offset == 0 && matches!(e.kind, MessageEntityKind::BotCommand))
}

/// Sender identity in core terms plus a display name for audit records.
pub(crate) fn sender(user: &User) -> (UserId, String) {
    let username = user
        .username
        .clone()
        .unwrap_or_else(|| "unknown".to_string());
    (UserId(user.id.0 as i64), username)
}

pub(crate) fn core_chat(chat_id: teloxide::types::ChatId) -> ChatId {
    ChatId(chat_id.0)
}

/// Best-effort send: failures are logged, never surfaced.
pub(crate) fn log_send_failure<T>(res: savebot_core::Result<T>, what: &str) {
    if let Err(e) = res {
        warn!("failed to send {what}: {e}");
    }
}

/// Unexpected internal failure while handling an update: log, audit, and
/// optionally tell the user something went wrong.
pub(crate) async fn report_internal_error(
    state: &AppState,
    chat_id: ChatId,
    user_id: UserId,
    username: &str,
    err: &savebot_core::Error,
    context: &str,
) {
    error!(user_id = user_id.0, context, "internal error: {err}");
    if let Err(e) = state.audit.write(AuditEvent::error(
        user_id,
        username,
        &err.to_string(),
        Some(context),
    )) {
        warn!("failed to write audit event: {e}");
    }
    if state.cfg.notify_internal_errors {
        log_send_failure(
            state.messenger.send_text(chat_id, texts::INTERNAL_ERROR).await,
            "error notice",
        );
    }
}
