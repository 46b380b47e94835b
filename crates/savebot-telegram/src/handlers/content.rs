use std::sync::Arc;

use teloxide::prelude::*;
use tracing::warn;

use savebot_core::{
    content::{Content, MessageSnapshot},
    domain::{ChatId, UserId},
    save::{RejectReason, SaveOutcome},
    texts,
    utils::AuditEvent,
};

use super::{core_chat, gate::ensure_subscribed, log_send_failure, report_internal_error, sender};
use crate::router::AppState;

/// Core view of a Telegram message.
pub(crate) fn snapshot(msg: &Message) -> MessageSnapshot {
    MessageSnapshot {
        forwarded: msg.forward_date().is_some(),
        document: msg.document().map(|d| d.file.id.clone()),
        photo: msg
            .photo()
            .map(|sizes| sizes.iter().map(|p| p.file.id.clone()).collect())
            .unwrap_or_default(),
        video: msg.video().map(|v| v.file.id.clone()),
        audio: msg.audio().map(|a| a.file.id.clone()),
        voice: msg.voice().map(|v| v.file.id.clone()),
        text: msg.text().map(str::to_string),
        caption: msg.caption().map(str::to_string),
    }
}

/// Plain inbound message: save it if it's content we keep (or any forward).
pub async fn handle_content(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let snap = snapshot(&msg);
    if !snap.wants_auto_save() {
        return Ok(());
    }
    let Some(user) = msg.from() else {
        return Ok(());
    };

    let (user_id, username) = sender(user);
    let chat_id = core_chat(msg.chat.id);

    if !ensure_subscribed(&state, chat_id, user_id, &username).await {
        return Ok(());
    }

    save_and_reply(&state, chat_id, user_id, &username, &snap).await;
    Ok(())
}

/// Run the save pipeline for `snap` on behalf of `owner` and reply with the
/// outcome. Shared by plain messages and `/save` replies.
pub(crate) async fn save_and_reply(
    state: &AppState,
    chat_id: ChatId,
    owner: UserId,
    username: &str,
    snap: &MessageSnapshot,
) {
    let content = Content::classify(snap);
    match state.saver.save(owner, &content).await {
        Ok(SaveOutcome::Saved(item)) => {
            if let Err(e) = state.audit.write(AuditEvent::saved(username, &item)) {
                warn!("failed to write audit event: {e}");
            }
            let reply = match content {
                Content::Text(_) => texts::text_saved(item.id),
                _ => texts::media_saved(item.id),
            };
            log_send_failure(
                state.messenger.send_text(chat_id, &reply).await,
                "save confirmation",
            );
        }
        Ok(SaveOutcome::Rejected(RejectReason::UnsupportedKind)) => {
            if let Err(e) =
                state
                    .audit
                    .write(AuditEvent::rejected(owner, username, "unsupported content kind"))
            {
                warn!("failed to write audit event: {e}");
            }
            log_send_failure(
                state
                    .messenger
                    .send_text(chat_id, texts::UNSUPPORTED_CONTENT)
                    .await,
                "rejection",
            );
        }
        Err(e) => report_internal_error(state, chat_id, owner, username, &e, "save").await,
    }
}
