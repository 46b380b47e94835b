//! Explicit subscription guard used at the top of gated handlers.

use tracing::warn;

use savebot_core::{
    domain::{ChannelId, ChatId, UserId},
    gate::{channel_list, subscribe_keyboard, GateVerdict},
    texts,
    utils::AuditEvent,
};

use super::log_send_failure;
use crate::router::AppState;

/// Returns `true` when the user may proceed. Otherwise the subscribe prompt
/// has already been sent and the caller must stop.
pub(crate) async fn ensure_subscribed(
    state: &AppState,
    chat_id: ChatId,
    user_id: UserId,
    username: &str,
) -> bool {
    let GateVerdict::Blocked(blocked) = state.gate.check(user_id).await else {
        return true;
    };

    audit_blocked(state, user_id, username, &blocked);
    log_send_failure(
        state
            .messenger
            .send_inline_keyboard(
                chat_id,
                texts::GATE_PROMPT,
                subscribe_keyboard(&blocked, texts::CHECK_NOW_BUTTON),
            )
            .await,
        "subscribe prompt",
    );
    false
}

/// `/verify` and the verify button: re-run the gate and report either way.
pub(crate) async fn report_verification(
    state: &AppState,
    chat_id: ChatId,
    user_id: UserId,
    username: &str,
) {
    match state.gate.check(user_id).await {
        GateVerdict::Clear => {
            log_send_failure(
                state.messenger.send_text(chat_id, texts::VERIFIED).await,
                "verification result",
            );
        }
        GateVerdict::Blocked(blocked) => {
            audit_blocked(state, user_id, username, &blocked);
            log_send_failure(
                state
                    .messenger
                    .send_text(chat_id, texts::STILL_NOT_SUBSCRIBED)
                    .await,
                "verification result",
            );
            log_send_failure(
                state
                    .messenger
                    .send_inline_keyboard(
                        chat_id,
                        &channel_list(&blocked),
                        subscribe_keyboard(&blocked, texts::CHECK_AGAIN_BUTTON),
                    )
                    .await,
                "channel list",
            );
        }
    }
}

fn audit_blocked(
    state: &AppState,
    user_id: UserId,
    username: &str,
    blocked: &[ChannelId],
) {
    if let Err(e) = state
        .audit
        .write(AuditEvent::gate_blocked(user_id, username, blocked))
    {
        warn!("failed to write audit event: {e}");
    }
}
