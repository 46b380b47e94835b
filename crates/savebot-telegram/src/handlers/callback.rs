use std::sync::Arc;

use teloxide::prelude::*;

use savebot_core::texts;

use super::{core_chat, gate::report_verification, log_send_failure, sender};
use crate::router::AppState;

pub async fn handle_callback(
    _bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let data = q.data.as_deref().unwrap_or_default();

    // Always answer the callback so the client stops its spinner.
    log_send_failure(
        state.messenger.answer_callback_query(&q.id, None).await,
        "callback answer",
    );

    if data != texts::VERIFY_CALLBACK {
        return Ok(());
    }
    // Buttons on inline-mode messages carry no chat to report into.
    let Some(chat_id) = q.message.as_ref().map(|m| core_chat(m.chat.id)) else {
        return Ok(());
    };

    let (user_id, username) = sender(&q.from);
    report_verification(&state, chat_id, user_id, &username).await;
    Ok(())
}
