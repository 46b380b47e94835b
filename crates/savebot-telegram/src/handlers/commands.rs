use std::sync::Arc;

use teloxide::prelude::*;
use tracing::debug;

use savebot_core::{
    messaging::types::{InlineButton, InlineKeyboard},
    texts,
};

use super::{
    content::{save_and_reply, snapshot},
    core_chat,
    gate::{ensure_subscribed, report_verification},
    log_send_failure, sender,
};
use crate::router::AppState;

#[derive(Debug, PartialEq, Eq)]
struct ParsedCommand {
    name: String,
    /// Bot named in `/cmd@botname`, if any.
    mention: Option<String>,
}

impl ParsedCommand {
    /// Addressed to us: no mention, our own name, or our name is unknown.
    fn is_for(&self, bot_username: Option<&str>) -> bool {
        match (&self.mention, bot_username) {
            (Some(mention), Some(ours)) => mention.eq_ignore_ascii_case(ours),
            _ => true,
        }
    }
}

fn parse_command(text: &str) -> ParsedCommand {
    // Telegram may send `/cmd@botname arg1 ...`; none of our commands take args.
    let first = text.split_whitespace().next().unwrap_or("");

    let (name, mention) = match first.trim_start_matches('/').split_once('@') {
        Some((name, mention)) => (name, Some(mention.to_string())),
        None => (first.trim_start_matches('/'), None),
    };

    ParsedCommand {
        name: name.to_lowercase(),
        mention,
    }
}

pub async fn handle_command(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(user) = msg.from() else {
        return Ok(());
    };

    let cmd = parse_command(text);
    if !cmd.is_for(state.bot_username.as_deref()) {
        debug!(mention = ?cmd.mention, "command addressed to another bot");
        return Ok(());
    }
    let (user_id, username) = sender(user);
    let chat_id = core_chat(msg.chat.id);

    match cmd.name.as_str() {
        "start" | "help" => {
            let keyboard = InlineKeyboard::new(vec![vec![InlineButton::callback(
                texts::JOIN_FIRST_BUTTON,
                texts::VERIFY_CALLBACK,
            )]]);
            log_send_failure(
                state
                    .messenger
                    .send_inline_keyboard(chat_id, &texts::greeting(&user.first_name), keyboard)
                    .await,
                "greeting",
            );
        }

        "verify" => {
            report_verification(&state, chat_id, user_id, &username).await;
        }

        "save" => {
            // Gate first, then look at the reply target.
            if !ensure_subscribed(&state, chat_id, user_id, &username).await {
                return Ok(());
            }
            let Some(target) = msg.reply_to_message() else {
                log_send_failure(
                    state.messenger.send_text(chat_id, texts::SAVE_USAGE).await,
                    "save usage",
                );
                return Ok(());
            };
            // The replied-to message is saved, owned by whoever issued /save.
            save_and_reply(&state, chat_id, user_id, &username, &snapshot(target)).await;
        }

        _ => {
            log_send_failure(
                state
                    .messenger
                    .send_text(chat_id, texts::UNKNOWN_COMMAND)
                    .await,
                "unknown command reply",
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use savebot_core::content::ContentKind;

    use super::*;
    use crate::handlers::{handle_message, testing::*};

    #[test]
    fn parse_command_splits_name_and_mention() {
        assert_eq!(
            parse_command("/Save@content_saver_bot  now please"),
            ParsedCommand {
                name: "save".to_string(),
                mention: Some("content_saver_bot".to_string()),
            }
        );
        assert_eq!(
            parse_command("/verify"),
            ParsedCommand {
                name: "verify".to_string(),
                mention: None,
            }
        );
    }

    #[test]
    fn mention_must_match_our_username_when_known() {
        let cmd = parse_command("/start@SomeOtherBot");
        assert!(!cmd.is_for(Some("content_saver_bot")));
        assert!(cmd.is_for(None));
        assert!(parse_command("/start@Content_Saver_Bot").is_for(Some("content_saver_bot")));
        assert!(parse_command("/start").is_for(Some("content_saver_bot")));
    }

    #[tokio::test]
    async fn save_reply_stores_target_for_the_issuer() {
        let h = Harness::new(&[]);
        let target = message_json(json!({
            "message_id": 9,
            "from": user_json(7, "bob"),
            "document": { "file_id": "doc-1", "file_unique_id": "u-doc-1", "file_name": "manual.pdf" },
            "caption": "manual",
        }));
        let msg = message(json!({
            "text": "/save",
            "entities": [{ "type": "bot_command", "offset": 0, "length": 5 }],
            "reply_to_message": target,
        }));

        handle_message(bot(), msg, h.state.clone()).await.unwrap();

        let saved = h.saved(USER).await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].content_kind, ContentKind::Document);
        assert_eq!(saved[0].content_ref, "doc-1");
        assert_eq!(saved[0].caption, "manual");
        assert!(h.saved(7).await.is_empty());
        assert_eq!(h.texts(), vec![texts::media_saved(saved[0].id)]);
    }

    #[tokio::test]
    async fn save_without_reply_sends_usage_hint() {
        let h = Harness::new(&[]);
        handle_message(bot(), command("/save"), h.state.clone())
            .await
            .unwrap();

        assert_eq!(h.texts(), vec![texts::SAVE_USAGE.to_string()]);
        assert!(h.saved(USER).await.is_empty());
    }

    #[tokio::test]
    async fn save_when_blocked_prompts_instead_of_usage() {
        let h = Harness::new(&["@alpha"]);
        handle_message(bot(), command("/save"), h.state.clone())
            .await
            .unwrap();

        assert_eq!(h.texts(), vec![texts::GATE_PROMPT.to_string()]);
    }

    #[tokio::test]
    async fn unknown_command_is_answered_and_not_saved() {
        let h = Harness::new(&[]);
        handle_message(bot(), command("/frobnicate now"), h.state.clone())
            .await
            .unwrap();

        assert_eq!(h.texts(), vec![texts::UNKNOWN_COMMAND.to_string()]);
        assert!(h.saved(USER).await.is_empty());
    }

    #[tokio::test]
    async fn commands_for_other_bots_are_ignored() {
        let h = Harness::named("content_saver_bot");
        handle_message(bot(), command("/start@SomeOtherBot"), h.state.clone())
            .await
            .unwrap();
        assert!(h.sent().is_empty());

        handle_message(bot(), command("/start@content_saver_bot"), h.state.clone())
            .await
            .unwrap();
        assert_eq!(h.texts(), vec![texts::greeting("Ann")]);
    }
}
