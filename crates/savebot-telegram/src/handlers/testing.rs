//! Fakes for driving handlers without Telegram.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use teloxide::{prelude::*, types::CallbackQuery};

use savebot_core::{
    config::Config,
    content::SavedItem,
    domain::{ChannelId, ChatId, MessageId, MessageRef, UserId},
    messaging::{
        port::{MembershipPort, MessagingPort},
        types::{InlineKeyboard, MembershipStatus},
    },
    store::{ContentStore, SqliteStore},
    Result,
};

use crate::router::AppState;

pub(crate) const USER: i64 = 42;

/// One outbound message as the handler produced it.
#[derive(Clone, Debug)]
pub(crate) struct Sent {
    pub chat_id: ChatId,
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

#[derive(Default)]
pub(crate) struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    answered: Mutex<Vec<String>>,
}

impl RecordingMessenger {
    fn record(&self, chat_id: ChatId, text: &str, keyboard: Option<InlineKeyboard>) -> MessageRef {
        let mut sent = self.sent.lock().unwrap();
        sent.push(Sent {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        MessageRef {
            chat_id,
            message_id: MessageId(sent.len() as i32),
        }
    }
}

#[async_trait]
impl MessagingPort for RecordingMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        Ok(self.record(chat_id, text, None))
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        Ok(self.record(chat_id, text, Some(keyboard)))
    }

    async fn answer_callback_query(&self, callback_id: &str, _text: Option<&str>) -> Result<()> {
        self.answered.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }
}

/// Member of every channel except the ones it was told the user left.
struct FakeMembership {
    left: Vec<ChannelId>,
}

#[async_trait]
impl MembershipPort for FakeMembership {
    async fn channel_membership(
        &self,
        channel: &ChannelId,
        _user_id: UserId,
    ) -> Result<MembershipStatus> {
        if self.left.contains(channel) {
            Ok(MembershipStatus::Left)
        } else {
            Ok(MembershipStatus::Member)
        }
    }
}

pub(crate) struct Harness {
    pub state: Arc<AppState>,
    pub messenger: Arc<RecordingMessenger>,
    store: Arc<SqliteStore>,
}

impl Harness {
    /// Required channels are `@alpha` and `@beta`; `left` lists the ones the
    /// user is not in.
    pub fn new(left: &[&str]) -> Self {
        Self::build(left, None)
    }

    pub fn named(bot_username: &str) -> Self {
        Self::build(&[], Some(bot_username))
    }

    fn build(left: &[&str], bot_username: Option<&str>) -> Self {
        let audit_path = std::env::temp_dir().join("savebot-handler-tests.log");
        let cfg = Config::from_lookup(|key: &str| match key {
            "BOT_TOKEN" => Some("0:test".to_string()),
            "REQUIRED_CHANNELS" => Some("@alpha,@beta".to_string()),
            "AUDIT_LOG_PATH" => Some(audit_path.display().to_string()),
            _ => None,
        })
        .unwrap();

        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let messenger = Arc::new(RecordingMessenger::default());
        let membership = Arc::new(FakeMembership {
            left: left.iter().map(|c| ChannelId::new(*c)).collect(),
        });

        let mut state = AppState::new(Arc::new(cfg), store.clone(), messenger.clone(), membership);
        if let Some(name) = bot_username {
            state = state.with_bot_username(name);
        }

        Self {
            state: Arc::new(state),
            messenger,
            store,
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.messenger.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.text).collect()
    }

    pub fn answered(&self) -> Vec<String> {
        self.messenger.answered.lock().unwrap().clone()
    }

    pub async fn saved(&self, owner: i64) -> Vec<SavedItem> {
        self.store.search(UserId(owner), "", 50).await.unwrap()
    }
}

pub(crate) fn bot() -> Bot {
    Bot::new("0:test")
}

pub(crate) fn user_json(id: i64, username: &str) -> Value {
    json!({ "id": id, "is_bot": false, "first_name": "Ann", "username": username })
}

/// Private-chat message from `USER`, with `extra` fields merged in.
pub(crate) fn message_json(extra: Value) -> Value {
    let mut base = json!({
        "message_id": 10,
        "date": 1_700_000_000,
        "chat": { "id": USER, "type": "private", "first_name": "Ann" },
        "from": user_json(USER, "ann"),
    });
    if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
        base.extend(extra);
    }
    base
}

pub(crate) fn message(extra: Value) -> Message {
    serde_json::from_value(message_json(extra)).unwrap()
}

/// Text with a leading `bot_command` entity, as Telegram sends `/cmd`.
pub(crate) fn command(text: &str) -> Message {
    let len = text.split_whitespace().next().unwrap_or("").encode_utf16().count();
    message(json!({
        "text": text,
        "entities": [{ "type": "bot_command", "offset": 0, "length": len }],
    }))
}

pub(crate) fn verify_button() -> CallbackQuery {
    serde_json::from_value(json!({
        "id": "cb-1",
        "from": user_json(USER, "ann"),
        "chat_instance": "ci-1",
        "data": "verify",
        "message": message_json(json!({ "text": "Before you can use the bot" })),
    }))
    .unwrap()
}
