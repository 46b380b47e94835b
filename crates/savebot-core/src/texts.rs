//! User-facing strings.

use crate::domain::ItemId;

pub const VERIFY_CALLBACK: &str = "verify";

pub const JOIN_FIRST_BUTTON: &str = "Join first 💌";
pub const CHECK_NOW_BUTTON: &str = "Check now";
pub const CHECK_AGAIN_BUTTON: &str = "Check again";

pub const GATE_PROMPT: &str = "Before you can use the bot, subscribe to these channels:";
pub const STILL_NOT_SUBSCRIBED: &str = "Looks like you're still not subscribed to:";
pub const VERIFIED: &str = "All set! Verified, you can use the bot now 🖤.";

pub const UNSUPPORTED_CONTENT: &str = "This content type can't be saved.";
pub const SAVE_USAGE: &str = "Reply to a message that has content, then send /save";
pub const UNKNOWN_COMMAND: &str = "Unknown command";
pub const INTERNAL_ERROR: &str = "Something went wrong while handling that. Please try again.";

pub const INLINE_SUBSCRIBE_TITLE: &str = "You need to subscribe first";
pub const INLINE_SUBSCRIBE_TEXT: &str = "Please subscribe to the required channels and try again.";
pub const INLINE_EMPTY_TITLE: &str = "No saved content";
pub const INLINE_EMPTY_TEXT: &str = "Nothing saved yet.";
pub const PHOTO_TITLE: &str = "Photo";
pub const DOCUMENT_TITLE: &str = "File";

pub fn greeting(first_name: &str) -> String {
    format!("- Hi {first_name}\nI'm the content saver bot. Send or forward something to save it 🖤")
}

pub fn subscribe_button(channel: &str) -> String {
    format!("Subscribe: {channel}")
}

pub fn media_saved(id: ItemId) -> String {
    format!("Saved! Reference number: #{id}")
}

pub fn text_saved(id: ItemId) -> String {
    format!("Text saved 📝 #{id}")
}

pub fn saved_placeholder(id: ItemId) -> String {
    format!("Saved content #{id}")
}
