//! Saved-content model and inbound message classification.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ItemId, UserId};

/// Kind of a saved item. Stored as its lowercase name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Document,
    Photo,
    Video,
    Audio,
    Voice,
    Text,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Document => "document",
            ContentKind::Photo => "photo",
            ContentKind::Video => "video",
            ContentKind::Audio => "audio",
            ContentKind::Voice => "voice",
            ContentKind::Text => "text",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown content kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for ContentKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(ContentKind::Document),
            "photo" => Ok(ContentKind::Photo),
            "video" => Ok(ContentKind::Video),
            "audio" => Ok(ContentKind::Audio),
            "voice" => Ok(ContentKind::Voice),
            "text" => Ok(ContentKind::Text),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// A persisted saved item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedItem {
    pub id: ItemId,
    pub owner_id: UserId,
    pub content_ref: String,
    pub content_kind: ContentKind,
    pub caption: String,
    pub created_at: DateTime<Utc>,
}

/// Row data for an insert; the store assigns `id` and `created_at`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewItem {
    pub owner_id: UserId,
    pub content_ref: String,
    pub content_kind: ContentKind,
    pub caption: String,
}

/// Transport-neutral view of the attributes of an inbound message that matter
/// for saving. The Telegram adapter fills this from a `Message`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageSnapshot {
    pub forwarded: bool,
    pub document: Option<String>,
    /// Photo variants ordered from smallest to largest resolution.
    pub photo: Vec<String>,
    pub video: Option<String>,
    pub audio: Option<String>,
    pub voice: Option<String>,
    pub text: Option<String>,
    pub caption: Option<String>,
}

impl MessageSnapshot {
    /// Whether a plain (non-command) message should go through the save
    /// pipeline on its own. Forwarded messages always do, so an unsupported
    /// forward still gets a rejection reply.
    pub fn wants_auto_save(&self) -> bool {
        self.forwarded || Content::classify(self).is_supported()
    }
}

/// Media payload: the transport reference plus the caption saved with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Media {
    pub file_ref: String,
    pub caption: String,
}

/// Classified inbound content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Document(Media),
    Photo(Media),
    Video(Media),
    Audio(Media),
    Voice(Media),
    Text(String),
    Unsupported,
}

impl Content {
    /// Classify a message. Precedence: document, photo, video, audio, voice,
    /// text; anything else is unsupported. For photos the last (largest)
    /// variant wins.
    pub fn classify(msg: &MessageSnapshot) -> Content {
        let caption = msg
            .caption
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(msg.text.as_deref())
            .unwrap_or("")
            .to_string();
        let media = |file_ref: &str| Media {
            file_ref: file_ref.to_string(),
            caption: caption.clone(),
        };

        if let Some(r) = present(&msg.document) {
            return Content::Document(media(r));
        }
        if let Some(r) = msg.photo.last().map(String::as_str).filter(|s| !s.is_empty()) {
            return Content::Photo(media(r));
        }
        if let Some(r) = present(&msg.video) {
            return Content::Video(media(r));
        }
        if let Some(r) = present(&msg.audio) {
            return Content::Audio(media(r));
        }
        if let Some(r) = present(&msg.voice) {
            return Content::Voice(media(r));
        }
        if let Some(text) = present(&msg.text) {
            return Content::Text(text.to_string());
        }
        Content::Unsupported
    }

    pub fn kind(&self) -> Option<ContentKind> {
        match self {
            Content::Document(_) => Some(ContentKind::Document),
            Content::Photo(_) => Some(ContentKind::Photo),
            Content::Video(_) => Some(ContentKind::Video),
            Content::Audio(_) => Some(ContentKind::Audio),
            Content::Voice(_) => Some(ContentKind::Voice),
            Content::Text(_) => Some(ContentKind::Text),
            Content::Unsupported => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.kind().is_some()
    }

    /// Row to insert for this content, or `None` when it can't be saved.
    pub fn to_new_item(&self, owner_id: UserId) -> Option<NewItem> {
        let content_kind = self.kind()?;
        let (content_ref, caption) = match self {
            Content::Document(m)
            | Content::Photo(m)
            | Content::Video(m)
            | Content::Audio(m)
            | Content::Voice(m) => (m.file_ref.clone(), m.caption.clone()),
            Content::Text(body) => (String::new(), body.clone()),
            Content::Unsupported => return None,
        };
        Some(NewItem {
            owner_id,
            content_ref,
            content_kind,
            caption,
        })
    }
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(body: &str) -> MessageSnapshot {
        MessageSnapshot {
            text: Some(body.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn document_wins_over_everything_else() {
        let msg = MessageSnapshot {
            document: Some("doc-1".into()),
            photo: vec!["p-small".into()],
            video: Some("vid".into()),
            caption: Some("report".into()),
            ..Default::default()
        };
        assert_eq!(
            Content::classify(&msg),
            Content::Document(Media {
                file_ref: "doc-1".into(),
                caption: "report".into()
            })
        );
    }

    #[test]
    fn photo_takes_last_variant() {
        let msg = MessageSnapshot {
            photo: vec!["p-90".into(), "p-320".into(), "p-1280".into()],
            ..Default::default()
        };
        let content = Content::classify(&msg);
        assert_eq!(content.kind(), Some(ContentKind::Photo));
        let item = content.to_new_item(UserId(7)).unwrap();
        assert_eq!(item.content_ref, "p-1280");
        assert_eq!(item.caption, "");
    }

    #[test]
    fn video_beats_audio_and_voice() {
        let msg = MessageSnapshot {
            video: Some("v".into()),
            audio: Some("a".into()),
            voice: Some("vo".into()),
            ..Default::default()
        };
        assert_eq!(Content::classify(&msg).kind(), Some(ContentKind::Video));

        let msg = MessageSnapshot {
            audio: Some("a".into()),
            voice: Some("vo".into()),
            ..Default::default()
        };
        assert_eq!(Content::classify(&msg).kind(), Some(ContentKind::Audio));
    }

    #[test]
    fn text_item_has_empty_ref_and_full_caption() {
        let item = Content::classify(&text("hello"))
            .to_new_item(UserId(1))
            .unwrap();
        assert_eq!(item.content_kind, ContentKind::Text);
        assert_eq!(item.content_ref, "");
        assert_eq!(item.caption, "hello");
    }

    #[test]
    fn media_caption_falls_back_to_text() {
        let msg = MessageSnapshot {
            voice: Some("vo".into()),
            text: Some("note".into()),
            ..Default::default()
        };
        let item = Content::classify(&msg).to_new_item(UserId(1)).unwrap();
        assert_eq!(item.content_kind, ContentKind::Voice);
        assert_eq!(item.caption, "note");
    }

    #[test]
    fn empty_message_is_unsupported() {
        let msg = MessageSnapshot::default();
        assert_eq!(Content::classify(&msg), Content::Unsupported);
        assert!(Content::Unsupported.to_new_item(UserId(1)).is_none());
        assert!(!msg.wants_auto_save());
    }

    #[test]
    fn unsupported_forward_still_goes_to_pipeline() {
        let msg = MessageSnapshot {
            forwarded: true,
            ..Default::default()
        };
        assert!(msg.wants_auto_save());
        assert!(text("hi").wants_auto_save());
    }

    #[test]
    fn unknown_kind_name_is_rejected() {
        assert_eq!("voice".parse::<ContentKind>().unwrap(), ContentKind::Voice);
        assert!("sticker".parse::<ContentKind>().is_err());
    }
}
