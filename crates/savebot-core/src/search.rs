//! Search/Inline Responder: gated lookup of a user's saved items.

use std::sync::Arc;

use crate::{
    content::{ContentKind, SavedItem},
    domain::{ItemId, UserId},
    gate::MembershipGate,
    store::ContentStore,
    texts,
    utils::truncate_chars,
    Result,
};

const ARTICLE_TITLE_CHARS: usize = 30;

/// A transport-neutral inline result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchEntry {
    /// Shown instead of real results when the gate blocks the user.
    SubscribeFirst,
    /// Shown when nothing matched.
    NothingSaved,
    /// Re-sendable photo by stored reference.
    CachedPhoto {
        id: String,
        file_ref: String,
        title: String,
    },
    /// Re-sendable document by stored reference.
    CachedDocument {
        id: String,
        file_ref: String,
        title: String,
    },
    /// Plain text result.
    Article {
        id: String,
        title: String,
        text: String,
    },
}

impl SearchEntry {
    pub fn id(&self) -> &str {
        match self {
            SearchEntry::SubscribeFirst => "not_subscribed",
            SearchEntry::NothingSaved => "empty",
            SearchEntry::CachedPhoto { id, .. }
            | SearchEntry::CachedDocument { id, .. }
            | SearchEntry::Article { id, .. } => id,
        }
    }

    /// Map a stored row to its presentable form.
    pub fn from_item(item: &SavedItem) -> Self {
        let id = result_id(item.id);
        match item.content_kind {
            ContentKind::Photo if !item.content_ref.is_empty() => SearchEntry::CachedPhoto {
                id,
                file_ref: item.content_ref.clone(),
                title: or_default(&item.caption, texts::PHOTO_TITLE),
            },
            ContentKind::Document if !item.content_ref.is_empty() => {
                SearchEntry::CachedDocument {
                    id,
                    file_ref: item.content_ref.clone(),
                    title: or_default(&item.caption, texts::DOCUMENT_TITLE),
                }
            }
            _ => {
                let text = if item.caption.is_empty() {
                    texts::saved_placeholder(item.id)
                } else {
                    item.caption.clone()
                };
                SearchEntry::Article {
                    id,
                    title: truncate_chars(&text, ARTICLE_TITLE_CHARS),
                    text,
                }
            }
        }
    }
}

/// Answer returned to the inline query handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchAnswer {
    pub entries: Vec<SearchEntry>,
    /// True when the answer is the gate's "subscribe first" stand-in.
    pub gated: bool,
}

pub struct SearchResponder {
    gate: Arc<MembershipGate>,
    store: Arc<dyn ContentStore>,
    limit: usize,
}

impl SearchResponder {
    pub fn new(gate: Arc<MembershipGate>, store: Arc<dyn ContentStore>, limit: usize) -> Self {
        Self { gate, store, limit }
    }

    /// Read-only: never writes to the store. Blocked users get a single
    /// `SubscribeFirst` entry and the store is not queried.
    pub async fn search(&self, user_id: UserId, query: &str) -> Result<SearchAnswer> {
        if !self.gate.check(user_id).await.is_clear() {
            return Ok(SearchAnswer {
                entries: vec![SearchEntry::SubscribeFirst],
                gated: true,
            });
        }

        let rows = self.store.search(user_id, query.trim(), self.limit).await?;
        let mut entries: Vec<SearchEntry> = rows
            .iter()
            .take(self.limit)
            .map(SearchEntry::from_item)
            .collect();
        if entries.is_empty() {
            entries.push(SearchEntry::NothingSaved);
        }

        Ok(SearchAnswer {
            entries,
            gated: false,
        })
    }
}

fn result_id(id: ItemId) -> String {
    format!("item-{id}")
}

fn or_default(caption: &str, fallback: &str) -> String {
    if caption.is_empty() {
        fallback.to_string()
    } else {
        caption.to_string()
    }
}
