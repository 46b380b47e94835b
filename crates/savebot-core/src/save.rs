//! Save Pipeline: classify inbound content and persist it.

use std::sync::Arc;

use tracing::info;

use crate::{
    content::{Content, SavedItem},
    domain::UserId,
    store::ContentStore,
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    UnsupportedKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(SavedItem),
    Rejected(RejectReason),
}

/// Callers must have passed the membership gate before invoking `save`.
#[derive(Clone)]
pub struct SavePipeline {
    store: Arc<dyn ContentStore>,
}

impl SavePipeline {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub async fn save(&self, owner: UserId, content: &Content) -> Result<SaveOutcome> {
        let Some(item) = content.to_new_item(owner) else {
            return Ok(SaveOutcome::Rejected(RejectReason::UnsupportedKind));
        };

        let saved = self.store.insert(item).await?;
        info!(
            item_id = saved.id.0,
            owner = owner.0,
            kind = %saved.content_kind,
            "content saved"
        );
        Ok(SaveOutcome::Saved(saved))
    }
}
