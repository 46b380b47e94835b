//! Membership Gate: mandatory channel subscription check.

use std::sync::Arc;

use tracing::warn;

use crate::{
    domain::{ChannelId, UserId},
    messaging::{
        port::MembershipPort,
        types::{InlineButton, InlineKeyboard},
    },
    texts,
};

/// Outcome of a gate check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateVerdict {
    Clear,
    /// Channels the user is not a member of, in configured order.
    Blocked(Vec<ChannelId>),
}

impl GateVerdict {
    pub fn is_clear(&self) -> bool {
        matches!(self, GateVerdict::Clear)
    }
}

/// Checks a user against the fixed list of required channels.
///
/// Every call is a fresh round-trip per channel; nothing is cached. Query
/// failures are fail-closed: the channel is reported as not joined.
pub struct MembershipGate {
    channels: Vec<ChannelId>,
    port: Arc<dyn MembershipPort>,
}

impl MembershipGate {
    pub fn new(channels: Vec<ChannelId>, port: Arc<dyn MembershipPort>) -> Self {
        Self { channels, port }
    }

    pub async fn check(&self, user_id: UserId) -> GateVerdict {
        let mut missing = Vec::new();
        for channel in &self.channels {
            match self.port.channel_membership(channel, user_id).await {
                Ok(status) if status.is_member() => {}
                Ok(_) => missing.push(channel.clone()),
                Err(e) => {
                    warn!(channel = %channel, user_id = user_id.0, "membership check failed: {e}");
                    missing.push(channel.clone());
                }
            }
        }

        if missing.is_empty() {
            GateVerdict::Clear
        } else {
            GateVerdict::Blocked(missing)
        }
    }
}

/// Keyboard shown to a blocked user: one row of subscribe links (channels
/// without a public username get no link) and a recheck button.
pub fn subscribe_keyboard(blocked: &[ChannelId], recheck_label: &str) -> InlineKeyboard {
    let mut kb = InlineKeyboard::default();
    kb.push_row(
        blocked
            .iter()
            .filter_map(|ch| {
                ch.join_url()
                    .map(|url| InlineButton::url(texts::subscribe_button(ch.as_str()), url))
            })
            .collect(),
    );
    kb.push_row(vec![InlineButton::callback(
        recheck_label,
        texts::VERIFY_CALLBACK,
    )]);
    kb
}

/// Newline-separated channel list for the verify report.
pub fn channel_list(blocked: &[ChannelId]) -> String {
    blocked
        .iter()
        .map(ChannelId::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}
