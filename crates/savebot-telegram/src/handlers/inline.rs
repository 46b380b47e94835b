use std::sync::Arc;

use teloxide::{
    payloads::AnswerInlineQuery,
    prelude::*,
    requests::JsonRequest,
    types::{
        InlineQuery, InlineQueryResult, InlineQueryResultArticle, InlineQueryResultCachedDocument,
        InlineQueryResultCachedPhoto, InputMessageContent, InputMessageContentText,
    },
};
use tracing::{error, warn};

use savebot_core::{search::SearchEntry, texts, utils::AuditEvent};

use super::sender;
use crate::router::AppState;

fn article(id: &str, title: &str, text: &str) -> InlineQueryResult {
    InlineQueryResult::Article(InlineQueryResultArticle::new(
        id,
        title,
        InputMessageContent::Text(InputMessageContentText::new(text)),
    ))
}

pub(crate) fn to_inline_result(entry: &SearchEntry) -> InlineQueryResult {
    match entry {
        SearchEntry::SubscribeFirst => article(
            entry.id(),
            texts::INLINE_SUBSCRIBE_TITLE,
            texts::INLINE_SUBSCRIBE_TEXT,
        ),
        SearchEntry::NothingSaved => {
            article(entry.id(), texts::INLINE_EMPTY_TITLE, texts::INLINE_EMPTY_TEXT)
        }
        SearchEntry::CachedPhoto {
            id,
            file_ref,
            title,
        } => InlineQueryResult::CachedPhoto(
            InlineQueryResultCachedPhoto::new(id.clone(), file_ref.clone()).title(title.clone()),
        ),
        SearchEntry::CachedDocument {
            id,
            file_ref,
            title,
        } => InlineQueryResult::CachedDocument(InlineQueryResultCachedDocument::new(
            id.clone(),
            title.clone(),
            file_ref.clone(),
        )),
        SearchEntry::Article { id, title, text } => article(id, title, text),
    }
}

/// Inline search. Gated inside the responder; a blocked user gets the single
/// "subscribe first" entry instead of the full prompt.
pub async fn handle_inline_query(
    bot: Bot,
    q: InlineQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let (user_id, username) = sender(&q.from);

    let answer = match state.search.search(user_id, &q.query).await {
        Ok(answer) => answer,
        Err(e) => {
            // Inline mode has no chat to send an error notice into.
            error!(user_id = user_id.0, "inline search failed: {e}");
            if let Err(e) = state.audit.write(AuditEvent::error(
                user_id,
                &username,
                &e.to_string(),
                Some("inline_query"),
            )) {
                warn!("failed to write audit event: {e}");
            }
            return Ok(());
        }
    };

    let cache_time = if answer.gated {
        state.cfg.gate_cache_time
    } else {
        state.cfg.inline_cache_time
    };
    let results: Vec<InlineQueryResult> = answer.entries.iter().map(to_inline_result).collect();

    answer_request(&bot, q.id, results, cache_time).await?;
    Ok(())
}

/// Results are per-user (owner scoped, gated), so Telegram must not serve
/// one user's cached answer to another sending the same query.
fn answer_request(
    bot: &Bot,
    query_id: String,
    results: Vec<InlineQueryResult>,
    cache_time: u32,
) -> JsonRequest<AnswerInlineQuery> {
    bot.answer_inline_query(query_id, results)
        .cache_time(cache_time)
        .is_personal(true)
}
