use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, error_handlers::LoggingErrorHandler, prelude::*};
use tracing::{debug, info, warn};

use savebot_core::{
    config::Config,
    gate::MembershipGate,
    messaging::port::{MembershipPort, MessagingPort},
    save::SavePipeline,
    search::SearchResponder,
    store::ContentStore,
    utils::AuditLogger,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub messenger: Arc<dyn MessagingPort>,
    pub gate: Arc<MembershipGate>,
    pub saver: SavePipeline,
    pub search: Arc<SearchResponder>,
    pub audit: Arc<AuditLogger>,
    /// Our own username, without `@`. Commands addressed to another bot are
    /// ignored; `None` (lookup failed) accepts every mention.
    pub bot_username: Option<String>,
}

impl AppState {
    pub fn new(
        cfg: Arc<Config>,
        store: Arc<dyn ContentStore>,
        messenger: Arc<dyn MessagingPort>,
        membership: Arc<dyn MembershipPort>,
    ) -> Self {
        let gate = Arc::new(MembershipGate::new(
            cfg.required_channels.clone(),
            membership,
        ));
        let search = Arc::new(SearchResponder::new(
            gate.clone(),
            store.clone(),
            cfg.search_limit,
        ));
        let audit = Arc::new(AuditLogger::new(
            cfg.audit_log_path.clone(),
            cfg.audit_log_json,
        ));

        Self {
            cfg,
            messenger,
            gate,
            saver: SavePipeline::new(store),
            search,
            audit,
            bot_username: None,
        }
    }

    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }
}

/// Long-poll Telegram until Ctrl-C. The caller owns the store and closes it
/// after this returns.
pub async fn run_polling(cfg: Arc<Config>, store: Arc<dyn ContentStore>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let me = match bot.get_me().await {
        Ok(me) => {
            info!("savebot started: @{}", me.username());
            Some(me.username().to_string())
        }
        Err(e) => {
            warn!("get_me failed, continuing: {e}");
            None
        }
    };
    info!(
        "required channels: {}",
        cfg.required_channels
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let telegram = Arc::new(TelegramMessenger::new(bot.clone()));
    let mut state = AppState::new(cfg, store, telegram.clone(), telegram);
    if let Some(username) = me {
        state = state.with_bot_username(username);
    }
    let state = Arc::new(state);

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_inline_query().endpoint(handlers::handle_inline_query))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            debug!("unhandled update: {:?}", upd.kind);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error from the update listener or a handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("polling stopped");
    Ok(())
}
