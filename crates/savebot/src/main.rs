use std::sync::Arc;

use tracing::error;

use savebot_core::{
    config::Config,
    store::{ContentStore, SqliteStore},
};

#[tokio::main]
async fn main() -> Result<(), savebot_core::Error> {
    savebot_core::logging::init("savebot")?;

    let cfg = Arc::new(Config::load()?);
    let store: Arc<dyn ContentStore> = Arc::new(SqliteStore::open(&cfg.db_path)?);

    let polled = savebot_telegram::router::run_polling(cfg, store.clone()).await;

    // Flush the store even when polling failed.
    if let Err(e) = store.close().await {
        error!("failed to close content store: {e}");
    }

    polled.map_err(|e| savebot_core::Error::External(format!("telegram bot failed: {e}")))
}
