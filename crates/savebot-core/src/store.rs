//! Content Store: the single `saved_items` table.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{
    params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
    Connection, ToSql,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    content::{ContentKind, NewItem, SavedItem},
    domain::{ItemId, UserId},
    Result,
};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS saved_items (
     id           INTEGER PRIMARY KEY AUTOINCREMENT,
     owner_id     INTEGER NOT NULL,
     content_ref  TEXT NOT NULL,
     content_kind TEXT NOT NULL,
     caption      TEXT NOT NULL DEFAULT '',
     created_at   TEXT NOT NULL
 );
 CREATE INDEX IF NOT EXISTS idx_saved_items_owner ON saved_items(owner_id, id);";

/// Persistence port for saved items.
///
/// Rows are append-only: there is no update or delete.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert a row and return it with its assigned id and timestamp.
    async fn insert(&self, item: NewItem) -> Result<SavedItem>;

    /// Items owned by `owner` whose caption contains `query` (case-sensitive;
    /// empty query matches everything), newest first, at most `limit`.
    async fn search(&self, owner: UserId, query: &str, limit: usize) -> Result<Vec<SavedItem>>;

    /// Flush pending writes before shutdown.
    async fn close(&self) -> Result<()>;
}

/// SQLite-backed store. One connection behind an async mutex; SQLite's own
/// single-writer locking is all the coordination inserts need.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.execute_batch(SCHEMA)?;

        info!("content store opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database (tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn insert(&self, item: NewItem) -> Result<SavedItem> {
        // Stored at microsecond precision; keep the returned value identical to what reads back.
        let created_at = Utc::now().trunc_subsecs(6);
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO saved_items (owner_id, content_ref, content_kind, caption, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                item.owner_id.0,
                item.content_ref,
                item.content_kind,
                item.caption,
                created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        let id = ItemId(conn.last_insert_rowid());
        debug!(item_id = id.0, owner = item.owner_id.0, "inserted saved item");

        Ok(SavedItem {
            id,
            owner_id: item.owner_id,
            content_ref: item.content_ref,
            content_kind: item.content_kind,
            caption: item.caption,
            created_at,
        })
    }

    async fn search(&self, owner: UserId, query: &str, limit: usize) -> Result<Vec<SavedItem>> {
        let conn = self.conn.lock().await;
        // instr() instead of LIKE: case-sensitive and no wildcard escaping.
        let mut stmt = conn.prepare_cached(
            "SELECT id, owner_id, content_ref, content_kind, caption, created_at
             FROM saved_items
             WHERE owner_id = ?1 AND (?2 = '' OR instr(caption, ?2) > 0)
             ORDER BY id DESC
             LIMIT ?3",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![owner.0, query, limit], row_to_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    async fn close(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        info!("content store flushed");
        Ok(())
    }
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<SavedItem> {
    let created_raw: String = row.get(5)?;
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(SavedItem {
        id: ItemId(row.get(0)?),
        owner_id: UserId(row.get(1)?),
        content_ref: row.get(2)?,
        content_kind: row.get(3)?,
        caption: row.get(4)?,
        created_at,
    })
}

impl ToSql for ContentKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ContentKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_item(owner: i64, caption: &str) -> NewItem {
        NewItem {
            owner_id: UserId(owner),
            content_ref: String::new(),
            content_kind: ContentKind::Text,
            caption: caption.to_string(),
        }
    }

    #[tokio::test]
    async fn ids_increase_per_insert() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store.insert(text_item(1, "a")).await.unwrap();
        let b = store.insert(text_item(2, "b")).await.unwrap();
        let c = store.insert(text_item(1, "c")).await.unwrap();
        assert!(a.id < b.id && b.id < c.id);
    }

    #[tokio::test]
    async fn search_is_scoped_to_owner_newest_first() {
        let store = SqliteStore::in_memory().unwrap();
        for i in 0..25 {
            store.insert(text_item(1, &format!("note {i}"))).await.unwrap();
        }
        store.insert(text_item(2, "someone else")).await.unwrap();

        let rows = store.search(UserId(1), "", 20).await.unwrap();
        assert_eq!(rows.len(), 20);
        assert!(rows.iter().all(|r| r.owner_id == UserId(1)));
        assert!(rows.windows(2).all(|w| w[0].id > w[1].id));
        assert_eq!(rows[0].caption, "note 24");
    }

    #[tokio::test]
    async fn caption_filter_is_case_sensitive_substring() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert(text_item(1, "Rust book")).await.unwrap();
        store.insert(text_item(1, "rusty nail")).await.unwrap();
        store.insert(text_item(1, "100% done")).await.unwrap();

        let rows = store.search(UserId(1), "Rust", 20).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].caption, "Rust book");

        // Wildcard characters are matched literally.
        let rows = store.search(UserId(1), "%", 20).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].caption, "100% done");

        assert!(store.search(UserId(1), "missing", 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn media_rows_read_back_with_kind_and_ref() {
        let store = SqliteStore::in_memory().unwrap();
        let saved = store
            .insert(NewItem {
                owner_id: UserId(9),
                content_ref: "AgACAgQ".to_string(),
                content_kind: ContentKind::Photo,
                caption: String::new(),
            })
            .await
            .unwrap();

        let rows = store.search(UserId(9), "", 5).await.unwrap();
        assert_eq!(rows, vec![saved]);
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("savebot-store-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("saves.db");

        let first = {
            let store = SqliteStore::open(&path).unwrap();
            let item = store.insert(text_item(3, "kept")).await.unwrap();
            store.close().await.unwrap();
            item
        };

        let store = SqliteStore::open(&path).unwrap();
        let second = store.insert(text_item(3, "next")).await.unwrap();
        assert!(second.id > first.id);
        let rows = store.search(UserId(3), "kept", 5).await.unwrap();
        assert_eq!(rows.len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
