//! SQLite message store with full-text search.
//!
//! [`ChatStore`] owns one connection. Operations are grouped by concern:
//!
//! - `ingest`: atomic import of a [`ParseResult`](crate::message::ParseResult),
//!   chat deletion, media linking
//! - `queries`: pagination, neighborhood, search, lookups
//! - `analytics`: statistics and "memories" queries
//!
//! Separate `ChatStore`s on the same database file may import different chats
//! concurrently; writers wait for each other up to the configured busy
//! timeout.
//!
//! # Example
//!
//! ```rust
//! use chatvault::ChatParser;
//! use chatvault::store::ChatStore;
//!
//! # fn main() -> chatvault::Result<()> {
//! let mut store = ChatStore::open_in_memory()?;
//! let parsed = ChatParser::new().parse_str(
//!     "Trip",
//!     "20/06/2021, 14:30 - Alice: Hi\n20/06/2021, 14:31 - Bob: Hey there",
//! );
//!
//! let chat_id = store.ingest(&parsed)?;
//! let hits = store.search("hey", 10)?;
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].message.chat_id, chat_id);
//! # Ok(())
//! # }
//! ```

mod analytics;
mod ingest;
mod queries;
pub mod schema;

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{ChatvaultError, Result};
use crate::message::{Chat, Sender, StoredMessage};

pub use analytics::{ChatStats, SenderCount};
pub use queries::{ChatSummary, SearchHit};

/// Persistent chat/message store.
#[derive(Debug)]
pub struct ChatStore {
    conn: Connection,
}

impl ChatStore {
    /// Opens (creating if needed) a store at `path` with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, &StoreConfig::default())
    }

    /// Opens (creating if needed) a store at `path`.
    pub fn open_with_config(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| ChatvaultError::storage("opening database", e))?;
        debug!(path = %path.display(), "opened database");
        Self::setup(conn, config, true)
    }

    /// Opens a private in-memory store. Mostly useful for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ChatvaultError::storage("opening database", e))?;
        Self::setup(conn, &StoreConfig::default(), false)
    }

    fn setup(conn: Connection, config: &StoreConfig, on_disk: bool) -> Result<Self> {
        let configure = || -> rusqlite::Result<()> {
            conn.pragma_update(None, "foreign_keys", true)?;
            if on_disk && config.wal {
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
            }
            conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
            conn.execute_batch(schema::SCHEMA_SQL)?;
            conn.pragma_update(None, "user_version", schema::SCHEMA_VERSION)?;
            Ok(())
        };
        configure().map_err(|e| ChatvaultError::storage("initializing schema", e))?;

        Ok(Self { conn })
    }

    /// Borrows the underlying connection.
    ///
    /// Intended for diagnostics and tests; writing through it bypasses the
    /// store's invariants.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Columns read by [`message_from_row`], in order.
pub(crate) const MESSAGE_COLUMNS: &str = "m.id, m.chat_id, m.sender_id, s.name, m.timestamp, \
     m.content, m.type, m.is_media_omitted, m.media_uri, m.reply_to_id, m.sentiment_score, m.raw_text";

/// Joins `messages m` with its sender.
pub(crate) const MESSAGE_FROM: &str = "messages m LEFT JOIN senders s ON s.id = m.sender_id";

pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<StoredMessage> {
    let kind: String = row.get(6)?;
    Ok(StoredMessage {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        sender_id: row.get(2)?,
        sender_name: row.get(3)?,
        timestamp: millis_to_datetime(row.get(4)?, 4)?,
        content: row.get(5)?,
        kind: kind
            .parse()
            .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, e.into()))?,
        media_omitted: row.get(7)?,
        media_uri: row.get(8)?,
        reply_to_id: row.get(9)?,
        sentiment_score: row.get(10)?,
        raw_text: row.get(11)?,
    })
}

pub(crate) const CHAT_COLUMNS: &str =
    "c.id, c.name, c.source_platform, c.import_date, c.file_path, c.metadata";

pub(crate) fn chat_from_row(row: &Row<'_>) -> rusqlite::Result<Chat> {
    let platform: String = row.get(2)?;
    let metadata: String = row.get(5)?;
    Ok(Chat {
        id: row.get(0)?,
        name: row.get(1)?,
        platform: platform
            .parse()
            .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into()))?,
        imported_at: millis_to_datetime(row.get(3)?, 3)?,
        file_path: row.get(4)?,
        metadata: serde_json::from_str(&metadata)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
    })
}

pub(crate) fn sender_from_row(row: &Row<'_>) -> rusqlite::Result<Sender> {
    Ok(Sender {
        id: row.get(0)?,
        name: row.get(1)?,
        display_name: row.get(2)?,
        color: row.get(3)?,
    })
}

fn millis_to_datetime(millis: i64, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(column, millis))
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
