use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use tracing::warn;

use super::{
    CHAT_COLUMNS, ChatStore, MESSAGE_COLUMNS, MESSAGE_FROM, chat_from_row, escape_like,
    message_from_row, millis_to_datetime, sender_from_row,
};
use crate::error::{ChatvaultError, Result};
use crate::message::{Chat, Sender, StoredMessage};

/// A search result with the name of the chat it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub message: StoredMessage,
    pub chat_name: String,
}

/// A chat with message counts and the time span it covers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSummary {
    pub chat: Chat,
    pub message_count: u64,
    pub first_message: Option<DateTime<Utc>>,
    pub last_message: Option<DateTime<Utc>>,
}

/// Builds an FTS5 query: every whitespace-separated term as a prefix, all
/// required.
///
/// Terms are passed through verbatim, so characters with meaning in FTS5
/// syntax can make the query invalid; [`ChatStore::search`] handles that.
pub fn build_fts_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|term| format!("{term}*"))
        .collect();

    if terms.is_empty() {
        return None;
    }
    Some(terms.join(" AND "))
}

impl ChatStore {
    /// Returns a chat's messages ordered by `(timestamp, id)`.
    pub fn messages(&self, chat_id: i64, limit: usize, offset: usize) -> Result<Vec<StoredMessage>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM {MESSAGE_FROM}
             WHERE m.chat_id = ?1
             ORDER BY m.timestamp ASC, m.id ASC
             LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(
            params![chat_id, limit as i64, offset as i64],
            message_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Returns every message of a chat, in order.
    pub fn all_messages(&self, chat_id: i64) -> Result<Vec<StoredMessage>> {
        self.messages(chat_id, i64::MAX as usize, 0)
    }

    /// Returns the messages around `anchor_id`, for showing a search hit in context.
    ///
    /// Up to `window / 2` messages with `id <= anchor_id` (at least one, so
    /// the anchor itself is included) and up to `window / 2` with
    /// `id > anchor_id`, all from `chat_id`, sorted by id.
    pub fn neighborhood(
        &self,
        chat_id: i64,
        anchor_id: i64,
        window: usize,
    ) -> Result<Vec<StoredMessage>> {
        if window == 0 {
            return Ok(Vec::new());
        }
        let after = window / 2;
        let before = after.max(1);

        let before_sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM {MESSAGE_FROM}
             WHERE m.chat_id = ?1 AND m.id <= ?2
             ORDER BY m.id DESC LIMIT ?3"
        );
        let after_sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM {MESSAGE_FROM}
             WHERE m.chat_id = ?1 AND m.id > ?2
             ORDER BY m.id ASC LIMIT ?3"
        );

        let mut messages: Vec<StoredMessage> = self
            .conn
            .prepare_cached(&before_sql)?
            .query_map(params![chat_id, anchor_id, before as i64], message_from_row)?
            .collect::<rusqlite::Result<_>>()?;
        messages.reverse();

        let following: Vec<StoredMessage> = self
            .conn
            .prepare_cached(&after_sql)?
            .query_map(params![chat_id, anchor_id, after as i64], message_from_row)?
            .collect::<rusqlite::Result<_>>()?;
        messages.extend(following);

        messages.sort_by_key(|m| m.id);
        Ok(messages)
    }

    /// Full-text search across all chats.
    ///
    /// Each term matches as a prefix and all terms must match; results come
    /// in relevance order. If the query is not valid FTS syntax the search
    /// falls back to a case-insensitive substring scan, newest first.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let Some(fts_query) = build_fts_query(query) else {
            return Ok(Vec::new());
        };

        match self.search_fts(&fts_query, limit) {
            Ok(hits) => Ok(hits),
            Err(err) => {
                warn!(%err, query, "full-text query rejected, falling back to substring scan");
                self.search_substring(query.trim(), limit)
                    .map_err(|e| ChatvaultError::storage("searching messages", e))
            }
        }
    }

    fn search_fts(&self, fts_query: &str, limit: usize) -> rusqlite::Result<Vec<SearchHit>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS}, c.name
             FROM messages_fts f
             JOIN messages m ON m.id = f.rowid
             LEFT JOIN senders s ON s.id = m.sender_id
             JOIN chats c ON c.id = m.chat_id
             WHERE f.messages_fts MATCH ?1
             ORDER BY f.rank
             LIMIT ?2"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![fts_query, limit as i64], |row| {
            Ok(SearchHit {
                message: message_from_row(row)?,
                chat_name: row.get(12)?,
            })
        })?;
        rows.collect()
    }

    fn search_substring(&self, needle: &str, limit: usize) -> rusqlite::Result<Vec<SearchHit>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS}, c.name
             FROM {MESSAGE_FROM}
             JOIN chats c ON c.id = m.chat_id
             WHERE m.content LIKE ?1 ESCAPE '\\'
             ORDER BY m.timestamp DESC, m.id DESC
             LIMIT ?2"
        );
        let pattern = format!("%{}%", escape_like(needle));
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![pattern, limit as i64], |row| {
            Ok(SearchHit {
                message: message_from_row(row)?,
                chat_name: row.get(12)?,
            })
        })?;
        rows.collect()
    }

    /// Looks up one chat.
    pub fn chat(&self, chat_id: i64) -> Result<Chat> {
        let sql = format!("SELECT {CHAT_COLUMNS} FROM chats c WHERE c.id = ?1");
        self.conn
            .query_row(&sql, [chat_id], chat_from_row)
            .optional()?
            .ok_or_else(|| ChatvaultError::not_found("chat", chat_id))
    }

    /// Lists all chats, most recently imported first.
    pub fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        let sql = format!(
            "SELECT {CHAT_COLUMNS}, COUNT(m.id), MIN(m.timestamp), MAX(m.timestamp)
             FROM chats c
             LEFT JOIN messages m ON m.chat_id = c.id
             GROUP BY c.id
             ORDER BY c.import_date DESC, c.id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let first: Option<i64> = row.get(7)?;
            let last: Option<i64> = row.get(8)?;
            Ok(ChatSummary {
                chat: chat_from_row(row)?,
                message_count: row.get::<_, i64>(6)? as u64,
                first_message: first.map(|ms| millis_to_datetime(ms, 7)).transpose()?,
                last_message: last.map(|ms| millis_to_datetime(ms, 8)).transpose()?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Distinct senders who wrote in a chat, by name.
    pub fn chat_senders(&self, chat_id: i64) -> Result<Vec<Sender>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT DISTINCT s.id, s.name, s.display_name, s.color
             FROM senders s
             JOIN messages m ON m.sender_id = s.id
             WHERE m.chat_id = ?1
             ORDER BY s.name",
        )?;
        let rows = stmt.query_map([chat_id], sender_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Looks up one message.
    pub fn message(&self, message_id: i64) -> Result<StoredMessage> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM {MESSAGE_FROM} WHERE m.id = ?1");
        self.conn
            .query_row(&sql, [message_id], message_from_row)
            .optional()?
            .ok_or_else(|| ChatvaultError::not_found("message", message_id))
    }
}
