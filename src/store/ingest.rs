use std::collections::HashMap;

use rusqlite::{OptionalExtension, Transaction, TransactionBehavior, params};
use serde_json::json;
use tracing::{debug, info};

use super::ChatStore;
use super::schema::sender_color;
use crate::error::{ChatvaultError, Result};
use crate::media::MediaIndex;
use crate::message::{ParseResult, SYSTEM_SENDER};
use crate::parsing::extract_attachment;

const INSERT_MESSAGE: &str = "
    INSERT INTO messages (
      chat_id, sender_id, timestamp, content, type, is_media_omitted,
      media_uri, reply_to_id, sentiment_score, raw_text
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

/// Resolves sender names to ids within one transaction, caching lookups.
struct SenderResolver<'t, 'c> {
    tx: &'t Transaction<'c>,
    ids: HashMap<String, i64>,
}

impl<'t, 'c> SenderResolver<'t, 'c> {
    fn new(tx: &'t Transaction<'c>) -> Self {
        Self {
            tx,
            ids: HashMap::new(),
        }
    }

    fn resolve(&mut self, name: &str) -> rusqlite::Result<i64> {
        if let Some(&id) = self.ids.get(name) {
            return Ok(id);
        }

        self.tx
            .prepare_cached("INSERT OR IGNORE INTO senders (name, color) VALUES (?1, ?2)")?
            .execute(params![name, sender_color(name)])?;
        let id: i64 = self
            .tx
            .prepare_cached("SELECT id FROM senders WHERE name = ?1")?
            .query_row([name], |row| row.get(0))?;

        self.ids.insert(name.to_string(), id);
        Ok(id)
    }
}

impl ChatStore {
    /// Persists a parse result as a new chat and returns its id.
    ///
    /// Runs in a single transaction: on any error nothing of the chat is
    /// left behind.
    pub fn ingest(&mut self, result: &ParseResult) -> Result<i64> {
        self.ingest_with_media(result, &MediaIndex::default())
    }

    /// Like [`ingest`](Self::ingest), linking attachments found in `media`.
    pub fn ingest_with_media(&mut self, result: &ParseResult, media: &MediaIndex) -> Result<i64> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ChatvaultError::storage("starting ingest transaction", e))?;

        let chat_id = insert_chat(&tx, result, media)
            .map_err(|e| ChatvaultError::storage("ingesting chat", e))?;

        tx.commit()
            .map_err(|e| ChatvaultError::storage("committing ingest", e))?;

        info!(
            chat_id,
            name = %result.chat.name,
            messages = result.messages.len(),
            senders = result.senders.len(),
            warnings = result.warnings.len(),
            "ingested chat"
        );
        Ok(chat_id)
    }

    /// Deletes a chat with all of its messages. Returns `false` if it did not exist.
    pub fn delete_chat(&mut self, chat_id: i64) -> Result<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ChatvaultError::storage("starting delete transaction", e))?;

        let (messages, chats) = (|| -> rusqlite::Result<(usize, usize)> {
            let messages = tx.execute("DELETE FROM messages WHERE chat_id = ?1", [chat_id])?;
            let chats = tx.execute("DELETE FROM chats WHERE id = ?1", [chat_id])?;
            Ok((messages, chats))
        })()
        .map_err(|e| ChatvaultError::storage("deleting chat", e))?;

        tx.commit()
            .map_err(|e| ChatvaultError::storage("committing delete", e))?;

        if chats > 0 {
            info!(chat_id, messages, "deleted chat");
        }
        Ok(chats > 0)
    }

    /// Fills in `media_uri` for messages of `chat_id` whose attachment is in `media`.
    ///
    /// Messages that already have a URI are left alone. Returns the number
    /// of messages linked.
    pub fn link_media(&mut self, chat_id: i64, media: &MediaIndex) -> Result<usize> {
        if media.is_empty() {
            return Ok(0);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ChatvaultError::storage("starting media link transaction", e))?;

        let linked = (|| -> rusqlite::Result<usize> {
            let candidates: Vec<(i64, String)> = tx
                .prepare(
                    "SELECT id, content FROM messages
                     WHERE chat_id = ?1 AND media_uri IS NULL AND sender_id IS NOT NULL",
                )?
                .query_map([chat_id], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<_>>()?;

            let mut update = tx.prepare("UPDATE messages SET media_uri = ?1 WHERE id = ?2")?;
            let mut linked = 0;
            for (id, content) in candidates {
                let uri = extract_attachment(&content)
                    .as_deref()
                    .and_then(|name| media.resolve(name));
                if let Some(uri) = uri {
                    update.execute(params![uri, id])?;
                    linked += 1;
                }
            }
            Ok(linked)
        })()
        .map_err(|e| ChatvaultError::storage("linking media", e))?;

        tx.commit()
            .map_err(|e| ChatvaultError::storage("committing media links", e))?;

        debug!(chat_id, linked, "linked media");
        Ok(linked)
    }

    /// Stores (or clears) a message's sentiment score.
    pub fn set_sentiment(&mut self, message_id: i64, score: Option<f64>) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE messages SET sentiment_score = ?1 WHERE id = ?2",
                params![score, message_id],
            )
            .map_err(|e| ChatvaultError::storage("updating sentiment", e))?;
        if updated == 0 {
            return Err(ChatvaultError::not_found("message", message_id));
        }
        Ok(())
    }

    /// Sets (or clears) the display name shown instead of a sender's export name.
    pub fn set_display_name(&mut self, sender_id: i64, display_name: Option<&str>) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE senders SET display_name = ?1 WHERE id = ?2",
                params![display_name, sender_id],
            )
            .map_err(|e| ChatvaultError::storage("updating sender", e))?;
        if updated == 0 {
            return Err(ChatvaultError::not_found("sender", sender_id));
        }
        Ok(())
    }

    /// Looks up a sender id by exact name.
    pub fn sender_id(&self, name: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row("SELECT id FROM senders WHERE name = ?1", [name], |row| {
                row.get(0)
            })
            .optional()?)
    }
}

/// Returns `name` unless it is blank or the system placeholder, which never
/// get a `senders` row.
fn human_sender(name: &str) -> Option<&str> {
    (!name.trim().is_empty() && name != SYSTEM_SENDER).then_some(name)
}

fn insert_chat(tx: &Transaction<'_>, result: &ParseResult, media: &MediaIndex) -> rusqlite::Result<i64> {
    let mut senders = SenderResolver::new(tx);
    for name in result.senders.iter().filter_map(|name| human_sender(name)) {
        senders.resolve(name)?;
    }

    let metadata = json!({
        "message_count": result.messages.len(),
        "sender_count": result.senders.len(),
        "warning_count": result.warnings.len(),
        "lines_read": result.lines_read,
    });
    tx.execute(
        "INSERT INTO chats (name, source_platform, import_date, file_path, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            result.chat.name,
            result.chat.platform.as_str(),
            result.chat.imported_at.timestamp_millis(),
            result
                .chat
                .file_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            metadata.to_string(),
        ],
    )?;
    let chat_id = tx.last_insert_rowid();

    // Line number → stored id, for resolving replies.
    let mut stored_ids: HashMap<usize, i64> = HashMap::with_capacity(result.messages.len());
    let mut insert = tx.prepare_cached(INSERT_MESSAGE)?;
    for message in &result.messages {
        let sender_id = match message.sender.as_deref().and_then(human_sender) {
            Some(name) => Some(senders.resolve(name)?),
            None => None,
        };
        let media_uri = message
            .attachment
            .as_deref()
            .and_then(|name| media.resolve(name));
        let reply_to_id = message
            .reply_to
            .and_then(|line| stored_ids.get(&line).copied());

        insert.execute(params![
            chat_id,
            sender_id,
            message.timestamp.timestamp_millis(),
            message.content,
            message.kind.as_str(),
            message.media_omitted,
            media_uri,
            reply_to_id,
            message.sentiment_score,
            message.raw_text,
        ])?;
        stored_ids.insert(message.line_number, tx.last_insert_rowid());
    }

    Ok(chat_id)
}
