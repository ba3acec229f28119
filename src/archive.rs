//! Backup and restore of single chats.
//!
//! An archive is a directory:
//!
//! ```text
//! <archive>/
//!   chat.json      versioned ArchiveRecord
//!   media/         files referenced by messages, by file name
//! ```
//!
//! Restoring an archive is the same as importing its record as a fresh
//! parse result and then linking the `media/` folder by file name.

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ChatvaultError, Result};
use crate::media::MediaIndex;
use crate::message::{MessageType, NewChat, ParseResult, ParsedMessage, Platform};
use crate::parsing::extract_attachment;
use crate::store::ChatStore;

pub const ARCHIVE_VERSION: u32 = 1;
pub const RECORD_FILE: &str = "chat.json";
pub const MEDIA_DIR: &str = "media";

/// Serialized form of one chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub version: u32,
    pub chat: ArchivedChat,
    pub messages: Vec<ArchivedMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedChat {
    pub name: String,
    pub platform: Platform,
    pub imported_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub sender: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub kind: MessageType,
    #[serde(default)]
    pub media_omitted: bool,
    /// File name inside `media/`
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub media_file: Option<String>,
    /// Index into `messages` of the message this one replies to
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub reply_to: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub raw_text: Option<String>,
}

/// What an export wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub messages: usize,
    pub media_files: usize,
}

/// Writes chat `chat_id` as an archive into `dir`, creating it if needed.
///
/// Media files are copied when the message's `media_uri` points at an
/// existing local file.
pub fn export_archive(store: &ChatStore, chat_id: i64, dir: impl AsRef<Path>) -> Result<ExportSummary> {
    let dir = dir.as_ref();
    let chat = store.chat(chat_id)?;
    let stored = store.all_messages(chat_id)?;

    let media_dir = dir.join(MEDIA_DIR);
    fs::create_dir_all(&media_dir)?;

    let positions: HashMap<i64, usize> = stored.iter().enumerate().map(|(i, m)| (m.id, i)).collect();
    let mut media_files = 0;
    let mut messages = Vec::with_capacity(stored.len());

    for message in stored {
        let local_file = message
            .media_uri
            .as_deref()
            .map(PathBuf::from)
            .filter(|p| p.is_file());

        let media_file = match &local_file {
            Some(source) => {
                let name = source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                fs::copy(source, media_dir.join(&name))?;
                media_files += 1;
                Some(name)
            }
            None => extract_attachment(&message.content),
        };

        messages.push(ArchivedMessage {
            sender: message.sender_name,
            timestamp: message.timestamp,
            content: message.content,
            kind: message.kind,
            media_omitted: message.media_omitted,
            media_file,
            reply_to: message.reply_to_id.and_then(|id| positions.get(&id).copied()),
            sentiment_score: message.sentiment_score,
            raw_text: message.raw_text,
        });
    }

    let record = ArchiveRecord {
        version: ARCHIVE_VERSION,
        chat: ArchivedChat {
            name: chat.name,
            platform: chat.platform,
            imported_at: chat.imported_at,
            metadata: chat.metadata,
        },
        messages,
    };

    let writer = BufWriter::new(File::create(dir.join(RECORD_FILE))?);
    serde_json::to_writer_pretty(writer, &record)?;

    let summary = ExportSummary {
        messages: record.messages.len(),
        media_files,
    };
    info!(chat_id, dir = %dir.display(), messages = summary.messages, media_files, "exported archive");
    Ok(summary)
}

/// Reads the record of an archive without importing it.
pub fn read_archive(dir: impl AsRef<Path>) -> Result<ArchiveRecord> {
    let dir = dir.as_ref();
    let record_path = dir.join(RECORD_FILE);
    if !record_path.is_file() {
        return Err(ChatvaultError::invalid_archive(dir, format!("missing {RECORD_FILE}")));
    }

    let record: ArchiveRecord = serde_json::from_reader(BufReader::new(File::open(&record_path)?))?;
    if record.version != ARCHIVE_VERSION {
        return Err(ChatvaultError::invalid_archive(
            dir,
            format!("unsupported version {} (expected {ARCHIVE_VERSION})", record.version),
        ));
    }
    Ok(record)
}

/// Converts an archive record into a parse result ready for ingesting.
pub fn record_to_parse_result(record: ArchiveRecord, source: Option<PathBuf>) -> ParseResult {
    let mut senders = BTreeSet::new();
    let messages: Vec<ParsedMessage> = record
        .messages
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            if let Some(name) = &m.sender {
                senders.insert(name.clone());
            }
            ParsedMessage {
                // Positions stand in for line numbers.
                line_number: i + 1,
                sender: m.sender,
                timestamp: m.timestamp,
                content: m.content,
                kind: m.kind,
                media_omitted: m.media_omitted,
                attachment: m.media_file,
                raw_text: m.raw_text,
                reply_to: m.reply_to.map(|r| r + 1),
                sentiment_score: m.sentiment_score,
            }
        })
        .collect();

    let mut chat = NewChat::new(record.chat.name, record.chat.platform);
    chat.file_path = source;

    ParseResult {
        chat,
        lines_read: messages.len(),
        messages,
        senders,
        warnings: Vec::new(),
    }
}

/// Restores an archive as a new chat and returns its id.
pub fn import_archive(store: &mut ChatStore, dir: impl AsRef<Path>) -> Result<i64> {
    let dir = dir.as_ref();
    let record = read_archive(dir)?;
    let result = record_to_parse_result(record, Some(dir.to_path_buf()));

    let media_dir = dir.join(MEDIA_DIR);
    let media = if media_dir.is_dir() {
        MediaIndex::from_dir(&media_dir)?
    } else {
        warn!(dir = %dir.display(), "archive has no media folder");
        MediaIndex::new()
    };

    let chat_id = store.ingest_with_media(&result, &media)?;
    let relinked = store.link_media(chat_id, &media)?;
    info!(chat_id, messages = result.messages.len(), media = media.len(), relinked, "restored archive");
    Ok(chat_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_record_is_invalid_archive() {
        let dir = tempdir().unwrap();
        let err = read_archive(dir.path()).unwrap_err();
        assert!(matches!(err, ChatvaultError::InvalidArchive { .. }));
        assert!(err.to_string().contains(RECORD_FILE));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(RECORD_FILE),
            r#"{"version": 9, "chat": {"name": "x", "platform": "ios", "imported_at": "2021-01-01T00:00:00Z"}, "messages": []}"#,
        )
        .unwrap();
        let err = read_archive(dir.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported version 9"));
    }

    #[test]
    fn test_record_to_parse_result_collects_senders() {
        let record = ArchiveRecord {
            version: ARCHIVE_VERSION,
            chat: ArchivedChat {
                name: "Trip".into(),
                platform: Platform::Android,
                imported_at: Utc::now(),
                metadata: serde_json::Value::Null,
            },
            messages: vec![
                ArchivedMessage {
                    sender: Some("Alice".into()),
                    timestamp: Utc::now(),
                    content: "Hi".into(),
                    kind: MessageType::Text,
                    media_omitted: false,
                    media_file: None,
                    reply_to: None,
                    sentiment_score: None,
                    raw_text: None,
                },
                ArchivedMessage {
                    sender: None,
                    timestamp: Utc::now(),
                    content: "Alice left".into(),
                    kind: MessageType::System,
                    media_omitted: false,
                    media_file: None,
                    reply_to: Some(0),
                    sentiment_score: None,
                    raw_text: None,
                },
            ],
        };

        let result = record_to_parse_result(record, None);
        assert_eq!(result.senders.len(), 1);
        assert_eq!(result.messages[1].reply_to, Some(1));
        assert_eq!(result.chat.platform, Platform::Android);
    }
}
