//! Flat exports of stored messages.
//!
//! - JSON Lines: one object per message, for pipelines and scripts.
//! - CSV (feature `csv-output`): `;`-delimited, for spreadsheets.
//!
//! Both writers take any [`Write`] so callers decide between files, stdout
//! and in-memory buffers.

use std::io::{BufWriter, Write};

use serde::Serialize;

use crate::error::Result;
use crate::message::{SYSTEM_SENDER, StoredMessage};

/// Timestamp format used in exports (UTC, RFC 3339 with seconds).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One exported row.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: i64,
    timestamp: String,
    sender: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_uri: Option<&'a str>,
}

impl<'a> ExportRow<'a> {
    fn new(msg: &'a StoredMessage) -> Self {
        Self {
            id: msg.id,
            timestamp: msg.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            sender: msg.sender_name.as_deref().unwrap_or(SYSTEM_SENDER),
            kind: msg.kind.as_str(),
            content: &msg.content,
            media_uri: msg.media_uri.as_deref(),
        }
    }
}

/// Writes messages as JSON Lines.
///
/// ```jsonl
/// {"id":1,"timestamp":"2021-06-20T12:30:00Z","sender":"Alice","type":"text","content":"Hi"}
/// ```
pub fn write_jsonl<W: Write>(messages: &[StoredMessage], writer: W) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    for msg in messages {
        serde_json::to_writer(&mut writer, &ExportRow::new(msg))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Converts messages to a JSON Lines string.
pub fn to_jsonl(messages: &[StoredMessage]) -> Result<String> {
    let mut buf = Vec::new();
    write_jsonl(messages, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Writes messages as `;`-delimited CSV with a header row.
///
/// Columns: `ID;Timestamp;Sender;Type;Content;MediaUri`.
#[cfg(feature = "csv-output")]
pub fn write_csv<W: Write>(messages: &[StoredMessage], writer: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(writer);

    writer.write_record(["ID", "Timestamp", "Sender", "Type", "Content", "MediaUri"])?;
    for msg in messages {
        let row = ExportRow::new(msg);
        writer.write_record([
            row.id.to_string().as_str(),
            &row.timestamp,
            row.sender,
            row.kind,
            row.content,
            row.media_uri.unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Converts messages to a CSV string.
#[cfg(feature = "csv-output")]
pub fn to_csv(messages: &[StoredMessage]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(messages, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
