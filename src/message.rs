//! Data model shared by the parser and the store.
//!
//! A message lives in two type-distinguished stages:
//!
//! - [`ParsedMessage`]: produced by the parser. Carries the sender as a *name*
//!   and a line-number placeholder instead of a database id.
//! - [`StoredMessage`]: read back from the store. Carries resolved ids plus
//!   the sender name for display.
//!
//! A parse pass yields one [`ParseResult`] (an unpersisted [`NewChat`], the
//! ordered messages, the distinct sender names and any warnings), which the
//! store ingests exactly once.
//!
//! # Example
//!
//! ```
//! use chatvault::ChatParser;
//! use chatvault::message::{MessageType, Platform};
//!
//! let result = ChatParser::new().parse_str(
//!     "Trip",
//!     "20/06/2021, 14:30 - Alice: Hi\n20/06/2021, 14:31 - Bob: Hey there",
//! );
//!
//! assert_eq!(result.chat.platform, Platform::Android);
//! assert_eq!(result.messages.len(), 2);
//! assert_eq!(result.messages[0].kind, MessageType::Text);
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChatvaultError, Result};

/// Sender marker for lines written by the exporting client itself.
///
/// A sender with this exact name is treated as system-authored and is never
/// persisted as a sender row.
pub const SYSTEM_SENDER: &str = "System";

/// Export dialect a chat was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Bracketed timestamps with seconds: `[20/06/2021, 14:30:00] `
    Ios,
    /// Dash-separated timestamps without seconds: `20/06/2021, 14:30 - `
    Android,
    /// No dialect detected
    Unknown,
}

impl Platform {
    /// Returns the lowercase name used in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => write!(f, "iOS"),
            Platform::Android => write!(f, "Android"),
            Platform::Unknown => write!(f, "Unknown"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            "unknown" => Ok(Platform::Unknown),
            _ => Err(format!(
                "Unknown platform: '{s}'. Expected one of: ios, android, unknown"
            )),
        }
    }
}

/// Semantic category of a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Image,
    Video,
    Audio,
    Sticker,
    Document,
    Contact,
    Location,
    System,
    CallLog,
    Deleted,
}

impl MessageType {
    /// Returns the snake_case name used in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::Video => "video",
            MessageType::Audio => "audio",
            MessageType::Sticker => "sticker",
            MessageType::Document => "document",
            MessageType::Contact => "contact",
            MessageType::Location => "location",
            MessageType::System => "system",
            MessageType::CallLog => "call_log",
            MessageType::Deleted => "deleted",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let kind = match s {
            "text" => MessageType::Text,
            "image" => MessageType::Image,
            "video" => MessageType::Video,
            "audio" => MessageType::Audio,
            "sticker" => MessageType::Sticker,
            "document" => MessageType::Document,
            "contact" => MessageType::Contact,
            "location" => MessageType::Location,
            "system" => MessageType::System,
            "call_log" => MessageType::CallLog,
            "deleted" => MessageType::Deleted,
            _ => return Err(format!("Unknown message type: '{s}'")),
        };
        Ok(kind)
    }
}

/// A chat that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChat {
    /// Display name
    pub name: String,
    /// Detected export dialect
    pub platform: Platform,
    /// When the import ran
    pub imported_at: DateTime<Utc>,
    /// File the export was read from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

impl NewChat {
    /// Creates a chat record stamped with the current instant.
    pub fn new(name: impl Into<String>, platform: Platform) -> Self {
        Self {
            name: name.into(),
            platform,
            imported_at: Utc::now(),
            file_path: None,
        }
    }
}

/// A persisted chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub name: String,
    pub platform: Platform,
    pub imported_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub file_path: Option<String>,
    /// Import statistics recorded at ingest time
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A persisted sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub color: Option<String>,
}

/// A message as produced by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMessage {
    /// 1-based line number of the head line; placeholder until persisted
    pub line_number: usize,

    /// Sender name, or `None` for system-authored lines
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub sender: Option<String>,

    pub timestamp: DateTime<Utc>,

    /// Sanitized text; continuation lines are joined with `\n`
    pub content: String,

    pub kind: MessageType,

    /// The export replaced the media with a placeholder
    #[serde(default)]
    pub media_omitted: bool,

    /// Attached media filename found in the body
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub attachment: Option<String>,

    /// Unsanitized line text, kept for diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub raw_text: Option<String>,

    /// Line number of the message this one replies to, within the same result
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub reply_to: Option<usize>,

    /// Filled in by an external scoring stage, never by the parser
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub sentiment_score: Option<f64>,
}

impl ParsedMessage {
    /// Creates a plain text message. Mostly useful in tests and archives.
    pub fn new(
        line_number: usize,
        sender: Option<String>,
        timestamp: DateTime<Utc>,
        content: impl Into<String>,
    ) -> Self {
        let kind = if sender.is_some() {
            MessageType::Text
        } else {
            MessageType::System
        };
        Self {
            line_number,
            sender,
            timestamp,
            content: content.into(),
            kind,
            media_omitted: false,
            attachment: None,
            raw_text: None,
            reply_to: None,
            sentiment_score: None,
        }
    }

    /// Returns `true` if no human sender wrote this message.
    pub fn is_system(&self) -> bool {
        self.sender.is_none()
    }
}

/// A message read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub chat_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub sender_id: Option<i64>,
    /// Resolved sender name (`None` for system messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub sender_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub kind: MessageType,
    pub media_omitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub media_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub reply_to_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub raw_text: Option<String>,
}

impl StoredMessage {
    /// Sender name for display, falling back to [`SYSTEM_SENDER`].
    pub fn sender_label(&self) -> &str {
        self.sender_name.as_deref().unwrap_or(SYSTEM_SENDER)
    }
}

/// Why a line produced a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    /// No dialect matched within the detection budget; parsing stopped
    UnrecognizedFormat { line_budget: usize },
    /// Text appeared before any message header and was discarded
    OrphanedLine,
    /// The header's date/time could not be resolved; the import instant was used
    InvalidTimestamp { date: String, time: String },
}

/// A non-fatal problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// 1-based line number
    pub line: usize,
    #[serde(flatten)]
    pub kind: WarningKind,
}

impl ParseWarning {
    pub fn new(line: usize, kind: WarningKind) -> Self {
        Self { line, kind }
    }

    /// Returns `true` if this warning stopped the parse.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, WarningKind::UnrecognizedFormat { .. })
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::UnrecognizedFormat { line_budget } => {
                write!(f, "format not recognized by line {line_budget}")
            }
            WarningKind::OrphanedLine => write!(f, "line {}: orphaned line", self.line),
            WarningKind::InvalidTimestamp { date, time } => write!(
                f,
                "line {}: invalid timestamp '{date}, {time}', using import time",
                self.line
            ),
        }
    }
}

/// Output of one parse pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub chat: NewChat,
    /// Messages in line order
    pub messages: Vec<ParsedMessage>,
    /// Distinct non-system sender names
    pub senders: BTreeSet<String>,
    pub warnings: Vec<ParseWarning>,
    /// Physical lines consumed
    pub lines_read: usize,
}

impl ParseResult {
    /// Returns `true` if a dialect was detected.
    pub fn is_recognized(&self) -> bool {
        self.chat.platform != Platform::Unknown
    }

    /// Converts an unrecognized export into [`ChatvaultError::UnrecognizedFormat`].
    pub fn into_recognized(self) -> Result<Self> {
        if self.is_recognized() {
            return Ok(self);
        }
        let line_budget = self
            .warnings
            .iter()
            .find_map(|w| match w.kind {
                WarningKind::UnrecognizedFormat { line_budget } => Some(line_budget),
                _ => None,
            })
            .unwrap_or(self.lines_read);
        Err(ChatvaultError::unrecognized(
            line_budget,
            self.chat.file_path,
        ))
    }
}
