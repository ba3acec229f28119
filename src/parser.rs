//! Parse orchestration: turning an export into a [`ParseResult`].
//!
//! [`ChatParser`] is the entry point. It feeds lines into a [`ParseSession`],
//! a small state machine:
//!
//! ```text
//! AwaitingPlatform ──head line──▶ Collecting
//!        │
//!        └── detection budget exhausted ──▶ Halted
//! ```
//!
//! While collecting, each line is either a head (finishes the in-flight
//! message and starts a new one) or a continuation (appended to the in-flight
//! message). The in-flight message is owned by the state and moved through
//! every step.
//!
//! Nothing in here fails on a bad line: problems become
//! [`ParseWarning`]s and parsing continues. The one hard stop is an input in
//! which no dialect is found; see [`ParseResult::into_recognized`].
//!
//! # Example
//!
//! ```rust
//! use chatvault::ChatParser;
//! use chatvault::message::Platform;
//!
//! let export = "01/01/2021, 10:00 - Bob: Line one\nLine two";
//! let result = ChatParser::new().parse_str("Bob", export);
//!
//! assert_eq!(result.chat.platform, Platform::Android);
//! assert_eq!(result.messages[0].content, "Line one\nLine two");
//! ```

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::ParserConfig;
use crate::error::Result;
use crate::message::{
    NewChat, ParseResult, ParseWarning, ParsedMessage, Platform, SYSTEM_SENDER, WarningKind,
};
use crate::parsing::{
    Dialect, HeadLine, LineKind, LineSplitter, classify, decode_line, detect_dialect,
    extract_attachment, is_media_omitted, resolve_timestamp, sanitize, split_lines,
};
use crate::progress::{Progress, ProgressCallback};

/// Filename prefixes the exporter puts in front of the chat name.
const EXPORT_NAME_PREFIXES: &[&str] = &["WhatsApp Chat with ", "WhatsApp Chat - "];

/// Parser for WhatsApp text exports.
///
/// Cheap to create; holds only configuration. Each parse runs in its own
/// [`ParseSession`].
#[derive(Debug, Clone, Default)]
pub struct ChatParser {
    config: ParserConfig,
}

impl ChatParser {
    /// Creates a parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Returns the parser's configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Starts a session for feeding lines by hand.
    pub fn session(&self, chat_name: impl Into<String>) -> ParseSession {
        ParseSession::new(chat_name.into(), self.config.clone())
    }

    /// Parses a complete export held in memory.
    pub fn parse_str(&self, chat_name: impl Into<String>, content: &str) -> ParseResult {
        let mut session = self.session(chat_name);
        for line in split_lines(content) {
            if session.is_halted() {
                break;
            }
            session.feed_line(line);
        }
        session.finish()
    }

    /// Parses an export from a byte source, chunk by chunk.
    ///
    /// After every chunk the optional `progress` callback is invoked and the
    /// thread yields, so a long import does not monopolize its thread.
    /// `total_bytes` is only used for progress percentages.
    pub fn parse_reader<R: Read>(
        &self,
        chat_name: impl Into<String>,
        mut reader: R,
        total_bytes: Option<u64>,
        progress: Option<&ProgressCallback>,
    ) -> Result<ParseResult> {
        let mut session = self.session(chat_name);
        let mut splitter = LineSplitter::new();
        let mut buf = vec![0u8; self.config.chunk_size.max(1)];
        let mut bytes_processed = 0u64;

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            bytes_processed += n as u64;

            for line in splitter.push(&buf[..n]) {
                session.feed_line(&line);
            }

            debug!(
                bytes_processed,
                messages = session.message_count(),
                "parsed chunk"
            );
            if let Some(callback) = progress {
                callback(Progress::new(
                    bytes_processed,
                    total_bytes,
                    session.message_count(),
                ));
            }

            if session.is_halted() {
                break;
            }
            std::thread::yield_now();
        }

        if let Some(line) = splitter.finish() {
            session.feed_line(&line);
        }
        Ok(session.finish())
    }

    /// Parses an export file.
    ///
    /// The chat is named after the file, without the exporter's
    /// `WhatsApp Chat with ` prefix.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ParseResult> {
        self.parse_file_inner(path.as_ref(), None)
    }

    /// Like [`parse_file`](Self::parse_file), reporting progress per chunk.
    pub fn parse_file_with_progress(
        &self,
        path: impl AsRef<Path>,
        progress: &ProgressCallback,
    ) -> Result<ParseResult> {
        self.parse_file_inner(path.as_ref(), Some(progress))
    }

    fn parse_file_inner(
        &self,
        path: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<ParseResult> {
        let file = File::open(path)?;
        let total_bytes = file.metadata().ok().map(|m| m.len());

        let mut result = self.parse_reader(chat_name_from_path(path), file, total_bytes, progress)?;
        result.chat.file_path = Some(path.to_path_buf());

        if !result.is_recognized() {
            warn!(path = %path.display(), "no chat export dialect recognized");
        }
        Ok(result)
    }
}

/// Derives a chat name from an export filename.
///
/// ```rust
/// use chatvault::parser::chat_name_from_path;
/// use std::path::Path;
///
/// assert_eq!(chat_name_from_path(Path::new("/tmp/WhatsApp Chat with Mum.txt")), "Mum");
/// assert_eq!(chat_name_from_path(Path::new("family.txt")), "family");
/// ```
pub fn chat_name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = EXPORT_NAME_PREFIXES
        .iter()
        .find_map(|prefix| stem.strip_prefix(prefix))
        .unwrap_or(&stem)
        .trim();

    if name.is_empty() {
        "Imported chat".to_string()
    } else {
        name.to_string()
    }
}

/// The message currently being accumulated.
#[derive(Debug)]
struct PendingMessage {
    line_number: usize,
    sender: Option<String>,
    timestamp: DateTime<Utc>,
    content: String,
    raw_text: String,
}

impl PendingMessage {
    fn push_continuation(&mut self, line: &str) {
        self.content.push('\n');
        self.content.push_str(&sanitize(line));
        self.raw_text.push('\n');
        self.raw_text.push_str(line);
    }

    fn into_message(self, keep_raw_text: bool) -> ParsedMessage {
        // Blank lines inside a message are kept; trailing ones belong to
        // the gap before the next head.
        let content = self.content.trim_end_matches('\n').to_string();
        let raw_text = self.raw_text.trim_end().to_string();

        let kind = classify(&content, self.sender.is_none());
        let attachment = if self.sender.is_some() {
            extract_attachment(&content)
        } else {
            None
        };

        ParsedMessage {
            line_number: self.line_number,
            sender: self.sender,
            timestamp: self.timestamp,
            media_omitted: is_media_omitted(&content),
            content,
            kind,
            attachment,
            raw_text: keep_raw_text.then_some(raw_text),
            reply_to: None,
            sentiment_score: None,
        }
    }
}

#[derive(Debug)]
enum SessionState {
    /// No head line seen yet.
    AwaitingPlatform {
        /// Non-blank lines inspected so far
        candidates: usize,
        /// Orphan warnings held back until we know the input is an export
        pending_orphans: Vec<ParseWarning>,
    },
    Collecting {
        dialect: Dialect,
        active: Option<PendingMessage>,
    },
    /// Detection failed; remaining input is ignored.
    Halted,
}

/// One pass over one export.
///
/// Feed lines in order with [`feed_line`](Self::feed_line), then call
/// [`finish`](Self::finish). A session is single-use and not meant to be
/// shared between threads.
///
/// ```rust
/// use chatvault::ChatParser;
///
/// let mut session = ChatParser::new().session("notes");
/// session.feed_line("[20/06/2021, 14:30:00] Alice: Hello");
/// session.feed_line("second line");
/// let result = session.finish();
///
/// assert_eq!(result.messages.len(), 1);
/// assert_eq!(result.messages[0].content, "Hello\nsecond line");
/// ```
#[derive(Debug)]
pub struct ParseSession {
    config: ParserConfig,
    chat: NewChat,
    state: SessionState,
    messages: Vec<ParsedMessage>,
    senders: BTreeSet<String>,
    warnings: Vec<ParseWarning>,
    line_number: usize,
}

impl ParseSession {
    fn new(chat_name: String, config: ParserConfig) -> Self {
        Self {
            config,
            chat: NewChat::new(chat_name, Platform::Unknown),
            state: SessionState::AwaitingPlatform {
                candidates: 0,
                pending_orphans: Vec::new(),
            },
            messages: Vec::new(),
            senders: BTreeSet::new(),
            warnings: Vec::new(),
            line_number: 0,
        }
    }

    /// Processes one physical line (without its terminator).
    ///
    /// Lines fed after detection failed are ignored.
    pub fn feed_line(&mut self, line: &str) {
        if self.is_halted() {
            return;
        }
        self.line_number += 1;

        let state = std::mem::replace(&mut self.state, SessionState::Halted);
        self.state = match state {
            SessionState::AwaitingPlatform {
                candidates,
                pending_orphans,
            } => self.await_platform(line, candidates, pending_orphans),
            SessionState::Collecting { dialect, active } => SessionState::Collecting {
                dialect,
                active: self.collect(dialect, line, active),
            },
            SessionState::Halted => SessionState::Halted,
        };
    }

    fn await_platform(
        &mut self,
        line: &str,
        candidates: usize,
        mut pending_orphans: Vec<ParseWarning>,
    ) -> SessionState {
        if line.trim().is_empty() {
            return SessionState::AwaitingPlatform {
                candidates,
                pending_orphans,
            };
        }

        if let Some(dialect) = detect_dialect(line) {
            self.chat.platform = dialect.platform();
            self.warnings.append(&mut pending_orphans);
            debug!(platform = %self.chat.platform, line = self.line_number, "detected export dialect");
            return SessionState::Collecting {
                dialect,
                active: self.collect(dialect, line, None),
            };
        }

        let candidates = candidates + 1;
        let line_budget = self.config.detection_line_limit;
        if candidates >= line_budget {
            warn!(line_budget, "format not recognized");
            self.warnings.push(ParseWarning::new(
                self.line_number,
                WarningKind::UnrecognizedFormat { line_budget },
            ));
            return SessionState::Halted;
        }

        pending_orphans.push(ParseWarning::new(self.line_number, WarningKind::OrphanedLine));
        SessionState::AwaitingPlatform {
            candidates,
            pending_orphans,
        }
    }

    fn collect(
        &mut self,
        dialect: Dialect,
        line: &str,
        active: Option<PendingMessage>,
    ) -> Option<PendingMessage> {
        match decode_line(dialect, line) {
            LineKind::Head(head) => {
                if let Some(done) = active {
                    self.complete(done);
                }
                Some(self.start(&head, line))
            }
            LineKind::Continuation => match active {
                Some(mut pending) => {
                    pending.push_continuation(line);
                    Some(pending)
                }
                None => {
                    if !line.trim().is_empty() {
                        self.warnings
                            .push(ParseWarning::new(self.line_number, WarningKind::OrphanedLine));
                    }
                    None
                }
            },
        }
    }

    fn start(&mut self, head: &HeadLine<'_>, raw_line: &str) -> PendingMessage {
        let timestamp = resolve_timestamp(head.date, head.time, self.config.date_order)
            .unwrap_or_else(|| {
                self.warnings.push(ParseWarning::new(
                    self.line_number,
                    WarningKind::InvalidTimestamp {
                        date: head.date.to_string(),
                        time: head.time.to_string(),
                    },
                ));
                Utc::now()
            });

        let sender = head
            .sender
            .map(sanitize)
            .filter(|name| !name.is_empty() && name != SYSTEM_SENDER);
        if let Some(name) = &sender {
            self.senders.insert(name.clone());
        }

        PendingMessage {
            line_number: self.line_number,
            sender,
            timestamp,
            content: sanitize(head.body),
            raw_text: raw_line.to_string(),
        }
    }

    fn complete(&mut self, pending: PendingMessage) {
        self.messages
            .push(pending.into_message(self.config.keep_raw_text));
    }

    /// Returns `true` once detection has failed.
    pub fn is_halted(&self) -> bool {
        matches!(self.state, SessionState::Halted)
    }

    /// Dialect detected so far (`Unknown` until the first head line).
    pub fn platform(&self) -> Platform {
        self.chat.platform
    }

    /// Messages started so far, including the one still being accumulated.
    pub fn message_count(&self) -> usize {
        let active = matches!(
            self.state,
            SessionState::Collecting {
                active: Some(_),
                ..
            }
        );
        self.messages.len() + usize::from(active)
    }

    /// Lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line_number
    }

    /// Ends the session, completing the in-flight message.
    pub fn finish(mut self) -> ParseResult {
        let state = std::mem::replace(&mut self.state, SessionState::Halted);
        match state {
            SessionState::AwaitingPlatform {
                mut pending_orphans,
                ..
            } => self.warnings.append(&mut pending_orphans),
            SessionState::Collecting {
                active: Some(pending),
                ..
            } => self.complete(pending),
            SessionState::Collecting { active: None, .. } | SessionState::Halted => {}
        }

        debug!(
            platform = %self.chat.platform,
            messages = self.messages.len(),
            warnings = self.warnings.len(),
            "parse finished"
        );

        ParseResult {
            chat: self.chat,
            messages: self.messages,
            senders: self.senders,
            warnings: self.warnings,
            lines_read: self.line_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DateOrder;
    use crate::message::MessageType;
    use std::io::Cursor;

    fn parse(content: &str) -> ParseResult {
        ChatParser::new().parse_str("test", content)
    }

    #[test]
    fn test_two_line_android_export() {
        let result = parse("20/06/2021, 14:30 - Alice: Hi\n20/06/2021, 14:31 - Bob: Hey there");
        assert_eq!(result.chat.platform, Platform::Android);
        assert_eq!(result.messages.len(), 2);
        assert_eq!(
            result.senders.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["Alice", "Bob"]
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_continuation_lines_accumulate() {
        let result = parse("01/01/2021, 10:00 - Bob: Line one\nLine two");
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].content, "Line one\nLine two");
        assert_eq!(
            result.messages[0].raw_text.as_deref(),
            Some("01/01/2021, 10:00 - Bob: Line one\nLine two")
        );
    }

    #[test]
    fn test_inner_blank_lines_preserved_trailing_dropped() {
        let result = parse(
            "01/01/2021, 10:00 - Bob: para one\n\npara two\n\n01/01/2021, 10:01 - Ann: ok",
        );
        assert_eq!(result.messages[0].content, "para one\n\npara two");
        assert_eq!(result.messages[1].content, "ok");
    }

    #[test]
    fn test_single_orphan_before_head() {
        let result = parse("stray text\n[20/06/2021, 14:30:00] Alice: Hello");
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::OrphanedLine);
        assert_eq!(result.warnings[0].line, 1);
    }

    #[test]
    fn test_orphan_only_input() {
        let result = parse("just one line");
        assert!(result.messages.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.chat.platform, Platform::Unknown);
    }

    #[test]
    fn test_leading_blank_lines_skipped_silently() {
        let result = parse("\n\n   \n20/06/2021, 14:30 - Alice: Hi");
        assert!(result.warnings.is_empty());
        assert_eq!(result.messages[0].line_number, 4);
    }

    #[test]
    fn test_detection_budget_halts_with_single_warning() {
        let mut content = String::new();
        for i in 0..80 {
            content.push_str(&format!("not a chat line {i}\n"));
        }
        content.push_str("20/06/2021, 14:30 - Alice: too late\n");

        let result = parse(&content);
        assert_eq!(result.chat.platform, Platform::Unknown);
        assert!(result.messages.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].to_string(), "format not recognized by line 50");
        assert_eq!(result.lines_read, 50);
        assert!(result.into_recognized().unwrap_err().is_unrecognized());
    }

    #[test]
    fn test_custom_detection_budget() {
        let parser = ChatParser::with_config(ParserConfig::new().with_detection_line_limit(2));
        let result = parser.parse_str("x", "a\nb\n20/06/2021, 14:30 - Alice: Hi");
        assert!(result.messages.is_empty());
        assert!(result.warnings[0].is_fatal());
    }

    #[test]
    fn test_system_lines_have_no_sender() {
        let result = parse(
            "20/06/2021, 14:29 - Messages and calls are end-to-end encrypted.\n\
             20/06/2021, 14:30 - System: You were added\n\
             20/06/2021, 14:31 - Alice: Hi",
        );
        assert_eq!(result.messages[0].sender, None);
        assert_eq!(result.messages[0].kind, MessageType::System);
        assert_eq!(result.messages[1].sender, None);
        assert_eq!(result.senders.len(), 1);
    }

    #[test]
    fn test_sender_names_sanitized_and_deduplicated() {
        let result = parse(
            "[20/06/2021, 14:30:00] \u{202A}+1 555 0100\u{202C}: one\n\
             [20/06/2021, 14:31:00] +1 555 0100: two",
        );
        assert_eq!(result.senders.len(), 1);
        assert_eq!(result.messages[0].sender.as_deref(), Some("+1 555 0100"));
    }

    #[test]
    fn test_invalid_timestamp_warns_and_continues() {
        let result = parse("31/02/2021, 10:00 - Alice: impossible date\n01/03/2021, 10:00 - Alice: ok");
        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.warnings.len(), 1);
        assert!(matches!(
            result.warnings[0].kind,
            WarningKind::InvalidTimestamp { .. }
        ));
    }

    #[test]
    fn test_attachment_and_media_flags() {
        let result = parse(
            "20/06/2021, 14:30 - Alice: IMG-20210620-WA0001.jpg (file attached)\n\
             20/06/2021, 14:31 - Bob: <Media omitted>",
        );
        assert_eq!(result.messages[0].kind, MessageType::Image);
        assert_eq!(
            result.messages[0].attachment.as_deref(),
            Some("IMG-20210620-WA0001.jpg")
        );
        assert!(result.messages[1].media_omitted);
        assert_eq!(result.messages[1].kind, MessageType::Image);
    }

    #[test]
    fn test_raw_text_can_be_dropped() {
        let parser = ChatParser::with_config(ParserConfig::new().with_raw_text(false));
        let result = parser.parse_str("x", "20/06/2021, 14:30 - Alice: Hi");
        assert_eq!(result.messages[0].raw_text, None);
    }

    #[test]
    fn test_month_first_order() {
        let parser =
            ChatParser::with_config(ParserConfig::new().with_date_order(DateOrder::MonthFirst));
        let result = parser.parse_str("x", "03/04/2021, 10:00 - Alice: Hi");
        let local = result.messages[0].timestamp.with_timezone(&chrono::Local);
        assert_eq!(local.format("%m-%d").to_string(), "03-04");
    }

    #[test]
    fn test_reader_matches_in_memory_for_tiny_chunks() {
        let content = "\u{feff}[20/06/2021, 14:30:00] Alice: caf\u{e9}\r\n\
                       more\r\n[20/06/2021, 14:31:00] Bob: \u{1F600}";
        let expected = parse(content);

        for chunk_size in [1, 2, 3, 7, 64] {
            let parser = ChatParser::with_config(ParserConfig::new().with_chunk_size(chunk_size));
            let result = parser
                .parse_reader("test", Cursor::new(content.as_bytes()), None, None)
                .unwrap();
            assert_eq!(result.messages.len(), expected.messages.len());
            for (a, b) in result.messages.iter().zip(&expected.messages) {
                assert_eq!(a.content, b.content);
                assert_eq!(a.sender, b.sender);
                assert_eq!(a.timestamp, b.timestamp);
            }
        }
    }

    #[test]
    fn test_reader_with_zero_chunk_size() {
        let config = ParserConfig {
            chunk_size: 0,
            ..ParserConfig::default()
        };
        let result = ChatParser::with_config(config)
            .parse_reader("x", "20/06/2021, 14:30 - Alice: Hi\n".as_bytes(), None, None)
            .unwrap();
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].content, "Hi");
    }

    #[test]
    fn test_reader_reports_progress() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let callback: ProgressCallback = Arc::new(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        let content = "20/06/2021, 14:30 - Alice: Hi\n20/06/2021, 14:31 - Bob: Hey";
        let parser = ChatParser::with_config(ParserConfig::new().with_chunk_size(16));
        parser
            .parse_reader("x", content.as_bytes(), Some(content.len() as u64), Some(&callback))
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), content.len().div_ceil(16));
    }

    #[test]
    fn test_chat_name_from_path() {
        assert_eq!(
            chat_name_from_path(Path::new("WhatsApp Chat - Book Club.txt")),
            "Book Club"
        );
        assert_eq!(chat_name_from_path(Path::new("")), "Imported chat");
    }
}
