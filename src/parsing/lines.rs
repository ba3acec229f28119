//! Line segmentation for chunked input.
//!
//! [`LineSplitter`] turns an arbitrary sequence of byte chunks into logical
//! lines. A chunk boundary may fall anywhere, including in the middle of a
//! `\r\n` pair or a multi-byte UTF-8 sequence; the produced lines are the same
//! as if the whole input had been split at once.

/// Byte order mark as it appears at the very start of a UTF-8 file.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Incremental splitter that carries partial lines across chunk boundaries.
///
/// # Example
///
/// ```
/// use chatvault::parsing::LineSplitter;
///
/// let mut splitter = LineSplitter::new();
/// assert_eq!(splitter.push(b"first\r\nsec"), vec!["first"]);
/// assert_eq!(splitter.push(b"ond\n"), vec!["second"]);
/// assert_eq!(splitter.finish(), None);
/// ```
#[derive(Debug, Default)]
pub struct LineSplitter {
    carry: Vec<u8>,
    started: bool,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every line it completes.
    ///
    /// Lines are returned without their terminator (`\n` or `\r\n`). Invalid
    /// UTF-8 is replaced rather than rejected.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut scan_from = self.carry.len();
        self.carry.extend_from_slice(chunk);

        if !self.started {
            if self.carry.len() < UTF8_BOM.len() && UTF8_BOM.starts_with(&self.carry) {
                // Can't tell yet whether this is a BOM.
                return lines;
            }
            if self.carry.starts_with(UTF8_BOM) {
                self.carry.drain(..UTF8_BOM.len());
            }
            self.started = true;
            scan_from = 0;
        }

        let mut line_start = 0;
        while let Some(offset) = self.carry[scan_from..].iter().position(|&b| b == b'\n') {
            let end = scan_from + offset;
            lines.push(decode_line(&self.carry[line_start..end]));
            line_start = end + 1;
            scan_from = line_start;
        }

        self.carry.drain(..line_start);
        lines
    }

    /// Flushes the trailing line if the input did not end with a newline.
    pub fn finish(&mut self) -> Option<String> {
        self.started = true;
        if self.carry.is_empty() {
            return None;
        }
        // No terminator follows, so a trailing `\r` is content.
        let line = String::from_utf8_lossy(&self.carry).into_owned();
        self.carry.clear();
        Some(line)
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Splits a complete in-memory export into lines.
///
/// Produces the same lines as feeding the UTF-8 bytes through a
/// [`LineSplitter`].
pub fn split_lines(content: &str) -> impl Iterator<Item = &str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content.lines()
}
