//! Configuration types for the parser and the message store.
//!
//! These are plain serde structs with builder methods, usable from library
//! code without any CLI framework.
//!
//! # Example
//!
//! ```rust
//! use chatvault::config::{DateOrder, ParserConfig};
//! use chatvault::ChatParser;
//!
//! let config = ParserConfig::new()
//!     .with_date_order(DateOrder::MonthFirst)
//!     .with_chunk_size(128 * 1024);
//!
//! let parser = ChatParser::with_config(config);
//! ```

use serde::{Deserialize, Serialize};

/// How to read a date whose first two fields are both 12 or lower.
///
/// Dates with a field above 12 are never ambiguous and ignore this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateOrder {
    /// `03/04/2021` is 3 April (default).
    #[default]
    DayFirst,
    /// `03/04/2021` is 4 March.
    MonthFirst,
}

impl std::str::FromStr for DateOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day-first" | "dmy" => Ok(DateOrder::DayFirst),
            "month-first" | "mdy" => Ok(DateOrder::MonthFirst),
            _ => Err(format!(
                "Unknown date order: '{s}'. Expected one of: day-first, month-first"
            )),
        }
    }
}

/// Configuration for parsing chat exports.
///
/// # Example
///
/// ```rust
/// use chatvault::config::ParserConfig;
///
/// let config = ParserConfig::new()
///     .with_detection_line_limit(100)
///     .with_raw_text(false);
/// assert_eq!(config.detection_line_limit, 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Non-blank lines to inspect before giving up on format detection (default: 50)
    pub detection_line_limit: usize,

    /// Interpretation of ambiguous day/month fields (default: day-first)
    pub date_order: DateOrder,

    /// Bytes read per chunk when parsing from a reader (default: 64KB)
    pub chunk_size: usize,

    /// Keep the unsanitized line text on every message (default: true)
    pub keep_raw_text: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            detection_line_limit: 50,
            date_order: DateOrder::DayFirst,
            chunk_size: 64 * 1024, // 64KB
            keep_raw_text: true,
        }
    }
}

impl ParserConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the detection budget.
    #[must_use]
    pub fn with_detection_line_limit(mut self, limit: usize) -> Self {
        self.detection_line_limit = limit.max(1);
        self
    }

    /// Sets the ambiguous-date policy.
    #[must_use]
    pub fn with_date_order(mut self, order: DateOrder) -> Self {
        self.date_order = order;
        self
    }

    /// Sets the chunk size used by [`ChatParser::parse_reader`](crate::ChatParser::parse_reader).
    #[must_use]
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Sets whether raw line text is kept on messages.
    #[must_use]
    pub fn with_raw_text(mut self, keep: bool) -> Self {
        self.keep_raw_text = keep;
        self
    }
}

/// Configuration for opening a [`ChatStore`](crate::store::ChatStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Use write-ahead logging (default: true; ignored for in-memory stores)
    pub wal: bool,

    /// How long a writer waits for a competing connection's lock (default: 5000ms)
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            wal: true,
            busy_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables write-ahead logging.
    #[must_use]
    pub fn with_wal(mut self, enabled: bool) -> Self {
        self.wal = enabled;
        self
    }

    /// Sets the busy timeout in milliseconds.
    #[must_use]
    pub fn with_busy_timeout_ms(mut self, timeout: u64) -> Self {
        self.busy_timeout_ms = timeout;
        self
    }
}
