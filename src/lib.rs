//! # Chatvault
//!
//! A Rust library for turning WhatsApp chat exports into a local, searchable
//! archive.
//!
//! ## Overview
//!
//! Chatvault reads the plain-text files produced by WhatsApp's
//! "Export chat" in both of its layouts:
//! - **iOS**: `[20/06/2021, 14:30:05] Alice: Hi`
//! - **Android**: `20/06/2021, 14:30 - Alice: Hi`
//!
//! The parser streams the file in chunks, detects the layout, reassembles
//! multi-line messages and classifies each message (text, photo, location,
//! deleted, ...). The store keeps chats in SQLite with an FTS5 index for
//! search, and answers the questions a chat archive gets asked: show me this
//! conversation, find that message, who talks the most, what happened on
//! this day years ago.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatvault::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let result = ChatParser::new()
//!         .parse_file("WhatsApp Chat with Mum.txt")?
//!         .into_recognized()?;
//!
//!     let mut store = ChatStore::open("chatvault.db")?;
//!     let chat_id = store.ingest(&result)?;
//!
//!     for hit in store.search("birthday", 10)? {
//!         println!("{}: {}", hit.message.sender_label(), hit.message.content);
//!     }
//!     # let _ = chat_id;
//!     Ok(())
//! }
//! ```
//!
//! ## Parsing without a store
//!
//! ```rust
//! use chatvault::{ChatParser, MessageType, Platform};
//!
//! let export = "[20/06/2021, 14:30:05] Alice: Hi\n\
//!               [20/06/2021, 14:31:10] Bob: <attached: 00000012-PHOTO-2021-06-20-14-31-10.jpg>";
//! let result = ChatParser::new().parse_str("Trip", export);
//!
//! assert_eq!(result.chat.platform, Platform::Ios);
//! assert_eq!(result.messages[1].kind, MessageType::Image);
//! ```
//!
//! ## Module Structure
//!
//! - [`parser`]: [`ChatParser`] and the incremental [`ParseSession`](parser::ParseSession)
//! - [`parsing`]: line-level building blocks (dialects, dates, classification)
//! - [`message`]: parsed and stored message types
//! - [`config`]: [`ParserConfig`](config::ParserConfig), [`StoreConfig`](config::StoreConfig)
//! - [`store`]: SQLite persistence, search and statistics (feature `storage`)
//! - [`archive`]: backup and restore of single chats (feature `storage`)
//! - [`media`]: matching attachment names to media files
//! - [`output`]: JSON Lines and CSV exports
//! - [`progress`]: parse progress reporting
//! - [`error`]: [`ChatvaultError`] and [`Result`]
//! - [`prelude`]: Convenient re-exports
//!
//! ## Features
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `storage` | [`store`], [`archive`] (bundled SQLite) |
//! | `csv-output` | CSV writer in [`output`] |
//! | `cli` | the `chatvault` binary |
//! | `gen-test` | the `gen_export` synthetic data generator |

#[cfg(feature = "storage")]
pub mod archive;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
#[cfg(feature = "cli")]
pub mod logging;
pub mod media;
pub mod message;
pub mod output;
pub mod parser;
pub mod parsing;
pub mod progress;
#[cfg(feature = "storage")]
pub mod store;

// Re-export the main types at the crate root for convenience
pub use error::{ChatvaultError, Result};
pub use message::{
    Chat, MessageType, ParseResult, ParseWarning, ParsedMessage, Platform, StoredMessage,
};
pub use parser::ChatParser;

/// Convenient re-exports for common usage.
///
/// ```rust
/// use chatvault::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{DateOrder, ParserConfig, StoreConfig};
    pub use crate::error::{ChatvaultError, Result};
    pub use crate::media::MediaIndex;
    pub use crate::message::{
        Chat, MessageType, ParseResult, ParseWarning, ParsedMessage, Platform, Sender,
        StoredMessage,
    };
    #[cfg(feature = "csv-output")]
    pub use crate::output::{to_csv, write_csv};
    pub use crate::output::{to_jsonl, write_jsonl};
    pub use crate::parser::ChatParser;
    pub use crate::progress::{Progress, ProgressCallback};

    #[cfg(feature = "storage")]
    pub use crate::archive::{export_archive, import_archive};
    #[cfg(feature = "storage")]
    pub use crate::store::{ChatStats, ChatStore, ChatSummary, SearchHit};
}
