//! Line-level building blocks of the export parser.
//!
//! Everything here is a pure function or a small self-contained state
//! holder; [`ChatParser`](crate::ChatParser) wires them together.

pub mod attachment;
pub mod classify;
pub mod datetime;
pub mod dialect;
pub mod lines;
pub mod sanitize;

pub use attachment::{extract_attachment, media_key};
pub use classify::{classify, is_media_omitted, kind_for_extension};
pub use datetime::{resolve_date, resolve_time, resolve_timestamp};
pub use dialect::{Dialect, HeadLine, LineKind, decode_line, detect_dialect};
pub use lines::{LineSplitter, split_lines};
pub use sanitize::sanitize;
