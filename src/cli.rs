//! Command-line interface definition using clap.
//!
//! - [`Args`] - global options and the subcommand
//! - [`Command`] - what to do with the store
//! - [`ExportFormat`] - output formats of `chatvault export`

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::DateOrder;

/// Import WhatsApp chat exports into a local searchable archive.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatvault")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    chatvault import \"WhatsApp Chat with Mum.txt\" --media-dir ./media
    chatvault list
    chatvault search \"birthday cake\"
    chatvault context 1042
    chatvault stats --chat 1
    chatvault export 1 --format archive -o ./backup/mum
    chatvault restore ./backup/mum")]
pub struct Args {
    /// Path to the database file
    #[arg(long, global = true, default_value = "chatvault.db", value_name = "FILE")]
    pub db: PathBuf,

    /// Log filter (e.g. "info", "chatvault=debug"); overrides RUST_LOG
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Parse an export file and store it as a new chat
    Import {
        /// Path to the exported .txt file
        input: PathBuf,

        /// Chat name (defaults to the name in the file name)
        #[arg(long)]
        name: Option<String>,

        /// Folder with the media files that came with the export
        #[arg(long, value_name = "DIR")]
        media_dir: Option<PathBuf>,

        /// How to read ambiguous dates like 03/04/21
        #[arg(long, default_value = "day-first", value_name = "ORDER")]
        date_order: DateOrder,

        /// Print parse progress to stderr
        #[arg(long)]
        progress: bool,
    },

    /// List stored chats
    List,

    /// Print a page of a chat's messages
    Show {
        chat_id: i64,

        #[arg(long, default_value_t = 50)]
        limit: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Print the messages around one message
    Context {
        message_id: i64,

        /// Number of surrounding messages
        #[arg(long, default_value_t = 10)]
        window: usize,
    },

    /// Full-text search across all chats
    Search {
        query: String,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Activity statistics for one chat or the whole archive
    Stats {
        /// Restrict to this chat
        #[arg(long, value_name = "ID")]
        chat: Option<i64>,

        /// Number of top senders to show
        #[arg(long, default_value_t = 5)]
        top: usize,
    },

    /// Random longer messages worth re-reading
    Highlights {
        /// Minimum message length in characters
        #[arg(long, default_value_t = 40)]
        min_length: usize,

        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Messages written on this day in other years
    OnThisDay {
        /// Day to look up (YYYY-MM-DD), today if omitted
        #[arg(long, value_name = "DATE")]
        date: Option<String>,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Delete a chat and all its messages
    Delete { chat_id: i64 },

    /// Write a chat to a file or archive folder
    Export {
        chat_id: i64,

        #[arg(short, long, value_enum, default_value = "jsonl")]
        format: ExportFormat,

        /// Output file (or folder for archives)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import a chat from an archive folder
    Restore { dir: PathBuf },
}

/// Output formats of `chatvault export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// JSON Lines, one message per line
    #[default]
    Jsonl,

    /// CSV with semicolon delimiter
    Csv,

    /// Folder with chat.json and media files, restorable with `chatvault restore`
    Archive,
}

impl ExportFormat {
    /// Returns all supported format names.
    pub fn all_names() -> &'static [&'static str] {
        &["jsonl", "csv", "archive"]
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Jsonl => write!(f, "JSONL"),
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Archive => write!(f, "archive"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" | "ndjson" => Ok(ExportFormat::Jsonl),
            "csv" => Ok(ExportFormat::Csv),
            "archive" | "backup" => Ok(ExportFormat::Archive),
            _ => Err(format!(
                "Unknown format: '{}'. Expected one of: {}",
                s,
                ExportFormat::all_names().join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_defaults() {
        let args = Args::try_parse_from(["chatvault", "import", "chat.txt"]).unwrap();
        assert_eq!(args.db, PathBuf::from("chatvault.db"));
        match args.command {
            Command::Import {
                input,
                date_order,
                progress,
                ..
            } => {
                assert_eq!(input, PathBuf::from("chat.txt"));
                assert_eq!(date_order, DateOrder::DayFirst);
                assert!(!progress);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_db_after_subcommand() {
        let args = Args::try_parse_from(["chatvault", "list", "--db", "/tmp/x.db"]).unwrap();
        assert_eq!(args.db, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_date_order_flag() {
        let args =
            Args::try_parse_from(["chatvault", "import", "c.txt", "--date-order", "mdy"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Import {
                date_order: DateOrder::MonthFirst,
                ..
            }
        ));
        assert!(Args::try_parse_from(["chatvault", "import", "c.txt", "--date-order", "ymd"]).is_err());
    }

    #[test]
    fn test_export_requires_output() {
        assert!(Args::try_parse_from(["chatvault", "export", "1"]).is_err());
        let args =
            Args::try_parse_from(["chatvault", "export", "1", "-f", "archive", "-o", "out"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Export {
                format: ExportFormat::Archive,
                ..
            }
        ));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("ndjson".parse::<ExportFormat>().unwrap(), ExportFormat::Jsonl);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_format_serde() {
        let json = serde_json::to_string(&ExportFormat::Archive).unwrap();
        assert_eq!(json, "\"archive\"");
    }
}
