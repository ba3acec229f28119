//! Database schema.
//!
//! Timestamps are stored as Unix milliseconds. `messages_fts` is an FTS5
//! external-content table over `messages.content`; the triggers below keep it
//! in step with every insert, delete and content update.

/// Bumped whenever [`SCHEMA_SQL`] changes incompatibly.
pub const SCHEMA_VERSION: i64 = 1;

pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS chats (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  source_platform TEXT NOT NULL,
  import_date INTEGER NOT NULL,
  file_path TEXT,
  metadata TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS senders (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE,
  display_name TEXT,
  color TEXT
);

CREATE TABLE IF NOT EXISTS messages (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  chat_id INTEGER NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
  sender_id INTEGER REFERENCES senders(id) ON DELETE SET NULL,
  timestamp INTEGER NOT NULL,
  content TEXT NOT NULL,
  type TEXT NOT NULL,
  is_media_omitted INTEGER NOT NULL DEFAULT 0,
  media_uri TEXT,
  reply_to_id INTEGER REFERENCES messages(id) ON DELETE SET NULL,
  sentiment_score REAL,
  raw_text TEXT
);

CREATE INDEX IF NOT EXISTS idx_messages_chat_ts ON messages(chat_id, timestamp, id);
CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender_id);
CREATE INDEX IF NOT EXISTS idx_messages_reply_to ON messages(reply_to_id);

CREATE VIRTUAL TABLE IF NOT EXISTS messages_fts USING fts5(
  content,
  content='messages',
  content_rowid='id'
);

CREATE TRIGGER IF NOT EXISTS messages_ai AFTER INSERT ON messages BEGIN
  INSERT INTO messages_fts(rowid, content) VALUES (new.id, new.content);
END;

CREATE TRIGGER IF NOT EXISTS messages_ad AFTER DELETE ON messages BEGIN
  INSERT INTO messages_fts(messages_fts, rowid, content) VALUES('delete', old.id, old.content);
END;

CREATE TRIGGER IF NOT EXISTS messages_au AFTER UPDATE OF content ON messages BEGIN
  INSERT INTO messages_fts(messages_fts, rowid, content) VALUES('delete', old.id, old.content);
  INSERT INTO messages_fts(rowid, content) VALUES (new.id, new.content);
END;
";

/// Colors assigned to senders, indexed by a hash of the name.
pub const SENDER_PALETTE: &[&str] = &[
    "#e57373", "#f06292", "#ba68c8", "#9575cd", "#7986cb", "#64b5f6", "#4fc3f7", "#4dd0e1",
    "#4db6ac", "#81c784", "#dce775", "#ffb74d", "#ff8a65", "#a1887f",
];

/// Deterministic palette color for a sender name (FNV-1a).
pub fn sender_color(name: &str) -> &'static str {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = name.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    });
    SENDER_PALETTE[(hash % SENDER_PALETTE.len() as u64) as usize]
}
