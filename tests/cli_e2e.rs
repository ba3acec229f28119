//! End-to-end CLI tests for chatvault.
//!
//! These tests run the actual binary against a throwaway database and check
//! its output.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test cli_e2e
//! ```

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

const EXPORT: &str = "20/06/2021, 14:29 - Messages and calls are end-to-end encrypted.\n\
20/06/2021, 14:30 - Alice: Packing list for the lake\n\
20/06/2021, 14:31 - Bob: IMG-20210620-WA0001.jpg (file attached)\n\
20/06/2021, 14:32 - Alice: bring the big tent\n\
and the stove\n\
20/06/2021, 14:33 - Bob: see you at the lake\n";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("WhatsApp Chat with Trip.txt"), EXPORT).unwrap();
        let media = dir.path().join("media");
        fs::create_dir(&media).unwrap();
        fs::write(media.join("IMG-20210620-WA0001.jpg"), b"jpeg").unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn db(&self) -> PathBuf {
        self.path("vault.db")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("chatvault").unwrap();
        cmd.arg("--db").arg(self.db());
        cmd
    }

    fn import(&self) {
        self.cmd()
            .arg("import")
            .arg(self.path("WhatsApp Chat with Trip.txt"))
            .arg("--media-dir")
            .arg(self.path("media"))
            .assert()
            .success();
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

// ============================================================================
// Import
// ============================================================================

#[test]
fn test_import_reports_summary() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("import")
        .arg(ws.path("WhatsApp Chat with Trip.txt"))
        .arg("--media-dir")
        .arg(ws.path("media"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 5 messages from 2 senders"))
        .stdout(predicate::str::contains("Android export"))
        .stdout(predicate::str::contains("Imported \"Trip\" as chat #1"));
    assert!(ws.db().is_file());
}

#[test]
fn test_import_with_custom_name() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("import")
        .arg(ws.path("WhatsApp Chat with Trip.txt"))
        .args(["--name", "Lake weekend"])
        .assert()
        .success();
    ws.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Lake weekend"));
}

#[test]
fn test_import_unrecognized_file_fails() {
    let ws = Workspace::new();
    let notes = ws.path("notes.txt");
    let content: String = (0..60).map(|i| format!("shopping item {i}\n")).collect();
    fs::write(&notes, content).unwrap();

    ws.cmd()
        .arg("import")
        .arg(&notes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a recognized chat export"))
        .stderr(predicate::str::contains("WhatsApp"));
}

#[test]
fn test_import_missing_file_fails() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["import", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));
}

#[test]
fn test_import_with_progress() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("import")
        .arg(ws.path("WhatsApp Chat with Trip.txt"))
        .arg("--progress")
        .assert()
        .success()
        .stderr(predicate::str::contains("Parsing: 100%"));
}

// ============================================================================
// Reading
// ============================================================================

#[test]
fn test_list_empty_store() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No chats yet"));
}

#[test]
fn test_list_show_and_context() {
    let ws = Workspace::new();
    ws.import();

    ws.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Trip (Android, 5 messages"));

    ws.cmd()
        .args(["show", "1", "--limit", "2", "--offset", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice: Packing list for the lake"))
        .stdout(predicate::str::contains("IMG-20210620-WA0001.jpg"))
        .stdout(predicate::str::contains("bring the big tent").not());

    ws.cmd()
        .args(["context", "3", "--window", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("▶ #3"))
        .stdout(predicate::str::contains("#4"));
}

#[test]
fn test_show_missing_chat() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["show", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("chat 9 not found"));
}

#[test]
fn test_search() {
    let ws = Workspace::new();
    ws.import();

    ws.cmd()
        .args(["search", "lake"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 results"))
        .stdout(predicate::str::contains("[Trip]"));

    ws.cmd()
        .args(["search", "stove"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bring the big tent\nand the stove"));

    ws.cmd()
        .args(["search", "\"half quoted"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 results"));
}

#[test]
fn test_stats() {
    let ws = Workspace::new();
    ws.import();

    ws.cmd()
        .args(["stats", "--chat", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Messages:     4"))
        .stdout(predicate::str::contains("Busiest day:  Sunday"))
        .stdout(predicate::str::contains("Busiest hour: 14:00"))
        .stdout(predicate::str::contains("1. Alice (2)"));
}

#[test]
fn test_on_this_day() {
    let ws = Workspace::new();
    ws.import();

    ws.cmd()
        .args(["on-this-day", "--date", "2024-06-20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Packing list for the lake"));

    ws.cmd()
        .args(["on-this-day", "--date", "20.06.2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date '20.06.2024'"));
}

#[test]
fn test_highlights() {
    let ws = Workspace::new();
    ws.import();

    ws.cmd()
        .args(["highlights", "--min-length", "200"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// ============================================================================
// Export, restore and delete
// ============================================================================

#[test]
fn test_export_jsonl_and_csv() {
    let ws = Workspace::new();
    ws.import();

    let jsonl = ws.path("trip.jsonl");
    ws.cmd()
        .args(["export", "1", "-o"])
        .arg(&jsonl)
        .assert()
        .success()
        .stdout(predicate::str::contains("5 messages saved"));
    let content = read(&jsonl);
    assert_eq!(content.lines().count(), 5);
    assert!(content.contains(r#""type":"image""#));
    assert!(content.contains("media_uri"));

    let csv = ws.path("trip.csv");
    ws.cmd()
        .args(["export", "1", "--format", "csv", "--output"])
        .arg(&csv)
        .assert()
        .success();
    assert!(read(&csv).starts_with("ID;Timestamp;Sender;Type;Content;MediaUri"));
}

#[test]
fn test_export_missing_chat_fails() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["export", "3", "-o"])
        .arg(ws.path("nothing.jsonl"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("chat 3 not found"));
}

#[test]
fn test_archive_restore_and_delete() {
    let ws = Workspace::new();
    ws.import();

    let backup = ws.path("backup");
    ws.cmd()
        .args(["export", "1", "-f", "archive", "-o"])
        .arg(&backup)
        .assert()
        .success()
        .stdout(predicate::str::contains("5 messages and 1 media files"));
    assert!(backup.join("chat.json").is_file());
    assert!(backup.join("media").join("IMG-20210620-WA0001.jpg").is_file());

    ws.cmd()
        .args(["delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted chat #1"));
    ws.cmd()
        .args(["delete", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("chat 1 not found"));

    ws.cmd()
        .arg("restore")
        .arg(&backup)
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored \"Trip\" as chat #2"));

    ws.cmd()
        .args(["search", "tent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 results"));
}

#[test]
fn test_restore_invalid_archive() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("restore")
        .arg(ws.path("media"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid archive"));
}

// ============================================================================
// Arguments
// ============================================================================

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("chatvault")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_invalid_date_order_rejected() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("import")
        .arg(ws.path("WhatsApp Chat with Trip.txt"))
        .args(["--date-order", "ymd"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown date order"));
}
