//! Property-based tests for chatvault.
//!
//! These tests generate random inputs to find edge cases.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

use chatvault::config::DateOrder;
use chatvault::parsing::{LineSplitter, resolve_date, sanitize, split_lines};
use chatvault::{ChatParser, Platform};

/// Text fragments that exercise line endings, marks and multi-byte UTF-8.
fn arb_fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "hello",
        " ",
        "\n",
        "\r\n",
        "\r",
        "\u{200E}",
        "\u{202A}",
        "\u{2069}",
        "café",
        "Привет",
        "😀",
        "👨‍👩‍👧",
        "20/06/2021, 14:30 - ",
        ": ",
    ])
}

fn arb_text(max_fragments: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(arb_fragment(), 0..max_fragments).prop_map(|parts| parts.concat())
}

/// Generate a sender name (fast: no regex)
fn arb_sender() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "Alice".to_string(),
        "Bob".to_string(),
        "Иван".to_string(),
        "村上".to_string(),
        "+44 7700 900123".to_string(),
        "Dr. Who".to_string(),
    ])
}

/// Generate a message body that sanitizes to itself.
fn arb_body() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "Hi".to_string(),
        "How are you?".to_string(),
        "meet at 10:30 - ok?".to_string(),
        "note: this has a colon".to_string(),
        "Привет мир".to_string(),
        "🎉🔥 emoji".to_string(),
        "Special;chars\"here".to_string(),
    ])
}

fn split_in_chunks(input: &[u8], size: usize) -> Vec<String> {
    let mut splitter = LineSplitter::new();
    let mut lines = Vec::new();
    for chunk in input.chunks(size) {
        lines.extend(splitter.push(chunk));
    }
    lines.extend(splitter.finish());
    lines
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // ============================================
    // SANITIZE PROPERTIES
    // ============================================

    /// Sanitizing twice changes nothing
    #[test]
    fn sanitize_is_idempotent(text in arb_text(12)) {
        let once = sanitize(&text);
        prop_assert_eq!(sanitize(&once), once);
    }

    /// No directional marks survive, and nothing else is lost
    #[test]
    fn sanitize_removes_only_marks(text in arb_text(12)) {
        let cleaned = sanitize(&text);
        let has_marks = cleaned.chars().any(|c| matches!(
            c,
            '\u{200E}' | '\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}'
        ));
        prop_assert!(!has_marks);
        let visible: String = text
            .chars()
            .filter(|c| !matches!(c, '\u{200E}' | '\u{202A}' | '\u{2069}'))
            .collect();
        prop_assert!(visible.contains(&cleaned));
    }

    /// Arbitrary text without marks is only trimmed
    #[test]
    fn sanitize_plain_text_is_trim(text in "[a-z ]{0,20}") {
        prop_assert_eq!(sanitize(&text), text.trim());
    }

    // ============================================
    // LINE SEGMENTATION PROPERTIES
    // ============================================

    /// Chunk boundaries never change the produced lines
    #[test]
    fn chunking_matches_whole_input(text in arb_text(30), size in 1usize..17) {
        let expected: Vec<String> = split_lines(&text).map(str::to_string).collect();
        prop_assert_eq!(split_in_chunks(text.as_bytes(), size), expected);
    }

    /// A leading byte order mark is dropped however the input is chunked
    #[test]
    fn bom_is_dropped(text in arb_text(10), size in 1usize..5) {
        let with_bom = format!("\u{feff}{text}");
        prop_assert_eq!(
            split_in_chunks(with_bom.as_bytes(), size),
            split_in_chunks(text.as_bytes(), size)
        );
    }

    // ============================================
    // DATE PROPERTIES
    // ============================================

    /// A day above 12 is read as the day in either order
    #[test]
    fn unambiguous_dates_ignore_order(
        day in 13u32..=28,
        month in 1u32..=12,
        year in 2000i32..2100,
    ) {
        let expected = NaiveDate::from_ymd_opt(year, month, day);
        let day_first = format!("{day:02}/{month:02}/{year}");
        let month_first = format!("{month:02}/{day:02}/{year}");
        for order in [DateOrder::DayFirst, DateOrder::MonthFirst] {
            prop_assert_eq!(resolve_date(&day_first, order), expected);
            prop_assert_eq!(resolve_date(&month_first, order), expected);
        }
    }

    /// Ambiguous dates follow the configured order
    #[test]
    fn ambiguous_dates_follow_order(a in 1u32..=12, b in 1u32..=12, year in 2000i32..2100) {
        let token = format!("{a}.{b}.{year}");
        prop_assert_eq!(
            resolve_date(&token, DateOrder::DayFirst),
            NaiveDate::from_ymd_opt(year, b, a)
        );
        prop_assert_eq!(
            resolve_date(&token, DateOrder::MonthFirst),
            NaiveDate::from_ymd_opt(year, a, b)
        );
    }

    /// Two-digit years land in the 2000s
    #[test]
    fn short_years_are_2000s(yy in 0i32..100) {
        let date = resolve_date(&format!("15/06/{yy:02}"), DateOrder::DayFirst).unwrap();
        prop_assert_eq!(date.year(), 2000 + yy);
    }

    // ============================================
    // PARSER PROPERTIES
    // ============================================

    /// Every rendered message comes back with its sender and body
    #[test]
    fn android_round_trip(
        messages in prop::collection::vec((arb_sender(), arb_body()), 1..30),
        chunk in 1usize..64,
    ) {
        let export: String = messages
            .iter()
            .enumerate()
            .map(|(i, (sender, body))| {
                format!("01/02/2021, {:02}:{:02} - {sender}: {body}\n", i / 60, i % 60)
            })
            .collect();

        let parser = ChatParser::with_config(
            chatvault::config::ParserConfig::new().with_chunk_size(chunk),
        );
        let result = parser
            .parse_reader("prop", export.as_bytes(), None, None)
            .unwrap();

        prop_assert_eq!(result.chat.platform, Platform::Android);
        prop_assert!(result.warnings.is_empty());
        prop_assert_eq!(result.messages.len(), messages.len());
        for (parsed, (sender, body)) in result.messages.iter().zip(&messages) {
            prop_assert_eq!(parsed.sender.as_deref(), Some(sender.as_str()));
            prop_assert_eq!(&parsed.content, body);
        }
    }

    /// Parsing never panics, whatever the input
    #[test]
    fn parser_never_panics(text in arb_text(40)) {
        let result = ChatParser::new().parse_str("fuzz", &text);
        prop_assert!(result.lines_read <= text.lines().count() + 1);
    }
}
