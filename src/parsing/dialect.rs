//! Export dialect detection and head-line decoding.
//!
//! WhatsApp writes one of two line grammars depending on the exporting
//! client:
//!
//! - iOS: `[20/06/2021, 14:30:00] Alice: Hello` (bracketed, with seconds)
//! - Android: `20/06/2021, 14:30 - Alice: Hello` (dash-separated, no seconds)
//!
//! Either may carry a 12-hour `AM`/`PM` suffix. Lines that match neither
//! grammar are continuations of the previous message.

use std::sync::LazyLock;

use regex::Regex;

use crate::message::Platform;

static IOS_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[\u{200E}\u{200F}]*\[(\d{1,2}[./-]\d{1,2}[./-]\d{2,4}), (\d{1,2}:\d{2}:\d{2}(?:[ \u{202F}](?i:[ap]m))?)\] (.*)$",
    )
    .expect("valid iOS head pattern")
});

static ANDROID_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[\u{200E}\u{200F}]*(\d{1,2}[./-]\d{1,2}[./-]\d{2,4}), (\d{1,2}:\d{2}(?:[ \u{202F}](?i:[ap]m))?) - (.*)$",
    )
    .expect("valid Android head pattern")
});

/// Sender is everything before the first `: `.
static SENDER_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?): (.*)$").expect("valid sender pattern"));

/// One of the two supported line grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `[D/M/Y, H:MM:SS] ` prefix
    Bracketed,
    /// `D/M/Y, H:MM - ` prefix
    Dashed,
}

impl Dialect {
    /// Dialects in detection order.
    pub fn all() -> &'static [Dialect] {
        &[Dialect::Bracketed, Dialect::Dashed]
    }

    /// Platform whose exporter writes this dialect.
    pub fn platform(self) -> Platform {
        match self {
            Dialect::Bracketed => Platform::Ios,
            Dialect::Dashed => Platform::Android,
        }
    }

    fn head_regex(self) -> &'static Regex {
        match self {
            Dialect::Bracketed => &IOS_HEAD,
            Dialect::Dashed => &ANDROID_HEAD,
        }
    }

    /// Returns `true` if `line` starts a message in this dialect.
    pub fn matches(self, line: &str) -> bool {
        self.head_regex().is_match(line)
    }
}

/// Returns the first dialect whose head grammar matches `line`.
///
/// # Example
///
/// ```
/// use chatvault::parsing::{Dialect, detect_dialect};
///
/// assert_eq!(detect_dialect("[1/2/21, 9:05:00 PM] Bob: hi"), Some(Dialect::Bracketed));
/// assert_eq!(detect_dialect("just some text"), None);
/// ```
pub fn detect_dialect(line: &str) -> Option<Dialect> {
    Dialect::all().iter().copied().find(|d| d.matches(line))
}

/// The pieces of a message head line, before any sanitizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadLine<'a> {
    pub date: &'a str,
    pub time: &'a str,
    /// `None` when the remainder has no `: ` separator
    pub sender: Option<&'a str>,
    pub body: &'a str,
}

/// What a single physical line is, under a known dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Head(HeadLine<'a>),
    Continuation,
}

/// Decodes one line under `dialect`.
pub fn decode_line(dialect: Dialect, line: &str) -> LineKind<'_> {
    let Some(caps) = dialect.head_regex().captures(line) else {
        return LineKind::Continuation;
    };

    // All three groups are mandatory in both patterns.
    let (Some(date), Some(time), Some(rest)) = (caps.get(1), caps.get(2), caps.get(3)) else {
        return LineKind::Continuation;
    };
    let rest = rest.as_str();

    let (sender, body) = match SENDER_SPLIT.captures(rest) {
        Some(parts) => match (parts.get(1), parts.get(2)) {
            (Some(sender), Some(body)) => (Some(sender.as_str()), body.as_str()),
            _ => (None, rest),
        },
        None => (None, rest),
    };

    LineKind::Head(HeadLine {
        date: date.as_str(),
        time: time.as_str(),
        sender,
        body,
    })
}
