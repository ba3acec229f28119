//! Attached-media filename extraction.
//!
//! Three conventions occur in exports, tried in order:
//!
//! 1. `IMG-20210101-WA0001.jpg (file attached)`
//! 2. `<attached: 00000012-PHOTO-2021-01-01-10-00-00.jpg>`
//! 3. a bare `IMG-20210101-WA0001.jpg` at the start of the body
//!
//! The extracted name, lower-cased, is the key used to link a message to a
//! file from the export's media folder.

use std::sync::LazyLock;

use regex::Regex;

static FILE_ATTACHED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\S.*?\.[a-z0-9]+)\s*\(file attached\)").expect("valid file-attached pattern")
});

static ANGLE_ATTACHED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<attached: ([^>]+)>").expect("valid attached pattern"));

static CAMERA_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:IMG|VID|AUD|PTT|DOC|STK)-\d{8}-WA\d{4}\.[A-Za-z0-9]+)")
        .expect("valid camera-name pattern")
});

/// Returns the attached filename in `body`, if any.
///
/// # Example
///
/// ```
/// use chatvault::parsing::extract_attachment;
///
/// assert_eq!(
///     extract_attachment("IMG-20210101-WA0001.jpg (file attached)").as_deref(),
///     Some("IMG-20210101-WA0001.jpg")
/// );
/// assert_eq!(extract_attachment("see you soon"), None);
/// ```
pub fn extract_attachment(body: &str) -> Option<String> {
    [&*FILE_ATTACHED, &*ANGLE_ATTACHED, &*CAMERA_NAME]
        .into_iter()
        .find_map(|re| re.captures(body).and_then(|c| c.get(1)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Normalizes a filename into the media join key.
pub fn media_key(filename: &str) -> String {
    filename.trim().to_lowercase()
}

/// Returns the lower-cased extension of `filename`, without the dot.
pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}
