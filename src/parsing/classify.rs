//! Message-type classification.
//!
//! Rules are evaluated in a fixed priority order and the first match wins.
//! The categories overlap by substring (an attachment line may also mention a
//! maps URL), so the order is part of the contract.

use crate::message::MessageType;

use super::attachment::{extension, extract_attachment};

const MEDIA_OMITTED: &str = "<media omitted>";
const FILE_ATTACHED: &str = "(file attached)";
const ANGLE_ATTACHED: &str = "<attached:";

const DELETION_PHRASES: &[&str] = &["this message was deleted", "you deleted this message"];
const CALL_PHRASES: &[&str] = &["missed voice call", "missed video call"];
const MAP_HOSTS: &[&str] = &["maps.google.com", "maps.apple.com"];
const LOCATION_PREFIX: &str = "location: ";
const LIVE_LOCATION: &str = "live location";

/// Returns `true` if `body` carries the media-omitted placeholder.
pub fn is_media_omitted(body: &str) -> bool {
    body.to_lowercase().contains(MEDIA_OMITTED)
}

/// Maps an attachment extension to its message type.
///
/// Unknown extensions are documents.
pub fn kind_for_extension(ext: &str) -> MessageType {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" | "png" | "gif" | "heic" | "heif" | "bmp" => MessageType::Image,
        "mp4" | "mov" | "3gp" | "avi" | "mkv" | "webm" | "m4v" => MessageType::Video,
        "opus" | "ogg" | "mp3" | "m4a" | "aac" | "wav" | "amr" => MessageType::Audio,
        "webp" => MessageType::Sticker,
        "vcf" => MessageType::Contact,
        _ => MessageType::Document,
    }
}

/// Classifies a sanitized message body.
///
/// # Example
///
/// ```
/// use chatvault::message::MessageType;
/// use chatvault::parsing::classify;
///
/// assert_eq!(classify("IMG-20210101-WA0001.jpg (file attached)", false), MessageType::Image);
/// assert_eq!(classify("Missed voice call", false), MessageType::CallLog);
/// assert_eq!(classify("anything", true), MessageType::System);
/// ```
pub fn classify(body: &str, sender_is_system: bool) -> MessageType {
    if sender_is_system {
        return MessageType::System;
    }

    let lower = body.to_lowercase();

    if lower.contains(MEDIA_OMITTED) {
        return MessageType::Image;
    }

    if let Some(name) = extract_attachment(body) {
        return extension(&name).map_or(MessageType::Document, |ext| kind_for_extension(&ext));
    }
    if lower.contains(FILE_ATTACHED) || lower.contains(ANGLE_ATTACHED) {
        return MessageType::Document;
    }

    let trimmed = lower.trim();
    if DELETION_PHRASES.contains(&trimmed) {
        return MessageType::Deleted;
    }

    if CALL_PHRASES.iter().any(|p| lower.contains(p)) {
        return MessageType::CallLog;
    }

    if MAP_HOSTS.iter().any(|h| lower.contains(h))
        || lower.starts_with(LOCATION_PREFIX)
        || lower.contains(LIVE_LOCATION)
    {
        return MessageType::Location;
    }

    MessageType::Text
}
