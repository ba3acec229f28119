//! Date and time resolution for head-line timestamps.
//!
//! Exports write wall-clock time in the exporting phone's time zone, with
//! the date fields in locale order. The day/month order is inferred per
//! token when one field is above 12 and taken from [`DateOrder`] otherwise.

use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;

use crate::config::DateOrder;

static TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s*([AaPp][Mm]))?$").expect("valid time pattern")
});

/// Resolves a date token such as `25/03/2021`, `3.4.21` or `12-31-2020`.
///
/// Two-digit years are in the 2000s. Returns `None` for tokens that are not
/// three numeric fields or do not name a real calendar day.
///
/// # Example
///
/// ```
/// use chatvault::config::DateOrder;
/// use chatvault::parsing::resolve_date;
/// use chrono::NaiveDate;
///
/// // First field above 12: always day-first.
/// assert_eq!(
///     resolve_date("25/03/2021", DateOrder::MonthFirst),
///     NaiveDate::from_ymd_opt(2021, 3, 25)
/// );
/// // Ambiguous: the configured order decides.
/// assert_eq!(
///     resolve_date("03/04/2021", DateOrder::DayFirst),
///     NaiveDate::from_ymd_opt(2021, 4, 3)
/// );
/// ```
pub fn resolve_date(token: &str, order: DateOrder) -> Option<NaiveDate> {
    let mut fields = token.trim().split(['/', '.', '-']);
    let first = fields.next()?;
    let second = fields.next()?;
    let year_str = fields.next()?;
    if fields.next().is_some() {
        return None;
    }

    let first: u32 = first.parse().ok()?;
    let second: u32 = second.parse().ok()?;
    let mut year: i32 = year_str.parse().ok()?;
    if year_str.len() <= 2 {
        year += 2000;
    }

    let (day, month) = if first > 12 {
        (first, second)
    } else if second > 12 {
        (second, first)
    } else {
        match order {
            DateOrder::DayFirst => (first, second),
            DateOrder::MonthFirst => (second, first),
        }
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Resolves a time token such as `14:30`, `14:30:00` or `2:30 PM`.
pub fn resolve_time(token: &str) -> Option<NaiveTime> {
    let caps = TIME.captures(token.trim())?;
    let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
    let second: u32 = match caps.get(3) {
        Some(s) => s.as_str().parse().ok()?,
        None => 0,
    };

    if let Some(meridiem) = caps.get(4) {
        let pm = meridiem.as_str().eq_ignore_ascii_case("pm");
        if pm && hour < 12 {
            hour += 12;
        } else if !pm && hour == 12 {
            hour = 0;
        }
    }

    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Resolves a head line's date and time into an instant.
///
/// The wall-clock value is read in the local time zone. For a time that
/// occurs twice (DST fall-back) the earlier instant wins; a time that never
/// occurs (DST spring-forward gap) yields `None`.
pub fn resolve_timestamp(date: &str, time: &str, order: DateOrder) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::new(resolve_date(date, order)?, resolve_time(time)?);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}
