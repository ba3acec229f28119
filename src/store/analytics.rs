//! Activity statistics and "memories" queries.
//!
//! Everything here counts only messages with a sender, and buckets by the
//! *local* calendar day and hour of each message: an evening conversation
//! belongs to the evening it happened in, not to a UTC date.

use chrono::{Datelike, NaiveDate};
use rusqlite::params;
use serde::Serialize;

use super::{ChatStore, MESSAGE_COLUMNS, MESSAGE_FROM, message_from_row};
use crate::error::Result;
use crate::message::StoredMessage;

/// Local-time expression for `m.timestamp` (milliseconds).
const LOCAL_TS: &str = "m.timestamp / 1000, 'unixepoch', 'localtime'";

/// Messages sent by one sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderCount {
    pub name: String,
    pub count: u64,
}

/// Aggregate activity of one chat or of the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChatStats {
    pub total_messages: u64,
    /// Distinct local calendar days with at least one message
    pub active_days: u64,
    /// Most active senders, busiest first
    pub top_senders: Vec<SenderCount>,
    /// Messages per local weekday, Sunday first
    pub by_weekday: [u64; 7],
    /// Messages per local hour of day
    pub by_hour: [u64; 24],
}

impl ChatStats {
    /// Weekday index (Sunday = 0) with the most messages, if any.
    pub fn busiest_weekday(&self) -> Option<usize> {
        busiest(&self.by_weekday)
    }

    /// Hour of day with the most messages, if any.
    pub fn busiest_hour(&self) -> Option<usize> {
        busiest(&self.by_hour)
    }
}

fn busiest(buckets: &[u64]) -> Option<usize> {
    buckets
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
        .map(|(i, _)| i)
}

impl ChatStore {
    /// Computes statistics for `chat_id`, or for every chat when `None`.
    pub fn chat_stats(&self, chat_id: Option<i64>, top_n: usize) -> Result<ChatStats> {
        let scope = "m.sender_id IS NOT NULL AND (?1 IS NULL OR m.chat_id = ?1)";

        let (total_messages, active_days): (i64, i64) = self.conn.query_row(
            &format!(
                "SELECT COUNT(*), COUNT(DISTINCT date({LOCAL_TS}))
                 FROM messages m WHERE {scope}"
            ),
            [chat_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let top_senders = self
            .conn
            .prepare(&format!(
                "SELECT s.name, COUNT(*) AS n
                 FROM messages m JOIN senders s ON s.id = m.sender_id
                 WHERE {scope}
                 GROUP BY s.id
                 ORDER BY n DESC, s.name ASC
                 LIMIT ?2"
            ))?
            .query_map(params![chat_id, top_n as i64], |row| {
                Ok(SenderCount {
                    name: row.get(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut by_weekday = [0u64; 7];
        self.fill_histogram(&mut by_weekday, "%w", scope, chat_id)?;
        let mut by_hour = [0u64; 24];
        self.fill_histogram(&mut by_hour, "%H", scope, chat_id)?;

        Ok(ChatStats {
            total_messages: total_messages as u64,
            active_days: active_days as u64,
            top_senders,
            by_weekday,
            by_hour,
        })
    }

    fn fill_histogram(
        &self,
        buckets: &mut [u64],
        format: &str,
        scope: &str,
        chat_id: Option<i64>,
    ) -> Result<()> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT CAST(strftime('{format}', {LOCAL_TS}) AS INTEGER) AS bucket, COUNT(*)
             FROM messages m WHERE {scope}
             GROUP BY bucket"
        ))?;
        let rows = stmt.query_map([chat_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (bucket, count) = row?;
            if let Some(slot) = usize::try_from(bucket).ok().and_then(|b| buckets.get_mut(b)) {
                *slot = count as u64;
            }
        }
        Ok(())
    }

    /// Random text messages of at least `min_len` characters.
    pub fn random_highlights(&self, min_len: usize, limit: usize) -> Result<Vec<StoredMessage>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM {MESSAGE_FROM}
             WHERE m.type = 'text' AND m.sender_id IS NOT NULL AND length(m.content) >= ?1
             ORDER BY RANDOM()
             LIMIT ?2"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![min_len as i64, limit as i64], message_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Messages from this calendar day in earlier (or later) years.
    ///
    /// When no message matches the exact month and day, falls back to
    /// messages from the same week of the year in a different year.
    pub fn on_this_day(&self, today: NaiveDate, limit: usize) -> Result<Vec<StoredMessage>> {
        let year = format!("{:04}", today.year());

        let exact = self.memories("%m-%d", &today.format("%m-%d").to_string(), &year, limit)?;
        if !exact.is_empty() {
            return Ok(exact);
        }
        self.memories("%W", &today.format("%W").to_string(), &year, limit)
    }

    fn memories(
        &self,
        format: &str,
        value: &str,
        exclude_year: &str,
        limit: usize,
    ) -> Result<Vec<StoredMessage>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM {MESSAGE_FROM}
             WHERE m.sender_id IS NOT NULL
               AND strftime('{format}', {LOCAL_TS}) = ?1
               AND strftime('%Y', {LOCAL_TS}) != ?2
             ORDER BY m.timestamp ASC, m.id ASC
             LIMIT ?3"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![value, exclude_year, limit as i64], message_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busiest_prefers_earliest_on_tie() {
        let mut by_hour = [0u64; 24];
        by_hour[9] = 4;
        by_hour[21] = 4;
        by_hour[3] = 1;
        let stats = ChatStats {
            by_hour,
            ..ChatStats::default()
        };
        assert_eq!(stats.busiest_hour(), Some(9));
        assert_eq!(stats.busiest_weekday(), None);
    }

    #[test]
    fn test_empty_store_stats() {
        let store = ChatStore::open_in_memory().unwrap();
        let stats = store.chat_stats(None, 5).unwrap();
        assert_eq!(stats, ChatStats::default());
    }
}
