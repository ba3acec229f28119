//! Progress reporting for chunked parsing.
//!
//! [`ChatParser::parse_reader`](crate::ChatParser::parse_reader) invokes a
//! [`ProgressCallback`] after every chunk. The callback receives a [`Progress`]
//! snapshot and must return quickly: it runs on the parsing thread.
//!
//! # Example
//!
//! ```rust
//! use chatvault::progress::{Progress, ProgressCallback};
//! use std::sync::Arc;
//!
//! let callback: ProgressCallback = Arc::new(|progress| {
//!     if let Some(pct) = progress.percentage() {
//!         println!("{pct:.1}% ({} messages)", progress.messages);
//!     }
//! });
//!
//! callback(Progress::new(512, Some(1024), 7));
//! ```

use std::sync::Arc;

/// Snapshot of a running parse.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Progress {
    /// Bytes consumed from the source so far.
    pub bytes_processed: u64,

    /// Total size of the source, if known.
    pub total_bytes: Option<u64>,

    /// Messages started so far (including the one still being accumulated).
    pub messages: usize,
}

impl Progress {
    pub fn new(bytes_processed: u64, total_bytes: Option<u64>, messages: usize) -> Self {
        Self {
            bytes_processed,
            total_bytes,
            messages,
        }
    }

    /// Returns the progress as a percentage (0.0 - 100.0).
    ///
    /// Returns `None` if the total size is not known.
    ///
    /// ```rust
    /// use chatvault::progress::Progress;
    ///
    /// assert_eq!(Progress::new(250, Some(1000), 3).percentage(), Some(25.0));
    /// assert_eq!(Progress::new(250, None, 3).percentage(), None);
    /// ```
    pub fn percentage(&self) -> Option<f64> {
        self.total_bytes.map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.bytes_processed.min(total) as f64 / total as f64) * 100.0
            }
        })
    }

    /// Returns whether the whole source has been consumed (if its size is known).
    pub fn is_complete(&self) -> bool {
        self.total_bytes
            .map(|total| self.bytes_processed >= total)
            .unwrap_or(false)
    }

    /// Returns the bytes still to read, if the total is known.
    pub fn remaining_bytes(&self) -> Option<u64> {
        self.total_bytes.map(|total| total.saturating_sub(self.bytes_processed))
    }
}

/// Thread-safe progress callback.
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Creates a callback that ignores every update.
pub fn no_progress() -> ProgressCallback {
    Arc::new(|_| {})
}

/// Creates a callback that reports to stderr, once per whole percent.
pub fn stderr_progress() -> ProgressCallback {
    use std::sync::atomic::{AtomicU64, Ordering};

    let last = Arc::new(AtomicU64::new(u64::MAX));
    Arc::new(move |progress| {
        if let Some(pct) = progress.percentage() {
            let whole = pct as u64;
            if last.swap(whole, Ordering::Relaxed) != whole {
                eprintln!("Parsing: {whole}% ({} messages)", progress.messages);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(Progress::new(0, Some(0), 0).percentage(), Some(100.0));
    }

    #[test]
    fn test_percentage_clamped() {
        // Stale size hint.
        assert_eq!(Progress::new(1500, Some(1000), 0).percentage(), Some(100.0));
    }

    #[test]
    fn test_is_complete() {
        assert!(Progress::new(1000, Some(1000), 10).is_complete());
        assert!(!Progress::new(500, Some(1000), 5).is_complete());
        assert!(!Progress::new(500, None, 5).is_complete());
    }

    #[test]
    fn test_remaining_bytes() {
        assert_eq!(Progress::new(300, Some(1000), 0).remaining_bytes(), Some(700));
        assert_eq!(Progress::new(300, None, 0).remaining_bytes(), None);
    }

    #[test]
    fn test_callback_receives_updates() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |progress| {
            seen_clone.store(progress.messages, Ordering::SeqCst);
        });

        callback(Progress::new(10, None, 42));
        assert_eq!(seen.load(Ordering::SeqCst), 42);
        no_progress()(Progress::default());
    }
}
