//! Quotation number synthesis.
//!
//! Numbers follow `prefix + YYYYMMDD + three digits`, e.g. `BJ20231201001`.
//! The trailing digits come from a process-wide monotonic counter rather
//! than a raw timestamp, so rapid successive calls cannot collide within
//! a process. The server remains the authority on global uniqueness.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_sequence() -> u64 {
    // Seed once from the clock so restarts within the same day do not
    // restart the low-order digits at the same point.
    let seeded = SEQUENCE.load(Ordering::Relaxed);
    if seeded == 0 {
        let millis = chrono::Utc::now().timestamp_millis() as u64;
        let _ = SEQUENCE.compare_exchange(0, millis, Ordering::Relaxed, Ordering::Relaxed);
    }
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// Generates day-scoped quotation numbers with a configurable prefix.
#[derive(Debug, Clone)]
pub struct QuotationNumberer {
    prefix: String,
}

impl QuotationNumberer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Synthesize the next quotation number for the given date.
    pub fn next(&self, date: NaiveDate) -> String {
        let seq = next_sequence() % 1000;
        format!("{}{}{seq:03}", self.prefix, date.format("%Y%m%d"))
    }

    /// Whether `candidate` matches the `prefix + YYYYMMDD + NNN` shape.
    pub fn matches(&self, candidate: &str) -> bool {
        let Some(rest) = candidate.strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        rest.len() == 11
            && rest.chars().all(|c| c.is_ascii_digit())
            && NaiveDate::parse_from_str(&rest[..8], "%Y%m%d").is_ok()
    }
}
