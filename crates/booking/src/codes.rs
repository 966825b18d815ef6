//! Order and ticket number generation.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::NaiveDateTime;

const ORDER_PREFIX: &str = "ORDER";
const TICKET_PREFIX: &str = "TICKET";

/// Issues `ORDER`/`TICKET` numbers: prefix, `yyyyMMddHHmmss`, 4-digit sequence.
///
/// The sequence is shared by both kinds and wraps at 10000, so numbers are
/// unique per process as long as fewer than 10000 are issued per second.
/// The store still rejects duplicates.
#[derive(Debug, Default)]
pub struct NumberGenerator {
    sequence: AtomicU32,
}

impl NumberGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_no(&self, now: NaiveDateTime) -> String {
        self.next(ORDER_PREFIX, now)
    }

    pub fn ticket_no(&self, now: NaiveDateTime) -> String {
        self.next(TICKET_PREFIX, now)
    }

    fn next(&self, prefix: &str, now: NaiveDateTime) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) % 10_000;
        format!("{prefix}{}{sequence:04}", now.format("%Y%m%d%H%M%S"))
    }
}
