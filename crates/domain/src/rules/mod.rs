//! Refund and change rules. Pure functions of a ticket and the current time.

mod change;
mod departure;
mod refund;

pub use change::{CHANGE_RULES, ChangeOutcome, ChangeQuote, evaluate_change};
pub use departure::{departure_at, parse_time_of_day};
pub use refund::{REFUND_RULES, RefundOutcome, RefundQuote, evaluate_refund, refund_fee_percent};

use serde::Serialize;

/// Why a ticket cannot be refunded or changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Refusal {
    AlreadyChangedOrRefunded,
    AlreadyDeparted,
    AlreadyArrived,
}

impl Refusal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Refusal::AlreadyChangedOrRefunded => "already changed or refunded",
            Refusal::AlreadyDeparted => "already departed",
            Refusal::AlreadyArrived => "already arrived",
        }
    }
}

impl std::fmt::Display for Refusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
