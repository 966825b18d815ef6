use chrono::NaiveDateTime;
use serde::Serialize;

use super::Refusal;
use crate::error::DomainError;
use crate::money::Money;
use crate::ticket::Ticket;

const MILLIS_PER_HOUR: i64 = 3_600_000;
const MILLIS_PER_MINUTE: i64 = 60_000;

/// Fee schedule shown to the passenger with every refund quote.
pub const REFUND_RULES: [&str; 5] = [
    "1. 开车前48小时（含）以上退票，手续费为票价的5%",
    "2. 开车前24小时（含）～48小时以内退票，手续费为票价的10%",
    "3. 开车前24小时以内退票，手续费为票价的20%",
    "4. 开车后、到站前退票，手续费为票价的50%",
    "5. 到站后退票，不予退款",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RefundOutcome {
    Refundable { fee: Money, refundable_amount: Money },
    Refused(Refusal),
}

/// What refunding a ticket right now would cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundQuote {
    pub original_price: Money,
    pub outcome: RefundOutcome,
    pub rules: &'static [&'static str],
}

impl RefundQuote {
    pub fn can_refund(&self) -> bool {
        matches!(self.outcome, RefundOutcome::Refundable { .. })
    }

    pub fn fee(&self) -> Option<Money> {
        match self.outcome {
            RefundOutcome::Refundable { fee, .. } => Some(fee),
            RefundOutcome::Refused(_) => None,
        }
    }

    pub fn refundable_amount(&self) -> Option<Money> {
        match self.outcome {
            RefundOutcome::Refundable {
                refundable_amount, ..
            } => Some(refundable_amount),
            RefundOutcome::Refused(_) => None,
        }
    }

    pub fn refusal(&self) -> Option<Refusal> {
        match self.outcome {
            RefundOutcome::Refundable { .. } => None,
            RefundOutcome::Refused(reason) => Some(reason),
        }
    }
}

/// Fee percentage for a refund `millis_to_departure` before departure.
///
/// Hours are counted whole, truncated toward zero, so the first hour after
/// departure still counts as hour zero. Returns `None` once the train has
/// arrived.
pub fn refund_fee_percent(millis_to_departure: i64, duration_minutes: u32) -> Option<u32> {
    let hours = millis_to_departure / MILLIS_PER_HOUR;
    if hours >= 48 {
        Some(5)
    } else if hours >= 24 {
        Some(10)
    } else if hours >= 0 {
        Some(20)
    } else if millis_to_departure > -(i64::from(duration_minutes) * MILLIS_PER_MINUTE) {
        Some(50)
    } else {
        None
    }
}

/// Quotes a refund of `ticket` at `now`.
///
/// Fails only when the ticket's start time cannot be parsed.
pub fn evaluate_refund(ticket: &Ticket, now: NaiveDateTime) -> Result<RefundQuote, DomainError> {
    let original_price = ticket.price;
    let quote = |outcome| RefundQuote {
        original_price,
        outcome,
        rules: &REFUND_RULES,
    };

    if !ticket.is_active() {
        return Ok(quote(RefundOutcome::Refused(Refusal::AlreadyChangedOrRefunded)));
    }

    let millis = (ticket.departure()? - now).num_milliseconds();
    let outcome = match refund_fee_percent(millis, ticket.duration_minutes) {
        Some(percent) => {
            let fee = original_price.percent(percent);
            RefundOutcome::Refundable {
                fee,
                refundable_amount: original_price - fee,
            }
        }
        None => RefundOutcome::Refused(Refusal::AlreadyArrived),
    };
    Ok(quote(outcome))
}
