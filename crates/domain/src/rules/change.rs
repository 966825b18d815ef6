use chrono::NaiveDateTime;
use serde::Serialize;

use super::Refusal;
use crate::error::DomainError;
use crate::money::Money;
use crate::ticket::Ticket;

/// Change rules shown to the passenger with every change quote.
pub const CHANGE_RULES: [&str; 5] = [
    "1. 同一车次不同席别或不同日期，收取票价差额",
    "2. 开车前48小时（含）以上改签，免收手续费",
    "3. 开车前24小时（含）～48小时以内改签，手续费为票价的2%",
    "4. 开车前24小时以内改签，手续费为票价的5%",
    "5. 每张车票限改签2次",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChangeOutcome {
    Changeable { min_fee: Money },
    Refused(Refusal),
}

/// Whether a ticket can be rebooked right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeQuote {
    pub original_price: Money,
    pub outcome: ChangeOutcome,
    pub rules: &'static [&'static str],
}

impl ChangeQuote {
    pub fn can_change(&self) -> bool {
        matches!(self.outcome, ChangeOutcome::Changeable { .. })
    }

    pub fn refusal(&self) -> Option<Refusal> {
        match self.outcome {
            ChangeOutcome::Changeable { .. } => None,
            ChangeOutcome::Refused(reason) => Some(reason),
        }
    }
}

/// Quotes a change of `ticket` at `now`.
pub fn evaluate_change(ticket: &Ticket, now: NaiveDateTime) -> Result<ChangeQuote, DomainError> {
    let quote = |outcome| ChangeQuote {
        original_price: ticket.price,
        outcome,
        rules: &CHANGE_RULES,
    };

    if !ticket.is_active() {
        return Ok(quote(ChangeOutcome::Refused(Refusal::AlreadyChangedOrRefunded)));
    }
    if ticket.departure()? <= now {
        return Ok(quote(ChangeOutcome::Refused(Refusal::AlreadyDeparted)));
    }
    Ok(quote(ChangeOutcome::Changeable {
        min_fee: Money::zero(),
    }))
}
