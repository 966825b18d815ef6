//! Ticket state machine.

use serde::{Deserialize, Serialize};

/// The status of a ticket.
///
/// State transitions:
/// ```text
/// Active ──┬──► Canceled
///          ├──► CheckedIn
///          └──► Changed
/// ```
/// Every state other than `Active` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TicketStatus {
    /// Canceled or refunded (terminal state).
    Canceled,

    /// Valid for travel. Tickets are created in this state.
    #[default]
    Active,

    /// The passenger has boarded (terminal state).
    CheckedIn,

    /// Replaced by a successor ticket through rebooking (terminal state).
    Changed,
}

impl TicketStatus {
    /// Returns true if the ticket can be canceled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(self, TicketStatus::Active)
    }

    /// Returns true if the ticket can be rebooked in this state.
    pub fn can_change(&self) -> bool {
        matches!(self, TicketStatus::Active)
    }

    /// Returns true if the ticket can be checked in in this state.
    pub fn can_check_in(&self) -> bool {
        matches!(self, TicketStatus::Active)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TicketStatus::Active)
    }

    /// Numeric status code used in storage.
    pub fn code(&self) -> i16 {
        match self {
            TicketStatus::Canceled => 0,
            TicketStatus::Active => 1,
            TicketStatus::CheckedIn => 2,
            TicketStatus::Changed => 3,
        }
    }

    /// Parses a storage code produced by [`TicketStatus::code`].
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(TicketStatus::Canceled),
            1 => Some(TicketStatus::Active),
            2 => Some(TicketStatus::CheckedIn),
            3 => Some(TicketStatus::Changed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Canceled => "CANCELED",
            TicketStatus::Active => "ACTIVE",
            TicketStatus::CheckedIn => "CHECKED_IN",
            TicketStatus::Changed => "CHANGED",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
