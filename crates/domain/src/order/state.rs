//! Order state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Unpaid ──► Paid
///   │         │
///   └─────────┴──► Canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Booked, seats not yet taken from inventory.
    #[default]
    Unpaid,

    /// Paid, seats debited from inventory.
    Paid,

    /// Canceled, or every ticket under it is gone (terminal state).
    Canceled,
}

impl OrderStatus {
    /// Returns true if the order can be paid in this state.
    pub fn can_pay(&self) -> bool {
        matches!(self, OrderStatus::Unpaid)
    }

    /// Returns true if the order can be canceled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Unpaid | OrderStatus::Paid)
    }

    /// Returns true if seats for this order are held in inventory.
    pub fn holds_inventory(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Canceled)
    }

    /// Numeric status code used in storage.
    pub fn code(&self) -> i16 {
        match self {
            OrderStatus::Unpaid => 0,
            OrderStatus::Paid => 1,
            OrderStatus::Canceled => 2,
        }
    }

    /// Parses a storage code produced by [`OrderStatus::code`].
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(OrderStatus::Unpaid),
            1 => Some(OrderStatus::Paid),
            2 => Some(OrderStatus::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Unpaid => "UNPAID",
            OrderStatus::Paid => "PAID",
            OrderStatus::Canceled => "CANCELED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unpaid() {
        assert_eq!(OrderStatus::default(), OrderStatus::Unpaid);
    }

    #[test]
    fn test_only_unpaid_can_pay() {
        assert!(OrderStatus::Unpaid.can_pay());
        assert!(!OrderStatus::Paid.can_pay());
        assert!(!OrderStatus::Canceled.can_pay());
    }

    #[test]
    fn test_cancel_from_live_states() {
        assert!(OrderStatus::Unpaid.can_cancel());
        assert!(OrderStatus::Paid.can_cancel());
        assert!(!OrderStatus::Canceled.can_cancel());
    }

    #[test]
    fn test_only_paid_holds_inventory() {
        assert!(!OrderStatus::Unpaid.holds_inventory());
        assert!(OrderStatus::Paid.holds_inventory());
        assert!(!OrderStatus::Canceled.holds_inventory());
    }

    #[test]
    fn test_codes_round_trip() {
        for status in [OrderStatus::Unpaid, OrderStatus::Paid, OrderStatus::Canceled] {
            assert_eq!(OrderStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(OrderStatus::from_code(-1), None);
    }

    #[test]
    fn test_terminal() {
        assert!(!OrderStatus::Unpaid.is_terminal());
        assert!(!OrderStatus::Paid.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
    }
}
