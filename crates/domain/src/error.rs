//! Domain error types.

use thiserror::Error;

use crate::order::OrderStatus;
use crate::ticket::TicketStatus;
use crate::train::TrainType;

/// Errors raised by the domain rules themselves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The seat class has no inventory or pricing rule for this train type.
    #[error("Seat class {seat_class} is not offered on {train_type} trains")]
    UnsupportedSeatClass {
        train_type: TrainType,
        seat_class: String,
    },

    /// Not enough seats left in the requested class.
    #[error("Insufficient inventory for {seat_class}: requested {requested}, available {available}")]
    InsufficientInventory {
        seat_class: String,
        requested: u32,
        available: u32,
    },

    /// The ticket is not in a state that allows the requested transition.
    #[error("Invalid ticket state: cannot {action} a {current} ticket")]
    InvalidTicketState {
        current: TicketStatus,
        action: &'static str,
    },

    /// The order is not in a state that allows the requested transition.
    #[error("Invalid order state: cannot {action} a {current} order")]
    InvalidOrderState {
        current: OrderStatus,
        action: &'static str,
    },

    /// A schedule time string was not `HH:mm`.
    #[error("Invalid time format: {0:?}")]
    InvalidTimeFormat(String),

    /// A decimal amount could not be parsed.
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),
}
