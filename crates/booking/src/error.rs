//! Booking error types.

use common::{PassengerId, TrainId};
use domain::DomainError;
use thiserror::Error;
use ticket_store::StoreError;

/// Errors returned by the booking workflows.
///
/// Every error leaves persisted state exactly as it was before the call.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Train not found: {0}")]
    TrainNotFound(TrainId),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    #[error("Passenger not found: {0}")]
    PassengerNotFound(PassengerId),

    /// The caller does not own the record and is not an admin.
    #[error("Forbidden")]
    Forbidden,

    /// At least one ticket of the order is no longer ACTIVE.
    #[error("Order {0} has tickets that can no longer be canceled")]
    TicketsNotCancelable(String),

    /// The order has no ACTIVE ticket to pay for.
    #[error("Order {0} has no tickets")]
    EmptyOrder(String),

    #[error("Ticket {0} has already departed")]
    AlreadyDeparted(String),

    /// The requested stations are not the train's route.
    #[error("Route {start} → {end} does not match train route {train_start} → {train_end}")]
    RouteMismatch {
        start: String,
        end: String,
        train_start: String,
        train_end: String,
    },

    #[error("At least one passenger is required")]
    NoPassengers,

    /// Domain rule violation.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Ticket store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Coarse classification of a [`BookingError`] for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidState,
    /// Retryable with a different seat class, train or passenger count.
    InsufficientInventory,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::InsufficientInventory => "insufficient_inventory",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::TrainNotFound(_)
            | BookingError::OrderNotFound(_)
            | BookingError::TicketNotFound(_)
            | BookingError::PassengerNotFound(_) => ErrorKind::NotFound,
            BookingError::Forbidden => ErrorKind::Forbidden,
            BookingError::TicketsNotCancelable(_)
            | BookingError::EmptyOrder(_)
            | BookingError::AlreadyDeparted(_) => ErrorKind::InvalidState,
            BookingError::RouteMismatch { .. } | BookingError::NoPassengers => {
                ErrorKind::InvalidInput
            }
            BookingError::Domain(err) => match err {
                DomainError::InsufficientInventory { .. } => ErrorKind::InsufficientInventory,
                DomainError::InvalidTicketState { .. } | DomainError::InvalidOrderState { .. } => {
                    ErrorKind::InvalidState
                }
                DomainError::UnsupportedSeatClass { .. }
                | DomainError::InvalidTimeFormat(_)
                | DomainError::InvalidAmount(_) => ErrorKind::InvalidInput,
            },
            BookingError::Store(_) => ErrorKind::Internal,
        }
    }

    /// True if the same request may succeed after the caller changes it.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::InsufficientInventory
    }
}

/// Convenience type alias for booking results.
pub type Result<T> = std::result::Result<T, BookingError>;
