//! Domain layer for the rail ticketing engine.
//!
//! This crate holds the rules that do not need storage:
//! - Fixed-point [`Money`]
//! - Trains, the seat-class table and the per-tier inventory ledger
//! - The ticket state machine and the order aggregate
//! - Refund and change rule evaluation

pub mod caller;
pub mod catalogue;
pub mod error;
pub mod money;
pub mod order;
pub mod rules;
pub mod ticket;
pub mod train;

pub use caller::{Caller, Role};
pub use catalogue::{Passenger, Station, station_city};
pub use error::DomainError;
pub use money::Money;
pub use order::{Order, OrderStatus};
pub use rules::{
    ChangeOutcome, ChangeQuote, RefundOutcome, RefundQuote, Refusal, evaluate_change,
    evaluate_refund,
};
pub use ticket::{Ticket, TicketIssue, TicketStatus, seat_info};
pub use train::{DEFAULT_DURATION_MINUTES, SeatInventory, SeatTier, Train, TrainType};
