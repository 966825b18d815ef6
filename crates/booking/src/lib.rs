//! Seat-inventory and ticket-lifecycle workflows.
//!
//! [`BookingService`] books, pays for, cancels and rebooks tickets against a
//! [`ticket_store::TicketStore`]:
//! 1. Booking creates an UNPAID order and its tickets without taking seats
//! 2. Payment takes the seats, first payer wins
//! 3. Cancellation gives paid seats back and re-derives the order
//! 4. Rebooking swaps a paid seat for one on the target train; it re-derives
//!    the order total only under [`config::RebookTotalPolicy::Recompute`]
//!
//! Each workflow is a single store transaction.

pub mod clock;
pub mod codes;
pub mod config;
pub mod error;
pub mod requests;
pub mod service;
pub mod views;

pub use clock::{Clock, FixedClock, SystemClock};
pub use codes::NumberGenerator;
pub use config::{BookingConfig, RebookTotalPolicy};
pub use error::{BookingError, ErrorKind, Result};
pub use requests::{BookRequest, PayRequest, RebookRequest};
pub use service::BookingService;
pub use views::{OrderDetail, Rebooking, TicketDetail, TripSummary};
