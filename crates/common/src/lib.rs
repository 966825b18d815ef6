//! Shared identifier types for the rail ticketing engine.

mod types;

pub use types::{OrderId, PassengerId, StationId, TicketId, TrainId, UserId};
