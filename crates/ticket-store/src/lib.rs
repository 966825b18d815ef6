//! Storage seam for the booking workflows.
//!
//! Every workflow runs inside one [`StoreTransaction`]: reads, upserts and
//! seat-counter moves either all commit or all roll back when the handle is
//! dropped.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryTicketStore;
pub use postgres::PostgresTicketStore;
pub use store::{SeatCounterKey, StoreTransaction, TicketStore};
