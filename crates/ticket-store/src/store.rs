use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{OrderId, PassengerId, StationId, TrainId};
use domain::{Order, Passenger, SeatTier, Station, Ticket, Train};

use crate::Result;

/// Identifies one seat-number sequence: a seat class on a train on a date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeatCounterKey {
    pub train_id: TrainId,
    pub travel_date: NaiveDate,
    pub seat_class: String,
}

impl SeatCounterKey {
    pub fn new(train_id: TrainId, travel_date: NaiveDate, seat_class: impl Into<String>) -> Self {
        Self {
            train_id,
            travel_date,
            seat_class: seat_class.into(),
        }
    }
}

/// Entry point of a ticket store.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Opens a transaction.
    ///
    /// Dropping the returned handle without calling
    /// [`StoreTransaction::commit`] discards every change made through it.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

#[async_trait]
impl<T: TicketStore + ?Sized> TicketStore for Arc<T> {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        (**self).begin().await
    }
}

/// A unit of work over trains, orders, tickets and seat counters.
///
/// The order row is the lock that serializes workflows on one order and its
/// tickets. Callers that change tickets find the order first and read the
/// tickets after that.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn find_train(&mut self, id: TrainId) -> Result<Option<Train>>;

    async fn find_station(&mut self, id: StationId) -> Result<Option<Station>>;

    async fn find_passenger(&mut self, id: PassengerId) -> Result<Option<Passenger>>;

    /// Finds an order and locks it until the transaction ends. A concurrent
    /// transaction asking for the same order waits, then sees what was
    /// committed.
    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>>;

    /// Same locking as [`StoreTransaction::find_order`].
    async fn find_order_by_no(&mut self, order_no: &str) -> Result<Option<Order>>;

    async fn find_ticket_by_no(&mut self, ticket_no: &str) -> Result<Option<Ticket>>;

    /// Returns every ticket of an order, whatever its status, oldest first.
    async fn find_tickets_by_order(&mut self, order_id: OrderId) -> Result<Vec<Ticket>>;

    /// Inserts or replaces an order.
    ///
    /// Fails with `Duplicate` if another order already uses the number.
    async fn save_order(&mut self, order: &Order) -> Result<()>;

    /// Inserts or replaces a ticket.
    ///
    /// Fails with `Duplicate` if another ticket already uses the number.
    async fn save_ticket(&mut self, ticket: &Ticket) -> Result<()>;

    /// Takes `count` seats from a tier if, and only if, enough are left.
    ///
    /// Returns `false` without touching anything when the counter is short,
    /// unstocked, or the train does not exist.
    async fn debit_seats(&mut self, train_id: TrainId, tier: SeatTier, count: u32)
    -> Result<bool>;

    /// Returns `count` seats to a tier. Unstocked tiers are left alone.
    async fn credit_seats(&mut self, train_id: TrainId, tier: SeatTier, count: u32) -> Result<()>;

    /// Reserves `count` consecutive seat numbers and returns the first one.
    ///
    /// Numbers start at 1 for every key and are never handed out twice.
    async fn allocate_seats(&mut self, key: &SeatCounterKey, count: u32) -> Result<u32>;

    /// Makes every change in this transaction durable.
    async fn commit(self: Box<Self>) -> Result<()>;
}
