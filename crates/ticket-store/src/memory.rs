use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, PassengerId, StationId, TicketId, TrainId};
use domain::{Order, Passenger, SeatTier, Station, Ticket, Train};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Result, StoreError,
    store::{SeatCounterKey, StoreTransaction, TicketStore},
};

#[derive(Debug, Clone, Default)]
struct State {
    trains: HashMap<TrainId, Train>,
    stations: HashMap<StationId, Station>,
    passengers: HashMap<PassengerId, Passenger>,
    orders: HashMap<OrderId, Order>,
    tickets: HashMap<TicketId, Ticket>,
    seat_counters: HashMap<SeatCounterKey, u32>,
}

/// In-memory ticket store implementation for testing.
///
/// Transactions are serialized: `begin` waits for the previous transaction
/// to finish, works on a copy of the state and writes it back on commit.
#[derive(Clone, Default)]
pub struct InMemoryTicketStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryTicketStore {
    /// Creates a new empty in-memory ticket store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a train in the catalogue.
    pub async fn insert_train(&self, train: Train) {
        self.state.lock().await.trains.insert(train.id, train);
    }

    /// Adds or replaces a station in the catalogue.
    pub async fn insert_station(&self, station: Station) {
        self.state.lock().await.stations.insert(station.id, station);
    }

    /// Adds or replaces a passenger in the catalogue.
    pub async fn insert_passenger(&self, passenger: Passenger) {
        self.state
            .lock()
            .await
            .passengers
            .insert(passenger.id, passenger);
    }

    /// Returns the committed state of a train.
    pub async fn train(&self, id: TrainId) -> Option<Train> {
        self.state.lock().await.trains.get(&id).cloned()
    }

    /// Returns the committed state of an order.
    pub async fn order(&self, id: OrderId) -> Option<Order> {
        self.state.lock().await.orders.get(&id).cloned()
    }

    /// Returns every committed ticket of an order, oldest first.
    pub async fn tickets_for_order(&self, order_id: OrderId) -> Vec<Ticket> {
        self.state.lock().await.tickets_for_order(order_id)
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Returns the total number of tickets stored.
    pub async fn ticket_count(&self) -> usize {
        self.state.lock().await.tickets.len()
    }
}

impl State {
    fn tickets_for_order(&self, order_id: OrderId) -> Vec<Ticket> {
        let mut tickets: Vec<_> = self
            .tickets
            .values()
            .filter(|ticket| ticket.order_id == order_id)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.ticket_no.cmp(&b.ticket_no))
        });
        tickets
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = State::clone(&guard);
        Ok(Box::new(InMemoryTransaction { guard, working }))
    }
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<State>,
    working: State,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn find_train(&mut self, id: TrainId) -> Result<Option<Train>> {
        Ok(self.working.trains.get(&id).cloned())
    }

    async fn find_station(&mut self, id: StationId) -> Result<Option<Station>> {
        Ok(self.working.stations.get(&id).cloned())
    }

    async fn find_passenger(&mut self, id: PassengerId) -> Result<Option<Passenger>> {
        Ok(self.working.passengers.get(&id).cloned())
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn find_order_by_no(&mut self, order_no: &str) -> Result<Option<Order>> {
        Ok(self
            .working
            .orders
            .values()
            .find(|order| order.order_no == order_no)
            .cloned())
    }

    async fn find_ticket_by_no(&mut self, ticket_no: &str) -> Result<Option<Ticket>> {
        Ok(self
            .working
            .tickets
            .values()
            .find(|ticket| ticket.ticket_no == ticket_no)
            .cloned())
    }

    async fn find_tickets_by_order(&mut self, order_id: OrderId) -> Result<Vec<Ticket>> {
        Ok(self.working.tickets_for_order(order_id))
    }

    async fn save_order(&mut self, order: &Order) -> Result<()> {
        let taken = self
            .working
            .orders
            .values()
            .any(|existing| existing.order_no == order.order_no && existing.id != order.id);
        if taken {
            return Err(StoreError::Duplicate {
                entity: "order",
                number: order.order_no.clone(),
            });
        }
        self.working.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn save_ticket(&mut self, ticket: &Ticket) -> Result<()> {
        let taken = self
            .working
            .tickets
            .values()
            .any(|existing| existing.ticket_no == ticket.ticket_no && existing.id != ticket.id);
        if taken {
            return Err(StoreError::Duplicate {
                entity: "ticket",
                number: ticket.ticket_no.clone(),
            });
        }
        self.working.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn debit_seats(
        &mut self,
        train_id: TrainId,
        tier: SeatTier,
        count: u32,
    ) -> Result<bool> {
        let Some(train) = self.working.trains.get_mut(&train_id) else {
            return Ok(false);
        };
        Ok(train.inventory.debit(tier, count).is_ok())
    }

    async fn credit_seats(&mut self, train_id: TrainId, tier: SeatTier, count: u32) -> Result<()> {
        if let Some(train) = self.working.trains.get_mut(&train_id) {
            train.inventory.credit(tier, count);
        }
        Ok(())
    }

    async fn allocate_seats(&mut self, key: &SeatCounterKey, count: u32) -> Result<u32> {
        let allocated = self.working.seat_counters.entry(key.clone()).or_insert(0);
        let first = *allocated + 1;
        *allocated += count;
        Ok(first)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
