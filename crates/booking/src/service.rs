//! Booking, payment, cancellation and rebooking workflows.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use common::{StationId, TrainId, UserId};
use domain::{
    Caller, ChangeQuote, DomainError, Order, RefundQuote, SeatTier, Ticket, TicketIssue,
    evaluate_change, evaluate_refund, station_city,
};
use ticket_store::{SeatCounterKey, StoreTransaction, TicketStore};

use crate::clock::{Clock, SystemClock};
use crate::codes::NumberGenerator;
use crate::config::{BookingConfig, RebookTotalPolicy};
use crate::error::{BookingError, Result};
use crate::requests::{BookRequest, PayRequest, RebookRequest};
use crate::views::{OrderDetail, Rebooking, TicketDetail};

/// Runs the ticket lifecycle workflows against a [`TicketStore`].
///
/// Every workflow opens one store transaction and commits it only once all
/// of its checks have passed, so a failed call changes nothing.
pub struct BookingService<S: TicketStore> {
    store: S,
    clock: Arc<dyn Clock>,
    numbers: NumberGenerator,
    rebook_policy: RebookTotalPolicy,
}

impl<S: TicketStore> BookingService<S> {
    /// Creates a service on the system clock.
    pub fn new(store: S, config: &BookingConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            numbers: NumberGenerator::new(),
            rebook_policy: config.rebook_total_policy,
        }
    }

    /// Replaces the clock the workflows read "now" from.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates an UNPAID order with one ACTIVE ticket per passenger.
    ///
    /// Seats are checked but not taken; payment takes them.
    #[tracing::instrument(skip(self, request), fields(user_id = %caller.user_id, train_id = %request.train_id))]
    pub async fn book(&self, caller: Caller, request: BookRequest) -> Result<OrderDetail> {
        let started = Instant::now();
        let result = self.book_inner(caller, request).await;
        finish("book", started, result)
    }

    async fn book_inner(&self, caller: Caller, request: BookRequest) -> Result<OrderDetail> {
        if request.passenger_ids.is_empty() {
            return Err(BookingError::NoPassengers);
        }
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let train = tx
            .find_train(request.train_id)
            .await?
            .ok_or(BookingError::TrainNotFound(request.train_id))?;
        if !train.serves(&request.start_station, &request.end_station) {
            return Err(BookingError::RouteMismatch {
                start: request.start_station,
                end: request.end_station,
                train_start: train.start_station,
                train_end: train.end_station,
            });
        }

        let mut passengers = Vec::with_capacity(request.passenger_ids.len());
        for &passenger_id in &request.passenger_ids {
            let passenger = tx
                .find_passenger(passenger_id)
                .await?
                .ok_or(BookingError::PassengerNotFound(passenger_id))?;
            passengers.push(passenger);
        }

        let seat_class = request
            .seat_class
            .unwrap_or_else(|| train.train_type.default_seat_class().to_string());
        let price = train.price_for(&seat_class)?;
        let count = u32::try_from(passengers.len()).unwrap_or(u32::MAX);
        train.ensure_available(&seat_class, count)?;

        let travel_date = request.travel_date.unwrap_or_else(|| now.date());
        let order = Order::place(self.numbers.order_no(now), caller.user_id, price, count, now);
        tx.save_order(&order).await?;

        let key = SeatCounterKey::new(train.id, travel_date, seat_class.as_str());
        let first_seat = tx.allocate_seats(&key, count).await?;
        let start_city = request
            .start_city
            .unwrap_or_else(|| station_city(&train.start_station).to_string());
        let end_city = request
            .end_city
            .unwrap_or_else(|| station_city(&train.end_station).to_string());

        let mut tickets = Vec::with_capacity(passengers.len());
        for (seat, passenger) in (first_seat..).zip(&passengers) {
            let ticket = Ticket::issue(
                passenger,
                TicketIssue {
                    ticket_no: self.numbers.ticket_no(now),
                    order_id: order.id,
                    user_id: caller.user_id,
                    train: &train,
                    seat_class: &seat_class,
                    price,
                    seat,
                    travel_date,
                    start_station_id: request.start_station_id.or(Some(train.start_station_id)),
                    end_station_id: request.end_station_id.or(Some(train.end_station_id)),
                    start_city: start_city.clone(),
                    end_city: end_city.clone(),
                    issued_at: now,
                },
            );
            tx.save_ticket(&ticket).await?;
            tickets.push(ticket);
        }
        tx.commit().await?;

        metrics::counter!("orders_booked_total").increment(1);
        tracing::info!(
            order_no = %order.order_no,
            seat_class = %seat_class,
            tickets = count,
            total = %order.total_amount,
            "order booked"
        );
        Ok(OrderDetail::new(order, tickets))
    }

    /// Pays an UNPAID order, taking its seats from inventory.
    ///
    /// Seats are taken per train and class of the order's ACTIVE tickets.
    /// If any group is short, nothing is taken and the order stays UNPAID.
    #[tracing::instrument(skip(self, request), fields(user_id = %caller.user_id, order_no = %request.order_no))]
    pub async fn pay(&self, caller: Caller, request: PayRequest) -> Result<OrderDetail> {
        let started = Instant::now();
        let result = self.pay_inner(caller, request).await;
        finish("pay", started, result)
    }

    async fn pay_inner(&self, caller: Caller, request: PayRequest) -> Result<OrderDetail> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let mut order = load_order(tx.as_mut(), &request.order_no).await?;
        authorize(&caller, order.user_id)?;
        order.mark_paid(request.payment_method, now)?;

        let mut tickets = tx.find_tickets_by_order(order.id).await?;
        let groups = seat_groups(tickets.iter().filter(|ticket| ticket.is_active()));
        if groups.is_empty() {
            return Err(BookingError::EmptyOrder(order.order_no));
        }

        for ((train_id, seat_class), (tier, count)) in &groups {
            let debited = match tier {
                Some(tier) => tx.debit_seats(*train_id, *tier, *count).await?,
                None => false,
            };
            if !debited {
                let available = tx
                    .find_train(*train_id)
                    .await?
                    .map_or(0, |train| train.available(seat_class));
                metrics::counter!("inventory_debit_rejected_total").increment(1);
                tracing::warn!(
                    order_no = %order.order_no,
                    %train_id,
                    seat_class = %seat_class,
                    requested = count,
                    available,
                    "seat debit rejected"
                );
                return Err(DomainError::InsufficientInventory {
                    seat_class: seat_class.clone(),
                    requested: *count,
                    available,
                }
                .into());
            }
        }

        for ticket in tickets.iter_mut().filter(|ticket| ticket.is_active()) {
            ticket.confirm_payment(now)?;
            tx.save_ticket(ticket).await?;
        }
        tx.save_order(&order).await?;
        tx.commit().await?;

        metrics::counter!("orders_paid_total").increment(1);
        tracing::info!(
            order_no = %order.order_no,
            total = %order.total_amount,
            payment_method = order.payment_method.as_deref().unwrap_or_default(),
            "order paid"
        );
        Ok(OrderDetail::new(order, tickets))
    }

    /// Cancels a whole order and every ticket in it.
    ///
    /// Seats go back to inventory only if the order had been paid.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn cancel_order(&self, caller: Caller, order_no: &str) -> Result<OrderDetail> {
        let started = Instant::now();
        let result = self.cancel_order_inner(caller, order_no).await;
        finish("cancel_order", started, result)
    }

    async fn cancel_order_inner(&self, caller: Caller, order_no: &str) -> Result<OrderDetail> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let mut order = load_order(tx.as_mut(), order_no).await?;
        authorize(&caller, order.user_id)?;
        let prior = order.cancel(now)?;

        let mut tickets = tx.find_tickets_by_order(order.id).await?;
        if tickets.iter().any(|ticket| !ticket.is_active()) {
            return Err(BookingError::TicketsNotCancelable(order.order_no));
        }

        if prior.holds_inventory() {
            for ((train_id, _), (tier, count)) in seat_groups(&tickets) {
                if let Some(tier) = tier {
                    tx.credit_seats(train_id, tier, count).await?;
                }
            }
        }
        for ticket in &mut tickets {
            ticket.cancel(now)?;
            tx.save_ticket(ticket).await?;
        }
        tx.save_order(&order).await?;
        tx.commit().await?;

        metrics::counter!("orders_canceled_total").increment(1);
        metrics::counter!("tickets_canceled_total").increment(tickets.len() as u64);
        tracing::info!(
            order_no = %order.order_no,
            prior_status = %prior,
            seats_returned = prior.holds_inventory(),
            "order canceled"
        );
        Ok(OrderDetail::new(order, tickets))
    }

    /// Cancels one ticket, returning its seat if the order had been paid.
    ///
    /// The parent order is re-derived from the tickets left; canceling the
    /// last ACTIVE ticket cancels the order.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn cancel_ticket(&self, caller: Caller, ticket_no: &str) -> Result<OrderDetail> {
        let started = Instant::now();
        let result = self.cancel_ticket_inner(caller, ticket_no).await;
        finish("cancel_ticket", started, result)
    }

    async fn cancel_ticket_inner(&self, caller: Caller, ticket_no: &str) -> Result<OrderDetail> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let ticket = load_ticket(tx.as_mut(), ticket_no).await?;
        authorize(&caller, ticket.user_id)?;
        let mut order = load_parent_order(tx.as_mut(), &ticket).await?;
        // Read again now that the order is locked.
        let mut ticket = load_ticket(tx.as_mut(), ticket_no).await?;
        ticket.cancel(now)?;

        // An unpaid order has not taken its seats yet.
        if order.status.holds_inventory() {
            if let Some(tier) = ticket.seat_tier() {
                tx.credit_seats(ticket.train_id, tier, 1).await?;
            }
        }
        tx.save_ticket(&ticket).await?;

        let tickets = tx.find_tickets_by_order(order.id).await?;
        order.recompute_after_ticket_change(&tickets, now);
        tx.save_order(&order).await?;
        tx.commit().await?;

        metrics::counter!("tickets_canceled_total").increment(1);
        tracing::info!(
            ticket_no = %ticket.ticket_no,
            order_no = %order.order_no,
            order_status = %order.status,
            total = %order.total_amount,
            "ticket canceled"
        );
        Ok(OrderDetail::new(order, tickets))
    }

    /// Moves a ticket to another train, class or date on the same route.
    ///
    /// On a paid order the old seat goes back and a new one is taken in the
    /// same unit of work; an unpaid order only checks the target has room and
    /// leaves the seats to payment. The original becomes CHANGED and its
    /// ACTIVE successor joins the same order.
    #[tracing::instrument(skip(self, request), fields(user_id = %caller.user_id, ticket_no = %request.ticket_no))]
    pub async fn rebook(&self, caller: Caller, request: RebookRequest) -> Result<Rebooking> {
        let started = Instant::now();
        let result = self.rebook_inner(caller, request).await;
        finish("rebook", started, result)
    }

    async fn rebook_inner(&self, caller: Caller, request: RebookRequest) -> Result<Rebooking> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let original = load_ticket(tx.as_mut(), &request.ticket_no).await?;
        authorize(&caller, original.user_id)?;
        let mut order = load_parent_order(tx.as_mut(), &original).await?;
        let mut original = load_ticket(tx.as_mut(), &request.ticket_no).await?;
        if !original.status.can_change() {
            return Err(DomainError::InvalidTicketState {
                current: original.status,
                action: "change",
            }
            .into());
        }
        if original.departure()? <= now {
            return Err(BookingError::AlreadyDeparted(original.ticket_no));
        }

        let target = tx
            .find_train(request.train_id)
            .await?
            .ok_or(BookingError::TrainNotFound(request.train_id))?;
        if !target.serves(&original.start_station, &original.end_station) {
            return Err(BookingError::RouteMismatch {
                start: original.start_station,
                end: original.end_station,
                train_start: target.start_station,
                train_end: target.end_station,
            });
        }
        target.ensure_available(&request.seat_class, 1)?;
        let price = target.price_for(&request.seat_class)?;
        let target_tier = target.seat_tier(&request.seat_class)?;

        if order.status.holds_inventory() {
            if let Some(tier) = original.seat_tier() {
                tx.credit_seats(original.train_id, tier, 1).await?;
            }
            if !tx.debit_seats(target.id, target_tier, 1).await? {
                metrics::counter!("inventory_debit_rejected_total").increment(1);
                tracing::warn!(
                    train_id = %target.id,
                    seat_class = %request.seat_class,
                    "seat debit rejected"
                );
                return Err(DomainError::InsufficientInventory {
                    seat_class: request.seat_class,
                    requested: 1,
                    available: 0,
                }
                .into());
            }
        }

        let key = SeatCounterKey::new(target.id, request.travel_date, request.seat_class.as_str());
        let seat = tx.allocate_seats(&key, 1).await?;
        let replacement = original.successor(TicketIssue {
            ticket_no: self.numbers.ticket_no(now),
            order_id: original.order_id,
            user_id: original.user_id,
            train: &target,
            seat_class: &request.seat_class,
            price,
            seat,
            travel_date: request.travel_date,
            start_station_id: request.start_station_id.or(original.start_station_id),
            end_station_id: request.end_station_id.or(original.end_station_id),
            start_city: original.start_city.clone(),
            end_city: original.end_city.clone(),
            issued_at: now,
        });
        original.mark_changed(now)?;
        tx.save_ticket(&original).await?;
        tx.save_ticket(&replacement).await?;

        if self.rebook_policy == RebookTotalPolicy::Recompute {
            let tickets = tx.find_tickets_by_order(order.id).await?;
            order.recompute_after_ticket_change(&tickets, now);
            tx.save_order(&order).await?;
        }
        tx.commit().await?;

        metrics::counter!("tickets_rebooked_total").increment(1);
        tracing::info!(
            from = %original.ticket_no,
            to = %replacement.ticket_no,
            train_code = %replacement.train_code,
            seat_class = %replacement.seat_class,
            price = %replacement.price,
            "ticket rebooked"
        );
        Ok(Rebooking {
            original,
            replacement,
            order,
        })
    }

    /// Quotes the refund fee for a ticket right now.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn refund_rule(&self, caller: Caller, ticket_no: &str) -> Result<RefundQuote> {
        let started = Instant::now();
        let result = self.refund_rule_inner(caller, ticket_no).await;
        finish("refund_rule", started, result)
    }

    async fn refund_rule_inner(&self, caller: Caller, ticket_no: &str) -> Result<RefundQuote> {
        let ticket = self.owned_ticket(&caller, ticket_no).await?;
        Ok(evaluate_refund(&ticket, self.clock.now())?)
    }

    /// Reports whether a ticket can be rebooked right now.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn change_rule(&self, caller: Caller, ticket_no: &str) -> Result<ChangeQuote> {
        let started = Instant::now();
        let result = self.change_rule_inner(caller, ticket_no).await;
        finish("change_rule", started, result)
    }

    async fn change_rule_inner(&self, caller: Caller, ticket_no: &str) -> Result<ChangeQuote> {
        let ticket = self.owned_ticket(&caller, ticket_no).await?;
        Ok(evaluate_change(&ticket, self.clock.now())?)
    }

    /// Loads a ticket, filling in station names the snapshot lacks.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn ticket_detail(&self, caller: Caller, ticket_no: &str) -> Result<TicketDetail> {
        let started = Instant::now();
        let result = self.ticket_detail_inner(caller, ticket_no).await;
        finish("ticket_detail", started, result)
    }

    async fn ticket_detail_inner(&self, caller: Caller, ticket_no: &str) -> Result<TicketDetail> {
        let mut tx = self.store.begin().await?;
        let ticket = load_ticket(tx.as_mut(), ticket_no).await?;
        authorize(&caller, ticket.user_id)?;

        let start_station =
            station_name(tx.as_mut(), &ticket.start_station, ticket.start_station_id).await?;
        let end_station =
            station_name(tx.as_mut(), &ticket.end_station, ticket.end_station_id).await?;
        Ok(TicketDetail {
            ticket,
            start_station,
            end_station,
        })
    }

    /// Loads an order with all of its tickets.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn order_detail(&self, caller: Caller, order_no: &str) -> Result<OrderDetail> {
        let started = Instant::now();
        let result = self.order_detail_inner(caller, order_no).await;
        finish("order_detail", started, result)
    }

    async fn order_detail_inner(&self, caller: Caller, order_no: &str) -> Result<OrderDetail> {
        let mut tx = self.store.begin().await?;
        let order = load_order(tx.as_mut(), order_no).await?;
        authorize(&caller, order.user_id)?;
        let tickets = tx.find_tickets_by_order(order.id).await?;
        Ok(OrderDetail::new(order, tickets))
    }

    async fn owned_ticket(&self, caller: &Caller, ticket_no: &str) -> Result<Ticket> {
        let mut tx = self.store.begin().await?;
        let ticket = load_ticket(tx.as_mut(), ticket_no).await?;
        authorize(caller, ticket.user_id)?;
        Ok(ticket)
    }
}

/// Seats per (train, seat class), with the inventory tier when the class is known.
type SeatGroups = BTreeMap<(TrainId, String), (Option<SeatTier>, u32)>;

fn seat_groups<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> SeatGroups {
    let mut groups = SeatGroups::new();
    for ticket in tickets {
        let entry = groups
            .entry((ticket.train_id, ticket.seat_class.clone()))
            .or_insert((ticket.seat_tier(), 0));
        entry.1 += 1;
    }
    groups
}

async fn load_order(tx: &mut dyn StoreTransaction, order_no: &str) -> Result<Order> {
    tx.find_order_by_no(order_no)
        .await?
        .ok_or_else(|| BookingError::OrderNotFound(order_no.to_string()))
}

/// Locks the order a ticket belongs to.
async fn load_parent_order(tx: &mut dyn StoreTransaction, ticket: &Ticket) -> Result<Order> {
    tx.find_order(ticket.order_id)
        .await?
        .ok_or_else(|| BookingError::OrderNotFound(ticket.order_id.to_string()))
}

async fn load_ticket(tx: &mut dyn StoreTransaction, ticket_no: &str) -> Result<Ticket> {
    tx.find_ticket_by_no(ticket_no)
        .await?
        .ok_or_else(|| BookingError::TicketNotFound(ticket_no.to_string()))
}

/// The snapshot name if there is one, else the catalogue name, else empty.
async fn station_name(
    tx: &mut dyn StoreTransaction,
    snapshot: &str,
    id: Option<StationId>,
) -> Result<String> {
    if !snapshot.is_empty() {
        return Ok(snapshot.to_string());
    }
    let Some(id) = id else {
        return Ok(String::new());
    };
    Ok(tx
        .find_station(id)
        .await?
        .map(|station| station.name)
        .unwrap_or_default())
}

fn authorize(caller: &Caller, owner: UserId) -> Result<()> {
    if caller.may_access(owner) {
        Ok(())
    } else {
        Err(BookingError::Forbidden)
    }
}

fn finish<T>(workflow: &'static str, started: Instant, result: Result<T>) -> Result<T> {
    metrics::histogram!("workflow_duration_seconds", "workflow" => workflow)
        .record(started.elapsed().as_secs_f64());
    if let Err(err) = &result {
        tracing::warn!(workflow, kind = %err.kind(), error = %err, "workflow failed");
    }
    result
}
