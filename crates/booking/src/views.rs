//! Workflow results.

use domain::{Order, Ticket, TrainType};
use serde::Serialize;

/// An order with every ticket issued under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    /// Oldest first, whatever their status.
    pub tickets: Vec<Ticket>,
    /// Taken from the first ticket; absent for an order without tickets.
    pub summary: Option<TripSummary>,
}

impl OrderDetail {
    pub fn new(order: Order, tickets: Vec<Ticket>) -> Self {
        let summary = tickets.first().map(TripSummary::from);
        Self {
            order,
            tickets,
            summary,
        }
    }

    /// Tickets that still hold a seat.
    pub fn active_tickets(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.iter().filter(|ticket| ticket.is_active())
    }
}

/// The trip an order is for, as printed on the order page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripSummary {
    pub train_code: String,
    pub train_type: TrainType,
    pub start_station: String,
    pub end_station: String,
    pub departure_time: String,
    pub arrival_time: String,
}

impl From<&Ticket> for TripSummary {
    fn from(ticket: &Ticket) -> Self {
        Self {
            train_code: ticket.train_code.clone(),
            train_type: ticket.train_type,
            start_station: ticket.start_station.clone(),
            end_station: ticket.end_station.clone(),
            departure_time: ticket.start_time.clone(),
            arrival_time: ticket.end_time.clone(),
        }
    }
}

/// A ticket with its station names resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketDetail {
    pub ticket: Ticket,
    pub start_station: String,
    pub end_station: String,
}

/// Both halves of a rebooking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rebooking {
    /// The original ticket, now CHANGED.
    pub original: Ticket,
    /// The new ACTIVE ticket.
    pub replacement: Ticket,
    pub order: Order,
}
