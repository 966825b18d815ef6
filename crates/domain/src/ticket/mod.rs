//! Tickets and their lifecycle.

mod state;

pub use state::TicketStatus;

use chrono::{NaiveDate, NaiveDateTime};
use common::{OrderId, PassengerId, StationId, TicketId, TrainId, UserId};
use serde::{Deserialize, Serialize};

use crate::catalogue::Passenger;
use crate::error::DomainError;
use crate::money::Money;
use crate::rules::departure_at;
use crate::train::{SeatTier, Train, TrainType};

/// Composes the seat label printed on a ticket.
pub fn seat_info(coach: u32, seat: u32) -> String {
    format!("{coach}车{seat}号座")
}

/// One passenger's seat on one train on one date.
///
/// Passenger, train and station fields are snapshots taken when the ticket
/// was issued; later catalogue edits do not reach them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub ticket_no: String,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub passenger_id: PassengerId,
    pub passenger_name: String,
    pub passenger_card: String,
    pub train_id: TrainId,
    pub train_code: String,
    pub train_type: TrainType,
    pub start_station_id: Option<StationId>,
    pub end_station_id: Option<StationId>,
    pub start_station: String,
    pub end_station: String,
    pub start_city: String,
    pub end_city: String,
    pub seat_class: String,
    pub coach: u32,
    pub seat: u32,
    pub seat_info: String,
    pub price: Money,
    pub travel_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: u32,
    pub status: TicketStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Everything needed to issue a fresh ticket on a train.
#[derive(Debug, Clone)]
pub struct TicketIssue<'a> {
    pub ticket_no: String,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub train: &'a Train,
    pub seat_class: &'a str,
    pub price: Money,
    pub seat: u32,
    pub travel_date: NaiveDate,
    pub start_station_id: Option<StationId>,
    pub end_station_id: Option<StationId>,
    pub start_city: String,
    pub end_city: String,
    pub issued_at: NaiveDateTime,
}

impl Ticket {
    /// Issues an ACTIVE ticket for a passenger.
    pub fn issue(passenger: &Passenger, issue: TicketIssue<'_>) -> Self {
        Self::issue_for(
            passenger.id,
            passenger.real_name.clone(),
            passenger.card_id.clone(),
            issue,
        )
    }

    /// Issues the successor of this ticket on another train.
    ///
    /// The passenger snapshot and the order carry over; everything about
    /// the trip comes from `issue`.
    pub fn successor(&self, issue: TicketIssue<'_>) -> Self {
        Self::issue_for(
            self.passenger_id,
            self.passenger_name.clone(),
            self.passenger_card.clone(),
            issue,
        )
    }

    fn issue_for(
        passenger_id: PassengerId,
        passenger_name: String,
        passenger_card: String,
        issue: TicketIssue<'_>,
    ) -> Self {
        let train = issue.train;
        let coach = train.coach_for(issue.seat_class);
        Self {
            id: TicketId::new(),
            ticket_no: issue.ticket_no,
            order_id: issue.order_id,
            user_id: issue.user_id,
            passenger_id,
            passenger_name,
            passenger_card,
            train_id: train.id,
            train_code: train.code.clone(),
            train_type: train.train_type,
            start_station_id: issue.start_station_id,
            end_station_id: issue.end_station_id,
            start_station: train.start_station.clone(),
            end_station: train.end_station.clone(),
            start_city: issue.start_city,
            end_city: issue.end_city,
            seat_class: issue.seat_class.to_string(),
            coach,
            seat: issue.seat,
            seat_info: seat_info(coach, issue.seat),
            price: issue.price,
            travel_date: issue.travel_date,
            start_time: train.start_time.clone(),
            end_time: train.end_time.clone(),
            duration_minutes: train.trip_minutes(),
            status: TicketStatus::Active,
            created_at: issue.issued_at,
            updated_at: issue.issued_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TicketStatus::Active
    }

    /// Inventory tier this ticket's seat was taken from, if the class is known.
    pub fn seat_tier(&self) -> Option<SeatTier> {
        self.train_type.tier_of(&self.seat_class)
    }

    /// Scheduled departure, the travel date at the start time.
    pub fn departure(&self) -> Result<NaiveDateTime, DomainError> {
        departure_at(self.travel_date, &self.start_time)
    }

    /// ACTIVE → CANCELED.
    pub fn cancel(&mut self, now: NaiveDateTime) -> Result<(), DomainError> {
        self.transition(TicketStatus::Canceled, "cancel", now)
    }

    /// ACTIVE → CHANGED, once a successor ticket exists.
    pub fn mark_changed(&mut self, now: NaiveDateTime) -> Result<(), DomainError> {
        self.transition(TicketStatus::Changed, "change", now)
    }

    /// ACTIVE → CHECKED_IN.
    pub fn check_in(&mut self, now: NaiveDateTime) -> Result<(), DomainError> {
        self.transition(TicketStatus::CheckedIn, "check in", now)
    }

    /// Confirms an ACTIVE ticket after payment, stamping the update time.
    pub fn confirm_payment(&mut self, now: NaiveDateTime) -> Result<(), DomainError> {
        self.transition(TicketStatus::Active, "confirm payment for", now)
    }

    fn transition(
        &mut self,
        to: TicketStatus,
        action: &'static str,
        now: NaiveDateTime,
    ) -> Result<(), DomainError> {
        if !self.is_active() {
            return Err(DomainError::InvalidTicketState {
                current: self.status,
                action,
            });
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}
