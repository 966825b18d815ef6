//! Workflow inputs.

use chrono::NaiveDate;
use common::{PassengerId, StationId, TrainId};
use serde::{Deserialize, Serialize};

/// Books seats on one train for one or more passengers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRequest {
    pub train_id: TrainId,
    /// Must equal the train's origin station name.
    pub start_station: String,
    /// Must equal the train's terminal station name.
    pub end_station: String,
    /// Defaults to the train's origin station.
    #[serde(default)]
    pub start_station_id: Option<StationId>,
    #[serde(default)]
    pub end_station_id: Option<StationId>,
    /// Derived from the station name when absent.
    #[serde(default)]
    pub start_city: Option<String>,
    #[serde(default)]
    pub end_city: Option<String>,
    /// Defaults to the train type's cheapest class.
    #[serde(default)]
    pub seat_class: Option<String>,
    pub passenger_ids: Vec<PassengerId>,
    /// Defaults to today.
    #[serde(default)]
    pub travel_date: Option<NaiveDate>,
}

impl BookRequest {
    pub fn new(
        train_id: TrainId,
        start_station: impl Into<String>,
        end_station: impl Into<String>,
        passenger_ids: Vec<PassengerId>,
    ) -> Self {
        Self {
            train_id,
            start_station: start_station.into(),
            end_station: end_station.into(),
            start_station_id: None,
            end_station_id: None,
            start_city: None,
            end_city: None,
            seat_class: None,
            passenger_ids,
            travel_date: None,
        }
    }

    pub fn with_seat_class(mut self, seat_class: impl Into<String>) -> Self {
        self.seat_class = Some(seat_class.into());
        self
    }

    pub fn on(mut self, travel_date: NaiveDate) -> Self {
        self.travel_date = Some(travel_date);
        self
    }
}

/// Pays for an UNPAID order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayRequest {
    pub order_no: String,
    /// Recorded on the order, never validated.
    pub payment_method: String,
}

impl PayRequest {
    pub fn new(order_no: impl Into<String>, payment_method: impl Into<String>) -> Self {
        Self {
            order_no: order_no.into(),
            payment_method: payment_method.into(),
        }
    }
}

/// Moves a ticket to another train, class or date on the same route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebookRequest {
    pub ticket_no: String,
    pub train_id: TrainId,
    pub seat_class: String,
    pub travel_date: NaiveDate,
    /// Defaults to the original ticket's station.
    #[serde(default)]
    pub start_station_id: Option<StationId>,
    #[serde(default)]
    pub end_station_id: Option<StationId>,
}

impl RebookRequest {
    pub fn new(
        ticket_no: impl Into<String>,
        train_id: TrainId,
        seat_class: impl Into<String>,
        travel_date: NaiveDate,
    ) -> Self {
        Self {
            ticket_no: ticket_no.into(),
            train_id,
            seat_class: seat_class.into(),
            travel_date,
            start_station_id: None,
            end_station_id: None,
        }
    }
}
