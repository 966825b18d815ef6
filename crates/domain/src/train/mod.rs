//! Trains, seat classes and the inventory ledger arithmetic.

mod inventory;
mod seat_class;

pub use inventory::{InsufficientSeats, SeatInventory};
pub use seat_class::{SeatTier, TrainType};

use common::{StationId, TrainId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;

/// Minutes assumed for a trip when the catalogue has no duration.
pub const DEFAULT_DURATION_MINUTES: u32 = 120;

/// A scheduled train with its remaining seat inventory.
///
/// The catalogue owns train records; the engine only moves seats in and out
/// of [`Train::inventory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Train {
    pub id: TrainId,
    pub code: String,
    pub train_type: TrainType,
    pub start_station_id: StationId,
    pub end_station_id: StationId,
    pub start_station: String,
    pub end_station: String,
    /// Departure time of day, `HH:mm`.
    pub start_time: String,
    /// Arrival time of day, `HH:mm`.
    pub end_time: String,
    pub duration_minutes: Option<u32>,
    /// Base fare, charged as-is for the low tier.
    pub price: Money,
    pub inventory: SeatInventory,
}

impl Train {
    /// Aggregate seats left across the tiers this train type sells.
    pub fn seat_count(&self) -> u32 {
        self.inventory.total(self.train_type.tiers())
    }

    /// Resolves a seat class name to a tier on this train.
    pub fn seat_tier(&self, seat_class: &str) -> Result<SeatTier, DomainError> {
        self.train_type
            .tier_of(seat_class)
            .ok_or_else(|| DomainError::UnsupportedSeatClass {
                train_type: self.train_type,
                seat_class: seat_class.to_string(),
            })
    }

    /// Fare for one seat of the given class.
    pub fn price_for(&self, seat_class: &str) -> Result<Money, DomainError> {
        let (numerator, denominator) = self.seat_tier(seat_class)?.price_multiplier();
        Ok(self.price.scale(numerator, denominator))
    }

    /// Seats left in a class. Unknown or unstocked classes have none.
    pub fn available(&self, seat_class: &str) -> u32 {
        self.train_type
            .tier_of(seat_class)
            .and_then(|tier| self.inventory.get(tier))
            .unwrap_or(0)
    }

    /// Checks, without taking anything, that `count` seats are left.
    pub fn ensure_available(&self, seat_class: &str, count: u32) -> Result<(), DomainError> {
        let available = self.available(seat_class);
        let stocked = self
            .train_type
            .tier_of(seat_class)
            .is_some_and(|tier| self.inventory.has(tier, count));
        if stocked {
            Ok(())
        } else {
            Err(DomainError::InsufficientInventory {
                seat_class: seat_class.to_string(),
                requested: count,
                available,
            })
        }
    }

    /// Coach a class is seated in. Unknown classes fall back to coach 1.
    pub fn coach_for(&self, seat_class: &str) -> u32 {
        self.train_type
            .tier_of(seat_class)
            .map_or(1, |tier| self.train_type.coach(tier))
    }

    /// Trip length in minutes, defaulted when the catalogue has none.
    pub fn trip_minutes(&self) -> u32 {
        self.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES)
    }

    /// True if the train runs between the two named stations.
    pub fn serves(&self, start_station: &str, end_station: &str) -> bool {
        self.start_station == start_station && self.end_station == end_station
    }
}
