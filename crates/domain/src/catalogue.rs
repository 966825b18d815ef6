//! Read-only catalogue records the engine consults.

use common::{PassengerId, StationId, UserId};
use serde::{Deserialize, Serialize};

/// Station name suffixes, longest first so 北京西站 yields 北京.
const STATION_SUFFIXES: [&str; 5] = ["东站", "南站", "西站", "北站", "站"];

/// A station in the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub city: String,
}

/// A traveller registered under a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: PassengerId,
    pub user_id: UserId,
    pub real_name: String,
    /// Identity document number.
    pub card_id: String,
}

/// Derives a city name from a station name by stripping the station suffix.
///
/// Names without a known suffix are returned unchanged. A name that is only
/// a suffix has no city and yields an empty string.
pub fn station_city(station_name: &str) -> &str {
    STATION_SUFFIXES
        .iter()
        .find_map(|suffix| station_name.strip_suffix(suffix))
        .unwrap_or(station_name)
}
