//! Train types and the seat-class table.

use serde::{Deserialize, Serialize};

/// The kind of train, which decides which seat classes it sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainType {
    /// High-speed rail (高铁).
    Bullet,
    /// Multiple-unit express (动车).
    Express,
    /// Conventional service with sleepers and hard seats.
    Regular,
}

/// One of the three inventory counters a train carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeatTier {
    High,
    Mid,
    Low,
}

impl SeatTier {
    pub const ALL: [SeatTier; 3] = [SeatTier::High, SeatTier::Mid, SeatTier::Low];

    /// Fare multiplier applied to the base price, as `(numerator, denominator)`.
    pub fn price_multiplier(&self) -> (i64, i64) {
        match self {
            SeatTier::High => (3, 2),
            SeatTier::Mid => (6, 5),
            SeatTier::Low => (1, 1),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeatTier::High => "high",
            SeatTier::Mid => "mid",
            SeatTier::Low => "low",
        }
    }
}

impl std::fmt::Display for SeatTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TrainType {
    /// Maps a catalogue label to a train type.
    ///
    /// Anything other than 高铁 or 动车 is a regular service.
    pub fn from_label(label: &str) -> Self {
        match label {
            "高铁" => TrainType::Bullet,
            "动车" => TrainType::Express,
            _ => TrainType::Regular,
        }
    }

    /// Returns the catalogue label.
    pub fn label(&self) -> &'static str {
        match self {
            TrainType::Bullet => "高铁",
            TrainType::Express => "动车",
            TrainType::Regular => "普通",
        }
    }

    /// Returns the stable storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainType::Bullet => "bullet",
            TrainType::Express => "express",
            TrainType::Regular => "regular",
        }
    }

    /// Parses a storage name produced by [`TrainType::as_str`].
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "bullet" => Some(TrainType::Bullet),
            "express" => Some(TrainType::Express),
            "regular" => Some(TrainType::Regular),
            _ => None,
        }
    }

    /// Returns the seat class name sold for a tier, if this train type has one.
    pub fn seat_class(&self, tier: SeatTier) -> Option<&'static str> {
        match (self, tier) {
            (TrainType::Bullet, SeatTier::High) => Some("商务座"),
            (TrainType::Bullet, SeatTier::Mid) => Some("一等座"),
            (TrainType::Bullet, SeatTier::Low) => Some("二等座"),
            (TrainType::Express, SeatTier::High) => None,
            (TrainType::Express, SeatTier::Mid) => Some("一等座"),
            (TrainType::Express, SeatTier::Low) => Some("二等座"),
            (TrainType::Regular, SeatTier::High) => Some("软卧"),
            (TrainType::Regular, SeatTier::Mid) => Some("硬卧"),
            (TrainType::Regular, SeatTier::Low) => Some("硬座"),
        }
    }

    /// Resolves a seat class name to its tier on this train type.
    pub fn tier_of(&self, seat_class: &str) -> Option<SeatTier> {
        SeatTier::ALL
            .into_iter()
            .find(|tier| self.seat_class(*tier) == Some(seat_class))
    }

    /// The class sold when a booking names none.
    pub fn default_seat_class(&self) -> &'static str {
        match self {
            TrainType::Regular => "硬座",
            TrainType::Bullet | TrainType::Express => "二等座",
        }
    }

    /// Coach a tier is seated in.
    ///
    /// Express trains have no high tier, so their classes start at coach 1.
    pub fn coach(&self, tier: SeatTier) -> u32 {
        match (self, tier) {
            (TrainType::Express, SeatTier::Mid) => 1,
            (TrainType::Express, SeatTier::Low) => 2,
            (_, SeatTier::High) => 1,
            (_, SeatTier::Mid) => 2,
            (_, SeatTier::Low) => 3,
        }
    }

    /// Returns the tiers whose counters count toward the train's seat total.
    pub fn tiers(&self) -> impl Iterator<Item = SeatTier> + use<> {
        let train_type = *self;
        SeatTier::ALL
            .into_iter()
            .filter(move |tier| train_type.seat_class(*tier).is_some())
    }
}

impl std::fmt::Display for TrainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_table_round_trips() {
        for train_type in [TrainType::Bullet, TrainType::Express, TrainType::Regular] {
            for tier in train_type.tiers() {
                let class = train_type.seat_class(tier).unwrap();
                assert_eq!(train_type.tier_of(class), Some(tier));
            }
        }
    }

    #[test]
    fn test_express_has_no_high_tier() {
        assert_eq!(TrainType::Express.seat_class(SeatTier::High), None);
        assert_eq!(TrainType::Express.tier_of("商务座"), None);
        assert_eq!(TrainType::Express.tiers().count(), 2);
    }

    #[test]
    fn test_cross_type_classes_are_unknown() {
        assert_eq!(TrainType::Bullet.tier_of("硬座"), None);
        assert_eq!(TrainType::Regular.tier_of("二等座"), None);
        assert_eq!(TrainType::Bullet.tier_of("站票"), None);
    }

    #[test]
    fn test_default_class_is_low_tier() {
        for train_type in [TrainType::Bullet, TrainType::Express, TrainType::Regular] {
            assert_eq!(
                train_type.tier_of(train_type.default_seat_class()),
                Some(SeatTier::Low)
            );
        }
    }

    #[test]
    fn test_coaches() {
        assert_eq!(TrainType::Bullet.coach(SeatTier::High), 1);
        assert_eq!(TrainType::Bullet.coach(SeatTier::Low), 3);
        assert_eq!(TrainType::Express.coach(SeatTier::Mid), 1);
        assert_eq!(TrainType::Express.coach(SeatTier::Low), 2);
        assert_eq!(TrainType::Regular.coach(SeatTier::Mid), 2);
    }

    #[test]
    fn test_labels() {
        assert_eq!(TrainType::from_label("高铁"), TrainType::Bullet);
        assert_eq!(TrainType::from_label("动车"), TrainType::Express);
        assert_eq!(TrainType::from_label("普快"), TrainType::Regular);
        assert_eq!(TrainType::parse(TrainType::Express.as_str()), Some(TrainType::Express));
        assert_eq!(TrainType::parse("maglev"), None);
    }
}
