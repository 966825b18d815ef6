//! Per-tier seat counters.

use serde::{Deserialize, Serialize};

use super::SeatTier;

/// Remaining seats per tier. A `None` counter means the tier is not stocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeatInventory {
    pub high: Option<u32>,
    pub mid: Option<u32>,
    pub low: Option<u32>,
}

/// A debit that could not be covered by the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientSeats {
    pub tier: SeatTier,
    pub requested: u32,
    pub available: u32,
}

impl SeatInventory {
    pub fn new(high: Option<u32>, mid: Option<u32>, low: Option<u32>) -> Self {
        Self { high, mid, low }
    }

    /// Returns the counter for a tier.
    pub fn get(&self, tier: SeatTier) -> Option<u32> {
        match tier {
            SeatTier::High => self.high,
            SeatTier::Mid => self.mid,
            SeatTier::Low => self.low,
        }
    }

    fn slot(&mut self, tier: SeatTier) -> &mut Option<u32> {
        match tier {
            SeatTier::High => &mut self.high,
            SeatTier::Mid => &mut self.mid,
            SeatTier::Low => &mut self.low,
        }
    }

    /// Returns true if the tier is stocked and holds at least `count` seats.
    pub fn has(&self, tier: SeatTier, count: u32) -> bool {
        self.get(tier).is_some_and(|available| available >= count)
    }

    /// Takes `count` seats out of a tier.
    ///
    /// Fails without touching the counter when the tier is unstocked or short.
    pub fn debit(&mut self, tier: SeatTier, count: u32) -> Result<(), InsufficientSeats> {
        let slot = self.slot(tier);
        match *slot {
            Some(available) if available >= count => {
                *slot = Some(available - count);
                Ok(())
            }
            other => Err(InsufficientSeats {
                tier,
                requested: count,
                available: other.unwrap_or(0),
            }),
        }
    }

    /// Returns `count` seats to a tier. Unstocked tiers stay unstocked.
    pub fn credit(&mut self, tier: SeatTier, count: u32) {
        if let Some(available) = self.slot(tier).as_mut() {
            *available = available.saturating_add(count);
        }
    }

    /// Sum of the stocked counters among `tiers`.
    pub fn total(&self, tiers: impl IntoIterator<Item = SeatTier>) -> u32 {
        tiers.into_iter().filter_map(|tier| self.get(tier)).sum()
    }
}
