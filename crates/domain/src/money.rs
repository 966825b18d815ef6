//! Fixed-point money in fen (hundredths of a yuan).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Money amount represented in fen to avoid floating point issues.
///
/// Every operation keeps the amount at exactly two decimal places. Scaling
/// operations (`scale`, `percent`, `divide`) round half-up, with ties going
/// away from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in fen (e.g., 55350 = ¥553.50)
    fen: i64,
}

impl Money {
    /// Creates a new Money amount from fen.
    pub const fn from_fen(fen: i64) -> Self {
        Self { fen }
    }

    /// Creates a new Money amount from a whole yuan value.
    pub const fn from_yuan(yuan: i64) -> Self {
        Self { fen: yuan * 100 }
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self { fen: 0 }
    }

    /// Returns the amount in fen.
    pub fn fen(&self) -> i64 {
        self.fen
    }

    /// Returns the yuan portion (whole number).
    pub fn yuan(&self) -> i64 {
        self.fen / 100
    }

    /// Returns the fen portion (remainder after yuan).
    pub fn fen_part(&self) -> i64 {
        self.fen.abs() % 100
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.fen > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.fen == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.fen < 0
    }

    /// Multiplies by a whole quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            fen: self.fen * i64::from(quantity),
        }
    }

    /// Multiplies by the rational factor `numerator / denominator`.
    ///
    /// `scale(3, 2)` is ×1.5, `scale(6, 5)` is ×1.2.
    ///
    /// # Panics
    ///
    /// Panics if `denominator` is zero.
    pub fn scale(&self, numerator: i64, denominator: i64) -> Money {
        Money {
            fen: round_half_up(i128::from(self.fen) * i128::from(numerator), i128::from(denominator)),
        }
    }

    /// Returns `percent`% of this amount.
    pub fn percent(&self, percent: u32) -> Money {
        self.scale(i64::from(percent), 100)
    }

    /// Divides by a whole divisor. Returns `None` when dividing by zero.
    pub fn divide(&self, divisor: u32) -> Option<Money> {
        (divisor != 0).then(|| self.scale(1, i64::from(divisor)))
    }
}

/// Integer division rounding half-up (ties away from zero).
fn round_half_up(value: i128, denominator: i128) -> i64 {
    assert!(denominator != 0, "money scaled by zero denominator");
    let (value, denominator) = if denominator < 0 {
        (-value, -denominator)
    } else {
        (value, denominator)
    };
    let quotient = value / denominator;
    let remainder = (value % denominator).abs();
    let rounded = if remainder * 2 >= denominator {
        quotient + value.signum()
    } else {
        quotient
    };
    rounded as i64
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.fen < 0 {
            write!(f, "-¥{}.{:02}", self.yuan().abs(), self.fen_part())
        } else {
            write!(f, "¥{}.{:02}", self.yuan(), self.fen_part())
        }
    }
}

impl FromStr for Money {
    type Err = DomainError;

    /// Parses a decimal amount such as `"553.5"` or `"-12.345"`.
    ///
    /// Digits beyond the second decimal place are rounded half-up.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidAmount(s.to_string());

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let scale = 10_i128
            .checked_pow(u32::try_from(fraction.len()).map_err(|_| invalid())?)
            .ok_or_else(invalid)?;
        let fraction: i128 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| invalid())?
        };

        let mut scaled = whole * scale + fraction;
        if negative {
            scaled = -scaled;
        }
        Ok(Money {
            fen: round_half_up(scaled * 100, scale),
        })
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            fen: self.fen + rhs.fen,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            fen: self.fen - rhs.fen,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.fen += rhs.fen;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.fen -= rhs.fen;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_money_from_fen() {
        let m = Money::from_fen(55350);
        assert_eq!(m.fen(), 55350);
        assert_eq!(m.yuan(), 553);
        assert_eq!(m.fen_part(), 50);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_fen(55350).to_string(), "¥553.50");
        assert_eq!(Money::from_fen(5).to_string(), "¥0.05");
        assert_eq!(Money::from_fen(-1234).to_string(), "-¥12.34");
    }

    #[test]
    fn test_parse_rounds_half_up() {
        assert_eq!(money("553.5").fen(), 55350);
        assert_eq!(money("27.675").fen(), 2768);
        assert_eq!(money("27.674").fen(), 2767);
        assert_eq!(money("-27.675").fen(), -2768);
        assert_eq!(money("12").fen(), 1200);
        assert_eq!(money(".5").fen(), 50);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("-".parse::<Money>().is_err());
    }

    #[test]
    fn test_percent_rounds_half_up() {
        // 5% of 553.50 is 27.675
        assert_eq!(money("553.50").percent(5), money("27.68"));
        assert_eq!(money("553.50").percent(10), money("55.35"));
        assert_eq!(money("0.10").percent(5), money("0.01"));
    }

    #[test]
    fn test_scale_by_seat_multipliers() {
        assert_eq!(money("553.50").scale(3, 2), money("830.25"));
        assert_eq!(money("553.50").scale(6, 5), money("664.20"));
        assert_eq!(money("99.99").scale(6, 5), money("119.99"));
    }

    #[test]
    fn test_divide() {
        assert_eq!(money("10.00").divide(3), Some(money("3.33")));
        assert_eq!(money("0.05").divide(2), Some(money("0.03")));
        assert_eq!(money("10.00").divide(0), None);
    }

    #[test]
    fn test_negative_ties_round_away_from_zero() {
        assert_eq!(Money::from_fen(-5).scale(1, 10), Money::from_fen(-1));
        assert_eq!(Money::from_fen(-4).scale(1, 10), Money::zero());
    }

    #[test]
    fn test_money_arithmetic() {
        let a = money("450.00");
        let b = money("27.68");
        assert_eq!(a + b, money("477.68"));
        assert_eq!(a - b, money("422.32"));
        assert_eq!(a.multiply(2), money("900.00"));
        let mut c = a;
        c += b;
        c -= b;
        assert_eq!(c, a);
    }

    #[test]
    fn test_sum() {
        let total: Money = [money("450"), money("450"), money("0.01")].into_iter().sum();
        assert_eq!(total, money("900.01"));
    }
}
