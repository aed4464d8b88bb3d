use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Signed money amount represented as **integer cents**.
///
/// Use this type for **all** monetary values in the engine (balances, entry
/// amounts, totals) to avoid floating-point drift.
///
/// Entry amounts are always positive; the direction of an entry is carried by
/// its [`EntryKind`](crate::EntryKind). Balances and signed effects may be
/// negative.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().cents(), 1000);
/// assert_eq!("10,5".parse::<Money>().unwrap().cents(), 1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest magnitude accepted for a single amount (999,999,999,999.99).
    pub const MAX_AMOUNT: Money = Money(999_999_999_999_99);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Saturating addition, clamped at the `i64` bounds.
    #[must_use]
    pub const fn saturating_add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }

    /// Scales the amount by `numerator / denominator`, rounding half-up (away
    /// from zero on an exact half) to whole cents.
    ///
    /// ```rust
    /// use engine::Money;
    ///
    /// // 100.00 / 0.30 = 333.333... -> 333.33
    /// assert_eq!(Money::new(100_00).mul_div_half_up(100, 30).unwrap(), Money::new(333_33));
    /// // 0.05 / 2 = 0.025 -> 0.03
    /// assert_eq!(Money::new(5).mul_div_half_up(1, 2).unwrap(), Money::new(3));
    /// ```
    pub fn mul_div_half_up(self, numerator: i64, denominator: i64) -> Result<Money, EngineError> {
        if denominator == 0 {
            return Err(EngineError::InvalidAmount("division by zero".to_string()));
        }
        let product = i128::from(self.0) * i128::from(numerator);
        let denominator = i128::from(denominator);
        let quotient = product / denominator;
        let remainder = product % denominator;

        let rounded = if remainder != 0 && 2 * remainder.abs() >= denominator.abs() {
            quotient + product.signum() * denominator.signum()
        } else {
            quotient
        };

        i64::try_from(rounded)
            .map(Money)
            .map_err(|_| EngineError::InvalidAmount("amount too large".to_string()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string into cents.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - magnitude at most [`Money::MAX_AMOUNT`]
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let units_str = parts.next().ok_or_else(invalid)?;
        let cents_str = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }

        if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let units: i64 = units_str.parse().map_err(|_| overflow())?;

        let cents: i64 = match cents_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    2 => frac.parse::<i64>().map_err(|_| invalid())?,
                    _ => return Err(EngineError::InvalidAmount("too many decimals".to_string())),
                }
            }
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .filter(|v| *v <= Self::MAX_AMOUNT.0)
            .ok_or_else(overflow)?;

        let signed = if negative {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money(signed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(Money::new(0).to_string(), "0.00");
        assert_eq!(Money::new(1).to_string(), "0.01");
        assert_eq!(Money::new(10).to_string(), "0.10");
        assert_eq!(Money::new(84945).to_string(), "849.45");
        assert_eq!(Money::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<Money>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().cents(), 1050);
        assert_eq!("10,50".parse::<Money>().unwrap().cents(), 1050);
        assert_eq!("-0.01".parse::<Money>().unwrap().cents(), -1);
        assert_eq!("+1.00".parse::<Money>().unwrap().cents(), 100);
        assert_eq!("  150.55 ".parse::<Money>().unwrap().cents(), 15055);
    }

    #[test]
    fn parse_rejects_more_than_two_decimals() {
        assert!("12.345".parse::<Money>().is_err());
        assert!("0.001".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("-".parse::<Money>().is_err());
    }

    #[test]
    fn half_up_rounds_away_from_zero_on_half() {
        assert_eq!(Money::new(5).mul_div_half_up(1, 2).unwrap(), Money::new(3));
        assert_eq!(Money::new(-5).mul_div_half_up(1, 2).unwrap(), Money::new(-3));
        assert_eq!(Money::new(4).mul_div_half_up(1, 3).unwrap(), Money::new(1));
        assert_eq!(
            Money::new(150_00).mul_div_half_up(100, 60).unwrap(),
            Money::new(250_00)
        );
        assert_eq!(
            Money::new(100_00).mul_div_half_up(100, 70).unwrap(),
            Money::new(142_86)
        );
    }

    #[test]
    fn parse_rejects_amounts_above_the_limit() {
        assert_eq!(
            "999999999999.99".parse::<Money>().unwrap(),
            Money::MAX_AMOUNT
        );
        assert_eq!(
            "-999999999999.99".parse::<Money>().unwrap(),
            -Money::MAX_AMOUNT
        );
        assert_eq!(
            "1000000000000".parse::<Money>(),
            Err(EngineError::InvalidAmount("amount too large".to_string()))
        );
        assert!("92233720368547758.07".parse::<Money>().is_err());
    }

    #[test]
    fn checked_and_saturating_addition_catch_overflow() {
        let big = Money::new(i64::MAX - 1);
        assert_eq!(big.checked_add(Money::new(1)), Some(Money::new(i64::MAX)));
        assert_eq!(big.checked_add(Money::new(2)), None);
        assert_eq!(big.saturating_add(Money::new(5)), Money::new(i64::MAX));
        assert_eq!(
            Money::new(i64::MIN).saturating_add(Money::new(-1)),
            Money::new(i64::MIN)
        );
    }

    #[test]
    fn half_up_rejects_zero_denominator() {
        assert_eq!(
            Money::new(1).mul_div_half_up(1, 0),
            Err(EngineError::InvalidAmount("division by zero".to_string()))
        );
    }

    #[test]
    fn sums_are_exact() {
        let parts = [Money::new(300_00), Money::new(200_00), Money::new(1)];
        assert_eq!(parts.iter().sum::<Money>(), Money::new(500_01));
    }
}
