use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Signed amount of the local currency, in **whole units**.
///
/// The local currency (rupiah) has no minor unit in practice, so amounts are
/// integers and every monetary field in the engine (rates, fees, costs,
/// expenses) uses this type to avoid floating-point drift.
///
/// The arithmetic operators saturate at the `i64` bounds, so a garbled input
/// can never wrap a total around to a plausible value. Use the `checked_*`
/// methods to detect the overflow instead.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let rate = Money::new(500_000);
/// assert_eq!(rate.amount(), 500_000);
/// assert_eq!(rate.to_string(), "Rp 500.000");
/// ```
///
/// Parsing from user input (accepts an optional `Rp` prefix and `.` or `,` as
/// thousands separator):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("150000".parse::<Money>().unwrap().amount(), 150_000);
/// assert_eq!("Rp 150.000".parse::<Money>().unwrap().amount(), 150_000);
/// assert!("150.00".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from whole currency units.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Returns the raw amount.
    #[must_use]
    pub const fn amount(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Checked multiplication by a count (returns `None` on overflow).
    #[must_use]
    pub fn checked_mul(self, rhs: i64) -> Option<Money> {
        self.0.checked_mul(rhs).map(Money)
    }

    /// The amount as `f64`, for ratios and averages only.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        write!(f, "{sign}Rp {grouped}")
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
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, rhs: i64) -> Self::Output {
        Money(self.0.saturating_mul(rhs))
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a user-typed amount.
    ///
    /// Accepts an optional leading `+`/`-`, an optional `Rp`/`IDR` prefix and
    /// `.` or `,` as thousands separators.
    ///
    /// Validation rules:
    /// - separators must split the digits in groups of exactly three
    ///   (rejects `150.00`, which looks like a decimal)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::Validation("empty amount".to_string());
        let invalid = || EngineError::Validation("invalid amount".to_string());
        let overflow = || EngineError::Validation("amount too large".to_string());

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

        let rest = rest.trim_start();
        let rest = ["Rp", "rp", "RP", "IDR", "idr"]
            .iter()
            .find_map(|prefix| rest.strip_prefix(prefix))
            .unwrap_or(rest)
            .trim_start()
            .trim_start_matches('.')
            .trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let groups: Vec<&str> = rest.split(['.', ',']).collect();
        if groups.iter().any(|g| g.is_empty() || !g.chars().all(|c| c.is_ascii_digit())) {
            return Err(invalid());
        }
        if groups.len() > 1 {
            let head_ok = groups[0].len() <= 3;
            let tail_ok = groups[1..].iter().all(|g| g.len() == 3);
            if !head_ok || !tail_ok {
                return Err(invalid());
            }
        }

        let digits: String = groups.concat();
        let amount: i64 = digits.parse().map_err(|_| overflow())?;
        let signed = if negative {
            amount.checked_neg().ok_or_else(overflow)?
        } else {
            amount
        };

        Ok(Money(signed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_groups_thousands() {
        assert_eq!(Money::new(0).to_string(), "Rp 0");
        assert_eq!(Money::new(999).to_string(), "Rp 999");
        assert_eq!(Money::new(1_000).to_string(), "Rp 1.000");
        assert_eq!(Money::new(650_000).to_string(), "Rp 650.000");
        assert_eq!(Money::new(12_500_000).to_string(), "Rp 12.500.000");
        assert_eq!(Money::new(-150_000).to_string(), "-Rp 150.000");
    }

    #[test]
    fn parse_accepts_separators_and_prefix() {
        assert_eq!("500000".parse::<Money>().unwrap().amount(), 500_000);
        assert_eq!("500.000".parse::<Money>().unwrap().amount(), 500_000);
        assert_eq!("500,000".parse::<Money>().unwrap().amount(), 500_000);
        assert_eq!("Rp 1.250.000".parse::<Money>().unwrap().amount(), 1_250_000);
        assert_eq!("Rp.50.000".parse::<Money>().unwrap().amount(), 50_000);
        assert_eq!("-Rp 2.000".parse::<Money>().unwrap().amount(), -2_000);
        assert_eq!("  75 ".parse::<Money>().unwrap().amount(), 75);
    }

    #[test]
    fn parse_rejects_decimals_and_garbage() {
        assert!("150.00".parse::<Money>().is_err());
        assert!("1.2345".parse::<Money>().is_err());
        assert!("12a".parse::<Money>().is_err());
        assert!("Rp".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
    }

    #[test]
    fn arithmetic_and_sum() {
        let total: Money = [Money::new(100), Money::new(250), Money::new(-50)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::new(300));
        assert_eq!(Money::new(50_000) * 3, Money::new(150_000));
        assert_eq!(Money::new(i64::MAX).checked_add(Money::new(1)), None);
    }

    #[test]
    fn operators_saturate_at_the_bounds() {
        assert_eq!(Money::new(i64::MAX) + Money::new(1), Money::new(i64::MAX));
        assert_eq!(Money::new(i64::MIN) - Money::new(1), Money::new(i64::MIN));
        assert_eq!(Money::new(i64::MAX / 2) * 3, Money::new(i64::MAX));
        assert_eq!(Money::new(1_000) * i64::MIN, Money::new(i64::MIN));
        assert_eq!(-Money::new(i64::MIN), Money::new(i64::MAX));
        assert_eq!(Money::new(i64::MAX / 2).checked_mul(3), None);

        let mut total = Money::new(i64::MAX - 1);
        total += Money::new(10);
        assert_eq!(total, Money::new(i64::MAX));
    }
}
