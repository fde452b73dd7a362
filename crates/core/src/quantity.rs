use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TradeError;

/// Exact base-10 share/contract count.
///
/// Running totals are folded with decimal arithmetic so that any number of
/// entries and exits that cancel out lands on exactly zero. `Quantity` is
/// `Copy`: every read hands back an independent value, so callers can never
/// mutate an owner's accumulator through the returned value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[must_use]
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// # Errors
    ///
    /// Returns `TradeError::Overflow` if the sum is out of range. The value is
    /// left unchanged in that case.
    pub fn add(&mut self, delta: Self) -> Result<(), TradeError> {
        self.0 = self
            .0
            .checked_add(delta.0)
            .ok_or(TradeError::Overflow { operation: "quantity add" })?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `TradeError::Overflow` if the difference is out of range. The
    /// value is left unchanged in that case.
    pub fn subtract(&mut self, delta: Self) -> Result<(), TradeError> {
        self.0 = self
            .0
            .checked_sub(delta.0)
            .ok_or(TradeError::Overflow { operation: "quantity subtract" })?;
        Ok(())
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Independent copy of the current value.
    #[must_use]
    pub const fn snapshot(&self) -> Self {
        Self(self.0)
    }

    #[must_use]
    pub fn min(a: Self, b: Self) -> Self {
        Ord::min(a, b)
    }
}

impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i32> for Quantity {
    fn from(value: i32) -> Self {
        Self(Decimal::from(value))
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl From<u32> for Quantity {
    fn from(value: u32) -> Self {
        Self(Decimal::from(value))
    }
}

impl FromStr for Quantity {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tenths_cancel_to_exact_zero() {
        let mut total = Quantity::ZERO;
        let tenth = Quantity::new(dec!(0.1));

        for _ in 0..10_000 {
            total.add(tenth).unwrap();
        }
        assert_eq!(total.value(), dec!(1000));

        for _ in 0..10_000 {
            total.subtract(tenth).unwrap();
        }
        assert!(total.is_zero());
    }

    #[test]
    fn test_fractional_round_trip_reaches_zero() {
        let mut total = Quantity::ZERO;
        total.add(Quantity::new(dec!(100.5))).unwrap();
        total.subtract(Quantity::new(dec!(50.25))).unwrap();
        assert_eq!(total.value(), dec!(50.25));
        total.subtract(Quantity::new(dec!(50.25))).unwrap();
        assert!(total.is_zero());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut total = Quantity::from(100);
        let mut copy = total.snapshot();
        copy.add(Quantity::from(50)).unwrap();

        assert_eq!(total.value(), dec!(100));
        assert_eq!(copy.value(), dec!(150));

        total.subtract(Quantity::from(100)).unwrap();
        assert!(total.is_zero());
        assert_eq!(copy.value(), dec!(150));
    }

    #[test]
    fn test_ordering_and_min() {
        let small = Quantity::new(dec!(-3));
        let large = Quantity::new(dec!(7.5));

        assert!(small < large);
        assert_eq!(Quantity::min(small, large), small);
        assert_eq!(Quantity::min(large, small), small);
        assert!(small.is_negative());
        assert!(large.is_positive());
    }

    #[test]
    fn test_overflow_is_an_error_and_keeps_value() {
        let mut total = Quantity::new(Decimal::MAX - dec!(1));
        let result = total.add(Quantity::new(dec!(10)));

        assert_eq!(result, Err(TradeError::Overflow { operation: "quantity add" }));
        assert_eq!(total.value(), Decimal::MAX - dec!(1));

        let mut low = Quantity::new(Decimal::MIN + dec!(1));
        assert!(low.subtract(Quantity::new(dec!(10))).is_err());
        assert_eq!(low.value(), Decimal::MIN + dec!(1));
    }

    #[test]
    fn test_parse_and_display() {
        let qty: Quantity = " 75.50 ".parse().unwrap();
        assert_eq!(qty.value(), dec!(75.5));
        assert_eq!(qty.to_string(), "75.5");
        assert!("abc".parse::<Quantity>().is_err());
    }
}
