//! Value Objects for the order core

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currencies the payment provider charges in whole units.
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd", "vuv", "xaf", "xof", "xpf",
];

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_lowercase() } }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_positive(&self) -> bool { self.amount > Decimal::ZERO }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }

    pub fn multiply(&self, qty: Quantity) -> Money { Money::new(self.amount * Decimal::from(qty.value()), &self.currency) }

    /// Amount in the smallest unit the payment provider bills in.
    pub fn minor_units(&self) -> Result<i64, MoneyError> {
        let exponent = if ZERO_DECIMAL_CURRENCIES.contains(&self.currency.as_str()) { 0 } else { 2 };
        let scaled = self.amount * Decimal::from(10_i64.pow(exponent));
        if scaled.fract() != Decimal::ZERO { return Err(MoneyError::SubMinorUnit); }
        scaled.to_i64().ok_or(MoneyError::Overflow)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", self.amount, self.currency.to_uppercase()) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum MoneyError { CurrencyMismatch, SubMinorUnit, Overflow }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrencyMismatch => write!(f, "Currency mismatch"),
            Self::SubMinorUnit => write!(f, "Amount is finer than the currency's minor unit"),
            Self::Overflow => write!(f, "Amount out of range"),
        }
    }
}

/// Quantity value object
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
    /// Whether a stock level of `available` covers this quantity.
    pub fn fits_within(&self, available: i64) -> bool { i64::from(self.0) <= available }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_add() {
        let a = Money::new(dec!(100), "usd");
        let b = Money::new(dec!(50), "USD");
        assert_eq!(a.add(&b).unwrap().amount(), dec!(150));
        assert_eq!(a.add(&Money::zero("jpy")), Err(MoneyError::CurrencyMismatch));
    }

    #[test]
    fn minor_units_respect_currency_exponent() {
        assert_eq!(Money::new(dec!(19.99), "usd").minor_units(), Ok(1999));
        assert_eq!(Money::new(dec!(500), "jpy").minor_units(), Ok(500));
        assert_eq!(Money::new(dec!(19.99), "jpy").minor_units(), Err(MoneyError::SubMinorUnit));
    }

    #[test]
    fn quantity_fits_within_stock() {
        assert!(Quantity::new(2).fits_within(5));
        assert!(Quantity::new(5).fits_within(5));
        assert!(!Quantity::new(2).fits_within(1));
        assert!(!Quantity::new(1).fits_within(-3));
    }
}
