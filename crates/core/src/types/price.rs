//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
///
/// Amounts are kept as [`Decimal`] in the currency's standard unit
/// (e.g., euros, not cents) to avoid floating-point drift in cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in euros, the marketplace's currency.
    #[must_use]
    pub const fn eur(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::EUR)
    }

    /// A zero price in euros.
    #[must_use]
    pub const fn zero() -> Self {
        Self::eur(Decimal::ZERO)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let amount = format!("{:.2}", self.amount);
        match self.currency_code {
            // French-style display for euro amounts
            CurrencyCode::EUR => write!(f, "{} €", amount.replace('.', ",")),
            CurrencyCode::USD | CurrencyCode::CAD => write!(f, "${amount}"),
            CurrencyCode::GBP => write!(f, "£{amount}"),
        }
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
    USD,
    GBP,
    CAD,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_eur_display() {
        let price = Price::eur(Decimal::new(49950, 2));
        assert_eq!(price.to_string(), "499,50 €");
    }

    #[test]
    fn test_whole_amount_keeps_two_decimals() {
        let price = Price::eur(Decimal::from(500));
        assert_eq!(price.to_string(), "500,00 €");
    }

    #[test]
    fn test_zero() {
        assert_eq!(Price::zero().amount, Decimal::ZERO);
        assert_eq!(Price::zero().to_string(), "0,00 €");
    }

    #[test]
    fn test_serde_roundtrip() {
        let price = Price::eur(Decimal::new(1295, 1));
        let json = serde_json::to_string(&price).unwrap();
        let parsed: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, price);
    }
}
