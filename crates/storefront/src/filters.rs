//! Custom Askama template filters and shared display formatting.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use rust_decimal::Decimal;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Format a euro amount the French way, e.g. `499,00 €`.
///
/// View structs pre-format their prices with this before rendering.
#[must_use]
pub fn format_eur(amount: Decimal) -> String {
    format!("{amount:.2} €").replace('.', ",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_eur() {
        assert_eq!(format_eur(Decimal::new(49950, 2)), "499,50 €");
        assert_eq!(format_eur(Decimal::from(1300)), "1300,00 €");
        assert_eq!(format_eur(Decimal::ZERO), "0,00 €");
    }
}
