use serde::Serialize;
use sqlx::FromRow;
use std::fmt;

/// A row of the `products` table. Rows are seeded by migrations and never
/// written by the service.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

impl Product {
    pub fn new(id: i64, name: impl Into<String>, price: f64) -> Self {
        Product {
            id,
            name: name.into(),
            price,
        }
    }

    pub fn display_price(&self) -> Price {
        Price(self.price)
    }
}

/// Renders a price the way the storefront has always shown it: whole
/// amounts keep a single decimal (`100.0`), anything else uses the shortest
/// representation that round-trips (`9.99`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Price(pub f64);

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if value.is_finite() && value.fract() == 0.0 {
            write!(f, "{value:.1}")
        } else {
            write!(f, "{value}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_prices_use_shortest_form() {
        assert_eq!(Price(9.99).to_string(), "9.99");
        assert_eq!(Price(0.5).to_string(), "0.5");
        assert_eq!(Price(1299.95).to_string(), "1299.95");
    }

    #[test]
    fn whole_prices_keep_one_decimal() {
        assert_eq!(Price(100.0).to_string(), "100.0");
        assert_eq!(Price(0.0).to_string(), "0.0");
        assert_eq!(Price(-3.0).to_string(), "-3.0");
    }

    #[test]
    fn extreme_prices_stay_in_plain_notation() {
        assert_eq!(Price(1e7).to_string(), "10000000.0");
        assert_eq!(Price(12345678.9).to_string(), "12345678.9");
        assert_eq!(Price(0.0001).to_string(), "0.0001");
        assert_eq!(Price(0.001).to_string(), "0.001");
    }

    #[test]
    fn non_finite_prices() {
        assert_eq!(Price(f64::NAN).to_string(), "NaN");
        assert_eq!(Price(f64::INFINITY).to_string(), "inf");
    }
}
