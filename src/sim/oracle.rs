//! Reference prices for the simulated market.

use crate::SimTime;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Source of reference prices, queried at simulation time.
pub trait PriceOracle: Send + Sync {
    fn observe_price(&self, symbol: &str, at: SimTime) -> Option<Decimal>;
}

/// Constant prices: a per-symbol table with an optional fallback.
#[derive(Debug, Clone, Default)]
pub struct FixedPriceOracle {
    default_price: Option<Decimal>,
    prices: HashMap<String, Decimal>,
}

impl FixedPriceOracle {
    /// Every symbol trades at `default_price` unless overridden.
    pub fn new(default_price: Decimal) -> Self {
        Self {
            default_price: Some(default_price),
            prices: HashMap::new(),
        }
    }

    /// Only symbols in the table have a price.
    pub fn from_table(prices: HashMap<String, Decimal>) -> Self {
        Self {
            default_price: None,
            prices,
        }
    }

    /// Build from integer cents, the unit exchange feeds quote in.
    pub fn from_cents(open_price_cents: i64) -> Self {
        Self::new(Decimal::new(open_price_cents, 2))
    }

    pub fn with_price(mut self, symbol: impl Into<String>, price: Decimal) -> Self {
        self.prices.insert(symbol.into(), price);
        self
    }
}

impl PriceOracle for FixedPriceOracle {
    fn observe_price(&self, symbol: &str, _at: SimTime) -> Option<Decimal> {
        self.prices.get(symbol).copied().or(self.default_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_and_override() {
        let oracle = FixedPriceOracle::from_cents(10_000).with_price("SYM_B", dec!(50));
        assert_eq!(oracle.observe_price("SYM_A", 0), Some(dec!(100.00)));
        assert_eq!(oracle.observe_price("SYM_B", 0), Some(dec!(50)));
    }

    #[test]
    fn test_table_without_fallback() {
        let mut prices = HashMap::new();
        prices.insert("SYM_A".to_string(), dec!(12.5));
        let oracle = FixedPriceOracle::from_table(prices);
        assert_eq!(oracle.observe_price("SYM_A", 0), Some(dec!(12.5)));
        assert_eq!(oracle.observe_price("SYM_X", 0), None);
    }
}
