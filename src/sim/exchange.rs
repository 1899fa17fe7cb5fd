//! Simulated exchange: immediate market fills and a cash/position ledger.
//!
//! Orders fill in full at the oracle price. There is no book, no partial
//! fill and no fee model.

use crate::error::HostError;
use crate::SimTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// One executed market order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fill {
    pub order_id: u64,
    /// Index of the session that sent the order
    pub session: usize,
    pub time: SimTime,
    pub symbol: String,
    /// Signed shares; positive bought, negative sold
    pub qty: i64,
    pub price: Decimal,
}

impl Fill {
    /// Signed notional; positive for buys.
    pub fn notional(&self) -> Decimal {
        Decimal::from(self.qty) * self.price
    }
}

/// Fill log and account state.
#[derive(Debug, Clone)]
pub struct SimExchange {
    initial_cash: Decimal,
    cash: Decimal,
    positions: HashMap<String, i64>,
    fills: Vec<Fill>,
    next_order_id: u64,
}

impl SimExchange {
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            positions: HashMap::new(),
            fills: Vec::new(),
            next_order_id: 1,
        }
    }

    /// Fill a market order at `price`.
    pub fn execute_market_order(
        &mut self,
        session: usize,
        time: SimTime,
        symbol: &str,
        qty: i64,
        price: Decimal,
    ) -> Result<Fill, HostError> {
        if qty == 0 {
            return Err(HostError::OrderRejected {
                instrument: symbol.to_string(),
                reason: "zero quantity".to_string(),
            });
        }
        if price <= Decimal::ZERO {
            return Err(HostError::OrderRejected {
                instrument: symbol.to_string(),
                reason: format!("no valid price ({price})"),
            });
        }

        let fill = Fill {
            order_id: self.next_order_id,
            session,
            time,
            symbol: symbol.to_string(),
            qty,
            price,
        };
        self.next_order_id += 1;

        self.cash -= fill.notional();
        *self.positions.entry(fill.symbol.clone()).or_insert(0) += qty;

        debug!(
            order_id = fill.order_id,
            %symbol,
            qty,
            %price,
            cash = %self.cash,
            "Market order filled"
        );

        self.fills.push(fill.clone());
        Ok(fill)
    }

    pub fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn initial_cash(&self) -> Decimal {
        self.initial_cash
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    /// Net signed shares a session traded in `symbol`.
    pub fn session_position(&self, session: usize, symbol: &str) -> i64 {
        self.session_fills(session, symbol).map(|f| f.qty).sum()
    }

    /// Net signed notional a session traded in `symbol`.
    pub fn session_notional(&self, session: usize, symbol: &str) -> Decimal {
        self.session_fills(session, symbol).map(Fill::notional).sum()
    }

    fn session_fills<'a>(&'a self, session: usize, symbol: &'a str) -> impl Iterator<Item = &'a Fill> {
        self.fills
            .iter()
            .filter(move |f| f.session == session && f.symbol == symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fill_updates_cash_and_position() {
        let mut ex = SimExchange::new(dec!(10000));
        ex.execute_market_order(0, 1, "SYM_A", 10, dec!(100)).unwrap();
        ex.execute_market_order(0, 1, "SYM_B", -20, dec!(50)).unwrap();

        assert_eq!(ex.position("SYM_A"), 10);
        assert_eq!(ex.position("SYM_B"), -20);
        // -1000 for the buy, +1000 for the sale
        assert_eq!(ex.cash(), dec!(10000));
        assert_eq!(ex.fills().len(), 2);
        assert_eq!(ex.fills()[1].order_id, 2);
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let mut ex = SimExchange::new(dec!(0));
        let err = ex.execute_market_order(0, 0, "SYM_A", 0, dec!(1)).unwrap_err();
        assert!(matches!(err, HostError::OrderRejected { .. }));
        assert!(ex.fills().is_empty());
    }

    #[test]
    fn test_non_positive_price_is_rejected() {
        let mut ex = SimExchange::new(dec!(0));
        assert!(ex.execute_market_order(0, 0, "SYM_A", 5, dec!(0)).is_err());
    }

    #[test]
    fn test_per_session_aggregates() {
        let mut ex = SimExchange::new(dec!(0));
        ex.execute_market_order(0, 0, "SYM_A", 10, dec!(100)).unwrap();
        ex.execute_market_order(1, 0, "SYM_A", -4, dec!(100)).unwrap();
        ex.execute_market_order(0, 5, "SYM_A", 5, dec!(102)).unwrap();

        assert_eq!(ex.position("SYM_A"), 11);
        assert_eq!(ex.session_position(0, "SYM_A"), 15);
        assert_eq!(ex.session_notional(0, "SYM_A"), dec!(1510));
        assert_eq!(ex.session_notional(1, "SYM_A"), dec!(-400));
    }
}
