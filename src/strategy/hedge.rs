//! Hedge splitting: one notional delta into two integer-lot leg quantities.

use crate::error::ScheduleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Price floor applied before dividing a leg notional by its price.
pub const MIN_PRICE: f64 = 1e-9;

/// Neutrality convention between the two legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HedgeKind {
    /// Equal and opposite notional on both legs
    #[default]
    Dollar,
    /// Leg B notional scaled by the hedge ratio
    Beta,
}

impl fmt::Display for HedgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HedgeKind::Dollar => write!(f, "dollar"),
            HedgeKind::Beta => write!(f, "beta"),
        }
    }
}

impl FromStr for HedgeKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dollar" => Ok(HedgeKind::Dollar),
            "beta" => Ok(HedgeKind::Beta),
            other => Err(ScheduleError::Configuration(format!(
                "unknown hedge kind '{other}'"
            ))),
        }
    }
}

/// How a fractional lot count is rounded to a whole lot.
///
/// Many small ticks rounded the same way in one direction drift realized
/// exposure away from the target, so ties are never broken towards a
/// fixed side by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Nearest lot, ties to the even lot count (banker's rounding)
    #[default]
    HalfEven,
    /// Nearest lot, ties away from zero (symmetric for buys and sells)
    HalfAwayFromZero,
}

impl RoundingPolicy {
    fn round(&self, lots: f64) -> f64 {
        match self {
            RoundingPolicy::HalfEven => lots.round_ties_even(),
            RoundingPolicy::HalfAwayFromZero => lots.round(),
        }
    }
}

/// Immutable hedge settings for a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HedgeRule {
    pub kind: HedgeKind,
    /// Hedge ratio, used only when `kind` is `Beta`
    pub beta: f64,
    /// Shares per lot; quantities are whole multiples of this
    pub lot_size: u32,
    pub rounding: RoundingPolicy,
}

impl Default for HedgeRule {
    fn default() -> Self {
        Self::dollar()
    }
}

impl HedgeRule {
    pub fn dollar() -> Self {
        Self {
            kind: HedgeKind::Dollar,
            beta: 1.0,
            lot_size: 1,
            rounding: RoundingPolicy::HalfEven,
        }
    }

    pub fn beta(beta: f64) -> Self {
        Self {
            kind: HedgeKind::Beta,
            beta,
            ..Self::dollar()
        }
    }

    pub fn with_lot_size(mut self, lot_size: u32) -> Self {
        self.lot_size = lot_size;
        self
    }

    pub fn with_rounding(mut self, rounding: RoundingPolicy) -> Self {
        self.rounding = rounding;
        self
    }

    /// Ratio applied to leg B's notional.
    pub fn effective_beta(&self) -> f64 {
        match self.kind {
            HedgeKind::Beta => self.beta,
            HedgeKind::Dollar => 1.0,
        }
    }

    /// Round a signed share count to whole lots.
    pub fn round_to_lot(&self, shares: f64) -> i64 {
        let lot = self.lot_size.max(1) as f64;
        (self.rounding.round(shares / lot) * lot) as i64
    }
}

/// Signed share quantities for both legs; positive buys, negative sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LegQuantities {
    pub qty_a: i64,
    pub qty_b: i64,
}

impl LegQuantities {
    pub fn is_empty(&self) -> bool {
        self.qty_a == 0 && self.qty_b == 0
    }
}

/// Split a signed notional delta into leg quantities.
///
/// A positive delta adds long-spread exposure: buy leg A, sell leg B.
/// Non-positive prices are floored at [`MIN_PRICE`] instead of failing.
pub fn split(delta_notional: f64, price_a: f64, price_b: f64, rule: &HedgeRule) -> LegQuantities {
    let notional_a = delta_notional;
    let notional_b = -rule.effective_beta() * delta_notional;

    LegQuantities {
        qty_a: rule.round_to_lot(notional_a / price_a.max(MIN_PRICE)),
        qty_b: rule.round_to_lot(notional_b / price_b.max(MIN_PRICE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dollar_neutral_split() {
        let q = split(1000.0, 100.0, 50.0, &HedgeRule::dollar());
        assert_eq!(q, LegQuantities { qty_a: 10, qty_b: -20 });
    }

    #[test]
    fn test_beta_neutral_split() {
        let q = split(1000.0, 100.0, 50.0, &HedgeRule::beta(2.0));
        assert_eq!(q, LegQuantities { qty_a: 10, qty_b: -40 });
    }

    #[test]
    fn test_beta_ignored_for_dollar_kind() {
        let rule = HedgeRule {
            beta: 3.0,
            ..HedgeRule::dollar()
        };
        assert_eq!(split(1000.0, 100.0, 50.0, &rule).qty_b, -20);
    }

    #[test]
    fn test_negative_delta_reverses_sides() {
        let q = split(-1000.0, 100.0, 50.0, &HedgeRule::dollar());
        assert_eq!(q, LegQuantities { qty_a: -10, qty_b: 20 });
    }

    #[test]
    fn test_zero_delta_is_empty() {
        for rule in [HedgeRule::dollar(), HedgeRule::beta(1.7).with_lot_size(100)] {
            let q = split(0.0, 42.0, 13.0, &rule);
            assert_eq!(q, LegQuantities { qty_a: 0, qty_b: 0 });
            assert!(q.is_empty());
        }
    }

    #[test]
    fn test_lot_size_rounding() {
        let rule = HedgeRule::dollar().with_lot_size(100);
        // 26_000 / 100 = 260 shares -> 2.6 lots -> 3 lots
        let q = split(26_000.0, 100.0, 100.0, &rule);
        assert_eq!(q, LegQuantities { qty_a: 300, qty_b: -300 });
    }

    #[test]
    fn test_rounding_policy_on_ties() {
        let even = HedgeRule::dollar();
        let away = HedgeRule::dollar().with_rounding(RoundingPolicy::HalfAwayFromZero);

        // 250 / 100 = 2.5 shares
        assert_eq!(split(250.0, 100.0, 100.0, &even).qty_a, 2);
        assert_eq!(split(250.0, 100.0, 100.0, &away).qty_a, 3);
        assert_eq!(split(250.0, 100.0, 100.0, &away).qty_b, -3);

        // 350 / 100 = 3.5 shares
        assert_eq!(split(350.0, 100.0, 100.0, &even).qty_a, 4);
    }

    #[test]
    fn test_degenerate_price_is_floored() {
        let q = split(1e-6, 0.0, -5.0, &HedgeRule::dollar());
        assert_eq!(q.qty_a, 1000);
        assert_eq!(q.qty_b, -1000);
    }

    #[test]
    fn test_hedge_kind_parsing() {
        assert_eq!("Beta".parse::<HedgeKind>().unwrap(), HedgeKind::Beta);
        assert_eq!("dollar".parse::<HedgeKind>().unwrap(), HedgeKind::Dollar);
        assert!("gamma".parse::<HedgeKind>().is_err());
    }
}
