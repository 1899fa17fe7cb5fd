//! Discrete-event simulation hosting execution sessions.
//!
//! Provides:
//! - A kernel delivering wake-ups in time order
//! - Reference prices and a synthetic volume feed
//! - A fill ledger with cash and positions
//! - Per-session reports and a parallel mode comparison

mod exchange;
mod kernel;
mod oracle;
mod report;
mod runner;
mod volume;

pub use exchange::{Fill, SimExchange};
pub use kernel::{Kernel, KernelStats, SessionSlot};
pub use oracle::{FixedPriceOracle, PriceOracle};
pub use report::{LegSummary, SessionReport};
pub use runner::{ModeComparison, ModeComparisonRunner};
pub use volume::SyntheticVolume;

use crate::config::Config;
use crate::strategy::ExecutionScheduler;
use anyhow::{Context, Result};
use tracing::info;

/// A configured single-session run.
pub struct Simulation {
    kernel: Kernel,
    session: usize,
}

impl Simulation {
    /// Wire kernel, oracle, exchange and volume feed from settings.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let session_config = config.session_config()?;
        let scheduler =
            ExecutionScheduler::new(session_config).context("Failed to build execution session")?;

        let open = config.session_open()?;
        let length = config.session_length();

        let mut oracle = FixedPriceOracle::new(config.market.default_price);
        for (symbol, price) in &config.market.prices {
            oracle = oracle.with_price(symbol.clone(), *price);
        }

        let mut kernel = Kernel::new(
            open,
            open + length,
            Box::new(oracle),
            SimExchange::new(config.market.initial_cash),
        );
        if let Some(rate) = config.market.volume_per_sec {
            kernel = kernel.with_volume(SyntheticVolume::shaped(
                rate,
                config.session.density.build(),
                open,
                length,
            ));
        }
        let session = kernel.add_session(scheduler, open);

        info!(
            mode = %config.session.mode,
            pair = %config.session.pair,
            notional = config.session.notional,
            volume_feed = config.market.volume_per_sec.is_some(),
            "Simulation configured"
        );

        Ok(Self { kernel, session })
    }

    /// Run to completion and report on the session.
    pub fn run(mut self) -> SessionReport {
        let stats = self.kernel.run();
        SessionReport::build(
            self.session,
            &self.kernel.sessions()[self.session],
            self.kernel.exchange(),
            stats,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::StrategyMode;
    use rust_decimal_macros::dec;

    fn config(mode: StrategyMode) -> Config {
        let mut config = Config::default();
        config.session.mode = mode;
        config.session.notional = 200_000.0;
        config.session.session_minutes = 5.0;
        config.market.prices.insert("SYM_B".to_string(), dec!(50));
        config
    }

    #[test]
    fn test_twap_from_config() {
        let report = Simulation::from_config(&config(StrategyMode::Twap)).unwrap().run();

        // 300s at 30s: ticks at 0, 30, ..., 300
        assert_eq!(report.ticks.len(), 11);
        assert!((report.completion - 1.0).abs() < 1e-9);
        assert_eq!(report.leg_a.position, 2000);
        assert_eq!(report.leg_b.position, -4000);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_pov_with_thin_volume_ends_short() {
        let mut config = config(StrategyMode::Pov);
        config.market.volume_per_sec = Some(100.0);
        config.session.density = crate::schedule::DensitySpec::Flat;

        let report = Simulation::from_config(&config).unwrap().run();

        // 10% of 100/s over 300s caps execution at 3000.
        assert!((report.final_target - 3_000.0).abs() < 1e-6);
        assert_eq!(report.phase, "ended");
        assert!(report.completion < 0.05);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = config(StrategyMode::Twap);
        config.session.decision_interval_secs = 0.0;
        assert!(Simulation::from_config(&config).is_err());
    }
}
