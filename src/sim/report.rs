//! Per-session execution report and exports.

use crate::schedule::StrategyMode;
use crate::sim::exchange::SimExchange;
use crate::sim::kernel::{KernelStats, SessionSlot};
use crate::strategy::TickReport;
use crate::utils::decimal::{round_to_precision, safe_div, to_decimal, weighted_average};
use crate::{nanos_to_secs, SimTime};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// What one leg ended up trading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegSummary {
    pub symbol: String,
    /// Net signed shares
    pub position: i64,
    /// Net signed notional; positive when bought
    pub notional: Decimal,
    /// Share-weighted average fill price
    pub average_price: Decimal,
    pub fills: usize,
}

impl LegSummary {
    fn collect(exchange: &SimExchange, session: usize, symbol: &str) -> Self {
        let fills: Vec<(Decimal, Decimal)> = exchange
            .fills()
            .iter()
            .filter(|f| f.session == session && f.symbol == symbol)
            .map(|f| (f.price, Decimal::from(f.qty.unsigned_abs())))
            .collect();

        Self {
            symbol: symbol.to_string(),
            position: exchange.session_position(session, symbol),
            notional: exchange.session_notional(session, symbol),
            average_price: round_to_precision(weighted_average(&fills), 4),
            fills: fills.len(),
        }
    }
}

/// Outcome of one execution session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub mode: StrategyMode,
    pub pair: String,
    pub hedge: String,
    pub signed_total_notional: f64,
    pub session_start: SimTime,
    pub session_end: SimTime,
    /// Lifecycle phase when the run stopped
    pub phase: String,
    /// Unsigned cumulative target reached
    pub final_target: f64,
    /// `final_target` over the total, 1.0 when fully executed
    pub completion: f64,
    pub leg_a: LegSummary,
    pub leg_b: LegSummary,
    /// Leg A notional minus the signed target, left over from lot rounding
    pub rounding_residual: Decimal,
    /// Account cash movement over the run, across all sessions
    pub cash_change: Decimal,
    pub ticks: Vec<TickReport>,
    pub errors: Vec<String>,
    pub kernel: KernelStats,
    pub generated_at: DateTime<Utc>,
}

impl SessionReport {
    /// Summarize session `index` after a kernel run.
    pub fn build(index: usize, slot: &SessionSlot, exchange: &SimExchange, kernel: KernelStats) -> Self {
        let config = slot.scheduler.config();
        let state = slot.scheduler.state();
        let total = config.signed_total_notional.abs();
        let final_target = state.map_or(0.0, |s| s.cumulative_target_executed);
        let completion = if total > 0.0 { final_target / total } else { 1.0 };
        let leg_a = LegSummary::collect(exchange, index, &config.pair.leg_a);
        let leg_b = LegSummary::collect(exchange, index, &config.pair.leg_b);
        let signed_target = to_decimal(final_target * config.direction());

        Self {
            mode: config.mode,
            pair: config.pair.to_string(),
            hedge: config.hedge.kind.to_string(),
            signed_total_notional: config.signed_total_notional,
            session_start: state.map_or(slot.start, |s| s.session_start),
            session_end: state.map_or(slot.start.saturating_add(config.session_length), |s| s.session_end),
            phase: slot.scheduler.phase().name().to_string(),
            final_target,
            completion,
            rounding_residual: round_to_precision(leg_a.notional - signed_target, 2),
            cash_change: exchange.cash() - exchange.initial_cash(),
            leg_a,
            leg_b,
            ticks: slot.ticks.clone(),
            errors: slot.errors.clone(),
            kernel,
            generated_at: Utc::now(),
        }
    }

    pub fn traded_ticks(&self) -> usize {
        self.ticks.iter().filter(|t| !t.orders.is_empty()).count()
    }

    /// Gross notional across both legs.
    pub fn gross_notional(&self) -> Decimal {
        self.leg_a.notional.abs() + self.leg_b.notional.abs()
    }

    /// Net notional over gross; zero for a perfectly dollar-balanced book.
    pub fn imbalance(&self) -> Decimal {
        safe_div(self.leg_a.notional + self.leg_b.notional, self.gross_notional())
    }

    /// Format the report as a summary string.
    pub fn summary(&self) -> String {
        format!(
            r#"═══════════════════════════════════════════════
EXECUTION REPORT {} {} ({:.0} min)
═══════════════════════════════════════════════
SESSION
  Hedge:             {}
  Notional:          ${:.2}
  Executed:          ${:.2} ({:.2}%)
  Phase:             {}

LEG A ({})
  Position:          {}
  Notional:          ${:.2}
  Avg Price:         ${:.4}
  Fills:             {}

LEG B ({})
  Position:          {}
  Notional:          ${:.2}
  Avg Price:         ${:.4}
  Fills:             {}

ACTIVITY
  Ticks:             {}
  Traded Ticks:      {}
  Imbalance:         {:.4}%
  Rounding Residual: ${:.2}
  Cash Change:       ${:.2}
  Errors:            {}
  Dropped Wake-ups:  {}

Generated {}
═══════════════════════════════════════════════"#,
            self.mode,
            self.pair,
            nanos_to_secs(self.session_end - self.session_start) / 60.0,
            self.hedge,
            self.signed_total_notional,
            self.final_target,
            self.completion * 100.0,
            self.phase,
            self.leg_a.symbol,
            self.leg_a.position,
            self.leg_a.notional,
            self.leg_a.average_price,
            self.leg_a.fills,
            self.leg_b.symbol,
            self.leg_b.position,
            self.leg_b.notional,
            self.leg_b.average_price,
            self.leg_b.fills,
            self.ticks.len(),
            self.traded_ticks(),
            self.imbalance() * Decimal::ONE_HUNDRED,
            self.rounding_residual,
            self.cash_change,
            self.errors.len(),
            self.kernel.events_dropped,
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }

    /// Export the tick log to CSV.
    pub fn ticks_to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        writeln!(
            file,
            "time,elapsed_secs,target,delta,signed_delta,price_a,price_b,qty_a,qty_b,next_wakeup"
        )?;

        for tick in &self.ticks {
            let (price_a, price_b) = match tick.prices {
                Some((a, b)) => (a.to_string(), b.to_string()),
                None => (String::new(), String::new()),
            };
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{},{}",
                tick.time,
                tick.elapsed_secs,
                tick.target,
                tick.delta,
                tick.signed_delta,
                price_a,
                price_b,
                tick.orders.qty_a,
                tick.orders.qty_b,
                tick.next_wakeup.map(|t| t.to_string()).unwrap_or_default(),
            )?;
        }

        Ok(())
    }

    /// Export the full report as pretty JSON.
    pub fn to_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }
}
