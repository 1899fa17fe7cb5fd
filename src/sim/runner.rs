//! Side-by-side runs of every strategy mode on the same session.
//!
//! Each mode gets its own kernel and ledger; runs execute in parallel on
//! the blocking pool.

use crate::config::Config;
use crate::schedule::StrategyMode;
use crate::sim::report::SessionReport;
use crate::sim::Simulation;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Reports from a comparison, in `StrategyMode::ALL` order.
#[derive(Debug, Clone, Serialize)]
pub struct ModeComparison {
    pub reports: Vec<SessionReport>,
    pub failed: Vec<(StrategyMode, String)>,
}

impl ModeComparison {
    pub fn report(&self, mode: StrategyMode) -> Option<&SessionReport> {
        self.reports.iter().find(|r| r.mode == mode)
    }

    /// Generate a summary comparison table.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════════\n");
        s.push_str("MODE COMPARISON\n");
        s.push_str("═══════════════════════════════════════════════════════════════\n");
        s.push_str(&format!(
            "{:<6} {:>14} {:>9} {:>7} {:>10} {:>10} {:>7}\n",
            "MODE", "EXECUTED", "DONE", "TICKS", "LEG A", "LEG B", "ERRORS"
        ));

        for report in &self.reports {
            s.push_str(&format!(
                "{:<6} {:>14.2} {:>8.2}% {:>7} {:>10} {:>10} {:>7}\n",
                report.mode.as_str(),
                report.final_target,
                report.completion * 100.0,
                report.ticks.len(),
                report.leg_a.position,
                report.leg_b.position,
                report.errors.len(),
            ));
        }

        for (mode, error) in &self.failed {
            s.push_str(&format!("{:<6} FAILED: {}\n", mode.as_str(), error));
        }

        s.push_str("═══════════════════════════════════════════════════════════════\n");
        s
    }

    /// Export one row per mode to CSV.
    pub fn to_csv(&self, path: &str) -> Result<()> {
        use std::io::Write;
        let mut file = std::fs::File::create(path)?;

        writeln!(
            file,
            "mode,notional,final_target,completion,ticks,traded_ticks,position_a,position_b,notional_a,notional_b,errors"
        )?;

        for r in &self.reports {
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{},{},{}",
                r.mode,
                r.signed_total_notional,
                r.final_target,
                r.completion,
                r.ticks.len(),
                r.traded_ticks(),
                r.leg_a.position,
                r.leg_b.position,
                r.leg_a.notional,
                r.leg_b.notional,
                r.errors.len(),
            )?;
        }

        Ok(())
    }
}

/// Runs one simulation per strategy mode.
pub struct ModeComparisonRunner {
    base_config: Config,
    parallelism: usize,
}

impl ModeComparisonRunner {
    pub fn new(base_config: Config, parallelism: usize) -> Self {
        Self {
            base_config,
            parallelism: parallelism.max(1),
        }
    }

    pub async fn run(&self) -> Result<ModeComparison> {
        info!(
            modes = StrategyMode::ALL.len(),
            parallelism = self.parallelism,
            "Starting mode comparison"
        );

        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut handles = Vec::with_capacity(StrategyMode::ALL.len());

        for mode in StrategyMode::ALL {
            let sem = semaphore.clone();
            let mut config = self.base_config.clone();
            config.session.mode = mode;

            let handle = tokio::spawn(async move {
                let _permit = sem.acquire_owned().await?;
                let report = tokio::task::spawn_blocking(move || {
                    Simulation::from_config(&config).map(Simulation::run)
                })
                .await??;
                Ok::<SessionReport, anyhow::Error>(report)
            });
            handles.push((mode, handle));
        }

        let mut reports = Vec::new();
        let mut failed = Vec::new();

        for (mode, handle) in handles {
            match handle.await {
                Ok(Ok(report)) => {
                    info!(
                        %mode,
                        completion = report.completion,
                        ticks = report.ticks.len(),
                        "Mode complete"
                    );
                    reports.push(report);
                }
                Ok(Err(e)) => {
                    warn!(%mode, error = %e, "Mode failed");
                    failed.push((mode, e.to_string()));
                }
                Err(e) => {
                    warn!(%mode, error = %e, "Task panicked");
                    failed.push((mode, e.to_string()));
                }
            }
        }

        Ok(ModeComparison { reports, failed })
    }
}
