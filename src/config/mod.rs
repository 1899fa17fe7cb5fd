//! Configuration management for pairs execution runs.
//!
//! Loads settings from an optional `config` file, environment variables of
//! the form `PAIRS__SECTION__FIELD` (e.g. `PAIRS__SESSION__MODE`) and
//! `.env`. CLI flags are applied on top by the binary.

use crate::schedule::{
    DensitySpec, StrategyMode, DEFAULT_FRONT_LOAD_EXPONENT, DEFAULT_PARTICIPATION_RATE,
};
use crate::strategy::{HedgeKind, HedgeRule, InstrumentPair, RoundingPolicy, SessionConfig};
use crate::{checked_secs_to_nanos, secs_to_nanos, SimTime, NS_PER_SEC};
use anyhow::{Context, Result};
use chrono::{NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// What to execute and on which schedule
    #[serde(default)]
    pub session: SessionSettings,
    /// Neutrality convention and lot rounding
    #[serde(default)]
    pub hedge: HedgeSettings,
    /// Simulated market the session trades against
    #[serde(default)]
    pub market: MarketSettings,
    /// Log output
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Strategy mode
    #[serde(default = "default_mode")]
    pub mode: StrategyMode,
    /// Instrument pair as "LEG_A,LEG_B"
    #[serde(default = "default_pair")]
    pub pair: String,
    /// Signed total notional; negative shorts the spread
    #[serde(default = "default_notional")]
    pub notional: f64,
    /// Seconds between decision ticks
    #[serde(default = "default_decision_interval_secs")]
    pub decision_interval_secs: f64,
    /// Session length in minutes
    #[serde(default = "default_session_minutes")]
    pub session_minutes: f64,
    /// IS front-load exponent (0.0-1.0, exclusive)
    #[serde(default = "default_front_load_exponent")]
    pub front_load_exponent: f64,
    /// POV participation rate (0.0-1.0]
    #[serde(default = "default_participation_rate")]
    pub participation_rate: f64,
    /// Intraday density used by VWAP (and to shape synthetic volume)
    #[serde(default)]
    pub density: DensitySpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedgeSettings {
    #[serde(default)]
    pub kind: HedgeKind,
    /// Hedge ratio, only used with `kind = "beta"`
    #[serde(default = "default_beta")]
    pub beta: f64,
    /// Shares per lot
    #[serde(default = "default_lot_size")]
    pub lot_size: u32,
    #[serde(default)]
    pub rounding: RoundingPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSettings {
    /// Session open, time of day (HH:MM:SS)
    #[serde(default = "default_open")]
    pub open: String,
    /// Reference price for symbols without an override
    #[serde(default = "default_price")]
    pub default_price: Decimal,
    /// Per-symbol reference prices
    #[serde(default)]
    pub prices: HashMap<String, Decimal>,
    /// Synthetic market volume in notional per second; unset = no feed
    #[serde(default)]
    pub volume_per_sec: Option<f64>,
    /// Starting cash of the execution account
    #[serde(default = "default_initial_cash")]
    pub initial_cash: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Emit JSON lines instead of human-readable logs
    #[serde(default)]
    pub json: bool,
    /// Directory for rolling log files
    #[serde(default = "default_log_directory")]
    pub directory: String,
}

// Default value functions
fn default_mode() -> StrategyMode {
    StrategyMode::Twap
}

fn default_pair() -> String {
    "SYM_A,SYM_B".to_string()
}

fn default_notional() -> f64 {
    1_000_000.0
}

fn default_decision_interval_secs() -> f64 {
    30.0
}

fn default_session_minutes() -> f64 {
    60.0
}

fn default_front_load_exponent() -> f64 {
    DEFAULT_FRONT_LOAD_EXPONENT
}

fn default_participation_rate() -> f64 {
    DEFAULT_PARTICIPATION_RATE
}

fn default_beta() -> f64 {
    1.0
}

fn default_lot_size() -> u32 {
    1
}

fn default_open() -> String {
    "09:30:00".to_string()
}

fn default_price() -> Decimal {
    Decimal::new(10000, 2) // $100.00
}

fn default_initial_cash() -> Decimal {
    Decimal::new(10_000_000, 0)
}

fn default_log_directory() -> String {
    "logs".to_string()
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("PAIRS").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.session.decision_interval_secs > 0.0
                && checked_secs_to_nanos(self.session.decision_interval_secs).is_some(),
            "decision_interval_secs must be positive and finite, got {}",
            self.session.decision_interval_secs
        );
        anyhow::ensure!(
            self.session.session_minutes > 0.0
                && checked_secs_to_nanos(self.session.session_minutes * 60.0).is_some(),
            "session_minutes must be positive and finite, got {}",
            self.session.session_minutes
        );
        anyhow::ensure!(
            self.market.default_price > Decimal::ZERO,
            "default_price must be positive"
        );
        anyhow::ensure!(
            self.market.volume_per_sec.map_or(true, |v| v >= 0.0),
            "volume_per_sec must not be negative"
        );
        anyhow::ensure!(
            self.session_open()?.checked_add(self.session_length()).is_some(),
            "session_minutes {} overflows the simulation clock",
            self.session.session_minutes
        );
        self.session_config()?
            .validate()
            .context("Invalid session")?;

        Ok(())
    }

    /// Session open as nanoseconds after midnight.
    pub fn session_open(&self) -> Result<SimTime> {
        let open = NaiveTime::parse_from_str(&self.market.open, "%H:%M:%S")
            .with_context(|| format!("Invalid session open '{}'", self.market.open))?;
        Ok(open.num_seconds_from_midnight() as SimTime * NS_PER_SEC)
    }

    pub fn session_length(&self) -> SimTime {
        secs_to_nanos(self.session.session_minutes * 60.0)
    }

    pub fn hedge_rule(&self) -> HedgeRule {
        HedgeRule {
            kind: self.hedge.kind,
            beta: self.hedge.beta,
            lot_size: self.hedge.lot_size,
            rounding: self.hedge.rounding,
        }
    }

    /// Core session description for these settings.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let pair = InstrumentPair::parse(&self.session.pair)?;
        let config = SessionConfig::new(
            self.session.mode,
            pair,
            self.hedge_rule(),
            self.session.notional,
            secs_to_nanos(self.session.decision_interval_secs),
            self.session_length(),
        )
        .with_front_load_exponent(self.session.front_load_exponent)
        .with_participation_rate(self.session.participation_rate);

        Ok(match self.session.mode {
            StrategyMode::Vwap => config.with_density(self.session.density.build()),
            _ => config,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionSettings::default(),
            hedge: HedgeSettings::default(),
            market: MarketSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            pair: default_pair(),
            notional: default_notional(),
            decision_interval_secs: default_decision_interval_secs(),
            session_minutes: default_session_minutes(),
            front_load_exponent: default_front_load_exponent(),
            participation_rate: default_participation_rate(),
            density: DensitySpec::default(),
        }
    }
}

impl Default for HedgeSettings {
    fn default() -> Self {
        Self {
            kind: HedgeKind::default(),
            beta: default_beta(),
            lot_size: default_lot_size(),
            rounding: RoundingPolicy::default(),
        }
    }
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            open: default_open(),
            default_price: default_price(),
            prices: HashMap::new(),
            volume_per_sec: None,
            initial_cash: default_initial_cash(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            json: false,
            directory: default_log_directory(),
        }
    }
}
