//! Schedule engine: elapsed session time to cumulative target notional.
//!
//! - `curve`: the per-mode shapes (linear, front-loaded, volume-weighted)
//! - `density`: intraday volume densities for VWAP
//! - `participation`: the volume-capped participation strategy
//!
//! The engine returns an unsigned magnitude; trade direction is applied by
//! the execution loop.

mod curve;
mod density;
mod participation;

pub use curve::{ScheduleCurve, VWAP_STEPS};
pub use density::{Density, DensitySpec};
pub use participation::ParticipationCap;

use crate::error::{ScheduleError, ScheduleResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Execution strategy selected for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyMode {
    /// Time-weighted: linear in elapsed time.
    #[serde(rename = "TWAP")]
    Twap,
    /// Volume-weighted: follows an intraday density.
    #[serde(rename = "VWAP")]
    Vwap,
    /// Participation-rate: sized against observed market volume.
    #[serde(rename = "POV")]
    Pov,
    /// Implementation shortfall: front-loaded power curve.
    #[serde(rename = "IS")]
    ImplementationShortfall,
}

impl StrategyMode {
    pub const ALL: [StrategyMode; 4] = [
        StrategyMode::Twap,
        StrategyMode::Vwap,
        StrategyMode::Pov,
        StrategyMode::ImplementationShortfall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyMode::Twap => "TWAP",
            StrategyMode::Vwap => "VWAP",
            StrategyMode::Pov => "POV",
            StrategyMode::ImplementationShortfall => "IS",
        }
    }
}

impl fmt::Display for StrategyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyMode {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TWAP" => Ok(StrategyMode::Twap),
            "VWAP" => Ok(StrategyMode::Vwap),
            "POV" => Ok(StrategyMode::Pov),
            "IS" => Ok(StrategyMode::ImplementationShortfall),
            _ => Err(ScheduleError::InvalidMode(s.to_string())),
        }
    }
}

/// Inputs shared by every schedule mode.
#[derive(Debug, Clone)]
pub struct ScheduleParams {
    /// Unsigned size to execute over the session
    pub total_notional: f64,
    /// Session length in seconds
    pub session_length_secs: f64,
    /// Intraday density, required by VWAP
    pub density: Option<Density>,
    /// IS exponent in (0, 1); smaller front-loads harder
    pub front_load_exponent: f64,
    /// POV participation fraction in (0, 1]
    pub participation_rate: f64,
}

pub const DEFAULT_FRONT_LOAD_EXPONENT: f64 = 0.6;
pub const DEFAULT_PARTICIPATION_RATE: f64 = 0.10;

impl ScheduleParams {
    /// Params for a session; the notional sign is dropped.
    pub fn new(signed_total_notional: f64, session_length_secs: f64) -> Self {
        Self {
            total_notional: signed_total_notional.abs(),
            session_length_secs,
            density: None,
            front_load_exponent: DEFAULT_FRONT_LOAD_EXPONENT,
            participation_rate: DEFAULT_PARTICIPATION_RATE,
        }
    }

    pub fn with_density(mut self, density: Density) -> Self {
        self.density = Some(density);
        self
    }

    pub fn with_front_load_exponent(mut self, exponent: f64) -> Self {
        self.front_load_exponent = exponent;
        self
    }

    pub fn with_participation_rate(mut self, rate: f64) -> Self {
        self.participation_rate = rate;
        self
    }
}

impl ScheduleCurve {
    /// Compile the curve for a mode, failing if the params cannot support it.
    ///
    /// POV has no time curve of its own; its backbone is linear.
    pub fn for_mode(mode: StrategyMode, params: &ScheduleParams) -> ScheduleResult<Self> {
        match mode {
            StrategyMode::Twap | StrategyMode::Pov => Ok(ScheduleCurve::Linear),
            StrategyMode::ImplementationShortfall => Ok(ScheduleCurve::FrontLoaded {
                exponent: params.front_load_exponent,
            }),
            StrategyMode::Vwap => {
                let density = params.density.clone().ok_or_else(|| {
                    ScheduleError::Configuration("VWAP requires a density function".to_string())
                })?;
                Ok(ScheduleCurve::VolumeWeighted {
                    density,
                    steps: VWAP_STEPS,
                })
            }
        }
    }
}

/// Cumulative unsigned notional that should be executed after `elapsed_secs`.
pub fn cumulative_target(
    mode: StrategyMode,
    elapsed_secs: f64,
    params: &ScheduleParams,
) -> ScheduleResult<f64> {
    let curve = ScheduleCurve::for_mode(mode, params)?;
    Ok(params.total_notional * curve.fraction(elapsed_secs, params.session_length_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ScheduleParams {
        ScheduleParams::new(100_000.0, 3600.0)
    }

    #[test]
    fn test_mode_parsing_is_case_insensitive() {
        assert_eq!("twap".parse::<StrategyMode>().unwrap(), StrategyMode::Twap);
        assert_eq!(" Vwap ".parse::<StrategyMode>().unwrap(), StrategyMode::Vwap);
        assert_eq!(
            "is".parse::<StrategyMode>().unwrap(),
            StrategyMode::ImplementationShortfall
        );
        assert_eq!(
            "MOC".parse::<StrategyMode>(),
            Err(ScheduleError::InvalidMode("MOC".to_string()))
        );
    }

    #[test]
    fn test_mode_display_round_trips_through_from_str() {
        for mode in StrategyMode::ALL {
            assert_eq!(mode.to_string().parse::<StrategyMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_negative_notional_is_unsigned() {
        let p = ScheduleParams::new(-5_000.0, 60.0);
        assert_eq!(p.total_notional, 5_000.0);
    }

    #[test]
    fn test_twap_monotone_and_exact_at_end() {
        let p = params();
        let mut last = 0.0;
        for i in 0..=3600 {
            let v = cumulative_target(StrategyMode::Twap, i as f64, &p).unwrap();
            assert!(v >= last);
            last = v;
        }
        assert_eq!(
            cumulative_target(StrategyMode::Twap, 3600.0, &p).unwrap(),
            p.total_notional
        );
    }

    #[test]
    fn test_is_executes_ahead_of_twap() {
        let p = params().with_front_load_exponent(0.6);
        for i in 0..3600 {
            let t = i as f64;
            let is = cumulative_target(StrategyMode::ImplementationShortfall, t, &p).unwrap();
            let twap = cumulative_target(StrategyMode::Twap, t, &p).unwrap();
            assert!(is >= twap, "IS behind TWAP at t={t}: {is} < {twap}");
        }
    }

    #[test]
    fn test_vwap_without_density_is_a_configuration_error() {
        let err = cumulative_target(StrategyMode::Vwap, 10.0, &params()).unwrap_err();
        assert!(matches!(err, ScheduleError::Configuration(_)));
    }

    #[test]
    fn test_vwap_completes_for_any_positive_density() {
        let densities = [
            Density::flat(),
            Density::u_shape(2.0),
            Density::u_shape(0.5),
            Density::from_fn("ramp", |x| x),
            Density::from_fn("spike", |x| if (0.2..0.25).contains(&x) { 10.0 } else { 0.0 }),
        ];
        for density in densities {
            let label = density.label().to_string();
            let p = params().with_density(density);
            let end = cumulative_target(StrategyMode::Vwap, p.session_length_secs, &p).unwrap();
            assert!(
                (end - p.total_notional).abs() < 1e-6 * p.total_notional,
                "{label}: {end}"
            );
        }
    }

    #[test]
    fn test_pov_falls_back_to_linear_backbone() {
        let p = params();
        let pov = cumulative_target(StrategyMode::Pov, 900.0, &p).unwrap();
        let twap = cumulative_target(StrategyMode::Twap, 900.0, &p).unwrap();
        assert_eq!(pov, twap);
    }

    #[test]
    fn test_cumulative_target_is_deterministic() {
        let p = params().with_density(Density::u_shape(2.0));
        let inputs = [0.0, 17.5, 1200.0, 3599.9, 3600.0, 7200.0];
        for mode in StrategyMode::ALL {
            let first: Vec<f64> = inputs
                .iter()
                .map(|&t| cumulative_target(mode, t, &p).unwrap())
                .collect();
            let second: Vec<f64> = inputs
                .iter()
                .map(|&t| cumulative_target(mode, t, &p).unwrap())
                .collect();
            assert_eq!(first, second);
        }
    }
}
