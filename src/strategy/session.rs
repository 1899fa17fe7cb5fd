//! Immutable description of one spread execution session.

use crate::error::{ScheduleError, ScheduleResult};
use crate::schedule::{
    Density, ScheduleParams, StrategyMode, DEFAULT_FRONT_LOAD_EXPONENT,
    DEFAULT_PARTICIPATION_RATE,
};
use crate::strategy::hedge::HedgeRule;
use crate::{nanos_to_secs, SimTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two instruments traded as a spread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentPair {
    pub leg_a: String,
    pub leg_b: String,
}

impl InstrumentPair {
    pub fn new(leg_a: impl Into<String>, leg_b: impl Into<String>) -> ScheduleResult<Self> {
        let pair = Self {
            leg_a: leg_a.into(),
            leg_b: leg_b.into(),
        };
        if pair.leg_a.is_empty() || pair.leg_b.is_empty() {
            return Err(ScheduleError::Configuration(
                "instrument identifiers must not be empty".to_string(),
            ));
        }
        if pair.leg_a == pair.leg_b {
            return Err(ScheduleError::Configuration(format!(
                "pair legs must differ, got {} twice",
                pair.leg_a
            )));
        }
        Ok(pair)
    }

    /// Parse `"SYM_A,SYM_B"`.
    pub fn parse(s: &str) -> ScheduleResult<Self> {
        match s.split_once(',') {
            Some((a, b)) => Self::new(a.trim(), b.trim()),
            None => Err(ScheduleError::Configuration(format!(
                "pair must be 'LEG_A,LEG_B', got '{s}'"
            ))),
        }
    }
}

impl fmt::Display for InstrumentPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.leg_a, self.leg_b)
    }
}

/// Session parameters fixed at construction.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub mode: StrategyMode,
    pub pair: InstrumentPair,
    pub hedge: HedgeRule,
    /// Sign is the spread direction, magnitude the size to execute
    pub signed_total_notional: f64,
    pub decision_interval: SimTime,
    pub session_length: SimTime,
    pub density: Option<Density>,
    pub front_load_exponent: f64,
    pub participation_rate: f64,
}

impl SessionConfig {
    pub fn new(
        mode: StrategyMode,
        pair: InstrumentPair,
        hedge: HedgeRule,
        signed_total_notional: f64,
        decision_interval: SimTime,
        session_length: SimTime,
    ) -> Self {
        Self {
            mode,
            pair,
            hedge,
            signed_total_notional,
            decision_interval,
            session_length,
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

    /// +1 for a long-spread session, -1 for short.
    pub fn direction(&self) -> f64 {
        if self.signed_total_notional >= 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    pub fn session_length_secs(&self) -> f64 {
        nanos_to_secs(self.session_length)
    }

    /// Unsigned schedule inputs derived from this session.
    pub fn schedule_params(&self) -> ScheduleParams {
        let params = ScheduleParams::new(self.signed_total_notional, self.session_length_secs())
            .with_front_load_exponent(self.front_load_exponent)
            .with_participation_rate(self.participation_rate);
        match &self.density {
            Some(density) => params.with_density(density.clone()),
            None => params,
        }
    }

    /// Reject sessions that cannot run.
    pub fn validate(&self) -> ScheduleResult<()> {
        let fail = |msg: String| Err(ScheduleError::Configuration(msg));

        if !self.signed_total_notional.is_finite() {
            return fail(format!("notional must be finite, got {}", self.signed_total_notional));
        }
        if self.decision_interval <= 0 {
            return fail(format!(
                "decision interval must be positive, got {}ns",
                self.decision_interval
            ));
        }
        if self.session_length <= 0 {
            return fail(format!(
                "session length must be positive, got {}ns",
                self.session_length
            ));
        }
        if !(self.front_load_exponent > 0.0 && self.front_load_exponent < 1.0) {
            return fail(format!(
                "front-load exponent must be in (0, 1), got {}",
                self.front_load_exponent
            ));
        }
        if !(self.participation_rate > 0.0 && self.participation_rate <= 1.0) {
            return fail(format!(
                "participation rate must be in (0, 1], got {}",
                self.participation_rate
            ));
        }
        if self.hedge.lot_size == 0 {
            return fail("lot size must be at least 1".to_string());
        }
        if !self.hedge.beta.is_finite() {
            return fail(format!("hedge ratio must be finite, got {}", self.hedge.beta));
        }
        Ok(())
    }
}
