//! Execution loop for a two-leg spread session.
//!
//! The scheduler is inert until `on_session_start`; from then on each
//! wake-up evaluates the schedule, trades the increment since the previous
//! tick across both legs, and registers the next wake-up while the session
//! is still open.

use crate::error::{ExecutionError, ExecutionResult, ScheduleError};
use crate::host::ExecutionHost;
use crate::schedule::{ParticipationCap, ScheduleCurve, ScheduleParams, StrategyMode};
use crate::strategy::hedge::{split, LegQuantities};
use crate::strategy::session::SessionConfig;
use crate::{nanos_to_secs, SimTime};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Deltas at or below this magnitude are not traded.
pub const MIN_DELTA_NOTIONAL: f64 = 1e-8;

/// Mutable per-session bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExecutionState {
    pub session_start: SimTime,
    pub session_end: SimTime,
    /// Last unsigned cumulative target reached
    pub cumulative_target_executed: f64,
    pub last_tick: Option<SimTime>,
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionPhase {
    Uninitialized,
    Active(ExecutionState),
    Ended(ExecutionState),
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Uninitialized => "uninitialized",
            SessionPhase::Active(_) => "active",
            SessionPhase::Ended(_) => "ended",
        }
    }
}

/// What a single tick decided.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub time: SimTime,
    pub elapsed_secs: f64,
    /// Unsigned cumulative target after this tick
    pub target: f64,
    /// Unsigned increment over the previous tick
    pub delta: f64,
    /// Increment with the session direction applied
    pub signed_delta: f64,
    /// Leg prices used for sizing, when a trade was attempted
    pub prices: Option<(f64, f64)>,
    pub orders: LegQuantities,
    pub next_wakeup: Option<SimTime>,
}

/// Drives one session through its wake-up chain.
pub struct ExecutionScheduler {
    config: SessionConfig,
    params: ScheduleParams,
    curve: ScheduleCurve,
    participation: Option<ParticipationCap>,
    phase: SessionPhase,
}

impl ExecutionScheduler {
    /// Build an inert scheduler, validating the session up front.
    pub fn new(config: SessionConfig) -> ExecutionResult<Self> {
        config.validate()?;
        let params = config.schedule_params();
        let curve = ScheduleCurve::for_mode(config.mode, &params)?;
        let participation = match config.mode {
            StrategyMode::Pov => Some(ParticipationCap::new(params.participation_rate)),
            _ => None,
        };

        Ok(Self {
            config,
            params,
            curve,
            participation,
            phase: SessionPhase::Uninitialized,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, SessionPhase::Active(_))
    }

    pub fn state(&self) -> Option<ExecutionState> {
        match self.phase {
            SessionPhase::Uninitialized => None,
            SessionPhase::Active(state) | SessionPhase::Ended(state) => Some(state),
        }
    }

    /// Open the session at `start` and request the first wake-up there.
    pub fn on_session_start<H: ExecutionHost + ?Sized>(
        &mut self,
        start: SimTime,
        host: &mut H,
    ) -> ExecutionResult<()> {
        if let Some(state) = self.state() {
            return Err(ExecutionError::AlreadyStarted(state.session_start));
        }

        let session_end = start.checked_add(self.config.session_length).ok_or_else(|| {
            ScheduleError::Configuration(format!(
                "session of {}ns starting at {start} overflows the simulation clock",
                self.config.session_length
            ))
        })?;
        let state = ExecutionState {
            session_start: start,
            session_end,
            cumulative_target_executed: 0.0,
            last_tick: None,
        };

        host.schedule_wakeup(start)?;
        self.phase = SessionPhase::Active(state);

        if let Some(cap) = self.participation {
            if host.observed_volume(&self.config.pair.leg_a, start, start).is_none() {
                warn!(
                    pair = %self.config.pair,
                    rate = cap.rate(),
                    "No volume feed for POV session, following the linear backbone"
                );
            } else {
                debug!(pair = %self.config.pair, rate = cap.rate(), "Participation cap armed");
            }
        }

        info!(
            mode = %self.config.mode,
            pair = %self.config.pair,
            hedge = %self.config.hedge.kind,
            notional = self.config.signed_total_notional,
            session_start = state.session_start,
            session_end = state.session_end,
            "Execution session started"
        );
        Ok(())
    }

    /// Process the wake-up registered for `now`.
    pub fn on_wakeup<H: ExecutionHost + ?Sized>(
        &mut self,
        now: SimTime,
        host: &mut H,
    ) -> ExecutionResult<TickReport> {
        let mut state = match self.phase {
            SessionPhase::Active(state) => state,
            other => {
                return Err(ExecutionError::NotActive {
                    time: now,
                    state: other.name().to_string(),
                })
            }
        };
        if let Some(last) = state.last_tick {
            if now < last {
                return Err(ExecutionError::OutOfOrder { time: now, last });
            }
        }
        let clock = host.current_time();
        if clock != now {
            warn!(wakeup = now, clock, "Host clock disagrees with wake-up time");
        }

        let elapsed = (now - state.session_start).clamp(0, self.config.session_length);
        let elapsed_secs = nanos_to_secs(elapsed);
        let target = self.next_target(&state, now, elapsed_secs, host);
        let delta = target - state.cumulative_target_executed;

        state.cumulative_target_executed = target;
        let previous_tick = state.last_tick.replace(now);
        self.phase = SessionPhase::Active(state);

        debug!(
            pair = %self.config.pair,
            now,
            elapsed_secs,
            target,
            delta,
            ?previous_tick,
            "Schedule tick"
        );

        let signed_delta = delta * self.config.direction();
        let (prices, orders) = if delta.abs() > MIN_DELTA_NOTIONAL {
            let (prices, orders) = self.execute_delta(signed_delta, host)?;
            (Some(prices), orders)
        } else {
            (None, LegQuantities::default())
        };

        let next_wakeup = match now.checked_add(self.config.decision_interval) {
            Some(next) if next <= state.session_end => {
                host.schedule_wakeup(next)?;
                Some(next)
            }
            _ => {
                self.finish(state);
                None
            }
        };

        Ok(TickReport {
            time: now,
            elapsed_secs,
            target,
            delta,
            signed_delta,
            prices,
            orders,
            next_wakeup,
        })
    }

    /// Cumulative target for this tick, capped by observed volume for POV.
    fn next_target<H: ExecutionHost + ?Sized>(
        &self,
        state: &ExecutionState,
        now: SimTime,
        elapsed_secs: f64,
        host: &H,
    ) -> f64 {
        let backbone =
            self.params.total_notional * self.curve.fraction(elapsed_secs, self.params.session_length_secs);

        let Some(cap) = self.participation else {
            return backbone;
        };
        let since = state.last_tick.unwrap_or(state.session_start);
        match host.observed_volume(&self.config.pair.leg_a, since, now) {
            Some(volume) => cap.next_cumulative(backbone, state.cumulative_target_executed, volume),
            None => backbone,
        }
    }

    /// Size both legs for a signed delta and send the orders.
    fn execute_delta<H: ExecutionHost + ?Sized>(
        &self,
        signed_delta: f64,
        host: &mut H,
    ) -> ExecutionResult<((f64, f64), LegQuantities)> {
        let pair = &self.config.pair;
        let price_a = host.lookup_price(&pair.leg_a)?;
        let price_b = host.lookup_price(&pair.leg_b)?;

        for (symbol, price) in [(&pair.leg_a, price_a), (&pair.leg_b, price_b)] {
            if price <= 0.0 {
                warn!(%symbol, price, "Degenerate price, sizing against the price floor");
            }
        }

        let orders = split(signed_delta, price_a, price_b, &self.config.hedge);

        if orders.qty_a != 0 {
            host.submit_market_order(&pair.leg_a, orders.qty_a)?;
        }
        if orders.qty_b != 0 {
            host.submit_market_order(&pair.leg_b, orders.qty_b)?;
        }

        info!(
            delta = signed_delta,
            leg_a = %pair.leg_a,
            qty_a = orders.qty_a,
            leg_b = %pair.leg_b,
            qty_b = orders.qty_b,
            "Executed delta"
        );

        Ok(((price_a, price_b), orders))
    }

    fn finish(&mut self, state: ExecutionState) {
        self.phase = SessionPhase::Ended(state);

        let shortfall = self.params.total_notional - state.cumulative_target_executed;
        if shortfall > MIN_DELTA_NOTIONAL {
            warn!(
                pair = %self.config.pair,
                target = self.params.total_notional,
                executed = state.cumulative_target_executed,
                shortfall,
                "Session ended under-executed"
            );
        } else {
            info!(
                pair = %self.config.pair,
                executed = state.cumulative_target_executed,
                "Execution session complete"
            );
        }
    }
}
