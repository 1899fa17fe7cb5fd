//! Execution strategy for a two-leg spread.
//!
//! Contains the core logic for:
//! - Session definition and validation
//! - Splitting notional deltas into hedge-balanced leg quantities
//! - The wake/execute/reschedule loop for one session

mod executor;
mod hedge;
mod session;

pub use executor::{
    ExecutionScheduler, ExecutionState, SessionPhase, TickReport, MIN_DELTA_NOTIONAL,
};
pub use hedge::{split, HedgeKind, HedgeRule, LegQuantities, RoundingPolicy, MIN_PRICE};
pub use session::{InstrumentPair, SessionConfig};
