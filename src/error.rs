//! Error taxonomy for the execution core.
//!
//! Configuration problems fail fast at construction. Host failures are
//! propagated to the caller untouched; the core never retries them.

use crate::SimTime;
use thiserror::Error;

/// Errors raised while building or evaluating a schedule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Unrecognized strategy mode string at the parsing boundary.
    #[error("Invalid schedule mode: {0}")]
    InvalidMode(String),

    /// The parameters cannot describe a schedule (e.g. VWAP without a density).
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Failures reported by the simulation host or its collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("No price available for {instrument}")]
    PriceUnavailable { instrument: String },

    #[error("Order for {instrument} rejected: {reason}")]
    OrderRejected { instrument: String, reason: String },

    #[error("Wake-up at {time} rejected: {reason}")]
    WakeupRejected { time: SimTime, reason: String },
}

/// Errors surfaced by the execution scheduler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("Session already started at {0}")]
    AlreadyStarted(SimTime),

    #[error("Wake-up at {time} ignored: session is {state}")]
    NotActive { time: SimTime, state: String },

    #[error("Wake-up at {time} precedes previous tick at {last}")]
    OutOfOrder { time: SimTime, last: SimTime },
}

pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;
