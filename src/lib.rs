//! # Pairs Exec
//!
//! Scheduled execution of two-leg spread trades inside a discrete-event
//! simulation.
//!
//! ## Architecture
//!
//! - `schedule`: Cumulative target curves (TWAP, VWAP, POV, IS)
//! - `strategy`: Hedge splitting and the per-session execution loop
//! - `host`: Capabilities the execution loop needs from its host
//! - `sim`: Discrete-event kernel, price oracle and fill ledger
//! - `config`: Configuration management and validation
//! - `error`: Error taxonomy
//! - `utils`: Shared utilities and decimal arithmetic

pub mod config;
pub mod error;
pub mod host;
pub mod schedule;
pub mod sim;
pub mod strategy;
pub mod utils;

pub use config::Config;

/// Absolute simulation time in nanoseconds.
pub type SimTime = i64;

pub const NS_PER_SEC: i64 = 1_000_000_000;

/// Convert seconds to simulation nanoseconds, rounding to the nearest ns.
pub fn secs_to_nanos(secs: f64) -> SimTime {
    (secs * NS_PER_SEC as f64).round() as SimTime
}

/// Convert seconds to nanoseconds, or `None` when the value is not finite
/// or does not fit in `SimTime`.
pub fn checked_secs_to_nanos(secs: f64) -> Option<SimTime> {
    let nanos = (secs * NS_PER_SEC as f64).round();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    (nanos.is_finite() && nanos >= i64::MIN as f64 && nanos < i64::MAX as f64)
        .then_some(nanos as SimTime)
}

pub fn nanos_to_secs(nanos: SimTime) -> f64 {
    nanos as f64 / NS_PER_SEC as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_conversions() {
        assert_eq!(secs_to_nanos(30.0), 30 * NS_PER_SEC);
        assert_eq!(secs_to_nanos(0.5), 500_000_000);
        assert_eq!(nanos_to_secs(90 * NS_PER_SEC), 90.0);
    }

    #[test]
    fn test_checked_conversion_rejects_out_of_range() {
        assert_eq!(checked_secs_to_nanos(30.0), Some(30 * NS_PER_SEC));
        assert_eq!(checked_secs_to_nanos(6e16), None);
        assert_eq!(checked_secs_to_nanos(f64::INFINITY), None);
        assert_eq!(checked_secs_to_nanos(f64::NAN), None);
    }
}
