//! Capabilities the execution core consumes from its host.
//!
//! The host is whatever drives simulated time: it delivers wake-ups,
//! answers price and volume queries, and accepts market orders. The core
//! calls these synchronously from inside a tick and never retries them.

use crate::error::HostError;
use crate::SimTime;

/// Host services available to an execution session during a callback.
#[cfg_attr(test, mockall::automock)]
pub trait ExecutionHost {
    /// Register a one-shot wake-up at an absolute time.
    fn schedule_wakeup(&mut self, at: SimTime) -> Result<(), HostError>;

    /// Current simulation time.
    fn current_time(&self) -> SimTime;

    /// Best-effort reference price for an instrument.
    fn lookup_price(&self, instrument: &str) -> Result<f64, HostError>;

    /// Fire-and-forget market order; positive buys, negative sells.
    fn submit_market_order(&mut self, instrument: &str, signed_qty: i64) -> Result<(), HostError>;

    /// Traded notional of `instrument` in `(since, until]`, if a volume
    /// feed is wired in.
    fn observed_volume(&self, instrument: &str, since: SimTime, until: SimTime) -> Option<f64>;
}
