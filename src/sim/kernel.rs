//! Discrete-event kernel hosting execution sessions.
//!
//! Wake-ups are kept in a min-heap keyed by `(time, sequence)` so sessions
//! sharing a timestamp are served in registration order. Events past the
//! stop time are dropped and counted; a session whose chain is cut this
//! way simply stops progressing.

use crate::error::HostError;
use crate::host::ExecutionHost;
use crate::sim::exchange::SimExchange;
use crate::sim::oracle::PriceOracle;
use crate::sim::volume::SyntheticVolume;
use crate::strategy::{ExecutionScheduler, TickReport};
use crate::utils::decimal::to_f64;
use crate::SimTime;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::{debug, error, info, warn};

type Wakeup = Reverse<(SimTime, u64, usize)>;

/// One hosted session and everything it produced.
pub struct SessionSlot {
    pub scheduler: ExecutionScheduler,
    pub start: SimTime,
    pub ticks: Vec<TickReport>,
    pub errors: Vec<String>,
}

/// Counters for one kernel run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KernelStats {
    pub events_delivered: u64,
    pub events_dropped: u64,
    pub callback_errors: u64,
}

/// The simulation driver.
pub struct Kernel {
    start_time: SimTime,
    stop_time: SimTime,
    now: SimTime,
    queue: BinaryHeap<Wakeup>,
    seq: u64,
    oracle: Box<dyn PriceOracle>,
    exchange: SimExchange,
    volume: Option<SyntheticVolume>,
    sessions: Vec<SessionSlot>,
    stats: KernelStats,
}

impl Kernel {
    pub fn new(
        start_time: SimTime,
        stop_time: SimTime,
        oracle: Box<dyn PriceOracle>,
        exchange: SimExchange,
    ) -> Self {
        Self {
            start_time,
            stop_time,
            now: start_time,
            queue: BinaryHeap::new(),
            seq: 0,
            oracle,
            exchange,
            volume: None,
            sessions: Vec::new(),
            stats: KernelStats::default(),
        }
    }

    pub fn with_volume(mut self, volume: SyntheticVolume) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Register a session that opens at `start`. Returns its index.
    pub fn add_session(&mut self, scheduler: ExecutionScheduler, start: SimTime) -> usize {
        self.sessions.push(SessionSlot {
            scheduler,
            start,
            ticks: Vec::new(),
            errors: Vec::new(),
        });
        self.sessions.len() - 1
    }

    pub fn sessions(&self) -> &[SessionSlot] {
        &self.sessions
    }

    pub fn exchange(&self) -> &SimExchange {
        &self.exchange
    }

    /// Start every session and deliver wake-ups until the queue drains or
    /// the stop time is reached.
    pub fn run(&mut self) -> KernelStats {
        info!(
            start = self.start_time,
            stop = self.stop_time,
            sessions = self.sessions.len(),
            "Kernel starting"
        );

        for index in 0..self.sessions.len() {
            let start = self.sessions[index].start.max(self.start_time);
            self.now = start;
            let slot = &mut self.sessions[index];
            let mut host = KernelHost {
                session: index,
                now: start,
                queue: &mut self.queue,
                seq: &mut self.seq,
                oracle: self.oracle.as_ref(),
                exchange: &mut self.exchange,
                volume: self.volume.as_ref(),
            };
            if let Err(e) = slot.scheduler.on_session_start(start, &mut host) {
                error!(session = index, error = %e, "Session failed to start");
                slot.errors.push(e.to_string());
                self.stats.callback_errors += 1;
            }
        }

        while let Some(Reverse((time, _, index))) = self.queue.pop() {
            if time > self.stop_time {
                self.stats.events_dropped += 1 + self.queue.len() as u64;
                warn!(
                    time,
                    stop = self.stop_time,
                    dropped = self.stats.events_dropped,
                    "Wake-ups past stop time dropped"
                );
                self.queue.clear();
                break;
            }

            self.now = time;
            self.stats.events_delivered += 1;

            let slot = &mut self.sessions[index];
            let mut host = KernelHost {
                session: index,
                now: time,
                queue: &mut self.queue,
                seq: &mut self.seq,
                oracle: self.oracle.as_ref(),
                exchange: &mut self.exchange,
                volume: self.volume.as_ref(),
            };
            match slot.scheduler.on_wakeup(time, &mut host) {
                Ok(report) => slot.ticks.push(report),
                Err(e) => {
                    error!(session = index, time, error = %e, "Wake-up failed");
                    slot.errors.push(e.to_string());
                    self.stats.callback_errors += 1;
                }
            }
        }

        info!(
            now = self.now,
            delivered = self.stats.events_delivered,
            dropped = self.stats.events_dropped,
            errors = self.stats.callback_errors,
            fills = self.exchange.fills().len(),
            "Kernel finished"
        );
        self.stats
    }
}

/// The host view handed to one session for the duration of a callback.
struct KernelHost<'a> {
    session: usize,
    now: SimTime,
    queue: &'a mut BinaryHeap<Wakeup>,
    seq: &'a mut u64,
    oracle: &'a dyn PriceOracle,
    exchange: &'a mut SimExchange,
    volume: Option<&'a SyntheticVolume>,
}

impl ExecutionHost for KernelHost<'_> {
    fn schedule_wakeup(&mut self, at: SimTime) -> Result<(), HostError> {
        if at < self.now {
            return Err(HostError::WakeupRejected {
                time: at,
                reason: format!("in the past (now {})", self.now),
            });
        }
        *self.seq += 1;
        self.queue.push(Reverse((at, *self.seq, self.session)));
        debug!(session = self.session, at, "Wake-up registered");
        Ok(())
    }

    fn current_time(&self) -> SimTime {
        self.now
    }

    fn lookup_price(&self, instrument: &str) -> Result<f64, HostError> {
        self.oracle
            .observe_price(instrument, self.now)
            .map(to_f64)
            .ok_or_else(|| HostError::PriceUnavailable {
                instrument: instrument.to_string(),
            })
    }

    fn submit_market_order(&mut self, instrument: &str, signed_qty: i64) -> Result<(), HostError> {
        let price = self
            .oracle
            .observe_price(instrument, self.now)
            .ok_or_else(|| HostError::OrderRejected {
                instrument: instrument.to_string(),
                reason: "no reference price".to_string(),
            })?;
        self.exchange
            .execute_market_order(self.session, self.now, instrument, signed_qty, price)?;
        Ok(())
    }

    fn observed_volume(&self, _instrument: &str, since: SimTime, until: SimTime) -> Option<f64> {
        self.volume.map(|v| v.between(since, until))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::StrategyMode;
    use crate::sim::oracle::FixedPriceOracle;
    use crate::strategy::{HedgeRule, InstrumentPair, SessionConfig, SessionPhase};
    use crate::{secs_to_nanos, NS_PER_SEC};
    use rust_decimal_macros::dec;

    const OPEN: SimTime = 34_200 * NS_PER_SEC;

    fn scheduler(pair: (&str, &str), notional: f64, length_secs: f64, dt_secs: f64) -> ExecutionScheduler {
        ExecutionScheduler::new(SessionConfig::new(
            StrategyMode::Twap,
            InstrumentPair::new(pair.0, pair.1).unwrap(),
            HedgeRule::dollar(),
            notional,
            secs_to_nanos(dt_secs),
            secs_to_nanos(length_secs),
        ))
        .unwrap()
    }

    fn kernel(stop_secs: f64) -> Kernel {
        Kernel::new(
            OPEN,
            OPEN + secs_to_nanos(stop_secs),
            Box::new(FixedPriceOracle::from_cents(10_000).with_price("SYM_B", dec!(50))),
            SimExchange::new(dec!(10_000_000)),
        )
    }

    #[test]
    fn test_single_session_runs_to_completion() {
        let mut k = kernel(3600.0);
        k.add_session(scheduler(("SYM_A", "SYM_B"), 100_000.0, 60.0, 30.0), OPEN);

        let stats = k.run();

        assert_eq!(stats.events_delivered, 3);
        assert_eq!(stats.events_dropped, 0);
        assert_eq!(stats.callback_errors, 0);
        assert_eq!(k.exchange().position("SYM_A"), 1000);
        assert_eq!(k.exchange().position("SYM_B"), -2000);
        assert_eq!(k.exchange().cash(), dec!(10_000_000));
        assert!(matches!(k.sessions()[0].scheduler.phase(), SessionPhase::Ended(_)));
    }

    #[test]
    fn test_stop_time_cuts_the_chain() {
        let mut k = kernel(45.0);
        k.add_session(scheduler(("SYM_A", "SYM_B"), 100_000.0, 60.0, 30.0), OPEN);

        let stats = k.run();

        assert_eq!(stats.events_delivered, 2);
        assert_eq!(stats.events_dropped, 1);
        // Only the first half got executed; the session is still active.
        assert_eq!(k.exchange().position("SYM_A"), 500);
        assert!(k.sessions()[0].scheduler.is_active());
    }

    #[test]
    fn test_sessions_interleave_in_time_order() {
        let mut k = kernel(3600.0);
        k.add_session(scheduler(("SYM_A", "SYM_B"), 10_000.0, 60.0, 20.0), OPEN);
        k.add_session(scheduler(("SYM_C", "SYM_D"), -10_000.0, 60.0, 30.0), OPEN);

        k.run();

        let times: Vec<SimTime> = k.exchange().fills().iter().map(|f| f.time).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
        assert_eq!(k.exchange().session_position(1, "SYM_C"), -100);
        assert_eq!(k.exchange().session_position(1, "SYM_D"), 100);
        assert_eq!(k.sessions()[0].ticks.len(), 4);
        assert_eq!(k.sessions()[1].ticks.len(), 3);
    }

    #[test]
    fn test_missing_price_is_recorded_as_error() {
        let mut k = Kernel::new(
            OPEN,
            OPEN + secs_to_nanos(3600.0),
            Box::new(FixedPriceOracle::from_table(Default::default())),
            SimExchange::new(dec!(0)),
        );
        k.add_session(scheduler(("SYM_A", "SYM_B"), 1_000.0, 60.0, 30.0), OPEN);

        let stats = k.run();

        // The zero-delta first tick succeeds, the second fails and the
        // chain ends there.
        assert_eq!(stats.events_delivered, 2);
        assert_eq!(stats.callback_errors, 1);
        assert!(k.sessions()[0].errors[0].contains("SYM_A"));
        assert!(k.exchange().fills().is_empty());
    }
}
