//! Participation-rate (POV) sizing.
//!
//! A POV session follows the linear backbone but never trades more in one
//! tick than `rate * observed market volume` since the previous tick. Any
//! shortfall against the backbone is carried into later ticks, because the
//! next tick is sized from the backbone minus what was actually executed.

/// Volume cap applied on top of the POV backbone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticipationCap {
    rate: f64,
}

impl ParticipationCap {
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Largest notional allowed for a window with `observed_volume` traded.
    pub fn increment(&self, observed_volume: f64) -> f64 {
        self.rate * observed_volume.max(0.0)
    }

    /// Cumulative executed notional after this tick.
    ///
    /// Never exceeds `backbone_target` and never goes below `executed`.
    pub fn next_cumulative(&self, backbone_target: f64, executed: f64, observed_volume: f64) -> f64 {
        let wanted = (backbone_target - executed).max(0.0);
        executed + wanted.min(self.increment(observed_volume))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_scales_with_volume() {
        let cap = ParticipationCap::new(0.1);
        assert_eq!(cap.increment(50_000.0), 5_000.0);
        assert_eq!(cap.increment(-1.0), 0.0);
    }

    #[test]
    fn test_rate_is_clamped_to_unit_interval() {
        assert_eq!(ParticipationCap::new(1.7).rate(), 1.0);
        assert_eq!(ParticipationCap::new(-0.2).rate(), 0.0);
    }

    #[test]
    fn test_thin_volume_caps_and_carries_shortfall() {
        let cap = ParticipationCap::new(0.1);

        // Backbone wants 10k but only 20k traded: capped at 2k.
        let executed = cap.next_cumulative(10_000.0, 0.0, 20_000.0);
        assert_eq!(executed, 2_000.0);

        // Next window is liquid; the 8k shortfall is caught up.
        let executed = cap.next_cumulative(20_000.0, executed, 1_000_000.0);
        assert_eq!(executed, 20_000.0);
    }

    #[test]
    fn test_never_runs_ahead_of_backbone() {
        let cap = ParticipationCap::new(1.0);
        assert_eq!(cap.next_cumulative(5_000.0, 5_000.0, 1e9), 5_000.0);
        assert_eq!(cap.next_cumulative(4_000.0, 5_000.0, 1e9), 5_000.0);
    }
}
