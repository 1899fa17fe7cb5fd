//! Synthetic market volume, the feed behind POV sessions.

use crate::schedule::Density;
use crate::{nanos_to_secs, SimTime};

/// Grid used to normalize a density to an average weight of one.
const NORMALIZATION_STEPS: usize = 600;

/// Traded notional per second, optionally shaped over the session.
#[derive(Debug, Clone)]
pub struct SyntheticVolume {
    notional_per_sec: f64,
    shape: Option<(Density, f64)>,
    session_start: SimTime,
    session_length: SimTime,
}

impl SyntheticVolume {
    /// Constant rate over the session.
    pub fn flat(notional_per_sec: f64, session_start: SimTime, session_length: SimTime) -> Self {
        Self {
            notional_per_sec: notional_per_sec.max(0.0),
            shape: None,
            session_start,
            session_length,
        }
    }

    /// Average rate `notional_per_sec`, distributed like `density`.
    ///
    /// A density with no mass falls back to the flat rate.
    pub fn shaped(
        notional_per_sec: f64,
        density: Density,
        session_start: SimTime,
        session_length: SimTime,
    ) -> Self {
        let mean = (0..NORMALIZATION_STEPS)
            .map(|i| density.weight((i as f64 + 0.5) / NORMALIZATION_STEPS as f64))
            .sum::<f64>()
            / NORMALIZATION_STEPS as f64;

        let mut volume = Self::flat(notional_per_sec, session_start, session_length);
        if mean > 0.0 {
            volume.shape = Some((density, mean));
        }
        volume
    }

    /// Traded notional in `(since, until]`, sampled at the window midpoint.
    pub fn between(&self, since: SimTime, until: SimTime) -> f64 {
        if until <= since {
            return 0.0;
        }
        let base = self.notional_per_sec * nanos_to_secs(until - since);

        match &self.shape {
            None => base,
            Some((density, mean)) => {
                let mid = since + (until - since) / 2;
                let x = nanos_to_secs(mid - self.session_start)
                    / nanos_to_secs(self.session_length.max(1));
                base * density.weight(x) / mean
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NS_PER_SEC;

    #[test]
    fn test_flat_volume_is_rate_times_duration() {
        let v = SyntheticVolume::flat(1_000.0, 0, 60 * NS_PER_SEC);
        assert_eq!(v.between(0, 10 * NS_PER_SEC), 10_000.0);
        assert_eq!(v.between(10 * NS_PER_SEC, 10 * NS_PER_SEC), 0.0);
    }

    #[test]
    fn test_shaped_volume_follows_density() {
        let v = SyntheticVolume::shaped(1_000.0, Density::u_shape(2.0), 0, 100 * NS_PER_SEC);
        let early = v.between(0, 10 * NS_PER_SEC);
        let mid = v.between(45 * NS_PER_SEC, 55 * NS_PER_SEC);
        assert!(mid > early);
        // u_shape(2) has mean 1/6 and peak 1/4: mid-session runs at 1.5x.
        assert!((mid - 15_000.0).abs() < 1.0);
    }

    #[test]
    fn test_massless_density_falls_back_to_flat() {
        let v = SyntheticVolume::shaped(500.0, Density::from_fn("zero", |_| 0.0), 0, NS_PER_SEC);
        assert_eq!(v.between(0, NS_PER_SEC), 500.0);
    }
}
