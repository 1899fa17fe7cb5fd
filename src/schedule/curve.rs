//! Cumulative execution curves.
//!
//! Each curve maps elapsed session time to the fraction of the total
//! notional that should be done by then. Curves are immutable and can be
//! shared across sessions.

use super::density::Density;

/// Number of midpoint sub-intervals used to integrate a VWAP density.
pub const VWAP_STEPS: usize = 600;

/// Smallest session length used as a divisor.
const MIN_SESSION_SECS: f64 = 1e-9;

/// A compiled schedule shape.
#[derive(Debug, Clone)]
pub enum ScheduleCurve {
    /// Straight line from 0 to 1 over the session.
    Linear,
    /// `x^exponent`; exponents below one execute ahead of linear pace.
    FrontLoaded { exponent: f64 },
    /// Cumulative share of a volume density, integrated on a midpoint grid.
    VolumeWeighted { density: Density, steps: usize },
}

impl ScheduleCurve {
    /// Fraction of the total to have executed after `elapsed_secs`.
    ///
    /// Always within `[0, 1]`; elapsed time is clamped to the session.
    pub fn fraction(&self, elapsed_secs: f64, session_secs: f64) -> f64 {
        let session = session_secs.max(MIN_SESSION_SECS);
        let elapsed = elapsed_secs.clamp(0.0, session);

        match self {
            ScheduleCurve::Linear => normalized(elapsed, session),
            ScheduleCurve::FrontLoaded { exponent } => {
                normalized(elapsed, session).powf(*exponent)
            }
            ScheduleCurve::VolumeWeighted { density, steps } => {
                volume_fraction(density, *steps, elapsed, session)
            }
        }
    }
}

fn normalized(elapsed: f64, session: f64) -> f64 {
    (elapsed / session).clamp(0.0, 1.0)
}

fn volume_fraction(density: &Density, steps: usize, elapsed: f64, session: f64) -> f64 {
    let steps = steps.max(1);
    let dt = session / steps as f64;

    let mut done = 0.0;
    let mut total = 0.0;
    for i in 0..steps {
        let mid = (i as f64 + 0.5) * dt;
        let mass = density.weight(mid / session) * dt;
        total += mass;
        if mid <= elapsed {
            done += mass;
        }
    }

    if total <= 0.0 {
        return 0.0;
    }
    (done / total).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_is_proportional() {
        let c = ScheduleCurve::Linear;
        assert_eq!(c.fraction(0.0, 60.0), 0.0);
        assert_eq!(c.fraction(15.0, 60.0), 0.25);
        assert_eq!(c.fraction(60.0, 60.0), 1.0);
    }

    #[test]
    fn test_elapsed_is_clamped() {
        let c = ScheduleCurve::Linear;
        assert_eq!(c.fraction(-10.0, 60.0), 0.0);
        assert_eq!(c.fraction(600.0, 60.0), 1.0);
    }

    #[test]
    fn test_front_loaded_runs_ahead_of_linear() {
        let c = ScheduleCurve::FrontLoaded { exponent: 0.6 };
        for i in 1..60 {
            let t = i as f64;
            assert!(c.fraction(t, 60.0) >= ScheduleCurve::Linear.fraction(t, 60.0));
        }
        assert_eq!(c.fraction(60.0, 60.0), 1.0);
    }

    #[test]
    fn test_zero_density_yields_zero() {
        let c = ScheduleCurve::VolumeWeighted {
            density: Density::from_fn("zero", |_| 0.0),
            steps: VWAP_STEPS,
        };
        assert_eq!(c.fraction(30.0, 60.0), 0.0);
        assert_eq!(c.fraction(60.0, 60.0), 0.0);
    }

    #[test]
    fn test_flat_density_tracks_linear_on_grid() {
        let c = ScheduleCurve::VolumeWeighted {
            density: Density::flat(),
            steps: VWAP_STEPS,
        };
        // Halfway through, exactly half of the midpoints have been passed.
        assert!((c.fraction(30.0, 60.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_u_shape_is_slow_at_the_edges() {
        let c = ScheduleCurve::VolumeWeighted {
            density: Density::u_shape(2.0),
            steps: VWAP_STEPS,
        };
        // Density vanishes at the open, so the first 10% of time carries
        // far less than 10% of the volume.
        assert!(c.fraction(6.0, 60.0) < 0.05);
        assert!((c.fraction(30.0, 60.0) - 0.5).abs() < 1e-6);
    }
}
