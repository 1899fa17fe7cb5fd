//! Intraday volume densities for VWAP scheduling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A non-negative weight over normalized session time `x ∈ [0, 1]`.
///
/// The density does not need to integrate to one; VWAP only uses ratios.
/// Negative or non-finite weights returned by the wrapped function are
/// clamped to zero.
#[derive(Clone)]
pub struct Density {
    label: String,
    func: Arc<dyn Fn(f64) -> f64 + Send + Sync>,
}

impl Density {
    /// Wrap an arbitrary weighting function.
    pub fn from_fn<F>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    /// Constant weight; VWAP then degenerates to TWAP.
    pub fn flat() -> Self {
        Self::from_fn("flat", |_| 1.0)
    }

    /// U-shaped intraday profile proportional to `(x(1-x))^(a-1)`.
    ///
    /// With `a > 1` the weight vanishes at the open and close and peaks
    /// mid-session; with `a < 1` it is heavy at both ends, like real
    /// equity volume.
    pub fn u_shape(a: f64) -> Self {
        Self::from_fn(format!("u_shape(a={a})"), move |x| {
            let x = x.clamp(0.0, 1.0);
            (x * (1.0 - x)).powf(a - 1.0)
        })
    }

    /// Weight at normalized time `x`, clamped to a finite non-negative value.
    pub fn weight(&self, x: f64) -> f64 {
        let w = (self.func)(x);
        if w.is_finite() && w > 0.0 {
            w
        } else {
            0.0
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Density").field("label", &self.label).finish()
    }
}

/// Serializable description of a density, as it appears in config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DensitySpec {
    Flat,
    UShape {
        #[serde(default = "default_u_shape_a")]
        a: f64,
    },
}

fn default_u_shape_a() -> f64 {
    2.0
}

impl Default for DensitySpec {
    fn default() -> Self {
        DensitySpec::UShape {
            a: default_u_shape_a(),
        }
    }
}

impl DensitySpec {
    pub fn build(&self) -> Density {
        match self {
            DensitySpec::Flat => Density::flat(),
            DensitySpec::UShape { a } => Density::u_shape(*a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u_shape_peaks_mid_session() {
        let d = Density::u_shape(2.0);
        assert_eq!(d.weight(0.0), 0.0);
        assert_eq!(d.weight(1.0), 0.0);
        assert!((d.weight(0.5) - 0.25).abs() < 1e-12);
        assert!(d.weight(0.5) > d.weight(0.1));
    }

    #[test]
    fn test_negative_and_nan_weights_are_clamped() {
        let neg = Density::from_fn("neg", |_| -3.0);
        assert_eq!(neg.weight(0.4), 0.0);

        let nan = Density::from_fn("nan", |_| f64::NAN);
        assert_eq!(nan.weight(0.4), 0.0);
    }

    #[test]
    fn test_density_spec_deserializes_tagged() {
        let spec: DensitySpec = serde_json::from_str(r#"{"kind":"u_shape","a":1.5}"#).unwrap();
        assert_eq!(spec, DensitySpec::UShape { a: 1.5 });

        let flat: DensitySpec = serde_json::from_str(r#"{"kind":"flat"}"#).unwrap();
        assert_eq!(flat.build().weight(0.3), 1.0);
    }
}
