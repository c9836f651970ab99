use crate::TofpaError;
use serde::{Deserialize, Serialize};

/// Half-width divergence of the standard surface, per meter forward.
const DIVERGENCE_RATIO: f64 = 0.125;

/// Geometry and slope of a take-off flight path area.
///
/// Defaults match a Type A take-off climb surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TofpaParameters {
    /// Full width of the surface at its start (meters).
    pub initial_width_m: f64,

    /// Angle (degrees) between the centerline and each side of the
    /// surface.
    pub splay_deg: f64,

    /// Rise over run of the surface, e.g. `0.012` for 1.2%.
    pub slope_ratio: f64,

    /// Length of the surface along the centerline (meters).
    pub max_length_m: f64,

    /// Full width at which the surface stops widening (meters).
    pub max_width_m: Option<f64>,

    /// Distance beyond the DER at which the surface starts, e.g. a
    /// clearway (meters).
    pub origin_offset_m: f64,
}

impl Default for TofpaParameters {
    fn default() -> Self {
        Self {
            initial_width_m: 180.0,
            splay_deg: Self::splay_for_divergence(DIVERGENCE_RATIO),
            slope_ratio: 0.012,
            max_length_m: 10_000.0,
            max_width_m: Some(1_800.0),
            origin_offset_m: 0.0,
        }
    }
}

impl TofpaParameters {
    /// Returns `Ok(())` if every field is usable for surface
    /// construction.
    pub fn validate(&self) -> Result<(), TofpaError> {
        let invalid = |msg: &str| Err(TofpaError::InvalidParameters(msg.to_owned()));

        let fields = [
            self.initial_width_m,
            self.splay_deg,
            self.slope_ratio,
            self.max_length_m,
            self.origin_offset_m,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return invalid("parameters must be finite");
        }
        if self.initial_width_m <= 0.0 {
            return invalid("initial width must be greater than 0 m");
        }
        if !(0.0..90.0).contains(&self.splay_deg) {
            return invalid("splay angle must be within [0, 90) degrees");
        }
        if self.slope_ratio <= 0.0 || self.slope_ratio >= 1.0 {
            return invalid("slope ratio must be within (0, 1)");
        }
        if self.max_length_m <= 0.0 {
            return invalid("maximum length must be greater than 0 m");
        }
        if self.origin_offset_m < 0.0 {
            return invalid("origin offset must not be negative");
        }
        if let Some(max_width_m) = self.max_width_m {
            if !max_width_m.is_finite() || max_width_m < self.initial_width_m {
                return invalid("maximum width must be at least the initial width");
            }
        }
        Ok(())
    }

    /// Returns the splay angle for a given half-width divergence
    /// ratio, e.g. `0.125` for 12.5%.
    pub fn splay_for_divergence(ratio: f64) -> f64 {
        ratio.atan().to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::TofpaParameters;
    use crate::TofpaError;
    use approx::assert_relative_eq;

    fn assert_invalid(params: TofpaParameters) {
        assert!(matches!(
            params.validate(),
            Err(TofpaError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_default_is_valid() {
        let params = TofpaParameters::default();
        params.validate().unwrap();
        assert_relative_eq!(params.splay_deg.to_radians().tan(), 0.125, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_non_positive() {
        let base = TofpaParameters::default();
        assert_invalid(TofpaParameters {
            initial_width_m: 0.0,
            ..base
        });
        assert_invalid(TofpaParameters {
            slope_ratio: 0.0,
            ..base
        });
        assert_invalid(TofpaParameters {
            slope_ratio: -0.012,
            ..base
        });
        assert_invalid(TofpaParameters {
            max_length_m: -1.0,
            ..base
        });
        assert_invalid(TofpaParameters {
            splay_deg: -1.0,
            ..base
        });
    }

    #[test]
    fn test_rejects_out_of_range() {
        let base = TofpaParameters::default();
        assert_invalid(TofpaParameters {
            slope_ratio: 1.0,
            ..base
        });
        assert_invalid(TofpaParameters {
            splay_deg: 90.0,
            ..base
        });
        assert_invalid(TofpaParameters {
            max_width_m: Some(100.0),
            ..base
        });
        assert_invalid(TofpaParameters {
            origin_offset_m: -60.0,
            ..base
        });
        assert_invalid(TofpaParameters {
            max_length_m: f64::NAN,
            ..base
        });
    }

    #[test]
    fn test_accepts_rectangle() {
        let params = TofpaParameters {
            splay_deg: 0.0,
            max_width_m: Some(180.0),
            ..TofpaParameters::default()
        };
        params.validate().unwrap();
    }

    #[test]
    fn test_deserialize_partial() {
        let params: TofpaParameters =
            serde_json::from_str(r#"{"slope_ratio": 0.02, "max_width_m": null}"#).unwrap();
        assert_relative_eq!(params.slope_ratio, 0.02);
        assert_eq!(params.max_width_m, None);
        assert_relative_eq!(params.initial_width_m, 180.0);
    }
}
