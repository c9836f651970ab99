use geo::Coord;

/// Elevation readings of a single sample, all in meters.
///
/// Any subset may be present; see [`SampleElevations::top_m`] and
/// [`SampleElevations::ground_m`] for how they combine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleElevations {
    /// Ellipsoidal height of the sample's top.
    pub ellipsoidal_m: Option<f64>,

    /// Geoid undulation (ellipsoid minus geoid) at the sample.
    pub geoid_undulation_m: Option<f64>,

    /// Height of the sample's top above the ground.
    pub height_from_ground_m: Option<f64>,

    /// Orthometric elevation of the ground at the sample.
    pub ortho_ground_m: Option<f64>,

    /// Orthometric (AMSL) elevation of the sample's top.
    pub amsl_m: Option<f64>,

    /// Terrain-model elevation at the sample, if already sampled.
    pub dtm_m: Option<f64>,
}

impl SampleElevations {
    /// Orthometric elevation of the sample's top, compared against
    /// the surface.
    pub fn top_m(&self) -> Option<f64> {
        let amsl = self.amsl_m.filter(|z| z.is_finite());
        match (amsl, self.ellipsoidal_m, self.geoid_undulation_m) {
            (Some(amsl), _, _) => Some(amsl),
            (None, Some(h), Some(n)) => Some(h - n),
            _ => None,
        }
        .filter(|z| z.is_finite())
    }

    /// Orthometric elevation of the ground below the sample.
    pub fn ground_m(&self) -> Option<f64> {
        match (self.ortho_ground_m, self.top_m(), self.height_from_ground_m) {
            (Some(ground), _, _) => Some(ground),
            (None, Some(top), Some(agl)) => Some(top - agl),
            _ => None,
        }
        .filter(|z| z.is_finite())
    }

    /// Terrain-model elevation minus the ground elevation.
    pub fn qa_check_ground(&self) -> Option<f64> {
        Some(self.dtm_m? - self.ground_m()?)
    }
}

/// One terrain or obstacle observation.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePoint {
    pub id: String,

    /// Free-form obstacle category, passed through to output.
    pub obj_type: Option<String>,

    /// Geographic position, passed through to output.
    pub lat: Option<f64>,
    pub lon: Option<f64>,

    /// Planar position in the surface's projected coordinate system.
    pub position: Option<Coord<f64>>,

    pub elevations: SampleElevations,
}

impl SamplePoint {
    pub fn new(id: impl Into<String>, position: Coord<f64>, elevations: SampleElevations) -> Self {
        Self {
            id: id.into(),
            obj_type: None,
            lat: None,
            lon: None,
            position: Some(position),
            elevations,
        }
    }

    /// Returns a sample whose only reading is an AMSL top elevation.
    pub fn with_amsl(id: impl Into<String>, position: Coord<f64>, amsl_m: f64) -> Self {
        let elevations = SampleElevations {
            amsl_m: Some(amsl_m),
            ..SampleElevations::default()
        };
        Self::new(id, position, elevations)
    }
}

#[cfg(test)]
mod tests {
    use super::SampleElevations;
    use approx::assert_relative_eq;

    #[test]
    fn test_top_prefers_amsl() {
        let elevations = SampleElevations {
            amsl_m: Some(120.0),
            ellipsoidal_m: Some(150.0),
            geoid_undulation_m: Some(25.0),
            ..SampleElevations::default()
        };
        assert_eq!(elevations.top_m(), Some(120.0));
    }

    #[test]
    fn test_top_from_ellipsoidal() {
        let elevations = SampleElevations {
            ellipsoidal_m: Some(150.0),
            geoid_undulation_m: Some(25.5),
            ..SampleElevations::default()
        };
        assert_relative_eq!(elevations.top_m().unwrap(), 124.5);
    }

    #[test]
    fn test_top_falls_back_past_bad_amsl() {
        let elevations = SampleElevations {
            amsl_m: Some(f64::NAN),
            ellipsoidal_m: Some(150.0),
            geoid_undulation_m: Some(25.0),
            ..SampleElevations::default()
        };
        assert_eq!(elevations.top_m(), Some(125.0));

        let elevations = SampleElevations {
            amsl_m: Some(f64::INFINITY),
            ..SampleElevations::default()
        };
        assert_eq!(elevations.top_m(), None);
    }

    #[test]
    fn test_top_missing() {
        let elevations = SampleElevations {
            ellipsoidal_m: Some(150.0),
            height_from_ground_m: Some(20.0),
            dtm_m: Some(100.0),
            ..SampleElevations::default()
        };
        assert_eq!(elevations.top_m(), None);
        assert_eq!(elevations.ground_m(), None);
        assert_eq!(elevations.qa_check_ground(), None);
    }

    #[test]
    fn test_qa_check_ground() {
        let elevations = SampleElevations {
            ellipsoidal_m: Some(150.0),
            geoid_undulation_m: Some(25.0),
            height_from_ground_m: Some(20.0),
            dtm_m: Some(103.5),
            ..SampleElevations::default()
        };
        assert_relative_eq!(elevations.ground_m().unwrap(), 105.0);
        assert_relative_eq!(elevations.qa_check_ground().unwrap(), -1.5);

        let elevations = SampleElevations {
            ortho_ground_m: Some(101.0),
            ..elevations
        };
        assert_relative_eq!(elevations.qa_check_ground().unwrap(), 2.5);
    }
}
