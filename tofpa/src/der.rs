use crate::{math::azimuth, TofpaError};
use geo::Coord;
use serde::{Deserialize, Serialize};

/// Which way aircraft take off along a digitized runway line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TakeoffDirection {
    /// Take off from the first vertex toward the last.
    #[default]
    StartToEnd,

    /// Take off from the last vertex toward the first.
    EndToStart,
}

/// Departure end of runway.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerReference {
    /// Planar position of the DER.
    pub position: Coord<f64>,

    /// Elevation of the DER above the vertical datum (meters).
    pub elevation_m: f64,

    /// Outbound bearing of the extended centerline, degrees clockwise
    /// from grid north.
    pub bearing_deg: f64,
}

impl DerReference {
    pub fn new(position: Coord<f64>, elevation_m: f64, bearing_deg: f64) -> Result<Self, TofpaError> {
        if !(position.x.is_finite()
            && position.y.is_finite()
            && elevation_m.is_finite()
            && bearing_deg.is_finite())
        {
            return Err(TofpaError::InvalidParameters(
                "DER position, elevation and bearing must be finite".to_owned(),
            ));
        }
        Ok(Self {
            position,
            elevation_m,
            bearing_deg: bearing_deg.rem_euclid(360.0),
        })
    }

    /// Returns the DER at the far end of a runway, in the direction of
    /// takeoff.
    pub fn from_runway(
        start: Coord<f64>,
        end: Coord<f64>,
        direction: TakeoffDirection,
        elevation_m: f64,
    ) -> Result<Self, TofpaError> {
        if start == end {
            return Err(TofpaError::InvalidParameters(
                "runway must have two distinct end points".to_owned(),
            ));
        }
        let (from, to) = match direction {
            TakeoffDirection::StartToEnd => (start, end),
            TakeoffDirection::EndToStart => (end, start),
        };
        Self::new(to, elevation_m, azimuth(from, to))
    }
}
