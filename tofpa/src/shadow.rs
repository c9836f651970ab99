//! Shadowing between penetrating obstacles.
//!
//! Seen from the start of the surface, a penetrating obstacle is
//! shadowed when a closer and taller penetrating obstacle lies in
//! roughly the same direction and subtends a higher elevation angle.

use crate::{
    math::{angular_difference, azimuth, elevation_angle},
    EvaluationResult, Outcome, TofpaSurface,
};
use rayon::prelude::*;

/// Default half-angle (degrees) of the cone in which shadowing can
/// occur.
pub const DEFAULT_SHADOW_TOLERANCE_DEG: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShadowStatus {
    /// Penetrating and not hidden by another obstacle.
    Visible,

    /// Penetrating but hidden behind the obstacle with id `by`.
    Shadowed { by: String },

    /// Not penetrating; shadowing does not apply.
    NotApplicable,
}

impl ShadowStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Visible => "VISIBLE",
            Self::Shadowed { .. } => "SHADOWED",
            Self::NotApplicable => "NOT_APPLICABLE",
        }
    }
}

/// Polar view of an obstacle from the surface start.
struct Sighting<'a> {
    id: &'a str,
    distance_m: f64,
    bearing_deg: f64,
    top_m: f64,
    angle_deg: f64,
}

/// Returns one status per entry of `results`, in the same order.
pub fn analyze(
    surface: &TofpaSurface,
    results: &[EvaluationResult],
    tolerance_deg: f64,
) -> Vec<ShadowStatus> {
    let origin = surface.start();
    let origin_z = surface.der().elevation_m;

    let sightings: Vec<Option<Sighting>> = results
        .iter()
        .map(|result| {
            (result.outcome == Outcome::Penetrates).then(|| {
                let delta = result.position - origin;
                let distance_m = delta.x.hypot(delta.y);
                Sighting {
                    id: &result.id,
                    distance_m,
                    bearing_deg: azimuth(origin, result.position),
                    top_m: result.sample_elevation_m,
                    angle_deg: elevation_angle(result.sample_elevation_m - origin_z, distance_m),
                }
            })
        })
        .collect();

    sightings
        .par_iter()
        .map(|sighting| match sighting {
            None => ShadowStatus::NotApplicable,
            Some(target) => sightings
                .iter()
                .flatten()
                .find(|other| shadows(other, target, tolerance_deg))
                .map_or(ShadowStatus::Visible, |other| ShadowStatus::Shadowed {
                    by: other.id.to_owned(),
                }),
        })
        .collect()
}

/// Returns `true` if `other` hides `target`.
fn shadows(other: &Sighting, target: &Sighting, tolerance_deg: f64) -> bool {
    other.distance_m > 0.0
        && target.distance_m > 0.0
        && other.distance_m < target.distance_m
        && other.top_m > target.top_m
        && angular_difference(other.bearing_deg, target.bearing_deg) <= tolerance_deg
        && other.angle_deg > target.angle_deg
}
