use crate::{math::AlongTrack, DerReference, TofpaError, TofpaParameters};
use geo::{Coord, EuclideanDistance, Line, LineString, Point, Polygon};
use log::debug;

/// Half-length of the reference line drawn across the surface start.
const REF_LINE_HALF_WIDTH_M: f64 = 3_000.0;

/// A take-off flight path area.
///
/// Immutable once built; evaluation only ever borrows it, so a single
/// surface can be shared by any number of worker threads.
#[derive(Debug, Clone, PartialEq)]
pub struct TofpaSurface {
    der: DerReference,

    params: TofpaParameters,

    /// Centerline frame with its origin at the start of the surface.
    frame: AlongTrack,

    /// `tan(splay)`, half-width gained per meter forward.
    divergence: f64,

    /// Ordered boundary of the surface.
    footprint: Polygon<f64>,
}

impl TofpaSurface {
    /// Builds the surface extending from `der` along its bearing.
    pub fn build(der: DerReference, params: TofpaParameters) -> Result<Self, TofpaError> {
        params.validate()?;
        // DER fields are public and may bypass `DerReference::new`.
        let der = DerReference::new(der.position, der.elevation_m, der.bearing_deg)?;

        let frame =
            AlongTrack::new(der.position, der.bearing_deg).advance(params.origin_offset_m);
        let divergence = params.splay_deg.to_radians().tan();

        let footprint = trace_footprint(&frame, &params, divergence);
        let surface = Self {
            der,
            params,
            frame,
            divergence,
            footprint,
        };

        debug!(
            "tofpa surface; start: {:?}, bearing: {}, length: {}, end half-width: {}, vertices: {}",
            surface.start(),
            der.bearing_deg,
            params.max_length_m,
            surface.half_width(params.max_length_m),
            surface.footprint.exterior().0.len() - 1,
        );

        Ok(surface)
    }

    pub fn der(&self) -> &DerReference {
        &self.der
    }

    pub fn params(&self) -> &TofpaParameters {
        &self.params
    }

    pub fn max_length_m(&self) -> f64 {
        self.params.max_length_m
    }

    /// Planar position where the surface starts.
    pub fn start(&self) -> Coord<f64> {
        self.frame.origin()
    }

    /// The surface boundary.
    pub fn footprint(&self) -> &Polygon<f64> {
        &self.footprint
    }

    /// Extended centerline from the surface start to its far end.
    pub fn centerline(&self) -> Line<f64> {
        Line::new(self.start(), self.frame.offset(self.max_length_m(), 0.0))
    }

    /// A line perpendicular to the centerline through the surface
    /// start.
    pub fn reference_line(&self) -> Line<f64> {
        Line::new(
            self.frame.offset(0.0, -REF_LINE_HALF_WIDTH_M),
            self.frame.offset(0.0, REF_LINE_HALF_WIDTH_M),
        )
    }

    /// Half-width of the surface at along-track distance `d`.
    pub fn half_width(&self, d: f64) -> f64 {
        half_width(&self.params, self.divergence, d)
    }

    /// Distance at which the surface stops widening, if that happens
    /// before its far end.
    pub fn cap_distance_m(&self) -> Option<f64> {
        cap_distance(&self.params, self.divergence)
    }

    /// Minimum design elevation at along-track distance `d`.
    ///
    /// Returns `None` outside `[0, max_length]`.
    pub fn elevation_at(&self, d: f64) -> Option<f64> {
        (0.0..=self.max_length_m())
            .contains(&d)
            .then(|| self.der.elevation_m + d * self.params.slope_ratio)
    }

    /// Returns `(d, w)`, the signed along-track distance from the
    /// surface start and the signed offset right of the centerline.
    pub fn locate(&self, point: Coord<f64>) -> (f64, f64) {
        self.frame.project(point)
    }

    /// Returns `true` if `(d, w)` lies on or inside the footprint.
    pub fn contains_located(&self, d: f64, w: f64) -> bool {
        (0.0..=self.max_length_m()).contains(&d) && w.abs() <= self.half_width(d)
    }

    /// Returns `true` if `point` lies on or inside the footprint.
    pub fn contains(&self, point: Coord<f64>) -> bool {
        let (d, w) = self.locate(point);
        self.contains_located(d, w)
    }

    /// Returns `true` if `point` lies within `buffer_m` of the
    /// footprint.
    pub fn reaches(&self, point: Coord<f64>, buffer_m: f64) -> bool {
        self.contains(point) || Point::from(point).euclidean_distance(&self.footprint) <= buffer_m
    }
}

fn half_width(params: &TofpaParameters, divergence: f64, d: f64) -> f64 {
    let half_width = params.initial_width_m / 2.0 + d.max(0.0) * divergence;
    match params.max_width_m {
        Some(max_width_m) => half_width.min(max_width_m / 2.0),
        None => half_width,
    }
}

fn cap_distance(params: &TofpaParameters, divergence: f64) -> Option<f64> {
    let max_width_m = params.max_width_m?;
    if divergence <= 0.0 {
        return None;
    }
    let d = (max_width_m - params.initial_width_m) / 2.0 / divergence;
    (d > 0.0 && d < params.max_length_m).then_some(d)
}

/// Returns the boundary through the start, the point where widening
/// stops (if any) and the far end, on both sides of the centerline.
fn trace_footprint(frame: &AlongTrack, params: &TofpaParameters, divergence: f64) -> Polygon<f64> {
    let mut stations = vec![0.0];
    if let Some(cap) = cap_distance(params, divergence) {
        stations.push(cap);
    }
    stations.push(params.max_length_m);

    // Right side outbound, left side back toward the start.
    let right = stations
        .iter()
        .map(|&d| frame.offset(d, half_width(params, divergence, d)));
    let left = stations
        .iter()
        .rev()
        .map(|&d| frame.offset(d, -half_width(params, divergence, d)));

    Polygon::new(right.chain(left).collect::<LineString<f64>>(), vec![])
}
