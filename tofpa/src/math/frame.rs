use geo::Coord;

/// A planar frame aligned with a centerline.
///
/// `d` runs along the bearing from `origin`, `w` runs perpendicular
/// to it and is positive to the right of the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlongTrack {
    origin: Coord<f64>,
    /// Unit vector along the bearing.
    along: Coord<f64>,
    /// Unit vector to the right of the bearing.
    right: Coord<f64>,
}

impl AlongTrack {
    /// `bearing_deg` is measured clockwise from grid north (+y).
    pub fn new(origin: Coord<f64>, bearing_deg: f64) -> Self {
        let (sin, cos) = bearing_deg.to_radians().sin_cos();
        Self {
            origin,
            along: Coord { x: sin, y: cos },
            right: Coord { x: cos, y: -sin },
        }
    }

    pub fn origin(&self) -> Coord<f64> {
        self.origin
    }

    /// Returns `(d, w)` of `point` in this frame.
    pub fn project(&self, point: Coord<f64>) -> (f64, f64) {
        let v = point - self.origin;
        let d = v.x * self.along.x + v.y * self.along.y;
        let w = v.x * self.right.x + v.y * self.right.y;
        (d, w)
    }

    /// Returns the planar coordinate at `(d, w)` in this frame.
    pub fn offset(&self, d: f64, w: f64) -> Coord<f64> {
        self.origin + self.along * d + self.right * w
    }

    /// Returns a frame with the same bearing moved `d` along it.
    pub fn advance(&self, d: f64) -> Self {
        Self {
            origin: self.offset(d, 0.0),
            ..*self
        }
    }
}
