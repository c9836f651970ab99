use geo::{Coord, CoordFloat};
use num_traits::FromPrimitive;

/// Returns the grid azimuth, in degrees clockwise from +y and within
/// `[0, 360)`, from `from` to `to`.
pub fn azimuth<T>(from: Coord<T>, to: Coord<T>) -> T
where
    T: CoordFloat + FromPrimitive,
{
    let full_turn = T::from_f64(360.0).unwrap();
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let deg = dx.atan2(dy).to_degrees();
    let deg = deg % full_turn;
    if deg < T::zero() {
        deg + full_turn
    } else {
        deg
    }
}

/// Returns the smallest angle, in degrees, between bearings `a` and
/// `b`.
pub fn angular_difference<T>(a: T, b: T) -> T
where
    T: CoordFloat + FromPrimitive,
{
    let full_turn = T::from_f64(360.0).unwrap();
    let half_turn = T::from_f64(180.0).unwrap();
    let diff = (a - b).abs() % full_turn;
    if diff > half_turn {
        full_turn - diff
    } else {
        diff
    }
}
