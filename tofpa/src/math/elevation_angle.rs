use num_traits::Float;

/// Returns the up/down angle (in degrees) of a target `rise_m` above
/// the observer at planar distance `distance_m`.
pub fn elevation_angle<T>(rise_m: T, distance_m: T) -> T
where
    T: Float,
{
    rise_m.atan2(distance_m).to_degrees()
}
