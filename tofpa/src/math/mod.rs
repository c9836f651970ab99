mod bearing;
mod elevation_angle;
mod frame;

pub(crate) use {
    bearing::{angular_difference, azimuth},
    elevation_angle::elevation_angle,
    frame::AlongTrack,
};
