//! # Take-Off Flight Path Area
//!
//! `tofpa` builds the take-off flight path area (TOFPA) surface beyond
//! a runway's departure end (DER) and checks terrain and obstacle
//! samples against it.
//!
//! Everything operates in a planar, projected coordinate system with
//! elevations in meters.

mod backoff;
mod der;
mod error;
pub mod evaluate;
pub mod export;
mod math;
mod params;
pub mod record;
mod sample;
pub mod shadow;
pub mod source;
mod surface;

pub use {
    crate::{
        der::{DerReference, TakeoffDirection},
        error::{SourceError, TofpaError},
        evaluate::{Diagnostics, EvaluationResult, Evaluator, Outcome, Skip, SkipReason},
        params::TofpaParameters,
        sample::{SampleElevations, SamplePoint},
        source::ElevationSource,
        surface::TofpaSurface,
    },
    geo,
};
