//! Obstacle and terrain penetration checks against a [`TofpaSurface`].

use crate::{ElevationSource, SampleElevations, SamplePoint, SourceError, TofpaError, TofpaSurface};
use geo::Coord;
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Default penetration tolerance (meters).
pub const DEFAULT_TOLERANCE_M: f64 = 0.01;

/// Classification of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Inside the footprint and at or below the surface (within
    /// tolerance).
    Clear,

    /// Inside the footprint and above the surface by more than the
    /// tolerance.
    Penetrates,

    /// Outside the footprint.
    NotApplicable,
}

/// Result of checking one sample against the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub id: String,
    pub obj_type: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub position: Coord<f64>,

    /// Input readings, with `dtm_m` filled in from the elevation
    /// source when one was consulted.
    pub elevations: SampleElevations,

    /// Orthometric elevation of the sample's top (meters).
    pub sample_elevation_m: f64,

    /// Signed distance along the centerline from the surface start
    /// (meters).
    pub distance_der_m: f64,

    /// Signed distance right of the centerline (meters).
    pub offset_m: f64,

    /// Design surface elevation at `distance_der_m`, if inside the
    /// footprint.
    pub design_elevation_m: Option<f64>,

    /// `sample_elevation_m - design_elevation_m`, if inside the
    /// footprint.
    pub penetration_m: Option<f64>,

    /// Terrain-model minus ground elevation; a data cross-check
    /// independent of `outcome`.
    pub qa_check_ground: Option<f64>,

    pub outcome: Outcome,
}

/// Why a sample produced no result.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// No usable planar position.
    MissingPosition,

    /// No usable top elevation.
    MissingElevation,

    /// The elevation source failed for this sample.
    SourceUnavailable(SourceError),

    /// The run was cancelled before this sample was reached.
    Cancelled,

    /// The input record had no usable identifier.
    MissingId,

    /// The input record could not be read as a sample at all.
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skip {
    pub id: String,
    pub reason: SkipReason,
}

/// Summary of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// Samples excluded from the results.
    pub skipped: Vec<Skip>,
    pub clear: usize,
    pub penetrates: usize,
    pub not_applicable: usize,
}

impl Diagnostics {
    /// Samples skipped for missing or unresolvable data.
    pub fn missing_data(&self) -> impl Iterator<Item = &Skip> + '_ {
        self.skipped
            .iter()
            .filter(|skip| skip.reason != SkipReason::Cancelled)
    }

    /// Number of samples not reached because the run was cancelled.
    pub fn cancelled(&self) -> usize {
        self.skipped
            .iter()
            .filter(|skip| skip.reason == SkipReason::Cancelled)
            .count()
    }
}

/// Results of a run, in input order, plus its diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub results: Vec<EvaluationResult>,
    pub diagnostics: Diagnostics,
}

/// Checks samples against `surface` without an elevation source.
pub fn evaluate(
    surface: &TofpaSurface,
    samples: &[SamplePoint],
    tolerance_m: f64,
) -> Result<Evaluation, TofpaError> {
    Evaluator::new(surface)
        .tolerance(tolerance_m)
        .evaluate(samples)
}

/// Checks samples against a surface.
///
/// Samples are independent, so they are evaluated in parallel; the
/// surface and the optional collaborators are only ever borrowed.
pub struct Evaluator<'a> {
    surface: &'a TofpaSurface,

    /// Penetrations up to and including this value are clear.
    tolerance_m: f64,

    /// Consulted for samples without a terrain-model elevation.
    source: Option<&'a dyn ElevationSource>,

    /// Radius around each sample that must reach the footprint for
    /// the sample to be checked.
    buffer_m: f64,

    /// Floor on the height of a sample's top above its ground.
    min_height_m: Option<f64>,

    /// When set, no further samples are started.
    cancel: Option<&'a AtomicBool>,

    /// Called once per sample handled.
    progress: Option<&'a (dyn Fn() + Sync)>,
}

impl<'a> Evaluator<'a> {
    pub fn new(surface: &'a TofpaSurface) -> Self {
        Self {
            surface,
            tolerance_m: DEFAULT_TOLERANCE_M,
            buffer_m: 0.0,
            min_height_m: None,
            source: None,
            cancel: None,
            progress: None,
        }
    }

    /// Penetration tolerance (meters, defaults to
    /// [`DEFAULT_TOLERANCE_M`]).
    #[must_use]
    pub fn tolerance(mut self, meters: f64) -> Self {
        self.tolerance_m = meters;
        self
    }

    /// Checks every sample whose surroundings, out to `meters`, touch
    /// the footprint. The design elevation is then taken `meters`
    /// closer to the surface start.
    #[must_use]
    pub fn buffer(mut self, meters: f64) -> Self {
        self.buffer_m = meters;
        self
    }

    /// Treats every sample with a known ground elevation as at least
    /// `meters` tall. Samples with a ground elevation but no top get
    /// exactly this height.
    #[must_use]
    pub fn min_height(mut self, meters: f64) -> Self {
        self.min_height_m = Some(meters);
        self
    }

    /// Terrain model for samples without a `dtm_m` reading.
    #[must_use]
    pub fn source(mut self, source: &'a dyn ElevationSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Flag checked before each sample; set it to stop the run early.
    #[must_use]
    pub fn cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Callback invoked once per sample handled.
    #[must_use]
    pub fn progress(mut self, progress: &'a (dyn Fn() + Sync)) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Evaluates all `samples`.
    ///
    /// Only an invalid tolerance fails the run; per-sample problems
    /// are reported in [`Evaluation::diagnostics`].
    pub fn evaluate(&self, samples: &[SamplePoint]) -> Result<Evaluation, TofpaError> {
        if !self.tolerance_m.is_finite() || self.tolerance_m < 0.0 {
            return Err(TofpaError::InvalidParameters(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance_m
            )));
        }
        if !self.buffer_m.is_finite() || self.buffer_m < 0.0 {
            return Err(TofpaError::InvalidParameters(format!(
                "obstacle buffer must be a non-negative number, got {}",
                self.buffer_m
            )));
        }
        if let Some(min_height_m) = self.min_height_m {
            if !min_height_m.is_finite() || min_height_m < 0.0 {
                return Err(TofpaError::InvalidParameters(format!(
                    "minimum obstacle height must be a non-negative number, got {min_height_m}"
                )));
            }
        }

        let now = std::time::Instant::now();
        let outcomes: Vec<Result<EvaluationResult, SkipReason>> = samples
            .par_iter()
            .map(|sample| {
                let res = self.evaluate_one(sample);
                if let Some(progress) = self.progress {
                    progress();
                }
                res
            })
            .collect();

        let mut evaluation = Evaluation {
            results: Vec::with_capacity(outcomes.len()),
            diagnostics: Diagnostics::default(),
        };
        for (sample, outcome) in samples.iter().zip(outcomes) {
            match outcome {
                Ok(result) => {
                    let diagnostics = &mut evaluation.diagnostics;
                    match result.outcome {
                        Outcome::Clear => diagnostics.clear += 1,
                        Outcome::Penetrates => diagnostics.penetrates += 1,
                        Outcome::NotApplicable => diagnostics.not_applicable += 1,
                    }
                    evaluation.results.push(result);
                }
                Err(reason) => {
                    if reason != SkipReason::Cancelled {
                        warn!("skipping sample {}: {reason:?}", sample.id);
                    }
                    evaluation.diagnostics.skipped.push(Skip {
                        id: sample.id.clone(),
                        reason,
                    });
                }
            }
        }

        let Diagnostics {
            skipped,
            clear,
            penetrates,
            not_applicable,
        } = &evaluation.diagnostics;
        debug!(
            "evaluation; samples: {}, clear: {clear}, penetrates: {penetrates}, not applicable: {not_applicable}, skipped: {}, exec: {:?}",
            samples.len(),
            skipped.len(),
            now.elapsed()
        );

        Ok(evaluation)
    }

    /// Evaluates a single sample.
    pub fn evaluate_one(&self, sample: &SamplePoint) -> Result<EvaluationResult, SkipReason> {
        if self
            .cancel
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return Err(SkipReason::Cancelled);
        }

        let position = sample
            .position
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .ok_or(SkipReason::MissingPosition)?;
        let sample_elevation_m = self
            .sample_elevation(&sample.elevations)
            .ok_or(SkipReason::MissingElevation)?;

        let mut elevations = sample.elevations;
        if let (None, Some(source)) = (elevations.dtm_m, self.source) {
            elevations.dtm_m = source
                .elevation(position)
                .map_err(SkipReason::SourceUnavailable)?;
        }

        let surface = self.surface;
        let (d, w) = surface.locate(position);
        let inside = if self.buffer_m > 0.0 {
            surface.reaches(position, self.buffer_m)
        } else {
            surface.contains_located(d, w)
        };
        let design_elevation_m = if inside {
            surface.elevation_at((d - self.buffer_m).clamp(0.0, surface.max_length_m()))
        } else {
            None
        };
        let penetration_m = design_elevation_m.map(|z| sample_elevation_m - z);
        let outcome = match penetration_m {
            Some(p) if p > self.tolerance_m => Outcome::Penetrates,
            Some(_) => Outcome::Clear,
            None => Outcome::NotApplicable,
        };

        Ok(EvaluationResult {
            id: sample.id.clone(),
            obj_type: sample.obj_type.clone(),
            lat: sample.lat,
            lon: sample.lon,
            position,
            elevations,
            sample_elevation_m,
            distance_der_m: d,
            offset_m: w,
            design_elevation_m,
            penetration_m,
            qa_check_ground: elevations.qa_check_ground(),
            outcome,
        })
    }

    fn sample_elevation(&self, elevations: &SampleElevations) -> Option<f64> {
        let top = elevations.top_m();
        match (self.min_height_m, elevations.ground_m()) {
            (Some(min_height_m), Some(ground)) => {
                let floor = ground + min_height_m;
                Some(top.map_or(floor, |top| top.max(floor)))
            }
            _ => top,
        }
    }
}
