//! Terrain elevation lookups.
//!
//! The core never reads terrain models itself; callers inject an
//! [`ElevationSource`] and may wrap it in [`Cached`] and/or
//! [`Retrying`].

use crate::{backoff::Backoff, SourceError};
use dashmap::DashMap;
use geo::Coord;
use log::warn;
use std::time::Duration;

/// A terrain model that can be sampled at planar positions.
///
/// Lookups are blocking and may be issued from several threads at
/// once.
pub trait ElevationSource: Sync {
    /// Returns the terrain elevation (meters) at `position`, or
    /// `Ok(None)` where the model has no data.
    fn elevation(&self, position: Coord<f64>) -> Result<Option<f64>, SourceError>;
}

impl<F> ElevationSource for F
where
    F: Fn(Coord<f64>) -> Result<Option<f64>, SourceError> + Sync,
{
    fn elevation(&self, position: Coord<f64>) -> Result<Option<f64>, SourceError> {
        self(position)
    }
}

/// Memoizes successful lookups of an inner source.
pub struct Cached<S> {
    inner: S,

    /// Lookups keyed by the bit patterns of the position.
    lookups: DashMap<(u64, u64), Option<f64>>,
}

impl<S: ElevationSource> Cached<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            lookups: DashMap::new(),
        }
    }

    /// Number of distinct positions looked up so far.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.lookups.len()
    }
}

impl<S: ElevationSource> ElevationSource for Cached<S> {
    fn elevation(&self, position: Coord<f64>) -> Result<Option<f64>, SourceError> {
        let key = (position.x.to_bits(), position.y.to_bits());
        if let Some(hit) = self.lookups.get(&key) {
            return Ok(*hit);
        }
        // No shard lock is held while the inner source runs, it may
        // sleep between retries.
        let elevation = self.inner.elevation(position)?;
        self.lookups.insert(key, elevation);
        Ok(elevation)
    }
}

/// Retries transient failures of an inner source with exponential
/// backoff.
pub struct Retrying<S> {
    inner: S,

    /// Total attempts per lookup, including the first.
    attempts: u32,

    base_delay: Duration,

    max_delay: Duration,
}

impl<S: ElevationSource> Retrying<S> {
    pub fn new(inner: S, attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            base_delay,
            max_delay,
        }
    }
}

impl<S: ElevationSource> ElevationSource for Retrying<S> {
    fn elevation(&self, position: Coord<f64>) -> Result<Option<f64>, SourceError> {
        let mut backoff = Backoff::new(self.base_delay, self.max_delay);
        let mut attempt = 1;
        loop {
            match self.inner.elevation(position) {
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    let delay = backoff.fail();
                    warn!("elevation lookup at {position:?} failed ({e}), attempt {attempt}, retrying in {delay:?}");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                res => return res,
            }
        }
    }
}
