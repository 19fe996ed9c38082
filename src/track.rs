//! Trajectories: a capability trait plus the one concrete variant this
//! crate implements. The trait stays open for a future non-linear variant
//! (a magnetic track, say) the way the design notes anticipate, but only
//! `LineTrack` exists today.

use rand::Rng;

use crate::error::TrackerError;

/// A trajectory that reports `y` for any `x`. The base case is never
/// meant to be called directly — there is no concrete "abstract" track
/// type, only this trait and its implementors.
pub trait Track {
    fn y_intercept_at(&self, x: f64) -> Result<f64, TrackerError>;
}

/// Marker type standing in for the original's uninstantiable base track.
/// Exists so the `Unimplemented` error has a concrete producer; no crate
/// code constructs one outside tests.
#[derive(Debug, Default)]
pub struct BaseTrack;

impl Track for BaseTrack {
    fn y_intercept_at(&self, _x: f64) -> Result<f64, TrackerError> {
        Err(TrackerError::Unimplemented)
    }
}

/// `y = a*x + b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineTrack {
    pub a: f64,
    pub b: f64,
}

impl LineTrack {
    pub fn new(a: f64, b: f64) -> Self {
        LineTrack { a, b }
    }
}

impl Track for LineTrack {
    fn y_intercept_at(&self, x: f64) -> Result<f64, TrackerError> {
        Ok(self.a * x + self.b)
    }
}

/// Generate `n` straight-line tracks with `b` uniform in `[-0.1, 0.1]` and
/// slope angle uniform in `[-15, 15]` degrees (`a = tan(pi/6 * (u - 0.5))`
/// for `u` uniform in `[0, 1]`).
pub fn gen_straight_tracks(n: usize) -> Vec<LineTrack> {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| {
            let b = 0.2 * (rng.gen::<f64>() - 0.5);
            let u: f64 = rng.gen();
            let a = (std::f64::consts::PI / 6.0 * (u - 0.5)).tan();
            LineTrack::new(a, b)
        })
        .collect()
}
