//! The single-direction linear Kalman filter.

use std::collections::VecDeque;

use crate::error::TrackerError;
use crate::matrix::{Matrix, DEFAULT_LU_EPSILON};

/// `(A, H, x, P, Q, R, I)` plus a retention buffer and iteration count.
/// `I` is derived at construction from `x`'s dimension and never changes.
#[derive(Debug, Clone)]
pub struct LKFilter {
    pub a: Matrix,
    pub h: Matrix,
    pub x: Matrix,
    pub p: Matrix,
    pub q: Matrix,
    pub r: Matrix,
    pub i: Matrix,
    /// Epsilon substituted for a zero pivot when inverting the innovation
    /// covariance `S` during `update`. Configurable so `FitManager` can wire
    /// a `FitConfig::lu_epsilon` through to candidate filters.
    lu_epsilon: f64,
    /// Measurements retained via `step(_, add = true)`, in step order: one
    /// entry per such call. A gated call records `Some(z)`; an ungated one
    /// records `None`, except the very first call on an empty buffer, which
    /// seeds it with a synthetic entry built from the current state (see
    /// [`Self::step`]). This keeps the buffer one-entry-per-layer, which
    /// downstream replay (the fit manager's `propagate_tracks`) depends on.
    retained: Vec<Option<Matrix>>,
    /// Queue drained by [`crate::kalman::filter::Sweep`]; populated by
    /// [`Self::add_measurements`]. Independent of `retained`.
    queue: VecDeque<Matrix>,
    iterations: u64,
}

impl LKFilter {
    pub fn new(a: Matrix, h: Matrix, x: Matrix, p: Matrix, q: Matrix, r: Matrix) -> Result<Self, TrackerError> {
        let (n, _) = x.size();
        let i = Matrix::identity(n)?;
        Ok(LKFilter {
            a,
            h,
            x,
            p,
            q,
            r,
            i,
            lu_epsilon: DEFAULT_LU_EPSILON,
            retained: Vec::new(),
            queue: VecDeque::new(),
            iterations: 0,
        })
    }

    pub fn lu_epsilon(&self) -> f64 {
        self.lu_epsilon
    }

    /// Override the pivot epsilon used to invert `S` in `update`.
    pub fn set_lu_epsilon(&mut self, epsilon: f64) {
        self.lu_epsilon = epsilon;
    }

    pub fn state(&self) -> (&Matrix, &Matrix) {
        (&self.x, &self.p)
    }

    pub fn set_state(&mut self, x: Matrix, p: Matrix) {
        self.x = x;
        self.p = p;
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Retained entries so far, in step order. `None` marks a layer the
    /// filter stepped through without a gated measurement.
    pub fn retained_measurements(&self) -> &[Option<Matrix>] {
        &self.retained
    }

    /// The retained buffer projected to rounded floats, mirroring the
    /// original's `measurements_list` diagnostic property. An ungated entry
    /// projects to `None`.
    pub fn measurements_list(&self) -> Vec<Option<f64>> {
        self.retained
            .iter()
            .map(|m| m.as_ref().map(|m| round5(m.get(0, 0))))
            .collect()
    }

    /// Kalman update: `y = z - H*x`, `S = H*P*H^T + R`, `K = P*H^T*S^-1`,
    /// `x <- x + K*y`, `P <- (I - K*H)*P`.
    pub fn update(&mut self, z: &Matrix) -> Result<(), TrackerError> {
        let hx = self.h.mul(&self.x)?;
        if z.size() != hx.size() {
            return Err(TrackerError::WrongMeasurementShape);
        }
        let y = z.sub(&hx)?;
        let h_t = self.h.t();
        let s = self.h.mul(&self.p)?.mul(&h_t)?.add(&self.r)?;
        let k = self.p.mul(&h_t)?.mul(&s.inverse_with_epsilon(self.lu_epsilon)?)?;
        self.x = self.x.add(&k.mul(&y)?)?;
        let kh = k.mul(&self.h)?;
        self.p = self.i.sub(&kh)?.mul(&self.p)?;
        Ok(())
    }

    /// Kalman predict: `x <- A*x`, `P <- A*P*A^T + Q`.
    pub fn predict(&mut self) -> Result<(), TrackerError> {
        self.x = self.a.mul(&self.x)?;
        let a_t = self.a.t();
        self.p = self.a.mul(&self.p)?.mul(&a_t)?.add(&self.q)?;
        Ok(())
    }

    /// Advance the filter by one step. If `z` is `Some`, runs `update`
    /// first. Always runs `predict` afterward. If `add` is set, records one
    /// entry into the retention buffer per call: `Some(z)` if a measurement
    /// was given, `None` if not — except the very first retaining call on
    /// an empty buffer, which records a synthetic seed built from the
    /// current state's first coordinate, normalized to the same `1x1` shape
    /// every real measurement has. Recording `None` on ungated calls (not
    /// just dropping them) keeps the buffer one entry per layer traversed,
    /// which the fit manager's replay depends on.
    pub fn step(&mut self, z: Option<&Matrix>, add: bool) -> Result<(Matrix, Matrix), TrackerError> {
        if add {
            match z {
                Some(z) => self.retained.push(Some(z.clone())),
                None if self.retained.is_empty() => {
                    self.retained.push(Some(Matrix::new(vec![vec![self.x.get(0, 0)]])));
                }
                None => self.retained.push(None),
            }
        }
        if let Some(z) = z {
            self.update(z)?;
        }
        self.predict()?;
        self.iterations += 1;
        Ok((self.x.clone(), self.p.clone()))
    }

    /// Load a measurement sequence for later destructive iteration via
    /// [`Self::sweep`]. Independent of the `step`-driven retention buffer.
    pub fn add_measurements(&mut self, ms: Vec<Matrix>) {
        self.queue = ms.into_iter().collect();
    }

    /// A lazy, destructive, finite iterator that pops the queue loaded by
    /// [`Self::add_measurements`], calling `step(head, add = true)` per
    /// item and yielding the resulting state.
    pub fn sweep(&mut self) -> Sweep<'_> {
        Sweep { filter: self }
    }
}

fn round5(v: f64) -> f64 {
    (v * 1e5).round() / 1e5
}

/// Destructive iterator over an [`LKFilter`]'s measurement queue.
pub struct Sweep<'a> {
    filter: &'a mut LKFilter,
}

impl<'a> Iterator for Sweep<'a> {
    type Item = Result<(Matrix, Matrix), TrackerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let z = self.filter.queue.pop_front()?;
        Some(self.filter.step(Some(&z), true))
    }
}
