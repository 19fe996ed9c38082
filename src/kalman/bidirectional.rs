//! The bidirectional filter: an [`LKFilter`] plus a pair of measurement
//! buffers and a direction flag, producing a backward-then-forward sweep
//! over a measurement sequence.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

use crate::error::TrackerError;
use crate::matrix::Matrix;

use super::filter::LKFilter;

#[derive(Debug, Clone)]
pub struct TwoWayLKFilter {
    inner: LKFilter,
    forward_buf: VecDeque<Matrix>,
    reverse_buf: VecDeque<Matrix>,
    rev: bool,
}

/// Gives callers direct access to the wrapped filter's fields and methods
/// (`x`, `p`, `step`, `retained_measurements`, ...) the way the fit manager
/// needs to without re-exporting every one of them by hand.
impl Deref for TwoWayLKFilter {
    type Target = LKFilter;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for TwoWayLKFilter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl TwoWayLKFilter {
    pub fn new(inner: LKFilter) -> Self {
        TwoWayLKFilter {
            inner,
            forward_buf: VecDeque::new(),
            reverse_buf: VecDeque::new(),
            rev: false,
        }
    }

    pub fn is_reversed(&self) -> bool {
        self.rev
    }

    /// Load a measurement sequence: `ms` becomes the forward buffer, its
    /// reverse becomes the reverse buffer.
    pub fn add_measurements(&mut self, ms: Vec<Matrix>) {
        self.reverse_buf = ms.iter().rev().cloned().collect();
        self.forward_buf = ms.into_iter().collect();
    }

    /// Invert `A` in place and toggle the direction flag. Calling twice
    /// restores the original `A`, modulo the numerical drift of two
    /// inversions.
    pub fn reverse(&mut self) -> Result<(), TrackerError> {
        self.inner.a = self.inner.a.inverse_with_epsilon(self.inner.lu_epsilon())?;
        self.rev = !self.rev;
        Ok(())
    }

    /// A destructive backward-then-forward sweep over the buffers loaded
    /// by [`Self::add_measurements`], yielding `2 * ms.len()` states.
    pub fn sweep(&mut self) -> BidirectionalSweep<'_> {
        BidirectionalSweep {
            filter: self,
            phase: Phase::Init,
        }
    }
}

enum Phase {
    Init,
    Backward,
    Forward,
    Done,
}

pub struct BidirectionalSweep<'a> {
    filter: &'a mut TwoWayLKFilter,
    phase: Phase,
}

impl<'a> Iterator for BidirectionalSweep<'a> {
    type Item = Result<(Matrix, Matrix), TrackerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.phase {
                Phase::Init => {
                    if let Err(e) = self.filter.reverse() {
                        self.phase = Phase::Done;
                        return Some(Err(e));
                    }
                    self.phase = Phase::Backward;
                }
                Phase::Backward => match self.filter.reverse_buf.pop_front() {
                    Some(z) => return Some(self.filter.inner.step(Some(&z), true)),
                    None => {
                        std::mem::swap(&mut self.filter.forward_buf, &mut self.filter.reverse_buf);
                        if let Err(e) = self.filter.reverse() {
                            self.phase = Phase::Done;
                            return Some(Err(e));
                        }
                        self.phase = Phase::Forward;
                    }
                },
                Phase::Forward => match self.filter.reverse_buf.pop_front() {
                    Some(z) => return Some(self.filter.inner.step(Some(&z), true)),
                    None => {
                        self.phase = Phase::Done;
                        return None;
                    }
                },
                Phase::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(dx: f64) -> TwoWayLKFilter {
        let a = Matrix::new(vec![vec![1.0, dx], vec![0.0, 1.0]]);
        let h = Matrix::new(vec![vec![1.0, 0.0]]);
        let x = Matrix::new(vec![vec![0.0], vec![0.0]]);
        let p = Matrix::new(vec![vec![10.0, 0.0], vec![0.0, 10.0]]);
        let q = Matrix::new(vec![vec![1e-4, 0.0], vec![0.0, 1e-4]]);
        let r = Matrix::new(vec![vec![5.0]]);
        TwoWayLKFilter::new(LKFilter::new(a, h, x, p, q, r).unwrap())
    }

    #[test]
    fn sweep_yields_twice_the_measurement_count() {
        let mut f = make(1.0);
        let ms: Vec<Matrix> = (0..5).map(|i| Matrix::new(vec![vec![i as f64]])).collect();
        f.add_measurements(ms);
        let states: Vec<_> = f.sweep().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(states.len(), 10);
    }

    #[test]
    fn reversing_twice_restores_a_up_to_numerical_drift() {
        let mut f = make(1.0);
        let original = f.a.clone();
        f.reverse().unwrap();
        f.reverse().unwrap();
        for i in 0..2 {
            for j in 0..2 {
                assert!((f.a.get(i, j) - original.get(i, j)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn reverse_toggles_direction_flag() {
        let mut f = make(1.0);
        assert!(!f.is_reversed());
        f.reverse().unwrap();
        assert!(f.is_reversed());
    }
}
