//! Multi-track fit manager: the subsystem the teacher's own filter/track
//! split anticipates but never needed, since a single robot only ever
//! tracks itself. Here many candidate filters compete for hits across a
//! layered detector, one bidirectional Kalman filter per hypothesis.

use crate::config::FitConfig;
use crate::detector::LayeredDetector;
use crate::error::TrackerError;
use crate::kalman::TwoWayLKFilter;
use crate::matrix::Matrix;

/// Sweeps a populated detector layer by layer (descending `x`), spawning,
/// gating, advancing and pruning candidate filters built from a prototype
/// whose `A` is inverted once at construction so the sweep runs backward
/// through the detector's layer order.
pub struct FitManager<'a> {
    detector: &'a mut LayeredDetector,
    prototype: TwoWayLKFilter,
    candidates: Vec<TwoWayLKFilter>,
    config: FitConfig,
}

impl<'a> FitManager<'a> {
    /// `config.lu_epsilon` is pushed onto the prototype (and so onto every
    /// clone spawned from it) before it's reversed, so every candidate's `S`
    /// and `A` inversions use it; `config.gating_sigma_squared` and
    /// `config.min_retained_measurements` drive `fit`'s gate and prune step.
    pub fn new(
        detector: &'a mut LayeredDetector,
        mut prototype: TwoWayLKFilter,
        config: FitConfig,
    ) -> Result<Self, TrackerError> {
        prototype.set_lu_epsilon(config.lu_epsilon);
        prototype.reverse()?;
        Ok(FitManager {
            detector,
            prototype,
            candidates: Vec::new(),
            config,
        })
    }

    pub fn candidates(&self) -> &[TwoWayLKFilter] {
        &self.candidates
    }

    /// Run the full layer sweep and return the surviving candidates.
    pub fn fit(&mut self) -> Result<&[TwoWayLKFilter], TrackerError> {
        let layer_order = self.detector.layer_indices(true);
        let (first, rest) = layer_order.split_first().expect("detector has at least one layer");

        self.spawn_new_filters(*first)?;

        for &layer_idx in rest {
            for cand in self.candidates.iter_mut() {
                let y_predicted = cand.x.get(0, 0);
                let y_err = cand.p.get(0, 0);
                let layer = &self.detector.layers[layer_idx];
                let gated = layer.peek_nearest(y_predicted).filter(|&(_, measured_y, _)| {
                    (measured_y - y_predicted).powi(2) <= self.config.gating_sigma_squared * y_err
                });

                match gated {
                    Some((strip_idx, measured_y, _)) => {
                        self.detector.layers[layer_idx].consume_strip(strip_idx);
                        let z = Matrix::new(vec![vec![measured_y]]);
                        cand.step(Some(&z), true)?;
                    }
                    None => {
                        cand.step(None, true)?;
                    }
                }
            }
            self.spawn_new_filters(layer_idx)?;
        }

        let min_retained = self.config.min_retained_measurements;
        self.candidates
            .retain(|c| c.retained_measurements().len() > min_retained);
        Ok(&self.candidates)
    }

    /// Spawn one candidate per unit of hit multiplicity on `layer_idx`,
    /// seeded at `x = (y, y / x_strip)^T` with covariance `diag(10, 10)`,
    /// then clear the layer's hits.
    fn spawn_new_filters(&mut self, layer_idx: usize) -> Result<(), TrackerError> {
        let layer = &self.detector.layers[layer_idx];
        let x_strip = layer.x;
        let units = layer.hit_units();

        for (y, hits) in units {
            for _ in 0..hits {
                let mut candidate = self.prototype.clone();
                let state = Matrix::new(vec![vec![y], vec![y / x_strip]]);
                let cov = Matrix::new(vec![vec![10.0, 0.0], vec![0.0, 10.0]]);
                candidate.set_state(state, cov);
                candidate.step(None, true)?;
                log::debug!("spawned candidate at layer x={} y={}", x_strip, y);
                self.candidates.push(candidate);
            }
        }

        self.detector.layers[layer_idx].clear_hits();
        Ok(())
    }

    /// For each surviving candidate, reverse direction and emit a
    /// `(x, y)` sequence spanning the detector: an anchor point, one
    /// unmatched predict to align update/predict ordering, then one point
    /// per retained entry excluding the synthetic seed recorded at spawn
    /// time — replaying a gated entry as `step(Some(z))` and an ungated one
    /// as `step(None)`, so skipped layers still advance `x` by one `x_step`.
    pub fn propagate_tracks(&mut self) -> Result<Vec<Vec<(f64, f64)>>, TrackerError> {
        let x_step = self.detector.x_step();
        let leftmost_x = self
            .detector
            .get_layers(false)
            .first()
            .map(|l| l.x)
            .unwrap_or(self.detector.x);

        let mut tracks = Vec::with_capacity(self.candidates.len());
        for cand in self.candidates.iter_mut() {
            cand.reverse()?;

            let mut x = leftmost_x - x_step;
            let mut points = vec![(x, cand.x.get(0, 0))];

            cand.step(None, false)?;
            x += x_step;
            points.push((x, cand.x.get(0, 0)));

            let replay: Vec<Option<Matrix>> = cand.retained_measurements().iter().skip(1).cloned().collect();
            for z in replay {
                cand.step(z.as_ref(), false)?;
                x += x_step;
                points.push((x, cand.x.get(0, 0)));
            }

            tracks.push(points);
        }
        Ok(tracks)
    }
}
