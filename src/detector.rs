//! The layered strip detector: `LayeredDetector` owns `Layer`s, each of
//! which owns `Strip`s. Hit counts propagate upward by return value rather
//! than through parent back-pointers — the design notes this crate is
//! built from flag the original's parent references as a cycle risk best
//! avoided with an ownership tree plus explicit counter updates instead of
//! arena indices or weak references.

use crate::error::TrackerError;
use crate::track::Track;

/// A single strip sensor. `y_err` defaults to `height / sqrt(12)`, the
/// standard deviation of a uniform distribution across the strip width,
/// when not given explicitly.
#[derive(Debug, Clone)]
pub struct Strip {
    pub x: f64,
    pub y: f64,
    pub height: f64,
    pub x_err: f64,
    pub y_err: f64,
    pub hits: u64,
}

impl Strip {
    pub fn new(x: f64, y: f64, height: f64, x_err: f64, y_err: Option<f64>) -> Self {
        let y_err = y_err.unwrap_or_else(|| height / 12f64.sqrt());
        Strip {
            x,
            y,
            height,
            x_err,
            y_err,
            hits: 0,
        }
    }
}

/// An ordered set of strips at a fixed `x`. Tracks which strips currently
/// hold at least one hit, in the order they were first hit.
#[derive(Debug)]
pub struct Layer {
    pub x: f64,
    pub y: f64,
    pub height: f64,
    pub strips: Vec<Strip>,
    /// Indices into `strips`, in first-hit order. A strip's index appears
    /// here iff its `hits` count is > 0.
    hit_strips: Vec<usize>,
    hits: u64,
}

/// Outcome of a single `hit` call, used by the owning detector to keep its
/// own aggregate counter in sync without a parent back-pointer.
pub(crate) enum HitOutcome {
    Recorded,
    OutOfRange,
}

impl Layer {
    pub fn new(x: f64, y: f64, height: f64, num_strips: usize, x_err: f64) -> Self {
        let step = height / num_strips as f64;
        let y_bottom = y - height / 2.0;
        let strips = (0..num_strips)
            .map(|i| {
                let strip_y = y_bottom + (i as f64 + 0.5) * step;
                Strip::new(x, strip_y, step, x_err, None)
            })
            .collect();
        Layer {
            x,
            y,
            height,
            strips,
            hit_strips: Vec::new(),
            hits: 0,
        }
    }

    fn y_bottom(&self) -> f64 {
        self.y - self.height / 2.0
    }

    fn y_top(&self) -> f64 {
        self.y + self.height / 2.0
    }

    fn step(&self) -> f64 {
        self.height / self.strips.len() as f64
    }

    /// Record a hit at `(x, y)`. `x` must equal this layer's own `x`;
    /// anything else is a caller bug reported as `WrongLayerX`. A `y`
    /// outside `[y_bottom, y_top)` is silently dropped by contract.
    pub(crate) fn hit(&mut self, x: f64, y: f64) -> Result<HitOutcome, TrackerError> {
        if x != self.x {
            return Err(TrackerError::WrongLayerX);
        }
        if y >= self.y_top() || y < self.y_bottom() {
            return Ok(HitOutcome::OutOfRange);
        }
        let strip_index = ((y - self.y_bottom()) / self.step()).floor() as usize;
        let strip_index = strip_index.min(self.strips.len() - 1);

        let was_empty = self.strips[strip_index].hits == 0;
        self.strips[strip_index].hits += 1;
        if was_empty {
            self.hit_strips.push(strip_index);
        }
        self.hits += 1;
        Ok(HitOutcome::Recorded)
    }

    pub fn hit_strips(&self) -> impl Iterator<Item = &Strip> {
        self.hit_strips.iter().map(move |&i| &self.strips[i])
    }

    /// Find the hit strip closest to `y_predicted` without consuming it,
    /// returning its index plus its `y` and `y_err`. Separate from
    /// consumption so the fit manager can gate before committing.
    pub(crate) fn peek_nearest(&self, y_predicted: f64) -> Option<(usize, f64, f64)> {
        let best = self
            .hit_strips
            .iter()
            .copied()
            .min_by(|&a, &b| {
                let da = (self.strips[a].y - y_predicted).abs();
                let db = (self.strips[b].y - y_predicted).abs();
                da.partial_cmp(&db).unwrap()
            })?;
        Some((best, self.strips[best].y, self.strips[best].y_err))
    }

    /// Consume one hit from the strip at `strip_index`, removing it from
    /// `hit_strips` once its count reaches zero.
    pub(crate) fn consume_strip(&mut self, strip_index: usize) {
        self.strips[strip_index].hits -= 1;
        if self.strips[strip_index].hits == 0 {
            self.hit_strips.retain(|&i| i != strip_index);
        }
    }

    /// Total hit multiplicity still outstanding on the layer, one unit per
    /// candidate `_spawn_new_filters` should create.
    pub(crate) fn total_hit_multiplicity(&self) -> u64 {
        self.hit_strips.iter().map(|&i| self.strips[i].hits).sum()
    }

    /// `(y, hit_count)` for every strip currently holding a hit. Used by
    /// `_spawn_new_filters`, which spawns one candidate per unit of
    /// multiplicity (a strip hit 3 times spawns 3 candidates there).
    pub(crate) fn hit_units(&self) -> Vec<(f64, u64)> {
        self.hit_strips
            .iter()
            .map(|&i| (self.strips[i].y, self.strips[i].hits))
            .collect()
    }

    pub fn clear_hits(&mut self) {
        for &i in &self.hit_strips {
            self.strips[i].hits = 0;
        }
        self.hit_strips.clear();
        self.hits = 0;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }
}

/// An ordered collection of layers spanning `x` to `x + length`.
#[derive(Debug)]
pub struct LayeredDetector {
    pub x: f64,
    pub y: f64,
    pub length: f64,
    pub layer_height: f64,
    pub layers: Vec<Layer>,
    hits: u64,
}

impl LayeredDetector {
    pub fn new(
        x: f64,
        y: f64,
        layer_height: f64,
        length: f64,
        num_layers: usize,
        num_strips: usize,
    ) -> Self {
        let x_step = Self::compute_x_step(length, num_layers);
        let layers = (0..num_layers)
            .map(|i| Layer::new(x + i as f64 * x_step, y, layer_height, num_strips, 0.0))
            .collect();
        LayeredDetector {
            x,
            y,
            length,
            layer_height,
            layers,
            hits: 0,
        }
    }

    fn compute_x_step(length: f64, num_layers: usize) -> f64 {
        if num_layers > 1 {
            length / (num_layers - 1) as f64
        } else {
            0.0
        }
    }

    pub fn x_step(&self) -> f64 {
        Self::compute_x_step(self.length, self.layers.len())
    }

    pub fn pos(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Propagate a single track: for each layer, evaluate the track at the
    /// layer's `x` and deposit (or drop) the resulting hit.
    pub fn propagate_track(&mut self, track: &dyn Track) -> Result<(), TrackerError> {
        for layer in self.layers.iter_mut() {
            let y = track.y_intercept_at(layer.x)?;
            let outcome = layer.hit(layer.x, y)?;
            if let HitOutcome::Recorded = outcome {
                self.hits += 1;
            }
        }
        Ok(())
    }

    pub fn propagate_tracks(&mut self, tracks: &[Box<dyn Track>]) -> Result<(), TrackerError> {
        for track in tracks {
            self.propagate_track(track.as_ref())?;
        }
        Ok(())
    }

    pub fn clear_hits(&mut self) {
        for layer in self.layers.iter_mut() {
            layer.clear_hits();
        }
        self.hits = 0;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Layers sorted by `x`, ascending or descending.
    pub fn get_layers(&self, reverse: bool) -> Vec<&Layer> {
        let mut layers: Vec<&Layer> = self.layers.iter().collect();
        layers.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
        if reverse {
            layers.reverse();
        }
        layers
    }

    pub(crate) fn layer_indices(&self, reverse: bool) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.layers.len()).collect();
        indices.sort_by(|&a, &b| self.layers[a].x.partial_cmp(&self.layers[b].x).unwrap());
        if reverse {
            indices.reverse();
        }
        indices
    }

    /// Render the detector layout and accumulated hit counts to a PNG at
    /// `path`, rounding displayed values to `rounding` decimal places.
    pub fn draw(&self, path: &str, rounding: usize) -> Result<(), Box<dyn std::error::Error>> {
        use plotters::prelude::*;

        let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let y_min = self.y - self.layer_height / 2.0 - self.layer_height * 0.1;
        let y_max = self.y + self.layer_height / 2.0 + self.layer_height * 0.1;
        let x_min = self.x - self.x_step().max(1.0) * 0.5;
        let x_max = self.x + self.length + self.x_step().max(1.0) * 0.5;

        let mut chart = ChartBuilder::on(&root)
            .caption("strip detector", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(30)
            .y_label_area_size(30)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        chart.configure_mesh().draw()?;

        for layer in &self.layers {
            for strip in &layer.strips {
                let label = format!("{}@{:.*}", strip.hits, rounding, strip.y);
                chart.draw_series(std::iter::once(Circle::new(
                    (strip.x, strip.y),
                    3,
                    if strip.hits > 0 { RED.filled() } else { BLACK.filled() },
                )))?;
                if strip.hits > 0 {
                    chart.draw_series(std::iter::once(Text::new(
                        label,
                        (strip.x, strip.y),
                        ("sans-serif", 10),
                    )))?;
                }
            }
        }

        root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::LineTrack;

    fn flat_detector() -> LayeredDetector {
        LayeredDetector::new(1.0, 0.0, 0.5, 8.0, 9, 25)
    }

    #[test]
    fn centered_track_hits_every_layer_once() {
        let mut det = flat_detector();
        let track = LineTrack::new(0.0, 0.0);
        det.propagate_track(&track).unwrap();
        for layer in det.get_layers(false) {
            assert_eq!(layer.hits(), 1);
        }
        assert_eq!(det.hits(), 9);
    }

    #[test]
    fn hit_on_top_boundary_is_dropped() {
        let mut layer = Layer::new(1.0, 0.0, 0.5, 25, 0.0);
        let top = layer.y_top();
        let outcome = layer.hit(1.0, top).unwrap();
        assert!(matches!(outcome, HitOutcome::OutOfRange));
        assert_eq!(layer.hits(), 0);
    }

    #[test]
    fn hit_on_bottom_boundary_lands_on_strip_zero() {
        let mut layer = Layer::new(1.0, 0.0, 0.5, 25, 0.0);
        let bottom = layer.y_bottom();
        layer.hit(1.0, bottom).unwrap();
        assert_eq!(layer.strips[0].hits, 1);
    }

    #[test]
    fn wrong_layer_x_is_an_error() {
        let mut layer = Layer::new(1.0, 0.0, 0.5, 25, 0.0);
        assert_eq!(layer.hit(2.0, 0.0).unwrap_err(), TrackerError::WrongLayerX);
    }

    #[test]
    fn clear_hits_resets_counters_and_hit_strips() {
        let mut det = flat_detector();
        let track = LineTrack::new(0.0, 0.0);
        det.propagate_track(&track).unwrap();
        det.clear_hits();
        assert_eq!(det.hits(), 0);
        for layer in det.get_layers(false) {
            assert_eq!(layer.hits(), 0);
            assert_eq!(layer.hit_strips().count(), 0);
        }
    }

    #[test]
    fn x_step_is_zero_for_single_layer() {
        let det = LayeredDetector::new(1.0, 0.0, 0.5, 8.0, 1, 25);
        assert_eq!(det.x_step(), 0.0);
    }

    #[test]
    fn get_layers_orders_by_x() {
        let det = flat_detector();
        let ascending: Vec<f64> = det.get_layers(false).iter().map(|l| l.x).collect();
        let mut sorted = ascending.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(ascending, sorted);
        let descending: Vec<f64> = det.get_layers(true).iter().map(|l| l.x).collect();
        let mut reversed = ascending.clone();
        reversed.reverse();
        assert_eq!(descending, reversed);
    }
}
