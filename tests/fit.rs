use strip_track::config::FitConfig;
use strip_track::detector::LayeredDetector;
use strip_track::fit::FitManager;
use strip_track::kalman::{LKFilter, TwoWayLKFilter};
use strip_track::matrix::Matrix;
use strip_track::track::LineTrack;

mod utils;

fn prototype(dx: f64) -> TwoWayLKFilter {
    let a = Matrix::new(vec![vec![1.0, dx], vec![0.0, 1.0]]);
    let h = Matrix::new(vec![vec![1.0, 0.0]]);
    let x = Matrix::new(vec![vec![0.0], vec![0.0]]);
    let p = Matrix::new(vec![vec![10.0, 0.0], vec![0.0, 10.0]]);
    let q = Matrix::new(vec![vec![1e-4, 0.0], vec![0.0, 1e-4]]);
    let r = Matrix::new(vec![vec![5.0]]);
    TwoWayLKFilter::new(LKFilter::new(a, h, x, p, q, r).unwrap())
}

#[test]
fn two_well_separated_tracks_yield_two_surviving_candidates() {
    let mut det = LayeredDetector::new(1.0, 0.0, 0.5, 8.0, 9, 25);
    det.propagate_track(&LineTrack::new(-0.05, 0.29995)).unwrap();
    det.propagate_track(&LineTrack::new(0.05, -0.3)).unwrap();

    let dx = det.x_step();
    let mut manager = FitManager::new(&mut det, prototype(dx), FitConfig::default()).unwrap();
    let survivors = manager.fit().unwrap();
    assert_eq!(survivors.len(), 2);
}

#[test]
fn propagate_tracks_produces_num_layers_plus_one_points() {
    let mut det = LayeredDetector::new(1.0, 0.0, 0.5, 8.0, 9, 25);
    det.propagate_track(&LineTrack::new(0.0, 0.0)).unwrap();
    let num_layers = det.layers.len();

    let dx = det.x_step();
    let mut manager = FitManager::new(&mut det, prototype(dx), FitConfig::default()).unwrap();
    manager.fit().unwrap();
    let tracks = manager.propagate_tracks().unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].len(), num_layers + 1);
}
