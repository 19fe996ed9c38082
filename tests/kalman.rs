use strip_track::kalman::{LKFilter, TwoWayLKFilter};
use strip_track::matrix::Matrix;

mod utils;

fn ramp_filter() -> LKFilter {
    let a = Matrix::new(vec![vec![1.0, 1.0], vec![0.0, 1.0]]);
    let h = Matrix::new(vec![vec![1.0, 0.0]]);
    let x = Matrix::new(vec![vec![0.0], vec![0.0]]);
    let p = Matrix::new(vec![vec![100.0, 0.0], vec![0.0, 100.0]]);
    let q = Matrix::new(vec![vec![1e-4, 0.0], vec![0.0, 1e-4]]);
    let r = Matrix::new(vec![vec![5.0]]);
    LKFilter::new(a, h, x, p, q, r).unwrap()
}

#[test]
fn single_direction_sweep_yields_one_state_per_measurement() {
    let mut f = ramp_filter();
    let ms: Vec<Matrix> = (0..6).map(|i| Matrix::new(vec![vec![i as f64]])).collect();
    f.add_measurements(ms);
    let states: Vec<_> = f.sweep().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(states.len(), 6);
}

#[test]
fn bidirectional_sweep_yields_twice_the_measurement_count() {
    let a = Matrix::new(vec![vec![1.0, 1.0], vec![0.0, 1.0]]);
    let h = Matrix::new(vec![vec![1.0, 0.0]]);
    let x = Matrix::new(vec![vec![0.0], vec![0.0]]);
    let p = Matrix::new(vec![vec![100.0, 0.0], vec![0.0, 100.0]]);
    let q = Matrix::new(vec![vec![1e-4, 0.0], vec![0.0, 1e-4]]);
    let r = Matrix::new(vec![vec![5.0]]);
    let mut f = TwoWayLKFilter::new(LKFilter::new(a, h, x, p, q, r).unwrap());

    let ms: Vec<Matrix> = (0..7).map(|i| Matrix::new(vec![vec![i as f64]])).collect();
    f.add_measurements(ms);
    let states: Vec<_> = f.sweep().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(states.len(), 14);
}

#[test]
fn retention_buffer_records_a_seed_then_every_added_measurement() {
    let mut f = ramp_filter();
    f.step(None, true).unwrap();
    assert_eq!(f.retained_measurements().len(), 1);

    let z = Matrix::new(vec![vec![3.0]]);
    f.step(Some(&z), true).unwrap();
    assert_eq!(f.retained_measurements().len(), 2);
}
