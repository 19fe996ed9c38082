use strip_track::detector::LayeredDetector;
use strip_track::track::LineTrack;

mod utils;
use utils::FloatRangeInclusive;

#[test]
fn off_center_flat_tracks_land_on_the_predicted_strip() {
    let height = 0.5;
    let num_strips = 25;
    let step = height / num_strips as f64;

    for y0 in FloatRangeInclusive::new(-0.2, 0.2, 0.04) {
        let mut det = LayeredDetector::new(1.0, 0.0, height, 8.0, 9, num_strips);
        let track = LineTrack::new(0.0, y0);
        det.propagate_track(&track).unwrap();

        let expected_index = ((y0 + height / 2.0) / step).floor() as usize;
        for layer in det.get_layers(false) {
            assert_eq!(layer.hits(), 1);
            let hit: Vec<_> = layer.hit_strips().collect();
            assert_eq!(hit.len(), 1);
            let actual_index = ((hit[0].y - (0.0 - height / 2.0)) / step).round() as usize;
            assert_eq!(actual_index, expected_index.min(num_strips - 1));
        }
    }
}

#[test]
fn clear_hits_restores_every_counter_and_hit_set() {
    let mut det = LayeredDetector::new(1.0, 0.0, 0.5, 8.0, 9, 25);
    let t1 = LineTrack::new(-0.05, 0.29995);
    let t2 = LineTrack::new(0.05, -0.3);
    det.propagate_track(&t1).unwrap();
    det.propagate_track(&t2).unwrap();
    assert!(det.hits() > 0);

    det.clear_hits();
    assert_eq!(det.hits(), 0);
    for layer in det.get_layers(false) {
        assert_eq!(layer.hits(), 0);
        assert_eq!(layer.hit_strips().count(), 0);
    }
}
