//! Demo entry point: generates straight tracks, propagates them through a
//! layered detector, fits candidates back out of the hits, and reports
//! what it found. Modeled on the teacher's `logger_init` + `run` split.

use std::error::Error;
use std::str::FromStr;

use log::LevelFilter;
use simplelog::{Config as LogConfig, TermLogger, TerminalMode, ColorChoice};

use strip_track::config::TrackerConfig;
use strip_track::detector::LayeredDetector;
use strip_track::fit::FitManager;
use strip_track::kalman::{LKFilter, TwoWayLKFilter};
use strip_track::matrix::Matrix;
use strip_track::track::gen_straight_tracks;

/// Reads the level from `RUST_LOG` if set, falling back to
/// `config.log_level` rather than a hardcoded default.
fn logger_init(default_level: &str) -> Result<(), Box<dyn Error>> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    let log_level = LevelFilter::from_str(&log_level).unwrap_or(LevelFilter::Info);
    TermLogger::init(log_level, LogConfig::default(), TerminalMode::Mixed, ColorChoice::Auto)?;
    Ok(())
}

fn load_config() -> TrackerConfig {
    std::env::var("TRACKER_CONFIG")
        .ok()
        .and_then(|path| TrackerConfig::from_file(&path).ok())
        .unwrap_or_default()
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = load_config();
    logger_init(&config.log_level)?;
    log::info!("strip_track demo started");

    let result = run(config);
    if let Err(e) = &result {
        log::error!("{}", e);
    } else {
        log::info!("run completed successfully");
    }
    result
}

fn build_prototype(dx: f64) -> Result<TwoWayLKFilter, Box<dyn Error>> {
    let a = Matrix::new(vec![vec![1.0, dx], vec![0.0, 1.0]]);
    let h = Matrix::new(vec![vec![1.0, 0.0]]);
    let x = Matrix::new(vec![vec![0.0], vec![0.0]]);
    let p = Matrix::new(vec![vec![10.0, 0.0], vec![0.0, 10.0]]);
    let q = Matrix::new(vec![vec![1e-4, 0.0], vec![0.0, 1e-4]]);
    let r = Matrix::new(vec![vec![5.0]]);
    Ok(TwoWayLKFilter::new(LKFilter::new(a, h, x, p, q, r)?))
}

fn run(config: TrackerConfig) -> Result<(), Box<dyn Error>> {
    let d = &config.detector;
    let mut detector = LayeredDetector::new(d.x, d.y, d.layer_height, d.length, d.num_layers, d.num_strips);

    let tracks = gen_straight_tracks(3);
    log::info!("generated {} straight tracks", tracks.len());
    for track in &tracks {
        detector.propagate_track(track)?;
    }
    log::info!("detector recorded {} hits", detector.hits());

    let dx = detector.x_step();
    let prototype = build_prototype(dx)?;
    let mut manager = FitManager::new(&mut detector, prototype, config.fit.clone())?;
    let survivors = manager.fit()?;
    log::info!("fit produced {} surviving candidates", survivors.len());
    for (i, candidate) in survivors.iter().enumerate() {
        log::info!("candidate {}: measurements = {:?}", i, candidate.measurements_list());
    }

    let reconstructed = manager.propagate_tracks()?;
    for (i, points) in reconstructed.iter().enumerate() {
        log::info!("candidate {} reconstructed {} points", i, points.len());
    }

    detector.draw("detector.png", 2)?;

    Ok(())
}
