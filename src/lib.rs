//! Two-dimensional particle tracking over a layered silicon-strip
//! detector: dense matrix arithmetic, a bidirectional linear Kalman
//! filter, and a multi-track fit manager built on top of both.

pub mod config;
pub mod detector;
pub mod error;
pub mod fit;
pub mod kalman;
pub mod matrix;
pub mod track;

pub use config::TrackerConfig;
pub use detector::{Layer, LayeredDetector, Strip};
pub use error::TrackerError;
pub use fit::FitManager;
pub use kalman::{LKFilter, TwoWayLKFilter};
pub use matrix::Matrix;
pub use track::{gen_straight_tracks, LineTrack, Track};
