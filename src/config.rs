//! Run configuration, loaded from a TOML file the way the teacher's
//! `robot/src/config.rs` loads `Config`/`SensorParameterConfig`/
//! `ModelParameterConfig` — nested, `serde`-derived groups rather than
//! free-standing constants sprinkled through the binary.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    pub x: f64,
    pub y: f64,
    pub layer_height: f64,
    pub length: f64,
    pub num_layers: usize,
    pub num_strips: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            x: 1.0,
            y: 0.0,
            layer_height: 0.5,
            length: 8.0,
            num_layers: 9,
            num_strips: 25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FitConfig {
    /// Gating window, in multiples of sigma squared (3-sigma by default,
    /// so `9.0`).
    pub gating_sigma_squared: f64,
    /// Epsilon substituted for a zero pivot during LU decomposition.
    pub lu_epsilon: f64,
    /// Candidates with this many retained measurements or fewer are
    /// pruned after the sweep.
    pub min_retained_measurements: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            gating_sigma_squared: 9.0,
            lu_epsilon: crate::matrix::DEFAULT_LU_EPSILON,
            min_retained_measurements: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub fit: FitConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            detector: DetectorConfig::default(),
            fit: FitConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl TrackerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_s1_detector() {
        let cfg = TrackerConfig::default();
        assert_eq!(cfg.detector.num_layers, 9);
        assert_eq!(cfg.detector.num_strips, 25);
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let toml_str = r#"
            [detector]
            x = 1.0
            y = 0.0
            layer_height = 0.5
            length = 8.0
            num_layers = 9
            num_strips = 25
        "#;
        let cfg = TrackerConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.fit.min_retained_measurements, 2);
    }
}
