use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sqam::sqam_errors::{ConfigError, SqamError};

/// Tunables of [`SequenceQualityEngine`](crate::sqam::SequenceQualityEngine).
///
/// Every field has a default, so a YAML file only needs the values it overrides:
///
/// ```
/// use sqam_rs::sqam::SqamConfig;
/// let cfg = SqamConfig::from_yaml_str("n: 30\np: 5\nx: 3\nd: 20.0").unwrap();
/// assert_eq!(cfg.n, 30);
/// assert_eq!(cfg.t, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqamConfig {
    /// Number of frames a sequence must survive to be completed
    pub n: usize,
    /// Number of frames before trendline deviation checks begin
    pub p: usize,
    /// Stride (in frames) of speed sampling
    pub x: usize,
    /// Number of speed samples averaged for the minimum speed check
    pub t: usize,
    /// Max allowed deviation from the trendline, pixels
    pub d: f64,
    /// Min allowed average relative speed
    pub v: f64,
    /// Assumed distance from the camera to the tracking plane, pixels
    pub camera_dist: i32,
    /// Whether to accumulate diagram data
    pub diagrams: bool,
}

impl Default for SqamConfig {
    fn default() -> Self {
        SqamConfig {
            n: 75,
            p: 10,
            x: 5,
            t: 3,
            d: 15.0,
            v: 0.025,
            camera_dist: 920,
            diagrams: false,
        }
    }
}

// Files may either be flat or keep tunables under `sqam_cfg` next to other sections
#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigFile {
    Wrapped { sqam_cfg: SqamConfig },
    Flat(SqamConfig),
}

impl SqamConfig {
    /// Checks range rules and relationships between the tunables
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n < 2 {
            return Err(ConfigError::WindowTooShort(self.n));
        }
        if !(2 <= self.p && self.p < self.n) {
            return Err(ConfigError::DirectionWarmup { p: self.p, n: self.n });
        }
        if self.t < 1 {
            return Err(ConfigError::SpeedSamples(self.t));
        }
        if !(2 <= self.x && self.x <= self.n / 2) {
            return Err(ConfigError::SpeedStride {
                x: self.x,
                half: self.n as f64 / 2.0,
            });
        }
        if self.x.checked_mul(self.t).map_or(true, |span| span > self.n) {
            return Err(ConfigError::SpeedSpan {
                x: self.x,
                t: self.t,
                n: self.n,
            });
        }
        if self.camera_dist < 1 {
            return Err(ConfigError::CameraDistance(self.camera_dist));
        }
        for (name, value) in [("d", self.d), ("v", self.v)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Threshold { name, value });
            }
        }
        Ok(())
    }
    /// Parses and validates YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self, SqamError> {
        let cfg = match serde_yaml::from_str::<ConfigFile>(text)? {
            ConfigFile::Wrapped { sqam_cfg } => sqam_cfg,
            ConfigFile::Flat(cfg) => cfg,
        };
        cfg.validate()?;
        Ok(cfg)
    }
    /// Reads, parses and validates YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SqamError> {
        let text = fs::read_to_string(path)?;
        SqamConfig::from_yaml_str(&text)
    }
}
