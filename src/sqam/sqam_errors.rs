use thiserror::Error;

/// Violated range rule among the engine tunables. Detected once, at construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("value of 'n' must be greater than or equal to 2, got {0}")]
    WindowTooShort(usize),
    #[error("value of 'p' must be between 2 and 'n'={n} (exclusive), got {p}")]
    DirectionWarmup { p: usize, n: usize },
    #[error("value of 'x' must be between 2 and 'n/2'={half}, got {x}")]
    SpeedStride { x: usize, half: f64 },
    #[error("value of 't' must be greater than or equal to 1, got {0}")]
    SpeedSamples(usize),
    #[error("the product of 'x'={x} and 't'={t} must be less than or equal to 'n'={n}")]
    SpeedSpan { x: usize, t: usize, n: usize },
    #[error("value of 'camera_dist' must be greater than or equal to 1, got {0}")]
    CameraDistance(i32),
    #[error("value of '{name}' must be a finite non-negative number, got {value}")]
    Threshold { name: &'static str, value: f64 },
    #[error("camera reference is out of range: scene height {height} + 'camera_dist' {camera_dist}")]
    CameraOutOfRange { height: i32, camera_dist: i32 },
    #[error("scene size must be at least 1x1 pixels, got {width}x{height}")]
    SceneSize { height: i32, width: i32 },
}

#[derive(Debug, Error)]
pub enum SqamError {
    #[error("bad configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("can't parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("can't serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}
