use thiserror::Error;

/// Configuration rejected before any engine loop is entered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("parameter step must be positive, got {0}")]
    NonPositiveStep(f64),
    #[error("parameter range is inverted: min {min} > max {max}")]
    InvertedRange { min: f64, max: f64 },
    #[error("setting `{0}` must be finite")]
    NonFiniteSetting(&'static str),
    #[error("trajectory length must be at least one iteration")]
    ZeroIterations,
    #[error("speed must be at least one map application per tick")]
    ZeroSpeed,
    #[error("period search depth {depth} exceeds the maximum of {max}")]
    SearchDepthTooLarge { depth: u32, max: u32 },
    #[error("sweep of {samples} values x {iterations} iterations exceeds the work limit of {limit}")]
    SweepTooLarge {
        samples: usize,
        iterations: usize,
        limit: usize,
    },
    #[error("unknown map: {0}")]
    UnknownMap(String),
    #[error("unknown parameter `{parameter}` for map `{map}`")]
    UnknownParameter { map: String, parameter: String },
    #[error("period tolerance must be positive and finite, got {0}")]
    InvalidTolerance(f64),
}
