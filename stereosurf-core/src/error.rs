/// Error types for parameter validation and config parsing
use thiserror::Error;

/// Degenerate numeric input detected by the optional validators.
///
/// Mesh generation and stereo projection never return these on their own;
/// callers opt in through `validate()`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("shape parameter `{name}` is not finite: {value}")]
    NonFiniteParameter { name: &'static str, value: f32 },

    #[error("shape parameter a or b is zero, the radius term vanishes")]
    ZeroRadius,

    #[error("convergence distance must be non-zero")]
    ZeroConvergence,

    #[error("near plane ({near}) must be positive and less than far plane ({far})")]
    InvalidClipPlanes { near: f32, far: f32 },
}

/// Failure to parse a viewer config or a parameter string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("line {line}: unknown key `{key}`")]
    UnknownKey { line: usize, key: String },

    #[error("line {line}: invalid number `{value}` for `{key}`")]
    InvalidNumber {
        line: usize,
        key: String,
        value: String,
    },

    #[error("line {line}: expected `key = value`")]
    Syntax { line: usize },

    #[error("expected {expected} comma or space separated numbers, got `{input}`")]
    ParameterList { expected: usize, input: String },
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
