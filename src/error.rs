// src/error.rs
use thiserror::Error;

/// Failure of a single angle computation. Callers recover locally by
/// reporting the affected angle as unmeasurable.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("degenerate geometry: zero-length ray at vertex ({x:.1}, {y:.1})")]
    DegenerateGeometry { x: f64, y: f64 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl ConfigError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ConfigError::InvalidConfiguration(msg.into())
    }
}
