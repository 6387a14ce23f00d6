// src/config.rs - Tracker configuration: defaults, TOML loading, validation
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::filter::FilterConfig;
use crate::joint_angles::AngleThresholds;
use crate::rep::RepConfig;
use crate::scoring::ScoringRanges;

/// Every tunable of the pipeline. Missing sections and fields fall back to
/// the built-in reference values, so a partial file only overrides what it
/// names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessConfig {
    pub filter: FilterConfig,
    pub rep: RepConfig,
    pub scoring: ScoringRanges,
    pub angles: AngleThresholds,
}

impl AssessConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AssessConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.as_ref().display(), version = %config.scoring.version, "config loaded");
        Ok(config)
    }

    /// Built-in defaults, overridden by `path` when it exists.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            Some(p) => {
                debug!(path = %p.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.filter.validate()?;
        self.rep.validate()?;
        self.scoring.validate()?;
        self.angles.validate()?;
        Ok(())
    }
}
