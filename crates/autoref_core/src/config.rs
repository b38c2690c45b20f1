//! Referee configuration
//!
//! Loaded from YAML, then optionally overridden from the environment:
//! - `AUTOREF_MODE`: `autonomous` or `evaluation`
//! - `AUTOREF_MAX_PASSES`: sweep pass bound per frame
//! - `AUTOREF_STALL_TIMEOUT`: tracker round flush timeout in seconds, `none` to disable

use std::env;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AutorefError, Result};
use crate::referee::EngineConfig;
use crate::tracker::TrackerConfig;

/// Who runs the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutorefMode {
    /// Full automatic referee: kickoffs, restarts and stage changes
    #[default]
    Autonomous,
    /// Passive observer next to a human referee; only infractions are judged
    Evaluation,
}

impl AutorefMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "autonomous" => Some(AutorefMode::Autonomous),
            "evaluation" => Some(AutorefMode::Evaluation),
            _ => None,
        }
    }
}

impl fmt::Display for AutorefMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutorefMode::Autonomous => write!(f, "autonomous"),
            AutorefMode::Evaluation => write!(f, "evaluation"),
        }
    }
}

/// League division; decides how many robots a team may field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Division {
    A,
    #[default]
    B,
}

impl Division {
    pub fn max_team_robots(self) -> usize {
        match self {
            Division::A => 8,
            Division::B => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutorefConfig {
    pub mode: AutorefMode,
    pub division: Division,
    pub tracker: TrackerConfig,
    pub engine: EngineConfig,
}

impl AutorefConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: AutorefConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML file and apply environment overrides on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AutorefError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let mut config = Self::from_yaml_str(&text)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("AUTOREF_MODE") {
            self.mode = AutorefMode::parse(&value)
                .ok_or_else(|| AutorefError::Config(format!("unknown AUTOREF_MODE '{}'", value)))?;
        }
        if let Some(value) = lookup("AUTOREF_MAX_PASSES") {
            self.engine.max_passes = value
                .trim()
                .parse()
                .map_err(|_| AutorefError::Config(format!("invalid AUTOREF_MAX_PASSES '{}'", value)))?;
        }
        if let Some(value) = lookup("AUTOREF_STALL_TIMEOUT") {
            self.tracker.stall_timeout = match value.trim() {
                "" | "none" => None,
                secs => Some(secs.parse().map_err(|_| {
                    AutorefError::Config(format!("invalid AUTOREF_STALL_TIMEOUT '{}'", value))
                })?),
            };
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine.max_passes == 0 {
            return Err(AutorefError::Config("engine.max_passes must be at least 1".into()));
        }
        if let Some(timeout) = self.tracker.stall_timeout {
            if !timeout.is_finite() || timeout <= 0.0 {
                return Err(AutorefError::Config(format!(
                    "tracker.stall_timeout must be positive, got {}",
                    timeout
                )));
            }
        }
        Ok(())
    }

    pub fn max_team_robots(&self) -> usize {
        self.division.max_team_robots()
    }
}
