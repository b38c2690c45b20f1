use thiserror::Error;

use crate::referee::RuleKind;

#[derive(Error, Debug)]
pub enum AutorefError {
    #[error("Camera {camera} out of range (max {max})")]
    InvalidCamera { camera: u32, max: usize },

    #[error("Rule sweep did not settle after {passes} passes at t={time:.3}")]
    SweepLimitExceeded { passes: usize, time: f64 },

    #[error("Rule {rule:?} proposed an invalid referee state: {reason}")]
    InvalidState { rule: RuleKind, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AutorefError {
    /// Internal faults abandon the current frame; everything else is an input problem.
    pub fn is_internal_fault(&self) -> bool {
        matches!(
            self,
            AutorefError::SweepLimitExceeded { .. } | AutorefError::InvalidState { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AutorefError>;
