use thiserror::Error;

/// Top-level error type for strider-core.
#[derive(Debug, Error)]
pub enum StriderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration errors.
///
/// Raised at construction or setup time. Setters that return one of these
/// have not touched the simulator.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Length mismatch for {what}: expected {expected}, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Negative inertia value in {what} at index {index}")]
    NegativeInertia { what: &'static str, index: usize },

    #[error("Unknown category of joint {0}")]
    UnknownJointCategory(String),

    #[error("Invalid joint pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Randomization spec {0} is not found")]
    UnknownRandomizationSpec(String),

    #[error("Unknown randomization parameter: {0}")]
    UnknownRandomizationParam(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Incompatible configuration: {0}")]
    Incompatible(String),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns `Ok(())` when `got == expected`, otherwise a
    /// [`ConfigError::LengthMismatch`] naming both lengths.
    pub const fn check_len(what: &'static str, expected: usize, got: usize) -> Result<(), Self> {
        if expected == got {
            Ok(())
        } else {
            Err(Self::LengthMismatch {
                what,
                expected,
                got,
            })
        }
    }
}

/// Errors reported by a [`SimulatorLink`](crate::sim::SimulatorLink).
#[derive(Debug, Error)]
pub enum SimError {
    #[error("No body has been loaded")]
    BodyNotLoaded,

    #[error("Unknown joint: {0}")]
    UnknownJoint(String),

    #[error("Unknown link id: {0}")]
    UnknownLink(i32),

    #[error("Simulator link failure: {0}")]
    LinkFailure(String),
}

/// Action validation errors.
///
/// Copy + static messages for cheap propagation in the step loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Action dimension mismatch: expected {expected}, got {got}")]
    ActionDimMismatch { expected: usize, got: usize },

    #[error("Action contains NaN")]
    ActionContainsNan,

    #[error("Action contains Inf")]
    ActionContainsInf,
}

impl ValidationError {
    /// Checks an action's length and that every entry is finite.
    pub fn check_action(action: &[f32], expected: usize) -> Result<(), Self> {
        if action.len() != expected {
            return Err(Self::ActionDimMismatch {
                expected,
                got: action.len(),
            });
        }
        if action.iter().any(|v| v.is_nan()) {
            return Err(Self::ActionContainsNan);
        }
        if action.iter().any(|v| v.is_infinite()) {
            return Err(Self::ActionContainsInf);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strider_error_from_config_error() {
        let err = ConfigError::UnknownJointCategory("hip_x".into());
        let strider_err: StriderError = err.into();
        assert!(matches!(strider_err, StriderError::Config(_)));
        assert!(strider_err.to_string().contains("hip_x"));
    }

    #[test]
    fn strider_error_from_sim_error() {
        let err = SimError::BodyNotLoaded;
        let strider_err: StriderError = err.into();
        assert!(matches!(strider_err, StriderError::Simulation(_)));
    }

    #[test]
    fn strider_error_from_validation_error() {
        let err = ValidationError::ActionContainsNan;
        let strider_err: StriderError = err.into();
        assert!(matches!(strider_err, StriderError::Validation(_)));
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::Io(_)));
    }

    #[test]
    fn length_mismatch_names_both_lengths() {
        let err = ConfigError::check_len("base masses", 2, 1).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("base masses"));
        assert!(msg.contains("expected 2"));
        assert!(msg.contains("got 1"));
    }

    #[test]
    fn check_len_accepts_equal() {
        assert!(ConfigError::check_len("leg masses", 12, 12).is_ok());
    }

    #[test]
    fn unknown_spec_display() {
        let err = ConfigError::UnknownRandomizationSpec("nope".into());
        assert_eq!(err.to_string(), "Randomization spec nope is not found");
    }

    #[test]
    fn validation_error_is_copy() {
        let err = ValidationError::ActionContainsNan;
        let err2 = err;
        assert_eq!(err, err2);
    }

    #[test]
    fn check_action_rejects_bad_inputs() {
        assert_eq!(
            ValidationError::check_action(&[0.0; 3], 4),
            Err(ValidationError::ActionDimMismatch {
                expected: 4,
                got: 3
            })
        );
        assert_eq!(
            ValidationError::check_action(&[0.0, f32::NAN], 2),
            Err(ValidationError::ActionContainsNan)
        );
        assert_eq!(
            ValidationError::check_action(&[f32::INFINITY, 0.0], 2),
            Err(ValidationError::ActionContainsInf)
        );
        assert!(ValidationError::check_action(&[0.1, -0.2], 2).is_ok());
    }
}
