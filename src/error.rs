//! Configuration and simulation failure types

use std::fmt;

/// Errors raised while assembling a world or advancing the simulation.
///
/// Construction fails fast: the first structural problem in the
/// configuration or trial is reported and nothing is simulated. The only
/// runtime variant is [`WorldError::NonFinite`], raised when integration or
/// collision response produces a NaN or infinite state.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldError {
    /// Two bodies were registered under the same name.
    DuplicateBody { name: String },
    /// A marble spec is structurally invalid.
    InvalidMarble { name: String, reason: String },
    /// A wall spec is structurally invalid.
    InvalidWall { name: String, reason: String },
    /// A world-level configuration value is out of range.
    InvalidConfig { reason: String },
    /// A record list names something that is not a dynamic body of this world.
    UnknownBody { name: String },
    /// A body's position or velocity stopped being finite after a step.
    NonFinite { step: u64, name: String },
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::DuplicateBody { name } => {
                write!(f, "duplicate body name '{name}'")
            }
            WorldError::InvalidMarble { name, reason } => {
                write!(f, "invalid marble '{name}': {reason}")
            }
            WorldError::InvalidWall { name, reason } => {
                write!(f, "invalid wall '{name}': {reason}")
            }
            WorldError::InvalidConfig { reason } => {
                write!(f, "invalid world configuration: {reason}")
            }
            WorldError::UnknownBody { name } => {
                write!(f, "record list names unknown dynamic body '{name}'")
            }
            WorldError::NonFinite { step, name } => {
                write!(f, "body '{name}' became non-finite at step {step}")
            }
        }
    }
}

impl std::error::Error for WorldError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_offending_body() {
        let err = WorldError::DuplicateBody {
            name: "marble_1".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate body name 'marble_1'");

        let err = WorldError::NonFinite {
            step: 42,
            name: "marble_1".to_string(),
        };
        assert_eq!(err.to_string(), "body 'marble_1' became non-finite at step 42");
    }

    #[test]
    fn test_display_carries_the_reason() {
        let err = WorldError::InvalidMarble {
            name: "m".to_string(),
            reason: "position must be finite".to_string(),
        };
        assert!(err.to_string().contains("position must be finite"));

        let err = WorldError::InvalidConfig {
            reason: "step size must be positive and finite, got 0".to_string(),
        };
        assert!(err.to_string().starts_with("invalid world configuration"));
    }
}
