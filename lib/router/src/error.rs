//! Error types for the router crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ConfigError`: Startup configuration failures (fatal)
//! - `SurfaceError`: A reply could not be delivered to the user surface
//! - `RelayError`: Event handling context (use as context wrapper)

use std::fmt;

/// Errors from loading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration sources could not be read or deserialized.
    Load { reason: String },
    /// A required setting is missing or empty.
    MissingSetting { name: &'static str },
    /// A setting has an unusable value.
    InvalidValue { name: &'static str, reason: String },
    /// The env file could not be read or written.
    EnvFile { path: String, reason: String },
    /// Interactive entry of a setting failed.
    Prompt { name: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { reason } => write!(f, "failed to load configuration: {reason}"),
            Self::MissingSetting { name } => {
                write!(f, "{name} environment variable not set")
            }
            Self::InvalidValue { name, reason } => {
                write!(f, "invalid value for {name}: {reason}")
            }
            Self::EnvFile { path, reason } => {
                write!(f, "failed to update env file '{path}': {reason}")
            }
            Self::Prompt { name, reason } => {
                write!(f, "failed to read {name} from input: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors from delivering output to a user surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The surface refused or failed to deliver the text.
    Delivery { reason: String },
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivery { reason } => write!(f, "failed to deliver reply: {reason}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// Event handling context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// Clearing the transcript failed.
    Clear { identity: String },
    /// Sending output to the surface failed.
    Delivery { identity: String },
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear { identity } => {
                write!(f, "failed to clear chat history for {identity}")
            }
            Self::Delivery { identity } => {
                write!(f, "failed to deliver reply to {identity}")
            }
        }
    }
}

impl std::error::Error for RelayError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_setting_names_variable() {
        let err = ConfigError::MissingSetting { name: "AI_MODEL" };
        assert_eq!(err.to_string(), "AI_MODEL environment variable not set");
    }

    #[test]
    fn relay_error_display() {
        let err = RelayError::Delivery {
            identity: "user:42".to_string(),
        };
        assert!(err.to_string().contains("user:42"));
    }
}
