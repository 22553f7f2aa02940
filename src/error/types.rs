//! Custom error types with exit codes

use thiserror::Error;

/// Main error type for tenantcfg operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// Not-Found - no schema node at the path, or no such tenant/application
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Type-Mismatch - value incompatible with a leaf's declared type or
    /// platform-specific-ness
    #[error("Type mismatch: {message}")]
    TypeMismatch { message: String },

    /// Value-Invalid - a leaf validator rejected the value
    #[error("Invalid value: {message}")]
    ValueInvalid { message: String },

    /// Dependency-Unfulfilled - a setting or application dependency is not met
    #[error("Unfulfilled dependency: {message}")]
    DependencyUnfulfilled { message: String },

    /// Structural-Invalid - malformed JSON shape or a duplicate/invalid
    /// control-attribute marker
    #[error("Structural error: {message}")]
    StructuralInvalid { message: String },

    /// Unsupported-Version - a leaf requires a later release than requested
    #[error("Unsupported version: {message}")]
    UnsupportedVersion { message: String },

    /// Two or more problems reported together
    #[error("{} problems:\n{}", problems.len(), format_problems(problems))]
    Aggregate { problems: Vec<ConfigError> },
}

fn format_problems(problems: &[ConfigError]) -> String {
    problems
        .iter()
        .map(|problem| format!("  - {problem}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl ConfigError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub fn exit_code(&self) -> i32 {
        match *self {
            Self::NotFound { .. } => 2,
            Self::TypeMismatch { .. } => 3,
            Self::ValueInvalid { .. } => 4,
            Self::DependencyUnfulfilled { .. } => 5,
            Self::StructuralInvalid { .. } => 6,
            Self::UnsupportedVersion { .. } => 7,
            Self::Aggregate { ref problems } => {
                problems.first().map_or(1, ConfigError::exit_code)
            }
        }
    }

    /// Create a not-found error
    #[inline]
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a type-mismatch error
    #[inline]
    pub fn type_mismatch<S: Into<String>>(message: S) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }

    /// Create a value-invalid error
    #[inline]
    pub fn value_invalid<S: Into<String>>(message: S) -> Self {
        Self::ValueInvalid {
            message: message.into(),
        }
    }

    /// Create a dependency-unfulfilled error
    #[inline]
    pub fn dependency<S: Into<String>>(message: S) -> Self {
        Self::DependencyUnfulfilled {
            message: message.into(),
        }
    }

    /// Create a structural error
    #[inline]
    pub fn structural<S: Into<String>>(message: S) -> Self {
        Self::StructuralInvalid {
            message: message.into(),
        }
    }

    /// Create an unsupported-version error
    #[inline]
    pub fn unsupported_version<S: Into<String>>(message: S) -> Self {
        Self::UnsupportedVersion {
            message: message.into(),
        }
    }

    /// Wrap a list of problems: zero problems is `Ok`, one is reported as
    /// itself, two or more become an aggregate
    ///
    /// # Errors
    ///
    /// Returns the single problem, or an aggregate of all of them.
    #[inline]
    pub fn from_problems(mut problems: Vec<ConfigError>) -> Result<(), Self> {
        match problems.len() {
            0 => Ok(()),
            1 => Err(problems.remove(0)),
            _ => Err(Self::Aggregate { problems }),
        }
    }

    /// Flatten this error into its individual problems
    #[must_use]
    #[inline]
    pub fn into_problems(self) -> Vec<ConfigError> {
        match self {
            Self::Aggregate { problems } => problems,
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_problem_is_reported_as_itself() {
        let err = ConfigError::from_problems(vec![ConfigError::not_found("x")]).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn multiple_problems_become_aggregate() {
        let err = ConfigError::from_problems(vec![
            ConfigError::not_found("x"),
            ConfigError::value_invalid("y"),
        ])
        .unwrap_err();
        match err {
            ConfigError::Aggregate { problems } => assert_eq!(problems.len(), 2),
            other => panic!("expected aggregate, got {other}"),
        }
    }

    #[test]
    fn no_problems_is_ok() {
        assert!(ConfigError::from_problems(Vec::new()).is_ok());
    }

    #[test]
    fn aggregate_display_lists_all_problems() {
        let err = ConfigError::Aggregate {
            problems: vec![ConfigError::not_found("a"), ConfigError::type_mismatch("b")],
        };
        let text = err.to_string();
        assert!(text.contains("2 problems"));
        assert!(text.contains("Not found: a"));
        assert!(text.contains("Type mismatch: b"));
    }
}
