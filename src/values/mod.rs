//! Per-leaf value validation
//!
//! A leaf's declared [`ValueType`](crate::schema::ValueType) covers the JSON
//! shape; the pluggable [`ValueValidator`] covers semantic rules on top of
//! it. Validators are plugged into leaves at schema build time.

use std::fmt;

use regex::Regex;
use serde_json::Value;

/// Semantic check applied to a leaf value after the type check passed
pub trait ValueValidator: fmt::Debug + Send + Sync {
    /// Check a candidate value, returning a human-readable rejection message
    ///
    /// # Errors
    ///
    /// Returns the rejection message when the value is unacceptable.
    fn validate(&self, value: &Value) -> Result<(), String>;
}

/// Accepts only values from a fixed set of strings
#[derive(Debug)]
pub struct OneOf {
    allowed: Vec<String>,
}

impl OneOf {
    #[must_use]
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl ValueValidator for OneOf {
    fn validate(&self, value: &Value) -> Result<(), String> {
        let text = value
            .as_str()
            .ok_or_else(|| format!("Expected a string, got: {value}"))?;

        if self.allowed.iter().any(|candidate| candidate == text) {
            Ok(())
        } else {
            Err(format!(
                "Value '{}' is not one of: {}",
                text,
                self.allowed.join(", ")
            ))
        }
    }
}

/// Accepts integers within an inclusive range
#[derive(Debug)]
pub struct IntRange {
    min: i64,
    max: i64,
}

impl IntRange {
    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

impl ValueValidator for IntRange {
    fn validate(&self, value: &Value) -> Result<(), String> {
        let number = value
            .as_i64()
            .ok_or_else(|| format!("Expected an integer, got: {value}"))?;

        if number < self.min || number > self.max {
            return Err(format!(
                "Value {} is outside the allowed range {}..={}",
                number, self.min, self.max
            ));
        }

        Ok(())
    }
}

/// Accepts absolute http(s) URIs
#[derive(Debug)]
pub struct HttpUri {
    pattern: Regex,
}

impl HttpUri {
    /// Build the validator
    ///
    /// # Panics
    ///
    /// Never panics; the pattern is a verified literal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"^https?://[^\s/$.?#].[^\s]*$")
                .unwrap_or_else(|_| unreachable!("literal pattern compiles")),
        }
    }
}

impl Default for HttpUri {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueValidator for HttpUri {
    fn validate(&self, value: &Value) -> Result<(), String> {
        let text = value
            .as_str()
            .ok_or_else(|| format!("Expected a string, got: {value}"))?;

        if self.pattern.is_match(text) {
            Ok(())
        } else {
            Err(format!("Value '{text}' is not an absolute http(s) URI"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn one_of_accepts_listed_values() {
        let validator = OneOf::new(["light", "dark", "auto"]);
        assert!(validator.validate(&json!("dark")).is_ok());
        assert!(validator.validate(&json!("blue")).is_err());
        assert!(validator.validate(&json!(3)).is_err());
    }

    #[test]
    fn int_range_is_inclusive() {
        let validator = IntRange::new(1, 300);
        assert!(validator.validate(&json!(1)).is_ok());
        assert!(validator.validate(&json!(300)).is_ok());
        assert!(validator.validate(&json!(0)).is_err());
        assert!(validator.validate(&json!(301)).is_err());
        assert!(validator.validate(&json!("5")).is_err());
    }

    #[test]
    fn http_uri_requires_absolute_scheme() {
        let validator = HttpUri::new();
        assert!(validator.validate(&json!("https://acme.example.com/api")).is_ok());
        assert!(validator.validate(&json!("http://localhost:8080")).is_ok());
        assert!(validator.validate(&json!("ftp://example.com")).is_err());
        assert!(validator.validate(&json!("/relative/path")).is_err());
    }
}
