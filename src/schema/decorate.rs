//! Leaf decorators
//!
//! A decoration wraps exactly one leaf and augments only its default-value
//! computation and/or its value check; everything else (name, path, type,
//! flags) is the wrapped leaf's own, forwarded unchanged.

use regex::Regex;
use serde_json::Value;

/// Token substituted with the tenant name in decorated values
pub const TENANT_TOKEN: &str = "{tenant}";

/// Decoration of a single leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    /// Substitutes the tenant token in the computed default value
    DefaultToken,
    /// Tenant-specific service URI: substitutes the tenant token in the
    /// default, enforces absolute http(s) URIs on writes, and rewrites the
    /// authority of stored values still carrying the token
    TenantUri,
}

impl Decoration {
    /// Compute the decorated default from the leaf's raw schema default
    #[must_use]
    pub fn decorated_default(self, tenant: &str, raw: &Value) -> Value {
        match self {
            Self::DefaultToken | Self::TenantUri => substitute_token(tenant, raw),
        }
    }

    /// Rewrite a stored value for reading on behalf of a tenant
    #[must_use]
    pub fn effective(self, tenant: &str, stored: &Value) -> Value {
        match self {
            // Default-value decoration never touches stored values.
            Self::DefaultToken => stored.clone(),
            Self::TenantUri => substitute_token(tenant, stored),
        }
    }

    /// Additional value check on top of the leaf's type check and validator
    ///
    /// # Errors
    ///
    /// Returns a rejection message.
    pub fn check(self, value: &Value) -> Result<(), String> {
        match self {
            Self::DefaultToken => Ok(()),
            Self::TenantUri => {
                let Some(text) = value.as_str() else {
                    return Err(format!("Expected a URI string, got: {value}"));
                };

                // The token may sit inside the authority; substitute a neutral
                // label before the shape check.
                let candidate = text.replace(TENANT_TOKEN, "tenant");
                let pattern = Regex::new(r"^https?://[^\s/$.?#].[^\s]*$")
                    .unwrap_or_else(|_| unreachable!("literal pattern compiles"));

                if pattern.is_match(&candidate) {
                    Ok(())
                } else {
                    Err(format!("Value '{text}' is not an absolute http(s) URI"))
                }
            }
        }
    }
}

fn substitute_token(tenant: &str, value: &Value) -> Value {
    match value.as_str() {
        Some(text) if text.contains(TENANT_TOKEN) => {
            Value::String(text.replace(TENANT_TOKEN, tenant))
        }
        _ => value.clone(),
    }
}
