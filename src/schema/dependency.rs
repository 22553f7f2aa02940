//! Dependency objects attached to schema nodes
//!
//! A dependency requires either another application to be enabled for the
//! tenant, or another leaf (possibly in a different application) to carry a
//! specific value or any value at all. Checking and remedies live in
//! [`document::depcheck`](crate::document::depcheck).

use serde_json::Value;

use crate::schema::App;

/// One dependency of a schema node
#[derive(Debug, Clone, PartialEq)]
pub enum Dependency {
    /// The given application must be enabled for the tenant.
    /// Remedy: enable it.
    Application(App),

    /// Another leaf must be present / equal an expected value
    SettingValue {
        /// Application owning the other leaf
        app: App,
        /// Dotted path of the other leaf inside its application
        path: String,
        /// `Some(v)`: the leaf must equal `v` (a `null` expected value also
        /// matches an absent leaf). `None`: any present value satisfies it.
        expected: Option<Value>,
    },
}

impl Dependency {
    /// Shorthand for a setting-equals-value dependency
    #[must_use]
    pub fn setting_equals<S: Into<String>>(app: App, path: S, expected: Value) -> Self {
        Self::SettingValue {
            app,
            path: path.into(),
            expected: Some(expected),
        }
    }

    /// Shorthand for a setting-is-present dependency
    #[must_use]
    pub fn setting_present<S: Into<String>>(app: App, path: S) -> Self {
        Self::SettingValue {
            app,
            path: path.into(),
            expected: None,
        }
    }

    /// Human-readable description used in error messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Application(app) => {
                format!("application '{app}' must be enabled")
            }
            Self::SettingValue {
                app,
                path,
                expected: Some(value),
            } => format!("setting '{app}:{path}' must equal {value}"),
            Self::SettingValue {
                app,
                path,
                expected: None,
            } => format!("setting '{app}:{path}' must be present"),
        }
    }
}
