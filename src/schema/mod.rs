//! Configuration schema module
//!
//! Holds the typed schema tree (composites and leaves), the fluent builder,
//! leaf decorators, dependency objects, the per-application registry, and the
//! standard product catalog. Schemas are built once and are immutable
//! afterwards; any number of documents may read them concurrently.

pub mod builder;
pub mod catalog;
pub mod decorate;
pub mod dependency;
pub mod node;
pub mod registry;

pub use builder::AppSchemaBuilder;
pub use decorate::Decoration;
pub use dependency::Dependency;
pub use node::{AppSchema, LeafData, NodeId, NodeKind, ValueType};
pub use registry::SchemaRegistry;

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Top-level key of the configuration document
pub const TENANTS_KEY: &str = "tenants";

/// Platform axis along which a leaf value may vary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    /// Applies to all platforms; stored directly on the composite object
    Unspecified,
    /// Web client; stored under the "web" section
    Web,
    /// Mobile/desktop app; stored under the "app" section
    App,
}

impl Platform {
    /// The two platform-qualified variants
    pub const SPECIFIC: [Platform; 2] = [Platform::Web, Platform::App];

    /// JSON section key, `None` for the unspecified platform
    #[must_use]
    pub const fn key(self) -> Option<&'static str> {
        match self {
            Self::Unspecified => None,
            Self::Web => Some("web"),
            Self::App => Some("app"),
        }
    }

    /// Look up a platform section by its JSON key
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "web" => Some(Self::Web),
            "app" => Some(Self::App),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key().unwrap_or("unspecified"))
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unspecified" | "" => Ok(Self::Unspecified),
            "web" => Ok(Self::Web),
            "app" => Ok(Self::App),
            other => Err(ConfigError::not_found(format!(
                "Unknown platform: '{other}'. Supported: unspecified, web, app"
            ))),
        }
    }
}

/// One of the fixed product applications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum App {
    /// The base application; always present, can never be removed
    Client,
    /// Document management feature application
    Dokumente,
    /// Workflow feature application
    Workflow,
}

impl App {
    /// All applications, base first
    pub const ALL: [App; 3] = [App::Client, App::Dokumente, App::Workflow];

    /// Key of this application's section inside a tenant object
    #[must_use]
    pub const fn config_name(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Dokumente => "dokumente",
            Self::Workflow => "workflow",
        }
    }

    /// Whether this is the base application
    #[must_use]
    pub const fn is_base(self) -> bool {
        matches!(self, Self::Client)
    }

    /// Look up an application by its configuration name
    #[must_use]
    pub fn from_config_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|app| app.config_name() == name)
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_name())
    }
}

impl FromStr for App {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_config_name(s)
            .ok_or_else(|| ConfigError::not_found(format!("Unknown application: '{s}'")))
    }
}

/// Control attribute (CCA) a composite's JSON object is expected to carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAttribute {
    Extend,
    Replace,
    Remove,
    Internal,
    Private,
    /// No marker expected
    None,
}

impl ControlAttribute {
    /// Every attribute that has a marker key
    pub const MARKED: [ControlAttribute; 5] = [
        ControlAttribute::Extend,
        ControlAttribute::Replace,
        ControlAttribute::Remove,
        ControlAttribute::Internal,
        ControlAttribute::Private,
    ];

    /// Reserved marker key, `None` for [`ControlAttribute::None`]
    #[must_use]
    pub const fn marker_key(self) -> Option<&'static str> {
        match self {
            Self::Extend => Some("extend"),
            Self::Replace => Some("replace"),
            Self::Remove => Some("remove"),
            Self::Internal => Some("internal"),
            Self::Private => Some("private"),
            Self::None => None,
        }
    }

    /// Look up an attribute by its marker key
    #[must_use]
    pub fn from_marker_key(key: &str) -> Option<Self> {
        Self::MARKED
            .into_iter()
            .find(|attr| attr.marker_key() == Some(key))
    }

    /// Whether this tool supports documents carrying this marker.
    ///
    /// "replace" and "remove" are defined but categorically rejected by the
    /// validation walk; documents carrying them must be edited elsewhere.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Replace | Self::Remove)
    }
}

impl fmt::Display for ControlAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker_key().unwrap_or("none"))
    }
}

/// Product release level gating leaf availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Release {
    R16,
    R16_1,
    R17,
    R18,
    R19,
}

impl Release {
    /// The most recent known release
    pub const LATEST: Release = Release::R19;

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::R16 => "16",
            Self::R16_1 => "16.1",
            Self::R17 => "17",
            Self::R18 => "18",
            Self::R19 => "19",
        }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Release {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "16" => Ok(Self::R16),
            "16.1" => Ok(Self::R16_1),
            "17" => Ok(Self::R17),
            "18" => Ok(Self::R18),
            "19" => Ok(Self::R19),
            other => Err(ConfigError::not_found(format!(
                "Unknown release level: '{other}'. Supported: 16, 16.1, 17, 18, 19"
            ))),
        }
    }
}

/// Words that can never be used as schema node names: platform section keys
/// plus control-attribute marker keys
pub const RESERVED_WORDS: [&str; 7] = [
    "web", "app", "extend", "replace", "remove", "internal", "private",
];

/// Check whether a word is reserved for platform sections or markers
#[must_use]
pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

/// Validate a schema node name: non-empty, alphanumeric, not reserved
///
/// # Errors
///
/// Returns a structural error when the name is unusable.
pub fn validate_node_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::structural("Node name cannot be empty"));
    }

    if !name.chars().all(char::is_alphanumeric) {
        return Err(ConfigError::structural(format!(
            "Node name must be alphanumeric: '{name}'"
        )));
    }

    if is_reserved_word(name) {
        return Err(ConfigError::structural(format!(
            "Node name '{name}' is a reserved keyword"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_keys_round_trip() {
        assert_eq!(Platform::Web.key(), Some("web"));
        assert_eq!(Platform::from_key("app"), Some(Platform::App));
        assert_eq!(Platform::Unspecified.key(), None);
        assert_eq!(Platform::from_key("tenant"), None);
    }

    #[test]
    fn releases_are_ordered() {
        assert!(Release::R16 < Release::R16_1);
        assert!(Release::R16_1 < Release::R18);
        assert_eq!("16.1".parse::<Release>().unwrap(), Release::R16_1);
        assert!("20".parse::<Release>().is_err());
    }

    #[test]
    fn replace_and_remove_are_unsupported() {
        assert!(ControlAttribute::Extend.is_supported());
        assert!(ControlAttribute::Internal.is_supported());
        assert!(!ControlAttribute::Replace.is_supported());
        assert!(!ControlAttribute::Remove.is_supported());
    }

    #[test]
    fn node_names_reject_reserved_words() {
        assert!(validate_node_name("service").is_ok());
        assert!(validate_node_name("baseUrl2").is_ok());
        assert!(validate_node_name("web").is_err());
        assert!(validate_node_name("extend").is_err());
        assert!(validate_node_name("base.url").is_err());
        assert!(validate_node_name("").is_err());
    }

    #[test]
    fn base_app_is_client() {
        assert!(App::Client.is_base());
        assert!(!App::Dokumente.is_base());
        assert_eq!(App::from_config_name("workflow"), Some(App::Workflow));
    }
}
