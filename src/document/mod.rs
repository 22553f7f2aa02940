//! Live configuration document
//!
//! Holds the in-memory JSON document with its top-level tenants collection
//! and hands out per-tenant and per-application accessors. Loading and
//! saving are thin conveniences around the in-memory value; every mutation
//! runs through the transactional protocol in [`transaction`].

pub mod accessor;
pub mod depcheck;
pub mod locator;
pub mod tenant;
pub mod transaction;
pub mod validate;

pub use accessor::AppAccessor;
pub use locator::Locator;
pub use tenant::TenantAccessor;

use std::path::Path;

use anyhow::Context as _;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ConfigError;
use crate::schema::registry::SchemaRegistry;
use crate::schema::TENANTS_KEY;

/// The whole configuration document of the product family
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    root: Value,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigDocument {
    /// Create an empty document with no tenants
    #[must_use]
    pub fn new() -> Self {
        let mut root = Map::new();
        root.insert(TENANTS_KEY.to_owned(), Value::Object(Map::new()));
        Self {
            root: Value::Object(root),
        }
    }

    /// Parse a document from its JSON text
    ///
    /// # Errors
    ///
    /// Returns a structural error when the text is not valid JSON or the
    /// tenants collection is malformed.
    pub fn from_str(text: &str) -> Result<Self, ConfigError> {
        let mut root: Value = serde_json::from_str(text)
            .map_err(|err| ConfigError::structural(format!("Invalid JSON document: {err}")))?;

        let object = root.as_object_mut().ok_or_else(|| {
            ConfigError::structural("The document root must be a JSON object")
        })?;

        match object.get(TENANTS_KEY) {
            None => {
                object.insert(TENANTS_KEY.to_owned(), Value::Object(Map::new()));
            }
            Some(Value::Object(_)) => {}
            Some(other) => {
                return Err(ConfigError::structural(format!(
                    "'{TENANTS_KEY}' must be a JSON object, got: {other}"
                )));
            }
        }

        Ok(Self { root })
    }

    /// Load a document from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        debug!("Loaded configuration document from {}", path.display());

        Self::from_str(&text)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))
    }

    /// Serialize the document to pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error when serialization fails.
    pub fn to_string_pretty(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(&self.root)
            .context("Failed to serialize configuration document")
    }

    /// Write the document to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the write fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let text = self.to_string_pretty()?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        debug!("Wrote configuration document to {}", path.display());
        Ok(())
    }

    /// The underlying JSON value
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    fn tenants(&self) -> &Map<String, Value> {
        // The constructors guarantee the tenants object exists.
        static EMPTY: std::sync::LazyLock<Map<String, Value>> =
            std::sync::LazyLock::new(Map::new);
        self.root
            .get(TENANTS_KEY)
            .and_then(Value::as_object)
            .unwrap_or(&EMPTY)
    }

    pub(crate) fn tenants_mut(&mut self) -> Result<&mut Map<String, Value>, ConfigError> {
        self.root
            .get_mut(TENANTS_KEY)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                ConfigError::structural(format!("'{TENANTS_KEY}' must be a JSON object"))
            })
    }

    /// Names of all tenants, in document order
    #[must_use]
    pub fn tenant_names(&self) -> Vec<String> {
        self.tenants().keys().cloned().collect()
    }

    /// Whether a tenant exists
    #[must_use]
    pub fn has_tenant(&self, name: &str) -> bool {
        self.tenants().contains_key(name)
    }

    /// Create a new, empty tenant
    ///
    /// # Errors
    ///
    /// Returns a structural error for an empty name or a duplicate tenant.
    pub fn add_tenant(&mut self, name: &str) -> Result<(), ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::structural("Tenant name cannot be empty"));
        }

        let tenants = self.tenants_mut()?;
        if tenants.contains_key(name) {
            return Err(ConfigError::structural(format!(
                "Tenant '{name}' already exists"
            )));
        }

        tenants.insert(name.to_owned(), Value::Object(Map::new()));
        debug!("Created tenant '{name}'");
        Ok(())
    }

    /// Delete a tenant and its whole subtree
    ///
    /// # Errors
    ///
    /// Returns not-found when the tenant does not exist.
    pub fn remove_tenant(&mut self, name: &str) -> Result<(), ConfigError> {
        let tenants = self.tenants_mut()?;
        if tenants.remove(name).is_none() {
            return Err(ConfigError::not_found(format!("No tenant '{name}'")));
        }

        debug!("Removed tenant '{name}'");
        Ok(())
    }

    /// Obtain the accessor for one tenant
    ///
    /// # Errors
    ///
    /// Returns not-found when the tenant does not exist.
    pub fn tenant<'doc>(
        &'doc mut self,
        registry: &'doc SchemaRegistry,
        name: &str,
    ) -> Result<TenantAccessor<'doc>, ConfigError> {
        if !self.has_tenant(name) {
            return Err(ConfigError::not_found(format!("No tenant '{name}'")));
        }

        Ok(TenantAccessor::new(self, registry, name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_has_tenants_collection() {
        let doc = ConfigDocument::new();
        assert_eq!(doc.root().get(TENANTS_KEY), Some(&serde_json::json!({})));
        assert!(doc.tenant_names().is_empty());
    }

    #[test]
    fn add_and_remove_tenants() {
        let mut doc = ConfigDocument::new();
        doc.add_tenant("acme").unwrap();
        doc.add_tenant("globex").unwrap();
        assert_eq!(doc.tenant_names(), ["acme", "globex"]);

        assert!(doc.add_tenant("acme").is_err());
        doc.remove_tenant("acme").unwrap();
        assert!(!doc.has_tenant("acme"));
        assert!(doc.remove_tenant("acme").is_err());
    }

    #[test]
    fn from_str_accepts_empty_object() {
        let doc = ConfigDocument::from_str("{}").unwrap();
        assert!(doc.tenant_names().is_empty());
    }

    #[test]
    fn from_str_rejects_malformed_tenants() {
        assert!(ConfigDocument::from_str("[]").is_err());
        assert!(ConfigDocument::from_str(r#"{"tenants": 4}"#).is_err());
        assert!(ConfigDocument::from_str("not json").is_err());
    }

    #[test]
    fn round_trips_through_text() {
        let mut doc = ConfigDocument::new();
        doc.add_tenant("acme").unwrap();
        let text = doc.to_string_pretty().unwrap();
        let reloaded = ConfigDocument::from_str(&text).unwrap();
        assert!(reloaded.has_tenant("acme"));
    }
}
