//! Canonical addressing of JSON nodes
//!
//! A locator is the segment chain `tenants -> tenant -> application ->
//! [path...] -> [platform] -> leaf` identifying one value in the full
//! document. Composites are never platform-qualified; a leaf's platform
//! section sits inside its parent composite's object, next to the
//! platform-unspecified values. A well-formed document resolves a locator to
//! at most one node; a malformed intermediate is a structural error.

use std::fmt;

use serde_json::Value;

use crate::error::ConfigError;
use crate::schema::node::{AppSchema, NodeId};
use crate::schema::{App, Platform, TENANTS_KEY};

/// Canonical locator of one JSON node inside the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    segments: Vec<String>,
}

impl Locator {
    /// Locator of the top-level tenants collection
    #[must_use]
    pub fn for_tenants() -> Self {
        Self {
            segments: vec![TENANTS_KEY.to_owned()],
        }
    }

    /// Locator of one tenant's object
    #[must_use]
    pub fn for_tenant(tenant: &str) -> Self {
        Self {
            segments: vec![TENANTS_KEY.to_owned(), tenant.to_owned()],
        }
    }

    /// Locator of one application section inside a tenant
    #[must_use]
    pub fn for_app(tenant: &str, app: App) -> Self {
        let mut locator = Self::for_tenant(tenant);
        locator.segments.push(app.config_name().to_owned());
        locator
    }

    /// Locator of a schema node's JSON value
    ///
    /// For a composite this targets its own object directly. For a leaf it
    /// targets the parent composite's object, then the platform section when
    /// the platform is specific, then the leaf's own name.
    #[must_use]
    pub fn for_node(
        tenant: &str,
        schema: &AppSchema,
        node: NodeId,
        platform: Platform,
    ) -> Self {
        let mut locator = Self::for_app(tenant, schema.app());

        if schema.is_leaf(node) {
            let mut segments = schema.path_segments(node);
            let leaf_name = segments
                .pop()
                .map_or_else(String::new, ToOwned::to_owned);

            for segment in segments {
                locator.segments.push(segment.to_owned());
            }
            if let Some(key) = platform.key() {
                locator.segments.push(key.to_owned());
            }
            locator.segments.push(leaf_name);
        } else {
            for segment in schema.path_segments(node) {
                locator.segments.push(segment.to_owned());
            }
        }

        locator
    }

    /// Segment chain, outermost first
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Locator of the enclosing object plus the final key
    #[must_use]
    pub fn split_last(&self) -> Option<(Locator, &str)> {
        let (last, parents) = self.segments.split_last()?;
        Some((
            Self {
                segments: parents.to_vec(),
            },
            last,
        ))
    }

    /// Resolve to the addressed value, `None` when absent
    ///
    /// # Errors
    ///
    /// Returns a structural error when an intermediate node exists but is not
    /// a JSON object.
    pub fn resolve<'doc>(&self, root: &'doc Value) -> Result<Option<&'doc Value>, ConfigError> {
        let mut current = root;
        for (index, segment) in self.segments.iter().enumerate() {
            let object = current.as_object().ok_or_else(|| {
                ConfigError::structural(format!(
                    "'{}' is not a JSON object",
                    self.prefix_display(index)
                ))
            })?;

            match object.get(segment) {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Mutable variant of [`Locator::resolve`]
    ///
    /// # Errors
    ///
    /// Returns a structural error when an intermediate node exists but is not
    /// a JSON object.
    pub fn resolve_mut<'doc>(
        &self,
        root: &'doc mut Value,
    ) -> Result<Option<&'doc mut Value>, ConfigError> {
        let mut current = root;
        for (index, segment) in self.segments.iter().enumerate() {
            if !current.is_object() {
                return Err(ConfigError::structural(format!(
                    "'{}' is not a JSON object",
                    self.prefix_display(index)
                )));
            }

            match current
                .as_object_mut()
                .and_then(|object| object.get_mut(segment))
            {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    fn prefix_display(&self, upto: usize) -> String {
        if upto == 0 {
            "<document root>".to_owned()
        } else {
            self.segments[..upto].join("/")
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::builder::AppSchemaBuilder;
    use crate::schema::node::ValueType;
    use crate::schema::{ControlAttribute, Release};
    use serde_json::json;

    fn schema() -> (AppSchema, NodeId, NodeId) {
        let mut builder = AppSchemaBuilder::new(App::Client, ControlAttribute::Extend);
        let root = builder.root();
        let ui = builder.composite(root, "ui", ControlAttribute::Extend).unwrap();
        let pdf = builder.composite(ui, "pdf", ControlAttribute::Extend).unwrap();
        let editor = builder
            .leaf(pdf, "editor", ValueType::String, Release::R16, json!(""))
            .unwrap();
        (builder.build(), pdf, editor)
    }

    #[test]
    fn leaf_locator_carries_platform_between_parent_and_name() {
        let (schema, _, editor) = schema();
        let locator = Locator::for_node("acme", &schema, editor, Platform::Web);
        assert_eq!(
            locator.segments(),
            ["tenants", "acme", "client", "ui", "pdf", "web", "editor"]
        );

        let unspecified = Locator::for_node("acme", &schema, editor, Platform::Unspecified);
        assert_eq!(
            unspecified.segments(),
            ["tenants", "acme", "client", "ui", "pdf", "editor"]
        );
    }

    #[test]
    fn composite_locator_is_never_platform_qualified() {
        let (schema, pdf, _) = schema();
        let locator = Locator::for_node("acme", &schema, pdf, Platform::Web);
        assert_eq!(locator.segments(), ["tenants", "acme", "client", "ui", "pdf"]);
    }

    #[test]
    fn resolve_distinguishes_absent_from_malformed() {
        let (schema, _, editor) = schema();
        let locator = Locator::for_node("acme", &schema, editor, Platform::Unspecified);

        let absent = json!({ "tenants": { "acme": { "client": {} } } });
        assert_eq!(locator.resolve(&absent).unwrap(), None);

        let present = json!({
            "tenants": { "acme": { "client": { "ui": { "pdf": { "editor": "pdftools" } } } } }
        });
        assert_eq!(
            locator.resolve(&present).unwrap(),
            Some(&json!("pdftools"))
        );

        let malformed = json!({ "tenants": { "acme": { "client": { "ui": 5 } } } });
        let err = locator.resolve(&malformed).unwrap_err();
        assert!(matches!(err, ConfigError::StructuralInvalid { .. }));
    }
}
