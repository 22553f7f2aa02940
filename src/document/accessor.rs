//! App-scoped accessor
//!
//! Get/Set/Has/Remove bound to one tenant, one application and one document.
//! Writes keep platform storage minimal: a platform override equal to the
//! sibling unspecified value is never stored, overrides that agree across
//! all platforms collapse into one unspecified value, an unspecified write
//! clears now-redundant overrides, and emptied platform sections are pruned.

use serde_json::{Map, Value};
use tracing::debug;

use crate::document::depcheck::{self, DepMode};
use crate::document::locator::Locator;
use crate::document::transaction::with_tenant_rollback;
use crate::document::ConfigDocument;
use crate::error::ConfigError;
use crate::schema::node::{AppSchema, NodeId};
use crate::schema::registry::SchemaRegistry;
use crate::schema::{App, Platform};

/// Accessor for one enabled application of one tenant
#[derive(Debug)]
pub struct AppAccessor<'doc> {
    pub(crate) doc: &'doc mut ConfigDocument,
    pub(crate) registry: &'doc SchemaRegistry,
    pub(crate) tenant: String,
    pub(crate) app: App,
}

impl AppAccessor<'_> {
    /// Application this accessor is bound to
    #[must_use]
    pub const fn app(&self) -> App {
        self.app
    }

    /// Read a value from the document
    ///
    /// For a leaf, reading a specific platform falls back to the unspecified
    /// value; reading unspecified never returns a platform-specific value.
    /// For a composite, returns its JSON object (platform must be
    /// unspecified).
    ///
    /// # Errors
    ///
    /// Returns not-found when no entry exists, or a structural error for a
    /// malformed document.
    pub fn get(&self, path: &str, platform: Platform) -> Result<Value, ConfigError> {
        let (schema, node) = self.registry.lookup(self.app, path)?;

        if schema.leaf(node).is_some() {
            return read_leaf(self.doc, &self.tenant, schema, node, platform)?.ok_or_else(|| {
                ConfigError::not_found(format!(
                    "No value for setting '{path}' (platform: {platform})"
                ))
            });
        }

        if platform != Platform::Unspecified {
            return Err(ConfigError::type_mismatch(format!(
                "Setting '{path}' is a composite; composites are never platform-qualified"
            )));
        }

        let locator = Locator::for_node(&self.tenant, schema, node, Platform::Unspecified);
        locator
            .resolve(self.doc.root())?
            .cloned()
            .ok_or_else(|| ConfigError::not_found(format!("No value for setting '{path}'")))
    }

    /// Read a leaf value, falling back to its (decorated) schema default
    ///
    /// # Errors
    ///
    /// Returns a type-mismatch for composites, or a structural error for a
    /// malformed document.
    pub fn get_or_default(&self, path: &str, platform: Platform) -> Result<Value, ConfigError> {
        let (schema, node) = self.registry.lookup(self.app, path)?;
        let leaf = schema.leaf(node).ok_or_else(|| {
            ConfigError::type_mismatch(format!("Setting '{path}' is a composite, not a leaf"))
        })?;

        if let Some(stored) = read_leaf(self.doc, &self.tenant, schema, node, platform)? {
            return Ok(match leaf.decoration {
                Some(decoration) => decoration.effective(&self.tenant, &stored),
                None => stored,
            });
        }

        let raw = leaf.default_for(platform);
        Ok(match leaf.decoration {
            Some(decoration) => decoration.decorated_default(&self.tenant, raw),
            None => raw.clone(),
        })
    }

    /// Whether a value exists for the path
    ///
    /// For a specific platform this is true when either the platform entry
    /// or the unspecified entry exists; for the unspecified platform only
    /// when the unspecified entry itself exists.
    ///
    /// # Errors
    ///
    /// Returns a structural error for a malformed document.
    pub fn has(&self, path: &str, platform: Platform) -> Result<bool, ConfigError> {
        let (schema, node) = self.registry.lookup(self.app, path)?;

        if schema.leaf(node).is_some() {
            return Ok(read_leaf(self.doc, &self.tenant, schema, node, platform)?.is_some());
        }

        let locator = Locator::for_node(&self.tenant, schema, node, Platform::Unspecified);
        Ok(locator.resolve(self.doc.root())?.is_some())
    }

    /// Write a leaf value
    ///
    /// Confirms the application is enabled, checks the value against the
    /// leaf's type, validator and platform-specific-ness, materializes
    /// missing ancestor composites with their default control-attribute
    /// markers, stores the value with minimal platform storage, then checks
    /// the dependencies of the leaf and its ancestors: with
    /// `ensure_dependencies` unmet dependencies are remedied, without it
    /// they fail the call. On any failure the tenant subtree is restored
    /// value-for-value.
    ///
    /// # Errors
    ///
    /// Returns the first failure after the subtree has been rolled back.
    pub fn set(
        &mut self,
        path: &str,
        value: Value,
        platform: Platform,
        ensure_dependencies: bool,
    ) -> Result<(), ConfigError> {
        let app = self.app;
        let registry = self.registry;
        let tenant = self.tenant.clone();
        let mode = if ensure_dependencies {
            DepMode::Ensure
        } else {
            DepMode::Verify
        };

        with_tenant_rollback(self.doc, &tenant, |doc| {
            let (schema, node) = registry.lookup(app, path)?;
            if schema.leaf(node).is_none() {
                return Err(ConfigError::type_mismatch(format!(
                    "Setting '{path}' is a composite; use apply_defaults to populate it"
                )));
            }

            write_leaf_value(doc, registry, &tenant, app, path, value, platform)?;
            depcheck::check_chain(doc, registry, &tenant, app, node, mode)
        })
    }

    /// Default-population of a composite or a single leaf
    ///
    /// Recursively sets every descendant leaf to its schema default, once
    /// per platform when the leaf is platform-specific.
    ///
    /// # Errors
    ///
    /// Returns the first failure after the subtree has been rolled back.
    pub fn apply_defaults(
        &mut self,
        path: &str,
        ensure_dependencies: bool,
    ) -> Result<(), ConfigError> {
        let app = self.app;
        let registry = self.registry;
        let tenant = self.tenant.clone();
        let mode = if ensure_dependencies {
            DepMode::Ensure
        } else {
            DepMode::Verify
        };

        with_tenant_rollback(self.doc, &tenant, |doc| {
            let (schema, node) = registry.lookup(app, path)?;

            for leaf_id in schema.descendant_leaves(node) {
                populate_leaf_defaults(doc, registry, &tenant, app, schema, leaf_id)?;
                depcheck::check_node(doc, registry, &tenant, schema, leaf_id, mode)?;
            }

            depcheck::check_chain(doc, registry, &tenant, app, node, mode)
        })
    }

    /// Remove a leaf value or a whole composite subtree
    ///
    /// Removing a leaf without a platform removes all platform variants;
    /// with a platform, only that variant. Removing a composite deletes its
    /// whole JSON subtree.
    ///
    /// # Errors
    ///
    /// Returns not-found when nothing was stored at the path.
    pub fn remove(&mut self, path: &str, platform: Option<Platform>) -> Result<(), ConfigError> {
        let app = self.app;
        let registry = self.registry;
        let tenant = self.tenant.clone();

        with_tenant_rollback(self.doc, &tenant, |doc| {
            let (schema, node) = registry.lookup(app, path)?;

            if schema.leaf(node).is_some() {
                return remove_leaf(doc, &tenant, schema, node, platform);
            }

            if platform.is_some() {
                return Err(ConfigError::type_mismatch(format!(
                    "Setting '{path}' is a composite; composites are never platform-qualified"
                )));
            }

            let locator = Locator::for_node(&tenant, schema, node, Platform::Unspecified);
            let (parent, key) = locator
                .split_last()
                .ok_or_else(|| ConfigError::structural("Empty locator"))?;
            let removed = parent
                .resolve_mut(doc.root_mut())?
                .and_then(Value::as_object_mut)
                .and_then(|object| object.remove(key));

            if removed.is_none() {
                return Err(ConfigError::not_found(format!(
                    "No value for setting '{path}'"
                )));
            }

            debug!("Removed composite '{path}' for tenant '{tenant}'");
            Ok(())
        })
    }
}

/// Raw leaf entry read: a specific platform falls back to the unspecified
/// entry, unspecified never sees platform entries.
pub(crate) fn read_leaf(
    doc: &ConfigDocument,
    tenant: &str,
    schema: &AppSchema,
    node: NodeId,
    platform: Platform,
) -> Result<Option<Value>, ConfigError> {
    if let Some(value) = leaf_entry(doc, tenant, schema, node, platform)? {
        return Ok(Some(value));
    }

    if platform != Platform::Unspecified {
        return leaf_entry(doc, tenant, schema, node, Platform::Unspecified);
    }

    Ok(None)
}

/// Raw leaf entry for exactly one platform, no fallback
pub(crate) fn leaf_entry(
    doc: &ConfigDocument,
    tenant: &str,
    schema: &AppSchema,
    node: NodeId,
    platform: Platform,
) -> Result<Option<Value>, ConfigError> {
    let locator = Locator::for_node(tenant, schema, node, platform);
    Ok(locator.resolve(doc.root())?.cloned())
}

/// Whether an application section exists for the tenant
#[must_use]
pub(crate) fn is_app_enabled(doc: &ConfigDocument, tenant: &str, app: App) -> bool {
    doc.root()
        .get(crate::schema::TENANTS_KEY)
        .and_then(|tenants| tenants.get(tenant))
        .and_then(|tenant| tenant.get(app.config_name()))
        .is_some()
}

/// Write one leaf value without dependency checking; shared by `set` and the
/// dependency remedies
pub(crate) fn write_leaf_value(
    doc: &mut ConfigDocument,
    registry: &SchemaRegistry,
    tenant: &str,
    app: App,
    path: &str,
    value: Value,
    platform: Platform,
) -> Result<(), ConfigError> {
    let (schema, node) = registry.lookup(app, path)?;
    let leaf = schema.leaf(node).ok_or_else(|| {
        ConfigError::type_mismatch(format!("Setting '{path}' is a composite, not a leaf"))
    })?;

    if platform != Platform::Unspecified && !leaf.platform_specific() {
        return Err(ConfigError::type_mismatch(format!(
            "Setting '{path}' is not platform-specific"
        )));
    }

    leaf.check_value(path, &value)?;

    if !is_app_enabled(doc, tenant, app) {
        return Err(ConfigError::not_found(format!(
            "Application '{app}' is not enabled for tenant '{tenant}'"
        )));
    }

    let parent_chain = ancestor_chain(schema, node);
    let section = app_section_mut(doc, tenant, app)?;
    let parent = materialize_composites(section, schema, &parent_chain)?;

    write_optimized(parent, schema.name(node), platform, value)?;
    debug!("Set '{app}:{path}' (platform: {platform}) for tenant '{tenant}'");
    Ok(())
}

/// Default-population of one leaf: once per platform when platform-specific,
/// once unspecified otherwise
pub(crate) fn populate_leaf_defaults(
    doc: &mut ConfigDocument,
    registry: &SchemaRegistry,
    tenant: &str,
    app: App,
    schema: &AppSchema,
    leaf_id: NodeId,
) -> Result<(), ConfigError> {
    let leaf = schema
        .leaf(leaf_id)
        .ok_or_else(|| ConfigError::structural("Expected a leaf node"))?;
    let path = schema.path(leaf_id);

    let platforms: &[Platform] = if leaf.platform_specific() {
        &Platform::SPECIFIC
    } else {
        &[Platform::Unspecified]
    };

    for &platform in platforms {
        let raw = leaf.default_for(platform);
        let value = match leaf.decoration {
            Some(decoration) => decoration.decorated_default(tenant, raw),
            None => raw.clone(),
        };
        write_leaf_value(doc, registry, tenant, app, &path, value, platform)?;
    }

    Ok(())
}

fn remove_leaf(
    doc: &mut ConfigDocument,
    tenant: &str,
    schema: &AppSchema,
    node: NodeId,
    platform: Option<Platform>,
) -> Result<(), ConfigError> {
    let path = schema.path(node);
    let parent_locator = Locator::for_node(tenant, schema, node, Platform::Unspecified)
        .split_last()
        .map(|(parent, _)| parent)
        .ok_or_else(|| ConfigError::structural("Empty locator"))?;

    let Some(parent) = parent_locator
        .resolve_mut(doc.root_mut())?
        .and_then(Value::as_object_mut)
    else {
        return Err(ConfigError::not_found(format!(
            "No value for setting '{path}'"
        )));
    };

    let name = schema.name(node);
    let mut removed = false;

    let variants: &[Platform] = match platform {
        None => &[Platform::Unspecified, Platform::Web, Platform::App],
        Some(Platform::Unspecified) => &[Platform::Unspecified],
        Some(Platform::Web) => &[Platform::Web],
        Some(Platform::App) => &[Platform::App],
    };

    for &variant in variants {
        match variant.key() {
            None => removed |= parent.remove(name).is_some(),
            Some(key) => match parent.get_mut(key) {
                Some(Value::Object(section)) => {
                    removed |= section.remove(name).is_some();
                    prune_empty_section(parent, key);
                }
                Some(_) => {
                    return Err(ConfigError::structural(format!(
                        "Platform section '{key}' of setting '{path}' is not a JSON object"
                    )));
                }
                None => {}
            },
        }
    }

    if !removed {
        return Err(ConfigError::not_found(format!(
            "No value for setting '{path}'"
        )));
    }

    debug!("Removed '{path}' for tenant '{tenant}'");
    Ok(())
}

fn app_section_mut<'doc>(
    doc: &'doc mut ConfigDocument,
    tenant: &str,
    app: App,
) -> Result<&'doc mut Map<String, Value>, ConfigError> {
    let locator = Locator::for_app(tenant, app);
    match locator.resolve_mut(doc.root_mut())? {
        Some(Value::Object(section)) => Ok(section),
        Some(_) => Err(ConfigError::structural(format!(
            "Application section '{app}' of tenant '{tenant}' is not a JSON object"
        ))),
        None => Err(ConfigError::not_found(format!(
            "Application '{app}' is not enabled for tenant '{tenant}'"
        ))),
    }
}

/// Composite ids from the application root's children down to the node's
/// parent; empty for children of the root
fn ancestor_chain(schema: &AppSchema, node: NodeId) -> Vec<NodeId> {
    let mut chain = Vec::new();
    let mut current = schema.parent(node);
    while let Some(id) = current {
        if schema.parent(id).is_none() {
            break;
        }
        chain.push(id);
        current = schema.parent(id);
    }
    chain.reverse();
    chain
}

/// Walk the composite chain, creating missing objects. A freshly
/// materialized composite gets its schema-declared control-attribute marker;
/// existing objects are left alone.
fn materialize_composites<'obj>(
    section: &'obj mut Map<String, Value>,
    schema: &AppSchema,
    chain: &[NodeId],
) -> Result<&'obj mut Map<String, Value>, ConfigError> {
    let mut current = section;

    for &id in chain {
        let name = schema.name(id);

        if !current.contains_key(name) {
            let mut fresh = Map::new();
            if let Some(marker) = schema
                .composite(id)
                .and_then(|composite| composite.control_attribute.marker_key())
            {
                fresh.insert(marker.to_owned(), Value::Bool(true));
            }
            current.insert(name.to_owned(), Value::Object(fresh));
        }

        let path = schema.path(id);
        current = current
            .get_mut(name)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                ConfigError::structural(format!("Setting '{path}' is not a JSON object"))
            })?;
    }

    Ok(current)
}

/// Minimal-storage write of one leaf value
fn write_optimized(
    parent: &mut Map<String, Value>,
    name: &str,
    platform: Platform,
    value: Value,
) -> Result<(), ConfigError> {
    // Platform keys are reserved words, so any entry under them must be a
    // platform section object.
    for key in ["web", "app"] {
        if parent.get(key).is_some_and(|section| !section.is_object()) {
            return Err(ConfigError::structural(format!(
                "Platform section '{key}' is not a JSON object"
            )));
        }
    }

    match platform.key() {
        None => {
            // An unspecified write makes every override redundant.
            parent.insert(name.to_owned(), value);
            for key in ["web", "app"] {
                if let Some(section) = parent.get_mut(key).and_then(Value::as_object_mut) {
                    section.remove(name);
                }
                prune_empty_section(parent, key);
            }
        }
        Some(key) => {
            if parent.get(name) == Some(&value) {
                // Equal to the sibling unspecified value: never stored, and
                // an existing override is dropped.
                if let Some(section) = parent.get_mut(key).and_then(Value::as_object_mut) {
                    section.remove(name);
                }
                prune_empty_section(parent, key);
                return Ok(());
            }

            let section = parent
                .entry(key.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(section) = section.as_object_mut() {
                section.insert(name.to_owned(), value);
            }

            collapse_agreeing_overrides(parent, name);
        }
    }

    Ok(())
}

/// When the web and app overrides agree they become one unspecified value
fn collapse_agreeing_overrides(parent: &mut Map<String, Value>, name: &str) {
    let web = parent.get("web").and_then(|section| section.get(name));
    let app = parent.get("app").and_then(|section| section.get(name));

    let agreed = match (web, app) {
        (Some(web), Some(app)) if web == app => web.clone(),
        _ => return,
    };

    for key in ["web", "app"] {
        if let Some(section) = parent.get_mut(key).and_then(Value::as_object_mut) {
            section.remove(name);
        }
        prune_empty_section(parent, key);
    }

    parent.insert(name.to_owned(), agreed);
}

fn prune_empty_section(parent: &mut Map<String, Value>, key: &str) {
    let empty = parent
        .get(key)
        .and_then(Value::as_object)
        .is_some_and(Map::is_empty);
    if empty {
        parent.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parent_with(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn redundant_override_is_not_stored() {
        let mut parent = parent_with(json!({ "editor": "pdftools" }));
        write_optimized(&mut parent, "editor", Platform::Web, json!("pdftools")).unwrap();
        assert_eq!(Value::Object(parent), json!({ "editor": "pdftools" }));
    }

    #[test]
    fn redundant_override_deletes_an_existing_one() {
        let mut parent = parent_with(json!({
            "editor": "pdftools",
            "web": { "editor": "legacy" }
        }));
        write_optimized(&mut parent, "editor", Platform::Web, json!("pdftools")).unwrap();
        assert_eq!(Value::Object(parent), json!({ "editor": "pdftools" }));
    }

    #[test]
    fn agreeing_overrides_collapse_to_unspecified() {
        let mut parent = parent_with(json!({ "web": { "flag": true } }));
        write_optimized(&mut parent, "flag", Platform::App, json!(true)).unwrap();
        assert_eq!(Value::Object(parent), json!({ "flag": true }));
    }

    #[test]
    fn unspecified_write_clears_overrides() {
        let mut parent = parent_with(json!({
            "flag": false,
            "web": { "flag": true },
            "app": { "flag": true, "other": 1 }
        }));
        write_optimized(&mut parent, "flag", Platform::Unspecified, json!(true)).unwrap();
        assert_eq!(
            Value::Object(parent),
            json!({ "flag": true, "app": { "other": 1 } })
        );
    }

    #[test]
    fn distinct_override_is_stored_under_its_section() {
        let mut parent = parent_with(json!({ "editor": "" }));
        write_optimized(&mut parent, "editor", Platform::Web, json!("pdftools")).unwrap();
        assert_eq!(
            Value::Object(parent),
            json!({ "editor": "", "web": { "editor": "pdftools" } })
        );
    }

    #[test]
    fn malformed_platform_section_fails_the_write() {
        let mut parent = parent_with(json!({ "web": 5 }));
        let before = parent.clone();

        let err =
            write_optimized(&mut parent, "editor", Platform::Web, json!("x")).unwrap_err();
        assert!(matches!(err, ConfigError::StructuralInvalid { .. }));

        // The unspecified branch rejects it too, before clearing overrides.
        let err =
            write_optimized(&mut parent, "editor", Platform::Unspecified, json!("x"))
                .unwrap_err();
        assert!(matches!(err, ConfigError::StructuralInvalid { .. }));
        assert_eq!(parent, before);
    }
}
