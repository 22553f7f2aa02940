//! Dependency verification and enforcement
//!
//! Dependencies attached to a schema node are checked whenever a value under
//! it is written, and again during whole-document validation. Verify mode
//! fails on the first node with unmet dependencies, reporting all of that
//! node's failures together; ensure mode applies each dependency's remedy
//! and only fails when a remedy itself fails.

use serde_json::Value;
use tracing::debug;

use crate::document::accessor::{is_app_enabled, leaf_entry, write_leaf_value};
use crate::document::locator::Locator;
use crate::document::{tenant, ConfigDocument};
use crate::error::ConfigError;
use crate::schema::dependency::Dependency;
use crate::schema::node::{AppSchema, NodeId};
use crate::schema::registry::SchemaRegistry;
use crate::schema::{App, Platform};

/// How unmet dependencies are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DepMode {
    /// Fail with Dependency-Unfulfilled
    Verify,
    /// Apply the remedy; fail only when the remedy fails
    Ensure,
}

/// Check the dependencies of one node
pub(crate) fn check_node(
    doc: &mut ConfigDocument,
    registry: &SchemaRegistry,
    tenant_name: &str,
    schema: &AppSchema,
    node: NodeId,
    mode: DepMode,
) -> Result<(), ConfigError> {
    match mode {
        DepMode::Verify => verify_node(doc, registry, tenant_name, schema, node),
        DepMode::Ensure => ensure_node(doc, registry, tenant_name, schema, node),
    }
}

/// Check a node and all of its ancestors, the node first
pub(crate) fn check_chain(
    doc: &mut ConfigDocument,
    registry: &SchemaRegistry,
    tenant_name: &str,
    app: App,
    node: NodeId,
    mode: DepMode,
) -> Result<(), ConfigError> {
    let schema = registry.app(app)?;

    let mut current = Some(node);
    while let Some(id) = current {
        check_node(doc, registry, tenant_name, schema, id, mode)?;
        current = schema.parent(id);
    }

    Ok(())
}

/// Verify one node's dependencies, aggregating its failures
pub(crate) fn verify_node(
    doc: &ConfigDocument,
    registry: &SchemaRegistry,
    tenant_name: &str,
    schema: &AppSchema,
    node: NodeId,
) -> Result<(), ConfigError> {
    let failures: Vec<ConfigError> = schema
        .dependencies(node)
        .iter()
        .filter_map(|dep| dependency_failure(doc, registry, tenant_name, dep))
        .collect();

    ConfigError::from_problems(failures)
}

fn ensure_node(
    doc: &mut ConfigDocument,
    registry: &SchemaRegistry,
    tenant_name: &str,
    schema: &AppSchema,
    node: NodeId,
) -> Result<(), ConfigError> {
    for dep in schema.dependencies(node) {
        if dependency_failure(doc, registry, tenant_name, dep).is_some() {
            debug!("Applying remedy: {}", dep.describe());
            apply_remedy(doc, registry, tenant_name, dep)?;
        }
    }
    Ok(())
}

/// The failure one dependency currently produces, `None` when fulfilled
pub(crate) fn dependency_failure(
    doc: &ConfigDocument,
    registry: &SchemaRegistry,
    tenant_name: &str,
    dep: &Dependency,
) -> Option<ConfigError> {
    match dep {
        Dependency::Application(app) => {
            if is_app_enabled(doc, tenant_name, *app) {
                None
            } else {
                Some(unmet(dep))
            }
        }
        Dependency::SettingValue {
            app,
            path,
            expected,
        } => {
            let current = current_setting_value(doc, registry, tenant_name, *app, path);
            let current = match current {
                Ok(value) => value,
                Err(err) => return Some(err),
            };

            let fulfilled = match expected {
                // A null expected value also matches an absent leaf.
                Some(Value::Null) => {
                    matches!(current, None | Some(Value::Null))
                }
                Some(value) => current.as_ref() == Some(value),
                None => current.is_some(),
            };

            if fulfilled { None } else { Some(unmet(dep)) }
        }
    }
}

fn unmet(dep: &Dependency) -> ConfigError {
    ConfigError::dependency(format!("Dependency not met: {}", dep.describe()))
}

fn current_setting_value(
    doc: &ConfigDocument,
    registry: &SchemaRegistry,
    tenant_name: &str,
    app: App,
    path: &str,
) -> Result<Option<Value>, ConfigError> {
    if !is_app_enabled(doc, tenant_name, app) {
        return Ok(None);
    }

    let (schema, node) = registry.lookup(app, path).map_err(|err| {
        ConfigError::dependency(format!("Dependency target is unknown: {err}"))
    })?;

    leaf_entry(doc, tenant_name, schema, node, Platform::Unspecified)
}

fn apply_remedy(
    doc: &mut ConfigDocument,
    registry: &SchemaRegistry,
    tenant_name: &str,
    dep: &Dependency,
) -> Result<(), ConfigError> {
    match dep {
        Dependency::Application(app) => {
            tenant::enable_app_inner(doc, registry, tenant_name, *app, true)
        }
        Dependency::SettingValue {
            app,
            path,
            expected,
        } => match expected {
            Some(Value::Null) => clear_setting(doc, registry, tenant_name, *app, path),
            Some(value) => write_leaf_value(
                doc,
                registry,
                tenant_name,
                *app,
                path,
                value.clone(),
                Platform::Unspecified,
            ),
            None => {
                let (schema, node) = registry.lookup(*app, path)?;
                let leaf = schema.leaf(node).ok_or_else(|| {
                    ConfigError::dependency(format!(
                        "Dependency target '{app}:{path}' is a composite"
                    ))
                })?;

                let raw = leaf.default_for(Platform::Unspecified);
                let value = match leaf.decoration {
                    Some(decoration) => decoration.decorated_default(tenant_name, raw),
                    None => raw.clone(),
                };

                write_leaf_value(
                    doc,
                    registry,
                    tenant_name,
                    *app,
                    path,
                    value,
                    Platform::Unspecified,
                )
            }
        },
    }
}

/// Remedy for an expected-null dependency: drop the stored unspecified value
fn clear_setting(
    doc: &mut ConfigDocument,
    registry: &SchemaRegistry,
    tenant_name: &str,
    app: App,
    path: &str,
) -> Result<(), ConfigError> {
    let (schema, node) = registry.lookup(app, path)?;
    let locator = Locator::for_node(tenant_name, schema, node, Platform::Unspecified);
    let Some((parent, key)) = locator.split_last() else {
        return Err(ConfigError::structural("Empty locator"));
    };

    if let Some(object) = parent
        .resolve_mut(doc.root_mut())?
        .and_then(Value::as_object_mut)
    {
        object.remove(key);
    }

    Ok(())
}
