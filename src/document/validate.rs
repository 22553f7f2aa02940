//! Whole-document validation walk
//!
//! Walks every enabled application's subtree, classifying each JSON child as
//! a control-attribute marker, a platform section, or a schema-mapped node,
//! and collects every discoverable problem instead of failing fast.

use serde_json::{Map, Value};
use tracing::debug;

use crate::document::accessor::leaf_entry;
use crate::document::depcheck;
use crate::document::ConfigDocument;
use crate::error::ConfigError;
use crate::schema::node::{AppSchema, NodeId};
use crate::schema::registry::SchemaRegistry;
use crate::schema::{App, ControlAttribute, Platform, Release, TENANTS_KEY};

/// Validate one tenant's whole document against a requested release
///
/// # Errors
///
/// Returns a single problem as itself, two or more as an aggregate.
pub(crate) fn validate_tenant(
    doc: &ConfigDocument,
    registry: &SchemaRegistry,
    tenant: &str,
    release: Release,
) -> Result<(), ConfigError> {
    debug!("Validating tenant '{tenant}' against release {release}");

    let mut problems = Vec::new();

    let tenant_value = doc
        .root()
        .get(TENANTS_KEY)
        .and_then(|tenants| tenants.get(tenant));

    let Some(tenant_object) = tenant_value.and_then(Value::as_object) else {
        problems.push(ConfigError::structural(format!(
            "Tenant '{tenant}' is not a JSON object"
        )));
        return ConfigError::from_problems(problems);
    };

    for (key, section) in tenant_object {
        let Some(app) = App::from_config_name(key) else {
            problems.push(ConfigError::structural(format!(
                "Tenant '{tenant}' carries an unknown application section '{key}'"
            )));
            continue;
        };

        let schema = match registry.app(app) {
            Ok(schema) => schema,
            Err(err) => {
                problems.push(err);
                continue;
            }
        };

        let Some(object) = section.as_object() else {
            problems.push(ConfigError::structural(format!(
                "Application section '{app}' of tenant '{tenant}' is not a JSON object"
            )));
            continue;
        };

        let mut walker = Walker {
            doc,
            registry,
            tenant,
            release,
            schema,
            problems: &mut problems,
        };
        walker.composite(schema.root(), object, "");
        walker.required_leaves();
    }

    ConfigError::from_problems(problems)
}

struct Walker<'walk> {
    doc: &'walk ConfigDocument,
    registry: &'walk SchemaRegistry,
    tenant: &'walk str,
    release: Release,
    schema: &'walk AppSchema,
    problems: &'walk mut Vec<ConfigError>,
}

impl Walker<'_> {
    fn composite(&mut self, id: NodeId, object: &Map<String, Value>, prefix: &str) {
        let mut markers = Vec::new();

        for (key, child) in object {
            if let Some(attribute) = ControlAttribute::from_marker_key(key) {
                self.marker(attribute, child, prefix);
                markers.push(attribute);
            } else if let Some(platform) = Platform::from_key(key) {
                self.platform_section(id, platform, child, prefix);
            } else {
                self.child(id, key, child, prefix);
            }
        }

        if markers.len() > 1 {
            self.problems.push(ConfigError::structural(format!(
                "Composite '{}' carries more than one control-attribute marker",
                display_path(prefix)
            )));
        }

        let declared = self
            .schema
            .composite(id)
            .map_or(ControlAttribute::None, |composite| {
                composite.control_attribute
            });

        match (markers.first(), declared) {
            (None, ControlAttribute::None) => {}
            (None, expected) => self.problems.push(ConfigError::structural(format!(
                "Composite '{}' is missing its '{}' marker",
                display_path(prefix),
                expected
            ))),
            (Some(found), expected) if *found != expected => {
                self.problems.push(ConfigError::structural(format!(
                    "Composite '{}' carries marker '{}' but the schema declares '{}'",
                    display_path(prefix),
                    found,
                    expected
                )));
            }
            (Some(_), _) => {}
        }
    }

    fn marker(&mut self, attribute: ControlAttribute, value: &Value, prefix: &str) {
        if value != &Value::Bool(true) {
            self.problems.push(ConfigError::structural(format!(
                "Control-attribute marker '{}' on '{}' must be boolean true, got: {}",
                attribute,
                display_path(prefix),
                value
            )));
        }

        if !attribute.is_supported() {
            self.problems.push(ConfigError::structural(format!(
                "Control attribute '{}' on '{}' is not supported by this tool",
                attribute,
                display_path(prefix)
            )));
        }
    }

    fn platform_section(&mut self, id: NodeId, platform: Platform, value: &Value, prefix: &str) {
        let Some(section) = value.as_object() else {
            self.problems.push(ConfigError::structural(format!(
                "Platform section '{}' of '{}' is not a JSON object",
                platform,
                display_path(prefix)
            )));
            return;
        };

        for (name, entry) in section {
            let path = join_path(prefix, name);

            let Some(child) = self.schema.child_by_name(id, name) else {
                self.unknown(&path);
                continue;
            };

            let Some(leaf) = self.schema.leaf(child) else {
                self.problems.push(ConfigError::structural(format!(
                    "Platform section '{platform}' may only contain leaves, '{path}' is a composite"
                )));
                continue;
            };

            if !leaf.platform_specific() {
                self.problems.push(ConfigError::type_mismatch(format!(
                    "Setting '{path}' is not platform-specific but appears under '{platform}'"
                )));
                continue;
            }

            self.leaf(child, entry, &path);
        }
    }

    fn child(&mut self, id: NodeId, name: &str, value: &Value, prefix: &str) {
        let path = join_path(prefix, name);

        let Some(child) = self.schema.child_by_name(id, name) else {
            self.unknown(&path);
            return;
        };

        if self.schema.leaf(child).is_some() {
            self.leaf(child, value, &path);
            return;
        }

        match value.as_object() {
            Some(object) => self.composite(child, object, &path),
            None => self.problems.push(ConfigError::structural(format!(
                "Composite '{path}' is not a JSON object"
            ))),
        }
    }

    fn leaf(&mut self, id: NodeId, value: &Value, path: &str) {
        let Some(leaf) = self.schema.leaf(id) else {
            return;
        };

        if leaf.min_release > self.release {
            self.problems.push(ConfigError::unsupported_version(format!(
                "Setting '{}' requires release {}, requested {}",
                path, leaf.min_release, self.release
            )));
        }

        if let Err(err) = leaf.check_value(path, value) {
            self.problems.push(err);
        }

        if let Err(err) =
            depcheck::verify_node(self.doc, self.registry, self.tenant, self.schema, id)
        {
            self.problems.extend(err.into_problems());
        }
    }

    fn unknown(&mut self, path: &str) {
        let app = self.schema.app();
        match self.registry.find_elsewhere(app, path) {
            Some(owner) => self.problems.push(ConfigError::not_found(format!(
                "Setting '{path}' does not belong to application '{app}'; it belongs to application '{owner}' (misplaced setting?)"
            ))),
            None => self.problems.push(ConfigError::not_found(format!(
                "No setting '{path}' in application '{app}'"
            ))),
        }
    }

    /// Every required leaf must have a value under some platform
    fn required_leaves(&mut self) {
        for id in self.schema.leaves() {
            let required = self.schema.leaf(id).is_some_and(|leaf| leaf.required());
            if !required {
                continue;
            }

            let present = [Platform::Unspecified, Platform::Web, Platform::App]
                .into_iter()
                .any(|platform| {
                    leaf_entry(self.doc, self.tenant, self.schema, id, platform)
                        .is_ok_and(|entry| entry.is_some())
                });

            if !present {
                self.problems.push(ConfigError::value_invalid(format!(
                    "Required setting '{}' of application '{}' is missing",
                    self.schema.path(id),
                    self.schema.app()
                )));
            }
        }
    }
}

fn display_path(prefix: &str) -> &str {
    if prefix.is_empty() { "<application root>" } else { prefix }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}.{name}")
    }
}
