//! Schema registry
//!
//! One root composite per application, with dotted-path lookup across the
//! whole product family. Built once, immutable afterwards.

use crate::error::ConfigError;
use crate::schema::node::{AppSchema, NodeId};
use crate::schema::App;

/// All application schemas of the product family
#[derive(Debug)]
pub struct SchemaRegistry {
    apps: Vec<AppSchema>,
}

impl SchemaRegistry {
    /// Assemble a registry from per-application trees
    ///
    /// # Errors
    ///
    /// Returns a structural error when an application appears twice or the
    /// base application is missing.
    pub fn new(apps: Vec<AppSchema>) -> Result<Self, ConfigError> {
        for (index, schema) in apps.iter().enumerate() {
            if apps[..index].iter().any(|other| other.app() == schema.app()) {
                return Err(ConfigError::structural(format!(
                    "Application '{}' is registered twice",
                    schema.app()
                )));
            }
        }

        if !apps.iter().any(|schema| schema.app().is_base()) {
            return Err(ConfigError::structural(
                "The base application schema is missing",
            ));
        }

        Ok(Self { apps })
    }

    /// Schema of one application
    ///
    /// # Errors
    ///
    /// Returns not-found when the application is not registered.
    pub fn app(&self, app: App) -> Result<&AppSchema, ConfigError> {
        self.apps
            .iter()
            .find(|schema| schema.app() == app)
            .ok_or_else(|| {
                ConfigError::not_found(format!("Application '{app}' is not registered"))
            })
    }

    /// All registered application schemas
    #[must_use]
    pub fn apps(&self) -> &[AppSchema] {
        &self.apps
    }

    /// Resolve a dotted path inside one application
    ///
    /// # Errors
    ///
    /// Returns not-found for an unregistered application or an unknown path;
    /// when another application's schema knows the path, the error carries a
    /// misplaced-setting hint.
    pub fn lookup(&self, app: App, path: &str) -> Result<(&AppSchema, NodeId), ConfigError> {
        let schema = self.app(app)?;

        if let Some(id) = schema.lookup(path) {
            return Ok((schema, id));
        }

        if let Some(owner) = self.find_elsewhere(app, path) {
            return Err(ConfigError::not_found(format!(
                "No setting '{path}' in application '{app}'; it belongs to application '{owner}' (misplaced setting?)"
            )));
        }

        Err(ConfigError::not_found(format!(
            "No setting '{path}' in application '{app}'"
        )))
    }

    /// Search the other applications for a path, for misplaced-setting hints
    #[must_use]
    pub fn find_elsewhere(&self, app: App, path: &str) -> Option<App> {
        self.apps
            .iter()
            .filter(|schema| schema.app() != app)
            .find(|schema| schema.lookup(path).is_some())
            .map(AppSchema::app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::builder::AppSchemaBuilder;
    use crate::schema::node::ValueType;
    use crate::schema::{ControlAttribute, Release};
    use serde_json::json;

    fn small_registry() -> SchemaRegistry {
        let mut client = AppSchemaBuilder::new(App::Client, ControlAttribute::Extend);
        let root = client.root();
        client
            .leaf(root, "locale", ValueType::String, Release::R16, json!("en"))
            .unwrap();

        let mut dokumente = AppSchemaBuilder::new(App::Dokumente, ControlAttribute::Extend);
        let root = dokumente.root();
        client_like_leaf(&mut dokumente, root);

        SchemaRegistry::new(vec![client.build(), dokumente.build()]).unwrap()
    }

    fn client_like_leaf(builder: &mut AppSchemaBuilder, root: crate::schema::NodeId) {
        builder
            .leaf(root, "previewLimit", ValueType::Integer, Release::R16, json!(20))
            .unwrap();
    }

    #[test]
    fn lookup_resolves_registered_paths() {
        let registry = small_registry();
        assert!(registry.lookup(App::Client, "locale").is_ok());
        assert!(registry.lookup(App::Dokumente, "previewLimit").is_ok());
    }

    #[test]
    fn lookup_hints_at_misplaced_settings() {
        let registry = small_registry();
        let err = registry.lookup(App::Client, "previewLimit").unwrap_err();
        assert!(err.to_string().contains("misplaced setting"));
        assert!(err.to_string().contains("dokumente"));
    }

    #[test]
    fn registry_requires_the_base_application() {
        let dokumente = AppSchemaBuilder::new(App::Dokumente, ControlAttribute::Extend);
        let err = SchemaRegistry::new(vec![dokumente.build()]).unwrap_err();
        assert!(matches!(err, ConfigError::StructuralInvalid { .. }));
    }

    #[test]
    fn registry_rejects_duplicate_applications() {
        let a = AppSchemaBuilder::new(App::Client, ControlAttribute::Extend);
        let b = AppSchemaBuilder::new(App::Client, ControlAttribute::Extend);
        assert!(SchemaRegistry::new(vec![a.build(), b.build()]).is_err());
    }
}
