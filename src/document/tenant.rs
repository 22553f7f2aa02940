//! Tenant accessor
//!
//! Enables and disables applications for one tenant, computes the effective
//! service base URL, hands out app-scoped accessors, and orchestrates
//! whole-document validation.

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::document::accessor::{
    is_app_enabled, populate_leaf_defaults, read_leaf, AppAccessor,
};
use crate::document::depcheck::{self, DepMode};
use crate::document::transaction::with_tenant_rollback;
use crate::document::{validate, ConfigDocument};
use crate::error::ConfigError;
use crate::schema::catalog::SERVICE_BASE_URL_PATH;
use crate::schema::registry::SchemaRegistry;
use crate::schema::{App, Platform, Release};

/// Accessor for one tenant of the document
#[derive(Debug)]
pub struct TenantAccessor<'doc> {
    doc: &'doc mut ConfigDocument,
    registry: &'doc SchemaRegistry,
    tenant: String,
}

impl<'doc> TenantAccessor<'doc> {
    pub(crate) fn new(
        doc: &'doc mut ConfigDocument,
        registry: &'doc SchemaRegistry,
        tenant: String,
    ) -> Self {
        Self {
            doc,
            registry,
            tenant,
        }
    }

    /// Name of this tenant
    #[must_use]
    pub fn name(&self) -> &str {
        &self.tenant
    }

    /// Whether an application is enabled for this tenant
    #[must_use]
    pub fn is_enabled(&self, app: App) -> bool {
        is_app_enabled(self.doc, &self.tenant, app)
    }

    /// All currently enabled applications, in the fixed application order
    #[must_use]
    pub fn enabled_apps(&self) -> Vec<App> {
        App::ALL
            .into_iter()
            .filter(|app| self.is_enabled(*app))
            .collect()
    }

    /// Enable an application
    ///
    /// Checks the application's own dependencies (remedying them when
    /// `ensure_dependencies` is set), creates the application section with
    /// its root control-attribute marker, and populates every required leaf
    /// with its schema default. Enabling an already enabled application is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns the first failure after the tenant subtree has been rolled
    /// back.
    pub fn enable_app(&mut self, app: App, ensure_dependencies: bool) -> Result<(), ConfigError> {
        let registry = self.registry;
        let tenant = self.tenant.clone();

        with_tenant_rollback(self.doc, &tenant, |doc| {
            enable_app_inner(doc, registry, &tenant, app, ensure_dependencies)
        })
    }

    /// Disable an application, deleting its whole subtree
    ///
    /// The base application can never be removed. An application with no
    /// section in the document is expected absence, not an error.
    ///
    /// # Errors
    ///
    /// Returns a structural error for the base application.
    pub fn disable_app(&mut self, app: App) -> Result<(), ConfigError> {
        if app.is_base() {
            return Err(ConfigError::structural(format!(
                "The base application '{app}' can never be removed"
            )));
        }

        let tenant = self.tenant.clone();
        with_tenant_rollback(self.doc, &tenant, |doc| {
            let Some(section) = doc
                .tenants_mut()?
                .get_mut(&tenant)
                .and_then(Value::as_object_mut)
            else {
                return Err(ConfigError::not_found(format!("No tenant '{tenant}'")));
            };

            if section.remove(app.config_name()).is_some() {
                info!("Disabled application '{app}' for tenant '{tenant}'");
            } else {
                debug!("Application '{app}' has no section for tenant '{tenant}'; nothing to do");
            }
            Ok(())
        })
    }

    /// Obtain the accessor for one enabled application
    ///
    /// # Errors
    ///
    /// Returns not-found when the application is not enabled.
    pub fn app(&mut self, app: App) -> Result<AppAccessor<'_>, ConfigError> {
        if !self.is_enabled(app) {
            return Err(ConfigError::not_found(format!(
                "Application '{app}' is not enabled for tenant '{}'",
                self.tenant
            )));
        }

        Ok(AppAccessor {
            doc: self.doc,
            registry: self.registry,
            tenant: self.tenant.clone(),
            app,
        })
    }

    /// Effective service base URL of this tenant
    ///
    /// The stored value of the base application's `service.baseUrl` leaf
    /// with its tenant-URI decoration applied, falling back to the decorated
    /// schema default.
    ///
    /// # Errors
    ///
    /// Returns not-found when the registry carries no such leaf, or a
    /// type-mismatch when the stored value is not a string.
    pub fn service_base_url(&self) -> Result<String, ConfigError> {
        let (schema, node) = self.registry.lookup(App::Client, SERVICE_BASE_URL_PATH)?;
        let leaf = schema.leaf(node).ok_or_else(|| {
            ConfigError::structural(format!("'{SERVICE_BASE_URL_PATH}' is not a leaf"))
        })?;

        let effective = if self.is_enabled(App::Client) {
            read_leaf(self.doc, &self.tenant, schema, node, Platform::Unspecified)?
        } else {
            None
        };

        let value = match effective {
            Some(stored) => match leaf.decoration {
                Some(decoration) => decoration.effective(&self.tenant, &stored),
                None => stored,
            },
            None => {
                let raw = leaf.default_for(Platform::Unspecified);
                match leaf.decoration {
                    Some(decoration) => decoration.decorated_default(&self.tenant, raw),
                    None => raw.clone(),
                }
            }
        };

        value.as_str().map(ToOwned::to_owned).ok_or_else(|| {
            ConfigError::type_mismatch(format!(
                "'{SERVICE_BASE_URL_PATH}' is not a string: {value}"
            ))
        })
    }

    /// Whole-document validation of this tenant against a requested release
    ///
    /// Collects every discoverable problem instead of failing fast.
    ///
    /// # Errors
    ///
    /// Returns a single problem as itself, two or more as an aggregate.
    pub fn validate(&self, release: Release) -> Result<(), ConfigError> {
        validate::validate_tenant(self.doc, self.registry, &self.tenant, release)
    }
}

/// Enable an application without the transaction wrapper; shared with the
/// application-dependency remedy
pub(crate) fn enable_app_inner(
    doc: &mut ConfigDocument,
    registry: &SchemaRegistry,
    tenant: &str,
    app: App,
    ensure_dependencies: bool,
) -> Result<(), ConfigError> {
    if is_app_enabled(doc, tenant, app) {
        return Ok(());
    }

    let schema = registry.app(app)?;
    let mode = if ensure_dependencies {
        DepMode::Ensure
    } else {
        DepMode::Verify
    };

    depcheck::check_node(doc, registry, tenant, schema, schema.root(), mode)?;

    let mut section = Map::new();
    if let Some(marker) = schema
        .composite(schema.root())
        .and_then(|composite| composite.control_attribute.marker_key())
    {
        section.insert(marker.to_owned(), Value::Bool(true));
    }

    let tenant_object = doc
        .tenants_mut()?
        .get_mut(tenant)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| ConfigError::not_found(format!("No tenant '{tenant}'")))?;
    tenant_object.insert(app.config_name().to_owned(), Value::Object(section));

    for leaf_id in schema.leaves() {
        let required = schema.leaf(leaf_id).is_some_and(|leaf| leaf.required());
        if !required {
            continue;
        }

        populate_leaf_defaults(doc, registry, tenant, app, schema, leaf_id)?;
        depcheck::check_node(doc, registry, tenant, schema, leaf_id, mode)?;
    }

    info!("Enabled application '{app}' for tenant '{tenant}'");
    Ok(())
}
