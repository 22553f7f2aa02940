//! `tenantcfg` - managing per-tenant, per-application configuration documents
//!
//! This library holds a typed configuration schema (a tree of composite and
//! leaf settings with defaults, release gating, dependencies and platform
//! overrides) and lets callers create, read, update, remove and validate
//! concrete tenant configurations against it, with all-or-nothing mutation
//! semantics on the in-memory JSON document.

pub mod cli;
pub mod document;
pub mod error;
pub mod schema;
pub mod values;

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use tracing::info;

use cli::Args;
use document::ConfigDocument;
use schema::{catalog, App, Platform, Release};

/// Main entry point for the tenantcfg CLI
///
/// # Errors
///
/// Returns an error when the document cannot be loaded or the requested
/// operation fails.
pub fn run(args: Args) -> Result<()> {
    let registry = catalog::standard_registry()?;

    let path = Path::new(&args.config);
    let mut doc = if path.exists() {
        ConfigDocument::from_file(path)?
    } else if args.add_tenant.is_some() {
        // Creating the first tenant may also create the document.
        ConfigDocument::new()
    } else {
        bail!("Configuration document not found: {}", args.config);
    };

    if args.list_tenants {
        for name in doc.tenant_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut mutated = false;

    if let Some(name) = args.add_tenant.as_ref() {
        doc.add_tenant(name)?;
        info!("Created tenant '{name}'");
        mutated = true;
    }

    let app: App = args.app.parse()?;
    let platform: Platform = args.platform.parse()?;

    if let Some(name) = args.enable_app.as_ref() {
        let target: App = name.parse()?;
        let tenant = require_tenant(&args)?;
        doc.tenant(&registry, tenant)?
            .enable_app(target, args.ensure_dependencies)?;
        info!("Enabled application '{target}' for tenant '{tenant}'");
        mutated = true;
    }

    if let Some(name) = args.disable_app.as_ref() {
        let target: App = name.parse()?;
        let tenant = require_tenant(&args)?;
        doc.tenant(&registry, tenant)?.disable_app(target)?;
        info!("Disabled application '{target}' for tenant '{tenant}'");
        mutated = true;
    }

    if let Some(setting) = args.set.as_ref() {
        let text = args
            .value
            .as_ref()
            .context("--set requires --value")?;
        let value: serde_json::Value = serde_json::from_str(text)
            .with_context(|| format!("Invalid JSON value: {text}"))?;

        let tenant = require_tenant(&args)?;
        doc.tenant(&registry, tenant)?
            .app(app)?
            .set(setting, value, platform, args.ensure_dependencies)?;
        mutated = true;
    }

    if let Some(setting) = args.remove.as_ref() {
        // Without an explicit platform, every platform variant goes.
        let target_platform = match platform {
            Platform::Unspecified => None,
            specific => Some(specific),
        };

        let tenant = require_tenant(&args)?;
        doc.tenant(&registry, tenant)?
            .app(app)?
            .remove(setting, target_platform)?;
        mutated = true;
    }

    if let Some(setting) = args.get.as_ref() {
        let tenant = require_tenant(&args)?;
        let value = doc
            .tenant(&registry, tenant)?
            .app(app)?
            .get_or_default(setting, platform)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    }

    if args.validate {
        let release: Release = args.release.parse()?;
        let tenant = require_tenant(&args)?;
        doc.tenant(&registry, tenant)?.validate(release)?;
        info!("Tenant '{tenant}' is valid for release {release}");
    }

    if mutated {
        let target = args.output.as_ref().unwrap_or(&args.config);
        doc.to_file(target)?;
        info!("Wrote configuration document to {target}");
    }

    Ok(())
}

fn require_tenant(args: &Args) -> Result<&str> {
    args.tenant
        .as_deref()
        .or(args.add_tenant.as_deref())
        .context("This operation requires --tenant")
}
