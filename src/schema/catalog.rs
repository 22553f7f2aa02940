//! Standard product catalog
//!
//! The fixed schema of the product family: the base `client` application
//! plus the `dokumente` and `workflow` feature applications, each depending
//! on the base.

use serde_json::json;

use crate::error::ConfigError;
use crate::schema::builder::AppSchemaBuilder;
use crate::schema::decorate::Decoration;
use crate::schema::dependency::Dependency;
use crate::schema::node::{AppSchema, ValueType};
use crate::schema::registry::SchemaRegistry;
use crate::schema::{App, ControlAttribute, Platform, Release};
use crate::values::{HttpUri, IntRange, OneOf};

/// Path of the leaf holding the tenant's service base URL
pub const SERVICE_BASE_URL_PATH: &str = "service.baseUrl";

/// Build the standard registry of the product family
///
/// # Errors
///
/// Returns a structural error when the catalog definition itself is
/// inconsistent; this indicates a programming error in the catalog.
pub fn standard_registry() -> Result<SchemaRegistry, ConfigError> {
    SchemaRegistry::new(vec![client_schema()?, dokumente_schema()?, workflow_schema()?])
}

fn client_schema() -> Result<AppSchema, ConfigError> {
    let mut builder = AppSchemaBuilder::new(App::Client, ControlAttribute::Extend);
    let root = builder.root();

    let locale = builder.leaf(root, "locale", ValueType::String, Release::R16, json!("en"))?;
    builder.validator(locale, Box::new(OneOf::new(["en", "de", "fr", "it"])))?;

    let service = builder.composite(root, "service", ControlAttribute::Extend)?;

    let base_url = builder.leaf(
        service,
        "baseUrl",
        ValueType::String,
        Release::R16,
        json!("https://{tenant}.example.com/api"),
    )?;
    builder.require(base_url)?;
    builder.decorate(base_url, Decoration::TenantUri)?;

    let timeout = builder.leaf(
        service,
        "timeoutSeconds",
        ValueType::Integer,
        Release::R16,
        json!(30),
    )?;
    builder.validator(timeout, Box::new(IntRange::new(1, 600)))?;

    let annotations = builder.leaf(
        service,
        "allowDokumenteAnnotations",
        ValueType::Bool,
        Release::R16_1,
        json!(false),
    )?;
    builder.depends(
        annotations,
        Dependency::setting_equals(App::Client, "ui.pdf.editor", json!("pdftools")),
    );

    builder.leaf(
        service,
        "uploadChunkSize",
        ValueType::Integer,
        Release::R18,
        json!(1_048_576),
    )?;

    let ui = builder.composite(root, "ui", ControlAttribute::Extend)?;

    let theme = builder.leaf(ui, "theme", ValueType::String, Release::R16, json!("auto"))?;
    builder.validator(theme, Box::new(OneOf::new(["light", "dark", "auto"])))?;

    let pdf = builder.composite(ui, "pdf", ControlAttribute::Extend)?;
    builder.leaf(pdf, "editor", ValueType::String, Release::R16, json!(""))?;

    let download = builder.leaf(
        pdf,
        "downloadEnabled",
        ValueType::Bool,
        Release::R16,
        json!(true),
    )?;
    builder.platform_specific(download)?;
    builder.platform_default(download, Platform::App, json!(false))?;

    let help_url = builder.leaf(
        ui,
        "helpUrl",
        ValueType::String,
        Release::R16,
        json!("https://help.example.com/{tenant}"),
    )?;
    builder.decorate(help_url, Decoration::DefaultToken)?;
    builder.validator(help_url, Box::new(HttpUri::new()))?;

    Ok(builder.build())
}

fn dokumente_schema() -> Result<AppSchema, ConfigError> {
    let mut builder = AppSchemaBuilder::new(App::Dokumente, ControlAttribute::Extend);
    let root = builder.root();
    builder.depends(root, Dependency::Application(App::Client));

    let annotations = builder.composite(root, "annotations", ControlAttribute::Extend)?;

    let enabled = builder.leaf(
        annotations,
        "enabled",
        ValueType::Bool,
        Release::R16,
        json!(true),
    )?;
    builder.require(enabled)?;

    let max_per_page = builder.leaf(
        annotations,
        "maxPerPage",
        ValueType::Integer,
        Release::R16_1,
        json!(50),
    )?;
    builder.validator(max_per_page, Box::new(IntRange::new(1, 500)))?;

    builder.leaf(
        root,
        "previewPageLimit",
        ValueType::Integer,
        Release::R16,
        json!(20),
    )?;

    Ok(builder.build())
}

fn workflow_schema() -> Result<AppSchema, ConfigError> {
    let mut builder = AppSchemaBuilder::new(App::Workflow, ControlAttribute::Extend);
    let root = builder.root();
    builder.depends(root, Dependency::Application(App::Client));

    let inbox = builder.composite(root, "inbox", ControlAttribute::None)?;

    let refresh = builder.leaf(
        inbox,
        "refreshSeconds",
        ValueType::Integer,
        Release::R16,
        json!(60),
    )?;
    builder.validator(refresh, Box::new(IntRange::new(5, 3600)))?;

    let show_counts = builder.leaf(
        inbox,
        "showCounts",
        ValueType::Bool,
        Release::R16,
        json!(true),
    )?;
    builder.platform_specific(show_counts)?;

    builder.leaf(
        root,
        "delegationEnabled",
        ValueType::Bool,
        Release::R17,
        json!(false),
    )?;

    Ok(builder.build())
}
