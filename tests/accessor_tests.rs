//! App-scoped accessor tests: platform storage optimization, reads with
//! fallback, removal semantics, ancestor materialization

use serde_json::json;
use tenantcfg::document::ConfigDocument;
use tenantcfg::error::ConfigError;
use tenantcfg::schema::catalog::standard_registry;
use tenantcfg::schema::registry::SchemaRegistry;
use tenantcfg::schema::{App, Platform};

fn setup() -> (SchemaRegistry, ConfigDocument) {
    let registry = standard_registry().unwrap();
    let mut doc = ConfigDocument::new();
    doc.add_tenant("acme").unwrap();
    doc.tenant(&registry, "acme")
        .unwrap()
        .enable_app(App::Client, false)
        .unwrap();
    (registry, doc)
}

#[test]
fn set_then_get_round_trips() {
    let (registry, mut doc) = setup();
    let mut tenant = doc.tenant(&registry, "acme").unwrap();
    let mut client = tenant.app(App::Client).unwrap();

    client
        .set("ui.theme", json!("dark"), Platform::Unspecified, false)
        .unwrap();
    assert_eq!(
        client.get("ui.theme", Platform::Unspecified).unwrap(),
        json!("dark")
    );
}

#[test]
fn set_materializes_ancestors_with_markers() {
    let (registry, mut doc) = setup();
    {
        let mut tenant = doc.tenant(&registry, "acme").unwrap();
        let mut client = tenant.app(App::Client).unwrap();
        client
            .set("ui.pdf.editor", json!("pdftools"), Platform::Unspecified, false)
            .unwrap();
    }

    let ui = &doc.root()["tenants"]["acme"]["client"]["ui"];
    assert_eq!(ui["extend"], json!(true));
    assert_eq!(ui["pdf"]["extend"], json!(true));
    assert_eq!(ui["pdf"]["editor"], json!("pdftools"));
}

#[test]
fn redundant_platform_override_is_not_stored() {
    let (registry, mut doc) = setup();
    {
        let mut tenant = doc.tenant(&registry, "acme").unwrap();
        let mut client = tenant.app(App::Client).unwrap();

        client
            .set(
                "ui.pdf.downloadEnabled",
                json!(true),
                Platform::Unspecified,
                false,
            )
            .unwrap();
        client
            .set("ui.pdf.downloadEnabled", json!(true), Platform::Web, false)
            .unwrap();
    }

    let pdf = &doc.root()["tenants"]["acme"]["client"]["ui"]["pdf"];
    assert_eq!(pdf["downloadEnabled"], json!(true));
    assert!(pdf.get("web").is_none());
}

#[test]
fn agreeing_platform_overrides_collapse() {
    let (registry, mut doc) = setup();
    {
        let mut tenant = doc.tenant(&registry, "acme").unwrap();
        let mut client = tenant.app(App::Client).unwrap();

        client
            .set("ui.pdf.downloadEnabled", json!(false), Platform::Web, false)
            .unwrap();
        client
            .set("ui.pdf.downloadEnabled", json!(false), Platform::App, false)
            .unwrap();
    }

    let pdf = &doc.root()["tenants"]["acme"]["client"]["ui"]["pdf"];
    assert_eq!(pdf["downloadEnabled"], json!(false));
    assert!(pdf.get("web").is_none());
    assert!(pdf.get("app").is_none());
}

#[test]
fn unspecified_write_clears_platform_overrides() {
    let (registry, mut doc) = setup();
    {
        let mut tenant = doc.tenant(&registry, "acme").unwrap();
        let mut client = tenant.app(App::Client).unwrap();

        client
            .set("ui.pdf.downloadEnabled", json!(false), Platform::Web, false)
            .unwrap();
        client
            .set(
                "ui.pdf.downloadEnabled",
                json!(true),
                Platform::Unspecified,
                false,
            )
            .unwrap();
    }

    let pdf = &doc.root()["tenants"]["acme"]["client"]["ui"]["pdf"];
    assert_eq!(pdf["downloadEnabled"], json!(true));
    assert!(pdf.get("web").is_none());
}

#[test]
fn platform_read_falls_back_to_unspecified() {
    let (registry, mut doc) = setup();
    let mut tenant = doc.tenant(&registry, "acme").unwrap();
    let mut client = tenant.app(App::Client).unwrap();

    client
        .set(
            "ui.pdf.downloadEnabled",
            json!(true),
            Platform::Unspecified,
            false,
        )
        .unwrap();
    client
        .set("ui.pdf.downloadEnabled", json!(false), Platform::Web, false)
        .unwrap();

    assert_eq!(
        client.get("ui.pdf.downloadEnabled", Platform::Web).unwrap(),
        json!(false)
    );
    // App has no override; the unspecified value applies.
    assert_eq!(
        client.get("ui.pdf.downloadEnabled", Platform::App).unwrap(),
        json!(true)
    );
    // Reading unspecified never returns a platform-specific value.
    assert_eq!(
        client
            .get("ui.pdf.downloadEnabled", Platform::Unspecified)
            .unwrap(),
        json!(true)
    );
}

#[test]
fn has_distinguishes_platform_and_unspecified_entries() {
    let (registry, mut doc) = setup();
    let mut tenant = doc.tenant(&registry, "acme").unwrap();
    let mut client = tenant.app(App::Client).unwrap();

    client
        .set("ui.pdf.downloadEnabled", json!(false), Platform::Web, false)
        .unwrap();

    assert!(client.has("ui.pdf.downloadEnabled", Platform::Web).unwrap());
    assert!(!client.has("ui.pdf.downloadEnabled", Platform::App).unwrap());
    assert!(!client
        .has("ui.pdf.downloadEnabled", Platform::Unspecified)
        .unwrap());

    client
        .set(
            "ui.pdf.downloadEnabled",
            json!(true),
            Platform::Unspecified,
            false,
        )
        .unwrap();
    assert!(client.has("ui.pdf.downloadEnabled", Platform::App).unwrap());
}

#[test]
fn remove_without_platform_drops_every_variant() {
    let (registry, mut doc) = setup();
    let mut tenant = doc.tenant(&registry, "acme").unwrap();
    let mut client = tenant.app(App::Client).unwrap();

    client
        .set(
            "ui.pdf.downloadEnabled",
            json!(true),
            Platform::Unspecified,
            false,
        )
        .unwrap();
    client
        .set("ui.pdf.downloadEnabled", json!(false), Platform::Web, false)
        .unwrap();

    client.remove("ui.pdf.downloadEnabled", None).unwrap();

    for platform in [Platform::Unspecified, Platform::Web, Platform::App] {
        assert!(!client.has("ui.pdf.downloadEnabled", platform).unwrap());
    }
}

#[test]
fn remove_of_one_platform_keeps_the_others() {
    let (registry, mut doc) = setup();
    let mut tenant = doc.tenant(&registry, "acme").unwrap();
    let mut client = tenant.app(App::Client).unwrap();

    client
        .set(
            "ui.pdf.downloadEnabled",
            json!(true),
            Platform::Unspecified,
            false,
        )
        .unwrap();
    client
        .set("ui.pdf.downloadEnabled", json!(false), Platform::Web, false)
        .unwrap();

    client
        .remove("ui.pdf.downloadEnabled", Some(Platform::Web))
        .unwrap();
    assert!(client
        .has("ui.pdf.downloadEnabled", Platform::Unspecified)
        .unwrap());
}

#[test]
fn remove_of_a_composite_deletes_the_subtree() {
    let (registry, mut doc) = setup();
    {
        let mut tenant = doc.tenant(&registry, "acme").unwrap();
        let mut client = tenant.app(App::Client).unwrap();
        client
            .set("ui.pdf.editor", json!("pdftools"), Platform::Unspecified, false)
            .unwrap();
        client.remove("ui", None).unwrap();
    }

    assert!(doc.root()["tenants"]["acme"]["client"].get("ui").is_none());
}

#[test]
fn malformed_platform_sections_fail_writes_and_removes() {
    let registry = standard_registry().unwrap();
    let text = serde_json::json!({
        "tenants": { "acme": { "client": {
            "extend": true,
            "service": { "extend": true, "baseUrl": "https://acme.example.com/api" },
            "ui": { "extend": true, "pdf": { "extend": true, "web": 5 } }
        } } }
    })
    .to_string();
    let mut doc = ConfigDocument::from_str(&text).unwrap();
    let before = doc.root().clone();

    {
        let mut tenant = doc.tenant(&registry, "acme").unwrap();
        let mut client = tenant.app(App::Client).unwrap();

        let err = client
            .set("ui.pdf.downloadEnabled", json!(false), Platform::Web, false)
            .unwrap_err();
        assert!(matches!(err, ConfigError::StructuralInvalid { .. }));

        let err = client
            .remove("ui.pdf.downloadEnabled", Some(Platform::Web))
            .unwrap_err();
        assert!(matches!(err, ConfigError::StructuralInvalid { .. }));
    }

    // The failed calls left the document untouched.
    assert_eq!(doc.root(), &before);
}

#[test]
fn set_rejects_platform_writes_on_plain_leaves() {
    let (registry, mut doc) = setup();
    let mut tenant = doc.tenant(&registry, "acme").unwrap();
    let mut client = tenant.app(App::Client).unwrap();

    let err = client
        .set("ui.pdf.editor", json!("x"), Platform::Web, false)
        .unwrap_err();
    assert!(matches!(err, ConfigError::TypeMismatch { .. }));
}

#[test]
fn set_rejects_wrong_types_and_invalid_values() {
    let (registry, mut doc) = setup();
    let mut tenant = doc.tenant(&registry, "acme").unwrap();
    let mut client = tenant.app(App::Client).unwrap();

    let err = client
        .set("ui.theme", json!(42), Platform::Unspecified, false)
        .unwrap_err();
    assert!(matches!(err, ConfigError::TypeMismatch { .. }));

    let err = client
        .set("ui.theme", json!("blue"), Platform::Unspecified, false)
        .unwrap_err();
    assert!(matches!(err, ConfigError::ValueInvalid { .. }));

    let err = client
        .set(
            "service.timeoutSeconds",
            json!(100_000),
            Platform::Unspecified,
            false,
        )
        .unwrap_err();
    assert!(matches!(err, ConfigError::ValueInvalid { .. }));
}

#[test]
fn unknown_paths_report_misplaced_settings() {
    let (registry, mut doc) = setup();
    let mut tenant = doc.tenant(&registry, "acme").unwrap();
    let mut client = tenant.app(App::Client).unwrap();

    let err = client
        .get("previewPageLimit", Platform::Unspecified)
        .unwrap_err();
    assert!(err.to_string().contains("misplaced setting"));
    assert!(err.to_string().contains("dokumente"));

    let err = client.get("no.such.path", Platform::Unspecified).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
    assert!(!err.to_string().contains("misplaced"));
}

#[test]
fn get_or_default_reads_schema_defaults() {
    let (registry, mut doc) = setup();
    let mut tenant = doc.tenant(&registry, "acme").unwrap();
    let client = tenant.app(App::Client).unwrap();

    assert_eq!(
        client
            .get_or_default("ui.theme", Platform::Unspecified)
            .unwrap(),
        json!("auto")
    );
    // Platform-specific default for the app platform.
    assert_eq!(
        client
            .get_or_default("ui.pdf.downloadEnabled", Platform::App)
            .unwrap(),
        json!(false)
    );
    // Decorated default substitutes the tenant name.
    assert_eq!(
        client
            .get_or_default("ui.helpUrl", Platform::Unspecified)
            .unwrap(),
        json!("https://help.example.com/acme")
    );
}

#[test]
fn apply_defaults_populates_a_composite() {
    let (registry, mut doc) = setup();
    let mut tenant = doc.tenant(&registry, "acme").unwrap();
    let mut client = tenant.app(App::Client).unwrap();

    client.apply_defaults("ui", false).unwrap();

    assert_eq!(
        client.get("ui.theme", Platform::Unspecified).unwrap(),
        json!("auto")
    );
    assert_eq!(
        client.get("ui.pdf.editor", Platform::Unspecified).unwrap(),
        json!("")
    );
    // Platform-specific leaf: once per platform, stored as distinct
    // overrides because the defaults differ.
    assert_eq!(
        client.get("ui.pdf.downloadEnabled", Platform::Web).unwrap(),
        json!(true)
    );
    assert_eq!(
        client.get("ui.pdf.downloadEnabled", Platform::App).unwrap(),
        json!(false)
    );
}
