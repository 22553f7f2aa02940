//! Transactional mutation protocol
//!
//! Every structural mutation runs against a snapshot of the tenant's JSON
//! subtree taken before the operation: clone the subtree, apply the
//! mutation, commit by discarding the snapshot, or restore the subtree
//! value-for-value when the operation reports a failure. This is an
//! in-memory consistency protocol, not a lock; concurrent writers must be
//! serialized by the caller.

use serde_json::Value;
use tracing::debug;

use crate::document::ConfigDocument;
use crate::error::ConfigError;

/// Run a mutation of one tenant's subtree with all-or-nothing semantics
///
/// # Errors
///
/// Propagates the operation's error after the subtree has been restored.
pub fn with_tenant_rollback<T>(
    doc: &mut ConfigDocument,
    tenant: &str,
    operation: impl FnOnce(&mut ConfigDocument) -> Result<T, ConfigError>,
) -> Result<T, ConfigError> {
    let snapshot: Option<Value> = doc
        .root()
        .get(crate::schema::TENANTS_KEY)
        .and_then(|tenants| tenants.get(tenant))
        .cloned();

    match operation(doc) {
        Ok(value) => Ok(value),
        Err(err) => {
            debug!("Rolling back tenant '{tenant}' after: {err}");
            let tenants = doc.tenants_mut()?;
            match snapshot {
                Some(previous) => {
                    tenants.insert(tenant.to_owned(), previous);
                }
                None => {
                    tenants.remove(tenant);
                }
            }
            Err(err)
        }
    }
}
