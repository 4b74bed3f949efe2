//! Audit writes that follow a successful mutation.

use verifiedmeasure_core::NewAuditEntry;
use verifiedmeasure_store::{Session, Store};

use crate::config::AuditMode;
use crate::error::ApiError;

/// Append one audit row, applying the configured failure policy.
///
/// The primary mutation has already been committed when this runs, so a
/// failure here can only be reported, never rolled back.
pub async fn record(
    store: &dyn Store,
    session: &Session,
    entry: &NewAuditEntry,
    mode: AuditMode,
) -> Result<(), ApiError> {
    match store.insert_audit_entry(session, entry).await {
        Ok(()) => Ok(()),
        Err(e) => match mode {
            AuditMode::BestEffort => {
                tracing::warn!(
                    error = %e,
                    actor_id = %entry.actor_id,
                    action = ?entry.action,
                    meta = %entry.meta,
                    "Audit write failed after mutation; continuing"
                );
                Ok(())
            }
            AuditMode::Strict => Err(e.into()),
        },
    }
}
