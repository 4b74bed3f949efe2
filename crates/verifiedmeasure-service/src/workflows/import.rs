//! Bulk lead import.

use serde_json::json;

use verifiedmeasure_core::{normalize_rows, AuditAction, CoreError, NewAuditEntry, NewLead, RawLeadRow};
use verifiedmeasure_store::{Session, Store};

use crate::config::AuditMode;
use crate::error::ApiError;
use crate::workflows::audit;

/// Normalize raw rows and import the survivors.
///
/// # Errors
///
/// - `ApiError::Validation` if `rows` is empty or no row has a company.
/// - `ApiError::Upstream` if the insert fails.
pub async fn import_rows(
    store: &dyn Store,
    session: &Session,
    rows: &[RawLeadRow],
    audit_mode: AuditMode,
) -> Result<usize, ApiError> {
    let leads = normalize_rows(rows)?;
    tracing::debug!(
        submitted = %rows.len(),
        valid = %leads.len(),
        "Import rows normalized"
    );
    import_leads(store, session, &leads, audit_mode).await
}

/// Insert already-normalized leads in one batch and audit the import.
///
/// Returns the number of rows the store reports inserted.
///
/// # Errors
///
/// - `ApiError::Validation` if `leads` is empty.
/// - `ApiError::Upstream` if the insert fails.
pub async fn import_leads(
    store: &dyn Store,
    session: &Session,
    leads: &[NewLead],
    audit_mode: AuditMode,
) -> Result<usize, ApiError> {
    if leads.is_empty() {
        return Err(CoreError::NoValidRows.into());
    }

    let imported = store.insert_leads(session, leads).await?;

    tracing::info!(
        admin_id = %session.user_id,
        imported = %imported,
        "Leads imported"
    );

    let entry = NewAuditEntry::new(
        session.user_id,
        AuditAction::ImportLeads,
        json!({ "imported": imported }),
    );
    audit::record(store, session, &entry, audit_mode).await?;

    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verifiedmeasure_core::UserId;
    use verifiedmeasure_store::{MemoryStore, Table};

    fn session() -> Session {
        Session {
            user_id: UserId::generate(),
            email: None,
            access_token: "admin".into(),
        }
    }

    fn row(company: serde_json::Value) -> RawLeadRow {
        serde_json::from_value(json!({ "company": company, "email": " a@b.co " })).unwrap()
    }

    #[tokio::test]
    async fn blank_company_rows_are_dropped() {
        let store = MemoryStore::new();
        let rows = [row(json!("Acme")), row(json!("   ")), row(json!("Globex"))];

        let imported = import_rows(&store, &session(), &rows, AuditMode::Strict)
            .await
            .unwrap();

        assert_eq!(imported, 2);
        assert_eq!(store.lead_count().await, 2);

        let audit = store.audit_entries().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, AuditAction::ImportLeads);
        assert_eq!(audit[0].entity, "leads");
        assert_eq!(audit[0].meta, json!({ "imported": 2 }));
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let store = MemoryStore::new();
        let err = import_rows(&store, &session(), &[], AuditMode::Strict)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m == "rows required"));
    }

    #[tokio::test]
    async fn all_invalid_is_rejected_without_writes() {
        let store = MemoryStore::new();
        let rows = [row(json!(null)), row(json!(["x"]))];

        let err = import_rows(&store, &session(), &rows, AuditMode::Strict)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation(ref m) if m == "no valid rows"));
        assert_eq!(store.lead_count().await, 0);
        assert!(store.audit_entries().await.is_empty());
    }

    #[tokio::test]
    async fn insert_failure_passes_message_through() {
        let store = MemoryStore::new();
        store.fail_writes(Table::Leads, "new row violates row-level security policy").await;

        let err = import_rows(&store, &session(), &[row(json!("Acme"))], AuditMode::Strict)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Upstream(ref m) if m == "new row violates row-level security policy"));
    }
}
