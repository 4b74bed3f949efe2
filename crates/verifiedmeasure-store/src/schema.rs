//! Names of the tables and stored procedures in the external data service.

use std::fmt;

/// Tables exposed by the data service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// The shared lead pool.
    Leads,
    /// Entitlement rows, unique per `(user_id, lead_id)`.
    LeadAccess,
    /// Append-only credit ledger.
    CreditLedger,
    /// Append-only audit log.
    AuditLog,
}

impl Table {
    /// Table name as addressed on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Leads => "leads",
            Self::LeadAccess => "lead_access",
            Self::CreditLedger => "credit_ledger",
            Self::AuditLog => "audit_log",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stored procedures called through the RPC endpoint.
pub mod rpc {
    /// Session-scoped admin predicate. Takes no arguments.
    pub const IS_ADMIN: &str = "is_admin";

    /// Ledger aggregation. Takes `in_user_id`.
    pub const GET_USER_BALANCE: &str = "get_user_balance";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_match_the_data_service() {
        let names: Vec<_> = [
            Table::Leads,
            Table::LeadAccess,
            Table::CreditLedger,
            Table::AuditLog,
        ]
        .iter()
        .map(Table::name)
        .collect();
        assert_eq!(names, ["leads", "lead_access", "credit_ledger", "audit_log"]);
    }
}
