//! Core types and utilities for VerifiedMeasure.
//!
//! This crate provides the domain types shared by the store, the HTTP service
//! and the client SDK:
//!
//! - **Identifiers**: `UserId`, `LeadId`, `LedgerEntryId`, `AuditEntryId`
//! - **Leads**: `Lead`, `NewLead`, `RawLeadRow` and import-row normalization
//! - **Entitlements**: `LeadAccess`, `AccessType`
//! - **Ledger**: `CreditLedgerEntry`, `NewLedgerEntry`, `LedgerReason`
//! - **Audit**: `AuditLogEntry`, `NewAuditEntry`, `AuditAction`
//! - **Helpers**: CSV parsing, field masking, work-email check
//!
//! # Credits
//!
//! **1 credit = 1 net-new lead.** Balances are never stored; they are the sum
//! of a user's ledger deltas.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod access;
pub mod audit;
pub mod csv;
pub mod email;
pub mod error;
pub mod ids;
pub mod lead;
pub mod ledger;
pub mod mask;

pub use access::{AccessType, LeadAccess};
pub use audit::{AuditAction, AuditLogEntry, NewAuditEntry};
pub use email::is_work_email;
pub use error::{CoreError, Result};
pub use ids::{is_lead_id_shape, AuditEntryId, IdError, LeadId, LedgerEntryId, UserId};
pub use lead::{normalize_rows, Lead, NewLead, RawLeadRow};
pub use ledger::{balance_of, CreditLedgerEntry, LedgerReason, NewLedgerEntry};
pub use mask::LeadView;
