//! Multi-step workflows composed from single store calls.
//!
//! Handlers parse and authorize; everything that reads or writes more than
//! once lives here so it can be tested directly against `MemoryStore`.

pub mod audit;
pub mod claim;
pub mod grant;
pub mod import;
mod locks;

pub use claim::{claim, clean_lead_ids, ClaimOutcome};
pub use grant::{grant_credit, whole_credits};
pub use import::{import_leads, import_rows};
pub use locks::ClaimLocks;
