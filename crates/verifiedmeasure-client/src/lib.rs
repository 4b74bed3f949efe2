//! VerifiedMeasure Client SDK.
//!
//! This crate provides a client library for dashboards and scripts that talk
//! to the VerifiedMeasure API on behalf of one user.
//!
//! # Example
//!
//! ```no_run
//! use verifiedmeasure_client::VerifiedMeasureClient;
//! use verifiedmeasure_core::{AccessType, LeadId};
//!
//! # async fn example() -> Result<(), verifiedmeasure_client::ClientError> {
//! let client = VerifiedMeasureClient::new("http://verifiedmeasure:8080", "user-access-token")?;
//!
//! // Browse the pool, then claim the first lead not yet held
//! let page = client.list_leads(Some("logistics")).await?;
//! let wanted: Vec<LeadId> = page
//!     .leads
//!     .iter()
//!     .filter(|lead| !lead.entitled)
//!     .take(1)
//!     .map(|lead| lead.id)
//!     .collect();
//!
//! let claim = client.claim(&wanted, AccessType::Download).await?;
//! println!("Charged {} credits, {} left", claim.cost, claim.new_balance);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, VerifiedMeasureClient};
pub use error::ClientError;
pub use types::*;
