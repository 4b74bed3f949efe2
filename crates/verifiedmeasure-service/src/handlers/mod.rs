//! API handlers.

pub mod account;
pub mod admin;
pub mod claim;
pub mod health;
pub mod leads;
pub mod signup;
