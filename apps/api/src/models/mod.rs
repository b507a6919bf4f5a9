//! Database models and types for the Journey API
//!
//! This module contains the types the access-control layer reads from the
//! datastore or derives per request:
//! - Accounts and bearer-token claims
//! - Ecosystems and per-request entitlement maps
//! - Admin principals and the access-level hierarchy

pub mod account;
pub mod admin;
pub mod ecosystem;

pub use account::{Account, Claims};
pub use admin::{AccessLevel, AdminPrincipal, AdminRecord};
pub use ecosystem::{Ecosystem, EcosystemAccess};
