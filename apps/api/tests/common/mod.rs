//! Common test utilities for API integration tests
//!
//! In-memory datastore implementations and a router fixture so the
//! middleware can be exercised end to end without PostgreSQL or Redis.

#![allow(unused_imports)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
