//! Services used by the access-control middleware
//!
//! - Bearer token issuing and verification
//! - Ecosystem entitlement resolution
//! - Health checks for the datastore and Redis

pub mod ecosystem;
pub mod health;
pub mod token;

pub use ecosystem::EcosystemResolver;
pub use health::HealthService;
pub use token::{TokenConfig, TokenService};
