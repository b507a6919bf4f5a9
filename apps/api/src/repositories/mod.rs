//! Database repository layer for the Journey API
//!
//! Each datastore concern is a trait with a PostgreSQL implementation. The
//! middleware holds `Arc<dyn ...>` handles so the same code runs against
//! PostgreSQL in production and in-memory stores in tests.
//!
//! Every query here is a fixed string with bound parameters; caller input is
//! never concatenated into SQL.

pub mod account;
pub mod admin;
pub mod membership;

pub use account::{AccountStore, PgAccountRepository};
pub use admin::{AdminStore, PgAdminRepository};
pub use membership::{MembershipStore, PgMembershipRepository};
