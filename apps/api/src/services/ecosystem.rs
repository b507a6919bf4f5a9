//! Ecosystem entitlement resolution
//!
//! Computes an [`EcosystemAccess`] map for one account by counting its
//! membership rows in each ecosystem table. Lookups run concurrently and
//! fail independently: an ecosystem whose query errors is reported as not
//! granted, and the other flags are unaffected. A failed lookup never grants.

use std::sync::Arc;

use futures_util::future::join_all;

use crate::models::{Ecosystem, EcosystemAccess};
use crate::repositories::MembershipStore;

/// Resolves per-ecosystem entitlements for an account
#[derive(Clone)]
pub struct EcosystemResolver {
    memberships: Arc<dyn MembershipStore>,
}

impl EcosystemResolver {
    /// Create a resolver over the given membership store
    pub fn new(memberships: Arc<dyn MembershipStore>) -> Self {
        Self { memberships }
    }

    /// Resolve the access map for `account_id`
    pub async fn resolve(&self, account_id: &str) -> EcosystemAccess {
        let lookups = Ecosystem::ALL.into_iter().map(move |ecosystem| async move {
            let granted = match self.memberships.count_memberships(ecosystem, account_id).await {
                Ok(count) => count > 0,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        account_id = %account_id,
                        ecosystem = %ecosystem,
                        "Ecosystem membership lookup failed, denying access"
                    );
                    false
                }
            };
            (ecosystem, granted)
        });

        let mut access = EcosystemAccess::denied();
        for (ecosystem, granted) in join_all(lookups).await {
            access.set(ecosystem, granted);
        }

        tracing::debug!(
            account_id = %account_id,
            granted = ?access.granted(),
            "Resolved ecosystem access"
        );

        access
    }
}
