//! In-memory implementations of the datastore traits
//!
//! Each store records the side-effect writes it receives and can be told to
//! fail, so tests can observe best-effort updates and fail-closed behavior
//! without a database.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use journey_api::models::{Account, AdminRecord, Ecosystem};
use journey_api::repositories::{AccountStore, AdminStore, MembershipStore};

#[derive(Default)]
pub struct InMemoryAccounts {
    accounts: Mutex<HashMap<String, Account>>,
    touched: Mutex<Vec<String>>,
    fail_lookups: Mutex<bool>,
    fail_touches: Mutex<bool>,
}

impl InMemoryAccounts {
    pub fn insert(&self, account: Account) {
        self.accounts
            .lock()
            .unwrap()
            .insert(account.id.clone(), account);
    }

    pub fn touched(&self) -> Vec<String> {
        self.touched.lock().unwrap().clone()
    }

    pub fn fail_lookups(&self) {
        *self.fail_lookups.lock().unwrap() = true;
    }

    pub fn fail_touches(&self) {
        *self.fail_touches.lock().unwrap() = true;
    }
}

#[async_trait]
impl AccountStore for InMemoryAccounts {
    async fn find_by_id(&self, account_id: &str) -> Result<Option<Account>, sqlx::Error> {
        if *self.fail_lookups.lock().unwrap() {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.accounts.lock().unwrap().get(account_id).cloned())
    }

    async fn touch_last_active(&self, account_id: &str) -> Result<(), sqlx::Error> {
        if *self.fail_touches.lock().unwrap() {
            return Err(sqlx::Error::PoolClosed);
        }
        self.touched.lock().unwrap().push(account_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMemberships {
    rows: Mutex<HashMap<(Ecosystem, String), i64>>,
    failing: Mutex<HashSet<Ecosystem>>,
}

impl InMemoryMemberships {
    pub fn enroll(&self, account_id: &str, ecosystem: Ecosystem) {
        *self
            .rows
            .lock()
            .unwrap()
            .entry((ecosystem, account_id.to_string()))
            .or_insert(0) += 1;
    }

    pub fn fail(&self, ecosystem: Ecosystem) {
        self.failing.lock().unwrap().insert(ecosystem);
    }
}

#[async_trait]
impl MembershipStore for InMemoryMemberships {
    async fn count_memberships(
        &self,
        ecosystem: Ecosystem,
        account_id: &str,
    ) -> Result<i64, sqlx::Error> {
        if self.failing.lock().unwrap().contains(&ecosystem) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&(ecosystem, account_id.to_string()))
            .copied()
            .unwrap_or(0))
    }
}

#[derive(Default)]
pub struct InMemoryAdmins {
    admins: Mutex<HashMap<String, AdminRecord>>,
    logins: Mutex<Vec<String>>,
    fail_lookups: Mutex<bool>,
}

impl InMemoryAdmins {
    pub fn insert(&self, id: &str, access_level: &str, permissions: Value) {
        self.admins.lock().unwrap().insert(
            id.to_string(),
            AdminRecord {
                id: id.to_string(),
                access_level: access_level.to_string(),
                permissions,
            },
        );
    }

    pub fn logins(&self) -> Vec<String> {
        self.logins.lock().unwrap().clone()
    }

    pub fn fail_lookups(&self) {
        *self.fail_lookups.lock().unwrap() = true;
    }
}

#[async_trait]
impl AdminStore for InMemoryAdmins {
    async fn find_by_id(&self, admin_id: &str) -> Result<Option<AdminRecord>, sqlx::Error> {
        if *self.fail_lookups.lock().unwrap() {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.admins.lock().unwrap().get(admin_id).cloned())
    }

    async fn touch_last_login(&self, admin_id: &str) -> Result<(), sqlx::Error> {
        self.logins.lock().unwrap().push(admin_id.to_string());
        Ok(())
    }
}
