//! Account model and bearer-token claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account row from the accounts table
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Opaque account identifier (derived from the Telegram user id)
    pub id: String,

    /// Telegram username, if the user has one
    pub username: Option<String>,

    /// Contact email
    pub email: Option<String>,

    /// Inactive accounts are rejected at authentication
    pub is_active: bool,

    /// Refreshed after every successful authentication
    pub last_active_at: Option<DateTime<Utc>>,
}

/// JWT claims payload for account bearer tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: String,

    /// Issued at timestamp (Unix epoch)
    pub iat: i64,

    /// Expiration timestamp (Unix epoch)
    pub exp: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,
}

impl Claims {
    /// Build claims for `account_id` valid for `ttl_secs` from now
    pub fn new(
        account_id: impl Into<String>,
        ttl_secs: i64,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: account_id.into(),
            iat: now,
            exp: now + ttl_secs,
            iss: issuer.into(),
            aud: audience.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_expiry_window() {
        let claims = Claims::new("u1", 900, "journey", "journey-miniapp");
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_account_serializes_camel_case() {
        let account = Account {
            id: "u1".to_string(),
            username: Some("bob".to_string()),
            email: None,
            is_active: true,
            last_active_at: None,
        };
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["isActive"], true);
        assert!(json.get("lastActiveAt").is_some());
    }
}
