//! Ecosystems and per-request entitlement maps
//!
//! The set of ecosystems is closed. Each variant owns a fixed membership
//! table and a fixed count query, so no caller-influenced string is ever
//! spliced into SQL.

use serde::{Deserialize, Serialize};

/// One of the seven sub-systems an account may be enrolled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Stars,
    Diamonds,
    Gifts,
    Marketplace,
    Charity,
    Leaderboard,
    Tasksboard,
}

impl Ecosystem {
    /// Every ecosystem, in a stable order
    pub const ALL: [Ecosystem; 7] = [
        Self::Stars,
        Self::Diamonds,
        Self::Gifts,
        Self::Marketplace,
        Self::Charity,
        Self::Leaderboard,
        Self::Tasksboard,
    ];

    /// Lowercase name used in JSON and route paths
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stars => "stars",
            Self::Diamonds => "diamonds",
            Self::Gifts => "gifts",
            Self::Marketplace => "marketplace",
            Self::Charity => "charity",
            Self::Leaderboard => "leaderboard",
            Self::Tasksboard => "tasksboard",
        }
    }

    /// Membership table holding one row per enrolled account
    pub fn table(&self) -> &'static str {
        match self {
            Self::Stars => "stars_ecosystems",
            Self::Diamonds => "diamonds_ecosystems",
            Self::Gifts => "gifts_ecosystems",
            Self::Marketplace => "marketplace_ecosystems",
            Self::Charity => "charity_ecosystems",
            Self::Leaderboard => "leaderboard_ecosystems",
            Self::Tasksboard => "tasksboard_ecosystems",
        }
    }

    /// Membership count query for this ecosystem, bound with the account id
    pub fn count_query(&self) -> &'static str {
        match self {
            Self::Stars => "SELECT COUNT(*) FROM stars_ecosystems WHERE user_id = $1",
            Self::Diamonds => "SELECT COUNT(*) FROM diamonds_ecosystems WHERE user_id = $1",
            Self::Gifts => "SELECT COUNT(*) FROM gifts_ecosystems WHERE user_id = $1",
            Self::Marketplace => "SELECT COUNT(*) FROM marketplace_ecosystems WHERE user_id = $1",
            Self::Charity => "SELECT COUNT(*) FROM charity_ecosystems WHERE user_id = $1",
            Self::Leaderboard => "SELECT COUNT(*) FROM leaderboard_ecosystems WHERE user_id = $1",
            Self::Tasksboard => "SELECT COUNT(*) FROM tasksboard_ecosystems WHERE user_id = $1",
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entitlement flags for a single account, computed fresh per request
///
/// `Default` is "no access anywhere", which is also what every failed
/// lookup degrades to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcosystemAccess {
    pub stars: bool,
    pub diamonds: bool,
    pub gifts: bool,
    pub marketplace: bool,
    pub charity: bool,
    pub leaderboard: bool,
    pub tasksboard: bool,
}

impl EcosystemAccess {
    /// Access map with every flag false
    pub fn denied() -> Self {
        Self::default()
    }

    /// Whether the account is enrolled in `ecosystem`
    pub fn has(&self, ecosystem: Ecosystem) -> bool {
        match ecosystem {
            Ecosystem::Stars => self.stars,
            Ecosystem::Diamonds => self.diamonds,
            Ecosystem::Gifts => self.gifts,
            Ecosystem::Marketplace => self.marketplace,
            Ecosystem::Charity => self.charity,
            Ecosystem::Leaderboard => self.leaderboard,
            Ecosystem::Tasksboard => self.tasksboard,
        }
    }

    /// Set the flag for one ecosystem, leaving the others untouched
    pub fn set(&mut self, ecosystem: Ecosystem, granted: bool) {
        let flag = match ecosystem {
            Ecosystem::Stars => &mut self.stars,
            Ecosystem::Diamonds => &mut self.diamonds,
            Ecosystem::Gifts => &mut self.gifts,
            Ecosystem::Marketplace => &mut self.marketplace,
            Ecosystem::Charity => &mut self.charity,
            Ecosystem::Leaderboard => &mut self.leaderboard,
            Ecosystem::Tasksboard => &mut self.tasksboard,
        };
        *flag = granted;
    }

    /// Ecosystems the account is enrolled in
    pub fn granted(&self) -> Vec<Ecosystem> {
        Ecosystem::ALL
            .into_iter()
            .filter(|ecosystem| self.has(*ecosystem))
            .collect()
    }
}
