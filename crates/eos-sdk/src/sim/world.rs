//! Backend state of the simulated runtime.
//!
//! A [`SimWorld`] is what the remote services know: accounts and their
//! social graph, launcher codes, the local keychain, game-service users,
//! achievements, stats and stored files. It outlives platform instances,
//! like the real backend and keychain do.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::achievements::{Definition, PlayerAchievement, StatThreshold};
use crate::ids::{EpicAccountId, ProductUserId};
use crate::presence::PresenceStatus;
use crate::result::EosResult;

use super::SimOp;

/// A remote account.
#[derive(Debug, Clone)]
pub struct SimAccount {
    pub id: EpicAccountId,
    pub display_name: String,
    pub country: Option<String>,
    pub presence: Option<PresenceStatus>,
    pub friends: Vec<EpicAccountId>,
}

impl SimAccount {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            id: EpicAccountId::generate(),
            display_name: display_name.into(),
            country: None,
            presence: None,
            friends: Vec::new(),
        }
    }

    pub fn with_presence(mut self, status: PresenceStatus) -> Self {
        self.presence = Some(status);
        self
    }

    pub fn with_friend(mut self, friend: &EpicAccountId) -> Self {
        self.friends.push(friend.clone());
        self
    }
}

/// Persistent credential stored in the local keychain.
#[derive(Debug, Clone)]
pub struct KeychainEntry {
    pub refresh_token: String,
    pub account_id: EpicAccountId,
    /// Revoked server-side; logins with it are rejected.
    pub stale: bool,
}

/// A player's stored progress on one achievement.
#[derive(Debug, Clone)]
pub struct SimProgress {
    pub achievement_id: String,
    pub progress: f64,
    pub unlock_time: Option<DateTime<Utc>>,
}

/// Build an achievement definition with generated texts.
pub fn definition(id: &str, display_name: &str, is_hidden: bool) -> Definition {
    Definition {
        achievement_id: id.to_string(),
        unlocked_display_name: display_name.to_string(),
        unlocked_description: format!("{} unlocked", display_name),
        locked_display_name: format!("{} (locked)", display_name),
        locked_description: format!("Unlock {}", display_name),
        flavor_text: String::new(),
        is_hidden,
        stat_thresholds: vec![StatThreshold {
            name: id.to_string(),
            threshold: 100,
        }],
    }
}

#[derive(Debug, Default)]
pub struct SimWorld {
    pub(crate) accounts: HashMap<EpicAccountId, SimAccount>,
    pub(crate) exchange_codes: HashMap<String, EpicAccountId>,
    pub(crate) developer_credentials: HashMap<String, EpicAccountId>,
    pub(crate) keychain: Option<KeychainEntry>,
    pub(crate) portal_account: Option<EpicAccountId>,
    pub(crate) product_users: HashMap<EpicAccountId, ProductUserId>,
    pub(crate) definitions: Vec<Definition>,
    pub(crate) progress: HashMap<EpicAccountId, Vec<SimProgress>>,
    pub(crate) stats: HashMap<ProductUserId, BTreeMap<String, i32>>,
    pub(crate) files: HashMap<ProductUserId, HashMap<String, Vec<u8>>>,
    pub(crate) failures: HashMap<SimOp, EosResult>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, account: SimAccount) -> Self {
        self.accounts.insert(account.id.clone(), account);
        self
    }

    /// Register a one-time launcher exchange code for `account`.
    pub fn with_exchange_code(mut self, code: impl Into<String>, account: &EpicAccountId) -> Self {
        self.exchange_codes.insert(code.into(), account.clone());
        self
    }

    /// Register a developer-tool credential name for `account`.
    pub fn with_developer_credential(
        mut self,
        name: impl Into<String>,
        account: &EpicAccountId,
    ) -> Self {
        self.developer_credentials.insert(name.into(), account.clone());
        self
    }

    /// Seed the keychain with a persistent credential for `account`.
    pub fn with_keychain(mut self, account: &EpicAccountId, stale: bool) -> Self {
        self.keychain = Some(KeychainEntry {
            refresh_token: uuid::Uuid::new_v4().simple().to_string(),
            account_id: account.clone(),
            stale,
        });
        self
    }

    /// The account a user would sign into through the interactive portal.
    pub fn with_portal_account(mut self, account: &EpicAccountId) -> Self {
        self.portal_account = Some(account.clone());
        self
    }

    /// Pre-existing game-service user for `account`.
    pub fn with_product_user(mut self, account: &EpicAccountId, user: ProductUserId) -> Self {
        self.product_users.insert(account.clone(), user);
        self
    }

    pub fn with_definition(mut self, definition: Definition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn with_progress(
        mut self,
        account: &EpicAccountId,
        achievement_id: &str,
        progress: f64,
    ) -> Self {
        let unlock_time = (progress >= 1.0).then(Utc::now);
        self.progress
            .entry(account.clone())
            .or_default()
            .push(SimProgress {
                achievement_id: achievement_id.to_string(),
                progress,
                unlock_time,
            });
        self
    }

    pub fn with_stat(mut self, user: &ProductUserId, name: &str, value: i32) -> Self {
        self.stats
            .entry(user.clone())
            .or_default()
            .insert(name.to_string(), value);
        self
    }

    /// Make every call of `op` complete with `result`.
    pub fn with_failure(mut self, op: SimOp, result: EosResult) -> Self {
        self.failures.insert(op, result);
        self
    }

    pub fn account(&self, id: &EpicAccountId) -> Option<&SimAccount> {
        self.accounts.get(id)
    }

    pub fn keychain(&self) -> Option<&KeychainEntry> {
        self.keychain.as_ref()
    }

    pub fn product_user(&self, account: &EpicAccountId) -> Option<&ProductUserId> {
        self.product_users.get(account)
    }

    pub fn file(&self, user: &ProductUserId, name: &str) -> Option<&[u8]> {
        self.files
            .get(user)
            .and_then(|files| files.get(name))
            .map(Vec::as_slice)
    }

    pub fn stat(&self, user: &ProductUserId, name: &str) -> Option<i32> {
        self.stats.get(user).and_then(|s| s.get(name)).copied()
    }

    pub fn progress_of(&self, account: &EpicAccountId, achievement_id: &str) -> Option<f64> {
        self.progress
            .get(account)?
            .iter()
            .find(|p| p.achievement_id == achievement_id)
            .map(|p| p.progress)
    }

    /// Number of achievement records the service holds for `account`.
    pub fn player_achievement_count(&self, account: &EpicAccountId) -> usize {
        self.progress.get(account).map_or(0, Vec::len)
    }

    pub(crate) fn failure(&self, op: SimOp) -> Option<EosResult> {
        self.failures.get(&op).copied()
    }

    pub(crate) fn set_failure(&mut self, op: SimOp, result: Option<EosResult>) {
        match result {
            Some(result) => {
                self.failures.insert(op, result);
            }
            None => {
                self.failures.remove(&op);
            }
        }
    }

    pub(crate) fn account_for_product_user(&self, user: &ProductUserId) -> Option<&EpicAccountId> {
        self.product_users
            .iter()
            .find(|(_, pid)| *pid == user)
            .map(|(account, _)| account)
    }

    /// Player achievement records as the service reports them.
    pub(crate) fn player_achievements(&self, user: &ProductUserId) -> Vec<PlayerAchievement> {
        let Some(account) = self.account_for_product_user(user) else {
            return Vec::new();
        };
        let Some(progress) = self.progress.get(account) else {
            return Vec::new();
        };

        progress
            .iter()
            .map(|p| {
                let definition = self
                    .definitions
                    .iter()
                    .find(|d| d.achievement_id == p.achievement_id);
                let unlocked = p.progress >= 1.0;
                let (display_name, description) = match definition {
                    Some(d) if unlocked => {
                        (d.unlocked_display_name.clone(), d.unlocked_description.clone())
                    }
                    Some(d) => (d.locked_display_name.clone(), d.locked_description.clone()),
                    None => (p.achievement_id.clone(), String::new()),
                };
                PlayerAchievement {
                    achievement_id: p.achievement_id.clone(),
                    progress: p.progress,
                    unlock_time: p.unlock_time,
                    display_name,
                    description,
                    stat_info: Vec::new(),
                }
            })
            .collect()
    }

    /// Mark achievements unlocked for the account behind `user`.
    pub(crate) fn unlock(&mut self, user: &ProductUserId, ids: &[String]) -> EosResult {
        if ids
            .iter()
            .any(|id| !self.definitions.iter().any(|d| &d.achievement_id == id))
        {
            return EosResult::InvalidParameters;
        }
        let Some(account) = self.account_for_product_user(user).cloned() else {
            return EosResult::InvalidUser;
        };

        let now = Utc::now();
        let entries = self.progress.entry(account).or_default();
        for id in ids {
            match entries.iter_mut().find(|p| &p.achievement_id == id) {
                Some(entry) => {
                    if entry.unlock_time.is_none() {
                        entry.unlock_time = Some(now);
                    }
                    entry.progress = 1.0;
                }
                None => entries.push(SimProgress {
                    achievement_id: id.clone(),
                    progress: 1.0,
                    unlock_time: Some(now),
                }),
            }
        }
        EosResult::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_achievements_use_definition_texts() {
        let account = SimAccount::new("alice");
        let pid = ProductUserId::generate();
        let world = SimWorld::new()
            .with_product_user(&account.id, pid.clone())
            .with_definition(definition("ach_a", "First Steps", false))
            .with_progress(&account.id, "ach_a", 0.25)
            .with_account(account);

        let records = world.player_achievements(&pid);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].display_name, "First Steps (locked)");
        assert!(records[0].unlock_time.is_none());
    }

    #[test]
    fn test_unlock_rejects_unknown_ids() {
        let account = SimAccount::new("alice");
        let pid = ProductUserId::generate();
        let mut world = SimWorld::new()
            .with_product_user(&account.id, pid.clone())
            .with_definition(definition("ach_a", "First Steps", false));

        assert_eq!(
            world.unlock(&pid, &["nope".to_string()]),
            EosResult::InvalidParameters
        );
        assert_eq!(world.unlock(&pid, &["ach_a".to_string()]), EosResult::Success);
        assert_eq!(world.progress_of(&account.id, "ach_a"), Some(1.0));
    }
}
