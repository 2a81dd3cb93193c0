//! State owned by one initialized platform.

use std::sync::Arc;

use dashmap::DashMap;
use eos_sdk::{EpicAccountId, Platform, ProductUserId};

use crate::bridge::{Completion, SyncBridge};
use crate::credentials::LaunchArgs;
use crate::error::{Error, Result};
use crate::identity::LocalIdentity;
use crate::types::LocalUser;

/// Everything that lives between initialize and deinitialize.
///
/// SDK callbacks hold a `Weak` reference to it, so a callback arriving after
/// teardown finds nothing to update.
pub struct PlatformContext {
    platform: Arc<dyn Platform>,
    bridge: SyncBridge,
    identities: DashMap<LocalUser, LocalIdentity>,
    launch_args: LaunchArgs,
    storage_enabled: bool,
}

impl PlatformContext {
    pub fn new(
        platform: Arc<dyn Platform>,
        bridge: SyncBridge,
        launch_args: LaunchArgs,
        storage_enabled: bool,
    ) -> Self {
        Self {
            platform,
            bridge,
            identities: DashMap::new(),
            launch_args,
            storage_enabled,
        }
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    pub fn launch_args(&self) -> &LaunchArgs {
        &self.launch_args
    }

    pub fn storage_enabled(&self) -> bool {
        self.storage_enabled
    }

    /// Issue an SDK call and block until its callback fires.
    pub fn call<T, F>(&self, label: &'static str, dispatch: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Platform, Completion<T>),
    {
        let platform = self.platform.as_ref();
        Ok(self
            .bridge
            .call(label, &self.platform, |done| dispatch(platform, done))?)
    }

    /// Snapshot of a user's identity.
    pub fn identity(&self, user: LocalUser) -> LocalIdentity {
        self.identities
            .get(&user)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Mutate a user's identity in place, creating it if needed.
    pub fn update_identity<R>(&self, user: LocalUser, f: impl FnOnce(&mut LocalIdentity) -> R) -> R {
        let mut entry = self.identities.entry(user).or_default();
        f(entry.value_mut())
    }

    pub fn remove_identity(&self, user: LocalUser) -> Option<LocalIdentity> {
        self.identities.remove(&user).map(|(_, identity)| identity)
    }

    /// Identities of every known user.
    pub fn identities(&self) -> Vec<(LocalUser, LocalIdentity)> {
        self.identities
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Account identity of `user`, required by account-level queries.
    pub fn account_id(&self, user: LocalUser) -> Result<EpicAccountId> {
        self.identity(user)
            .account_id
            .ok_or_else(|| Error::no_account(user))
    }

    /// Service identity of `user`, required by game-service queries.
    pub fn product_user_id(&self, user: LocalUser) -> Result<ProductUserId> {
        let identity = self.identity(user);
        match identity.product_user_id {
            Some(id) if identity.is_linked() => Ok(id),
            _ => Err(Error::no_service_identity(user)),
        }
    }
}
