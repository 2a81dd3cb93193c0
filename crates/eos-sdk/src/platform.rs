//! Process-level SDK entry point and platform instances.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::achievements::AchievementsInterface;
use crate::auth::AuthInterface;
use crate::connect::ConnectInterface;
use crate::friends::FriendsInterface;
use crate::logging::{LogCallback, LogCategory, LogLevel};
use crate::presence::PresenceInterface;
use crate::result::EosResult;
use crate::stats::StatsInterface;
use crate::storage::PlayerDataStorageInterface;
use crate::user_info::UserInfoInterface;

/// Options for [`Sdk::initialize`].
#[derive(Debug, Clone, Default)]
pub struct InitializeOptions {
    pub product_name: String,
    pub product_version: String,
}

/// Client credentials registered for the product.
#[derive(Clone, Default)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Platform creation flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformFlags {
    pub loading_in_editor: bool,
    pub disable_overlay: bool,
    pub disable_social_overlay: bool,
}

/// Options for [`Sdk::create_platform`].
#[derive(Debug, Clone, Default)]
pub struct PlatformOptions {
    pub product_id: String,
    pub sandbox_id: String,
    pub deployment_id: String,
    pub client_credentials: ClientCredentials,
    pub is_server: bool,
    /// 64 hex digits; required by player data storage.
    pub encryption_key: Option<String>,
    pub override_country_code: Option<String>,
    pub override_locale_code: Option<String>,
    pub flags: PlatformFlags,
    /// Directory the runtime may use for on-disk caches.
    pub cache_directory: PathBuf,
    /// Milliseconds of work allowed per tick; 0 means unbounded.
    pub tick_budget_ms: u32,
}

/// Application focus state reported to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    BackgroundConstrained,
    BackgroundUnconstrained,
    BackgroundSuspended,
    Foreground,
}

/// Network availability reported to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkStatus {
    Disabled,
    Offline,
    Online,
}

/// One platform instance.
///
/// Service interfaces are borrowed from the platform and are only usable
/// until [`Platform::release`] is called; afterwards every remote call is
/// dropped without its callback being invoked.
pub trait Platform: Send + Sync {
    /// Run due work and deliver completed callbacks on the calling thread.
    fn tick(&self);

    fn application_status(&self) -> ApplicationStatus;

    fn set_application_status(&self, status: ApplicationStatus) -> EosResult;

    fn network_status(&self) -> NetworkStatus;

    fn set_network_status(&self, status: NetworkStatus) -> EosResult;

    /// Release the platform. Idempotent.
    fn release(&self);

    fn is_released(&self) -> bool;

    fn auth(&self) -> &dyn AuthInterface;

    fn connect(&self) -> &dyn ConnectInterface;

    fn friends(&self) -> &dyn FriendsInterface;

    fn user_info(&self) -> &dyn UserInfoInterface;

    fn presence(&self) -> &dyn PresenceInterface;

    fn achievements(&self) -> &dyn AchievementsInterface;

    fn stats(&self) -> &dyn StatsInterface;

    fn player_data_storage(&self) -> &dyn PlayerDataStorageInterface;
}

/// Process-level SDK entry point.
pub trait Sdk: Send + Sync {
    fn initialize(&self, options: &InitializeOptions) -> EosResult;

    fn shutdown(&self) -> EosResult;

    /// Create a platform instance; `None` if the options are rejected.
    fn create_platform(&self, options: &PlatformOptions) -> Option<Arc<dyn Platform>>;

    fn set_log_callback(&self, callback: LogCallback) -> EosResult;

    fn set_log_level(&self, category: LogCategory, level: LogLevel) -> EosResult;
}
