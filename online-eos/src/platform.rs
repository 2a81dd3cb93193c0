//! Host-facing facade.
//!
//! [`OnlinePlatform`] is the fixed plugin surface the host engine calls.
//! Nothing structured crosses it: every failure is logged here and reported
//! as `false`, `None` or an empty value.

use std::sync::Arc;

use eos_sdk::{
    ClientCredentials, EosResult, InitializeOptions, LogCategory, LogLevel, PlatformFlags,
    PlatformOptions, Sdk,
};
use tracing::{debug, error, info, instrument, warn};

use crate::achievements;
use crate::bridge::SyncBridge;
use crate::config::{EosSettings, HostEnvironment, RuntimeOptions};
use crate::context::PlatformContext;
use crate::credentials::LaunchArgs;
use crate::error::{Error, Result};
use crate::identity::{self, IdentityState};
use crate::lifecycle::{self, FrameSignals};
use crate::logging::{LoggingConfig, SDK_LOG_TARGET, route_sdk_message, severity_of};
use crate::social;
use crate::stats;
use crate::storage;
use crate::types::{LocalUser, OnlineAchievement, OnlineUser};

/// SDK log level installed at initialization.
pub const DEFAULT_SDK_LOG_LEVEL: LogLevel = LogLevel::Warning;

/// Plugin interface consumed by the host engine.
pub trait OnlinePlatform {
    /// Bring the SDK up. `false` leaves the platform unusable; every later
    /// call is a no-op.
    fn initialize(&mut self) -> bool;

    /// Tear everything down. Safe to call repeatedly.
    fn deinitialize(&mut self);

    /// Start logging `user` in. `true` means the attempt was issued; the
    /// outcome arrives through later ticks.
    fn user_login(&self, user: LocalUser) -> bool;

    fn user_logout(&self, user: LocalUser) -> bool;

    fn get_user_logged_in(&self, user: LocalUser) -> bool;

    fn get_user(&self, user: LocalUser) -> Option<OnlineUser>;

    fn get_friends(&self, user: LocalUser) -> Option<Vec<OnlineUser>>;

    fn get_achievements(&self, user: LocalUser) -> Option<Vec<OnlineAchievement>>;

    /// Submit an unlock. Always `false`: the outcome is not known yet.
    fn unlock_achievement(&self, id: &str, user: LocalUser) -> bool;

    fn unlock_achievement_progress(&self, id: &str, progress: f32, user: LocalUser) -> bool;

    #[cfg(debug_assertions)]
    fn reset_achievements(&self, user: LocalUser) -> bool;

    fn get_stat(&self, name: &str, user: LocalUser) -> Option<f32>;

    fn set_stat(&self, name: &str, value: f32, user: LocalUser) -> bool;

    fn get_save_game(&self, name: &str, user: LocalUser) -> Option<Vec<u8>>;

    fn set_save_game(&self, name: &str, data: &[u8], user: LocalUser) -> bool;

    fn set_log_level(&self, category: LogCategory, level: LogLevel) -> bool;
}

/// [`OnlinePlatform`] backed by an [`Sdk`].
pub struct OnlinePlatformEos {
    settings: EosSettings,
    runtime: RuntimeOptions,
    host: HostEnvironment,
    sdk: Arc<dyn Sdk>,
    context: Option<Arc<PlatformContext>>,
    logging: Option<Arc<LoggingConfig>>,
}

impl OnlinePlatformEos {
    pub fn new(
        sdk: Arc<dyn Sdk>,
        settings: EosSettings,
        runtime: RuntimeOptions,
        host: HostEnvironment,
    ) -> Self {
        Self {
            settings,
            runtime,
            host,
            sdk,
            context: None,
            logging: None,
        }
    }

    /// Attach the subscriber handle so SDK log level changes also open the
    /// `eos_sdk` filter.
    pub fn with_logging(mut self, logging: Arc<LoggingConfig>) -> Self {
        self.logging = Some(logging);
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.context.is_some()
    }

    pub fn context(&self) -> Option<&Arc<PlatformContext>> {
        self.context.as_ref()
    }

    /// Current login progress of `user`.
    pub fn identity_state(&self, user: LocalUser) -> IdentityState {
        self.context
            .as_ref()
            .map(|ctx| ctx.identity(user).state)
            .unwrap_or_default()
    }

    /// Per-frame pump. Does nothing before initialization or after teardown.
    pub fn on_update(&self, signals: FrameSignals) {
        if let Some(ctx) = &self.context {
            lifecycle::tick(ctx, signals);
        }
    }

    pub fn set_network_status(&self, online: bool) -> bool {
        match &self.context {
            Some(ctx) => lifecycle::set_network_status(ctx, online),
            None => false,
        }
    }

    fn session(&self) -> Result<&Arc<PlatformContext>> {
        self.context.as_ref().ok_or(Error::NotInitialized)
    }

    fn try_initialize(&mut self) -> Result<Arc<PlatformContext>> {
        self.settings.validate()?;

        let result = self.sdk.initialize(&InitializeOptions {
            product_name: self.settings.product_name.clone(),
            product_version: self.settings.product_version.clone(),
        });
        match result {
            EosResult::Success => {}
            EosResult::AlreadyConfigured => debug!("SDK already initialized"),
            other => return Err(Error::sdk("initialize", other)),
        }

        let result = self.sdk.set_log_callback(Arc::new(route_sdk_message));
        if !result.is_success() {
            warn!(result = %result, "Failed to install SDK log callback");
        }
        let result = self
            .sdk
            .set_log_level(LogCategory::AllCategories, DEFAULT_SDK_LOG_LEVEL);
        if !result.is_success() {
            warn!(result = %result, "Failed to set SDK log level");
        }

        let storage_key = match self.settings.storage_encryption_key() {
            Ok(key) => Some(key.to_string()),
            Err(e) => {
                warn!(error = %e, "Cloud saves disabled");
                None
            }
        };
        let storage_enabled = storage_key.is_some();

        let options = PlatformOptions {
            product_id: self.settings.product_id.clone(),
            sandbox_id: self.settings.sandbox_id.clone(),
            deployment_id: self.settings.deployment_id.clone(),
            client_credentials: ClientCredentials {
                client_id: self.settings.client_id.clone(),
                client_secret: self.settings.client_secret.clone(),
            },
            is_server: self.runtime.is_server || self.host.headless,
            encryption_key: storage_key,
            override_country_code: None,
            override_locale_code: None,
            flags: PlatformFlags {
                disable_overlay: self.runtime.disable_overlay,
                disable_social_overlay: self.runtime.disable_overlay,
                ..PlatformFlags::default()
            },
            cache_directory: self.host.temp_dir.clone(),
            tick_budget_ms: self.runtime.tick_budget_ms,
        };

        let Some(platform) = self.sdk.create_platform(&options) else {
            self.sdk.shutdown();
            return Err(Error::sdk("create_platform", EosResult::InvalidParameters));
        };

        let bridge = match SyncBridge::new(&self.runtime) {
            Ok(bridge) => bridge,
            Err(e) => {
                platform.release();
                self.sdk.shutdown();
                return Err(e.into());
            }
        };

        Ok(Arc::new(PlatformContext::new(
            platform,
            bridge,
            LaunchArgs::parse(self.host.launch_args.as_slice()),
            storage_enabled,
        )))
    }
}

/// Log a failed facade call. Precondition failures are routine.
fn report<T>(operation: &str, user: LocalUser, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_precondition() => {
            debug!(operation, %user, error = %e, "Call rejected");
            None
        }
        Err(e) => {
            error!(operation, %user, error = %e, "Call failed");
            None
        }
    }
}

impl OnlinePlatform for OnlinePlatformEos {
    #[instrument(skip(self))]
    fn initialize(&mut self) -> bool {
        if self.context.is_some() {
            return true;
        }
        match self.try_initialize() {
            Ok(ctx) => {
                info!(
                    product = %self.settings.product_name,
                    storage = ctx.storage_enabled(),
                    "Online platform initialized"
                );
                self.context = Some(ctx);
                true
            }
            Err(e) => {
                error!(error = %e, "Online platform initialization failed");
                false
            }
        }
    }

    #[instrument(skip(self))]
    fn deinitialize(&mut self) {
        let Some(ctx) = self.context.take() else {
            debug!("Online platform not initialized");
            return;
        };
        for (user, _) in ctx.identities() {
            identity::forget(&ctx, user);
        }
        ctx.platform().release();
        drop(ctx);

        let result = self.sdk.shutdown();
        if result.is_success() {
            info!("Online platform shut down");
        } else {
            warn!(result = %result, "SDK shutdown reported an error");
        }
    }

    fn user_login(&self, user: LocalUser) -> bool {
        let result = self
            .session()
            .and_then(|ctx| identity::begin_login(ctx, user));
        report("login", user, result).is_some()
    }

    fn user_logout(&self, user: LocalUser) -> bool {
        let result = self.session().and_then(|ctx| identity::logout(ctx, user));
        report("logout", user, result).is_some()
    }

    fn get_user_logged_in(&self, user: LocalUser) -> bool {
        self.context
            .as_ref()
            .is_some_and(|ctx| ctx.identity(user).account_id.is_some())
    }

    fn get_user(&self, user: LocalUser) -> Option<OnlineUser> {
        let result = self
            .session()
            .and_then(|ctx| social::fetch_profile(ctx, user));
        report("get_user", user, result)
    }

    fn get_friends(&self, user: LocalUser) -> Option<Vec<OnlineUser>> {
        let result = self
            .session()
            .and_then(|ctx| social::fetch_friends(ctx, user));
        report("get_friends", user, result)
    }

    fn get_achievements(&self, user: LocalUser) -> Option<Vec<OnlineAchievement>> {
        let result = self
            .session()
            .and_then(|ctx| achievements::fetch_achievements(ctx, user));
        report("get_achievements", user, result)
    }

    fn unlock_achievement(&self, id: &str, user: LocalUser) -> bool {
        let result = self
            .session()
            .and_then(|ctx| achievements::unlock(ctx, user, id));
        report("unlock_achievement", user, result);
        false
    }

    fn unlock_achievement_progress(&self, id: &str, progress: f32, user: LocalUser) -> bool {
        let result = self
            .session()
            .and_then(|ctx| achievements::unlock_progress(ctx, user, id, progress));
        report("unlock_achievement_progress", user, result);
        false
    }

    #[cfg(debug_assertions)]
    fn reset_achievements(&self, user: LocalUser) -> bool {
        warn!(%user, "Achievement reset is not available on the client");
        false
    }

    fn get_stat(&self, name: &str, user: LocalUser) -> Option<f32> {
        let result = self
            .session()
            .and_then(|ctx| stats::get_stat(ctx, user, name));
        report("get_stat", user, result)
    }

    fn set_stat(&self, name: &str, value: f32, user: LocalUser) -> bool {
        let result = self
            .session()
            .and_then(|ctx| stats::set_stat(ctx, user, name, value));
        report("set_stat", user, result).is_some()
    }

    fn get_save_game(&self, name: &str, user: LocalUser) -> Option<Vec<u8>> {
        let result = self
            .session()
            .and_then(|ctx| storage::get_save_game(ctx, user, name));
        report("get_save_game", user, result)
    }

    fn set_save_game(&self, name: &str, data: &[u8], user: LocalUser) -> bool {
        let result = self
            .session()
            .and_then(|ctx| storage::set_save_game(ctx, user, name, data));
        report("set_save_game", user, result).is_some()
    }

    #[instrument(skip(self))]
    fn set_log_level(&self, category: LogCategory, level: LogLevel) -> bool {
        let result = self.sdk.set_log_level(category, level);
        if !result.is_success() {
            warn!(result = %result, "Failed to set SDK log level");
            return false;
        }
        if let (Some(logging), Some(severity)) = (&self.logging, severity_of(level))
            && let Err(e) = logging.raise_target_level(SDK_LOG_TARGET, severity.level_filter())
        {
            warn!(error = %e, "Failed to update SDK log filter");
        }
        true
    }
}

impl Drop for OnlinePlatformEos {
    fn drop(&mut self) {
        self.deinitialize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eos_sdk::sim::{SimAccount, SimOp, SimWorld, SimulatedSdk};

    fn settings() -> EosSettings {
        EosSettings {
            product_name: "Game".to_string(),
            product_version: "1.0".to_string(),
            product_id: "product".to_string(),
            sandbox_id: "sandbox".to_string(),
            deployment_id: "deployment".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            encryption_key: None,
        }
    }

    fn facade(sdk: &SimulatedSdk, settings: EosSettings) -> (OnlinePlatformEos, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let host = HostEnvironment::new(Vec::new(), dir.path());
        let platform =
            OnlinePlatformEos::new(Arc::new(sdk.clone()), settings, RuntimeOptions::default(), host);
        (platform, dir)
    }

    #[test]
    fn test_invalid_settings_leave_platform_unusable() {
        let sdk = SimulatedSdk::new(SimWorld::new());
        let mut bad = settings();
        bad.product_id.clear();
        let (mut platform, _dir) = facade(&sdk, bad);

        assert!(!platform.initialize());
        assert!(!platform.is_initialized());
        assert!(!sdk.is_initialized());
        assert!(!platform.user_login(LocalUser::PRIMARY));
        assert!(platform.get_friends(LocalUser::PRIMARY).is_none());
        platform.on_update(FrameSignals::foreground());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let sdk = SimulatedSdk::new(SimWorld::new());
        let (mut platform, _dir) = facade(&sdk, settings());

        assert!(platform.initialize());
        assert!(platform.initialize());
        assert_eq!(sdk.live_platforms(), 1);
    }

    #[test]
    fn test_storage_disabled_without_key() {
        let sdk = SimulatedSdk::new(SimWorld::new());
        let (mut platform, _dir) = facade(&sdk, settings());
        assert!(platform.initialize());
        assert!(!platform.context().unwrap().storage_enabled());
        assert!(!platform.set_save_game("slot1", b"data", LocalUser::PRIMARY));
        assert_eq!(sdk.calls(SimOp::WriteFile), 0);
    }

    #[test]
    fn test_logout_without_login_is_rejected_locally() {
        let account = SimAccount::new("alice");
        let sdk = SimulatedSdk::new(SimWorld::new().with_account(account));
        let (mut platform, _dir) = facade(&sdk, settings());
        assert!(platform.initialize());

        assert!(!platform.user_logout(LocalUser::PRIMARY));
        assert_eq!(sdk.calls(SimOp::AuthLogout), 0);
        assert!(!platform.get_user_logged_in(LocalUser::PRIMARY));
    }

    #[test]
    fn test_set_log_level_requires_sdk() {
        let sdk = SimulatedSdk::new(SimWorld::new());
        let (mut platform, _dir) = facade(&sdk, settings());
        assert!(!platform.set_log_level(LogCategory::Auth, LogLevel::Verbose));

        assert!(platform.initialize());
        assert!(platform.set_log_level(LogCategory::Auth, LogLevel::Verbose));
    }
}
