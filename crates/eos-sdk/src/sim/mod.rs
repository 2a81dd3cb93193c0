//! Deterministic in-process implementation of the SDK.
//!
//! Remote calls are queued and complete on the next [`Platform::tick`], in
//! issue order. Backend state lives in a [`SimWorld`] shared by every
//! platform created from the same [`SimulatedSdk`], so it survives a
//! release/create cycle the way a real keychain and backend would.

mod platform;
mod queue;
mod world;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::auth::LoginCredentialType;
use crate::ids::ProductUserId;
use crate::logging::{LogCallback, LogCategory, LogLevel, LogMessage};
use crate::memory::AllocationCounter;
use crate::platform::{InitializeOptions, Platform, PlatformOptions, Sdk};
use crate::result::EosResult;

pub use platform::SimPlatform;
pub use world::{KeychainEntry, SimAccount, SimProgress, SimWorld, definition};

use platform::PlatformState;

/// Operations counted by the simulated runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimOp {
    AuthLogin,
    AuthLogout,
    DeletePersistentAuth,
    ConnectLogin,
    CreateUser,
    QueryFriends,
    QueryUserInfo,
    QueryPresence,
    QueryDefinitions,
    QueryPlayerAchievements,
    UnlockAchievements,
    IngestStat,
    QueryStats,
    ReadFile,
    WriteFile,
    SetApplicationStatus,
    SetNetworkStatus,
}

/// State shared by the SDK handle and every platform it created.
pub(crate) struct SimShared {
    pub(crate) world: Mutex<SimWorld>,
    pub(crate) allocations: AllocationCounter,
    calls: Mutex<HashMap<SimOp, usize>>,
    login_attempts: Mutex<Vec<LoginCredentialType>>,
    log_callback: RwLock<Option<LogCallback>>,
    log_levels: Mutex<HashMap<LogCategory, LogLevel>>,
    initialized: AtomicBool,
    platforms: Mutex<Vec<Weak<PlatformState>>>,
}

impl SimShared {
    pub(crate) fn record(&self, op: SimOp) {
        *self.calls.lock().entry(op).or_insert(0) += 1;
    }

    pub(crate) fn record_login(&self, credential_type: LoginCredentialType) {
        self.record(SimOp::AuthLogin);
        self.login_attempts.lock().push(credential_type);
    }

    fn level_for(&self, category: LogCategory) -> LogLevel {
        let levels = self.log_levels.lock();
        levels
            .get(&category)
            .or_else(|| levels.get(&LogCategory::AllCategories))
            .copied()
            .unwrap_or(LogLevel::Info)
    }

    /// Emit a runtime log line through the registered callback.
    pub(crate) fn log(&self, category: LogCategory, level: LogLevel, message: impl Into<String>) {
        if level == LogLevel::Off || level > self.level_for(category) {
            return;
        }
        let callback = self.log_callback.read().clone();
        if let Some(callback) = callback {
            callback(&LogMessage {
                category: category.sdk_name(),
                message: message.into(),
                level,
            });
        }
    }
}

/// Simulated SDK entry point.
///
/// Cloning yields another handle to the same runtime, so a test can keep one
/// for inspection while the adapter owns another as `Arc<dyn Sdk>`.
#[derive(Clone)]
pub struct SimulatedSdk {
    shared: Arc<SimShared>,
}

impl SimulatedSdk {
    pub fn new(world: SimWorld) -> Self {
        Self {
            shared: Arc::new(SimShared {
                world: Mutex::new(world),
                allocations: AllocationCounter::new(),
                calls: Mutex::new(HashMap::new()),
                login_attempts: Mutex::new(Vec::new()),
                log_callback: RwLock::new(None),
                log_levels: Mutex::new(HashMap::new()),
                initialized: AtomicBool::new(false),
                platforms: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Number of times `op` was issued.
    pub fn calls(&self, op: SimOp) -> usize {
        self.shared.calls.lock().get(&op).copied().unwrap_or(0)
    }

    /// Credential types of every account login, in issue order.
    pub fn login_attempts(&self) -> Vec<LoginCredentialType> {
        self.shared.login_attempts.lock().clone()
    }

    /// SDK allocations handed out and not yet released.
    pub fn live_allocations(&self) -> usize {
        self.shared.allocations.live()
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.initialized.load(Ordering::SeqCst)
    }

    /// Inspect backend state.
    pub fn with_world<R>(&self, f: impl FnOnce(&SimWorld) -> R) -> R {
        f(&self.shared.world.lock())
    }

    /// Change the injected failure for `op`; `None` clears it.
    pub fn set_failure(&self, op: SimOp, result: Option<EosResult>) {
        self.shared.world.lock().set_failure(op, result);
    }

    /// Expire the game-service session of `user` on every live platform,
    /// notifying registered auth-expiration handlers on their next tick.
    pub fn expire_connect_auth(&self, user: &ProductUserId) {
        let platforms: Vec<Arc<PlatformState>> = self
            .shared
            .platforms
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        for state in platforms {
            state.expire_connect_auth(user);
        }
    }

    /// Platforms created and not yet released.
    pub fn live_platforms(&self) -> usize {
        self.shared
            .platforms
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|p| !p.is_released())
            .count()
    }
}

impl Sdk for SimulatedSdk {
    fn initialize(&self, options: &InitializeOptions) -> EosResult {
        if options.product_name.is_empty() {
            return EosResult::InvalidParameters;
        }
        if self.shared.initialized.swap(true, Ordering::SeqCst) {
            return EosResult::AlreadyConfigured;
        }
        debug!(product = %options.product_name, "Simulated SDK initialized");
        EosResult::Success
    }

    fn shutdown(&self) -> EosResult {
        if !self.shared.initialized.swap(false, Ordering::SeqCst) {
            return EosResult::NotConfigured;
        }
        let platforms: Vec<Arc<PlatformState>> = self
            .shared
            .platforms
            .lock()
            .drain(..)
            .filter_map(|p| p.upgrade())
            .collect();
        for platform in platforms {
            platform.release();
        }
        *self.shared.log_callback.write() = None;
        EosResult::Success
    }

    fn create_platform(&self, options: &PlatformOptions) -> Option<Arc<dyn Platform>> {
        if !self.is_initialized() {
            return None;
        }
        if options.product_id.is_empty()
            || options.sandbox_id.is_empty()
            || options.deployment_id.is_empty()
        {
            self.shared.log(
                LogCategory::Core,
                LogLevel::Error,
                "Platform options are missing product, sandbox or deployment id",
            );
            return None;
        }

        if !options.cache_directory.as_os_str().is_empty() {
            let dir = options.cache_directory.join("eos-cache");
            if let Err(e) = std::fs::create_dir_all(&dir) {
                self.shared.log(
                    LogCategory::Core,
                    LogLevel::Warning,
                    format!("Unable to create cache directory {}: {}", dir.display(), e),
                );
            }
        }

        let state = PlatformState::new(Arc::clone(&self.shared), options.clone());
        self.shared.platforms.lock().push(Arc::downgrade(&state));
        self.shared
            .log(LogCategory::Core, LogLevel::Info, "Platform created");
        Some(Arc::new(SimPlatform::new(state)))
    }

    fn set_log_callback(&self, callback: LogCallback) -> EosResult {
        if !self.is_initialized() {
            return EosResult::NotConfigured;
        }
        *self.shared.log_callback.write() = Some(callback);
        EosResult::Success
    }

    fn set_log_level(&self, category: LogCategory, level: LogLevel) -> EosResult {
        if !self.is_initialized() {
            return EosResult::NotConfigured;
        }
        let mut levels = self.shared.log_levels.lock();
        if category == LogCategory::AllCategories {
            levels.clear();
        }
        levels.insert(category, level);
        EosResult::Success
    }
}
