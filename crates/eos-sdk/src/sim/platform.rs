//! Simulated platform instance and its service interfaces.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::achievements::{
    AchievementsInterface, Definition, PlayerAchievement, QueryDefinitionsCallbackInfo,
    QueryPlayerAchievementsCallbackInfo, UnlockAchievementsCallbackInfo,
};
use crate::auth::{
    AuthInterface, Credentials, DeletePersistentAuthCallbackInfo, IdToken, LoginCallbackInfo,
    LoginCredentialType, LoginOptions, LoginStatus, LogoutCallbackInfo,
};
use crate::callback::{Callback, NotificationId, Notify};
use crate::connect::{
    AuthExpirationCallbackInfo, ConnectInterface, ConnectLoginCallbackInfo, ConnectLoginOptions,
    CreateUserCallbackInfo, ExternalCredentialType,
};
use crate::friends::{FriendsInterface, QueryFriendsCallbackInfo};
use crate::ids::{ContinuanceToken, EpicAccountId, ProductUserId};
use crate::logging::{LogCategory, LogLevel};
use crate::memory::SdkAllocation;
use crate::platform::{ApplicationStatus, NetworkStatus, Platform, PlatformOptions};
use crate::presence::{PresenceInfo, PresenceInterface, QueryPresenceCallbackInfo};
use crate::result::EosResult;
use crate::stats::{IngestData, IngestStatCallbackInfo, QueryStatsCallbackInfo, Stat, StatsInterface};
use crate::storage::{
    DEFAULT_CHUNK_LENGTH, MAX_FILE_SIZE, MAX_FILENAME_LENGTH, PlayerDataStorageInterface,
    ReadDataCallback, ReadFileCallbackInfo, ReadFileDataInfo, ReadFileOptions, ReadResult,
    WriteDataCallback, WriteFileCallbackInfo, WriteFileOptions, WriteResult,
};
use crate::user_info::{QueryUserInfoCallbackInfo, UserInfo, UserInfoInterface};

use super::queue::CallbackQueue;
use super::world::{KeychainEntry, SimWorld};
use super::{SimOp, SimShared};

/// Token format handed out by `copy_id_token` and accepted by connect login.
fn id_token_for(account: &EpicAccountId) -> String {
    format!("sim.{}.token", account)
}

fn account_from_id_token(token: &str) -> Option<EpicAccountId> {
    let inner = token.strip_prefix("sim.")?.strip_suffix(".token")?;
    EpicAccountId::from_string(inner).ok()
}

fn valid_filename(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_FILENAME_LENGTH
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}

/// Service caches local to one platform instance.
#[derive(Default)]
struct Session {
    accounts: HashSet<EpicAccountId>,
    connect_users: HashSet<ProductUserId>,
    continuations: HashMap<String, EpicAccountId>,
    friends: HashMap<EpicAccountId, Vec<EpicAccountId>>,
    user_info: HashMap<(EpicAccountId, EpicAccountId), UserInfo>,
    presence: HashMap<(EpicAccountId, EpicAccountId), PresenceInfo>,
    definitions: Vec<Definition>,
    player_achievements: HashMap<ProductUserId, Vec<PlayerAchievement>>,
    stats: HashMap<ProductUserId, Vec<Stat>>,
}

pub(crate) struct PlatformState {
    shared: Arc<SimShared>,
    options: PlatformOptions,
    queue: CallbackQueue,
    released: AtomicBool,
    application_status: Mutex<ApplicationStatus>,
    network_status: Mutex<NetworkStatus>,
    session: Mutex<Session>,
    expiration_handlers: Mutex<Vec<(NotificationId, Notify<AuthExpirationCallbackInfo>)>>,
    pending_expirations: Mutex<Vec<ProductUserId>>,
    next_notification: AtomicU64,
}

impl PlatformState {
    pub(crate) fn new(shared: Arc<SimShared>, options: PlatformOptions) -> Arc<Self> {
        Arc::new(Self {
            shared,
            options,
            queue: CallbackQueue::new(),
            released: AtomicBool::new(false),
            application_status: Mutex::new(ApplicationStatus::Foreground),
            network_status: Mutex::new(NetworkStatus::Online),
            session: Mutex::new(Session::default()),
            expiration_handlers: Mutex::new(Vec::new()),
            pending_expirations: Mutex::new(Vec::new()),
            next_notification: AtomicU64::new(1),
        })
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let dropped = self.queue.clear();
        self.expiration_handlers.lock().clear();
        self.pending_expirations.lock().clear();
        self.shared.log(
            LogCategory::Core,
            LogLevel::Info,
            format!("Platform released, {} pending callbacks dropped", dropped),
        );
    }

    pub(crate) fn expire_connect_auth(&self, user: &ProductUserId) {
        if self.session.lock().connect_users.contains(user) {
            self.pending_expirations.lock().push(user.clone());
        }
    }

    /// Queue work for the next tick. Dropped if the platform is released
    /// before it runs.
    fn enqueue(self: &Arc<Self>, job: impl FnOnce(&PlatformState) + Send + 'static) {
        if self.is_released() {
            return;
        }
        let weak: Weak<PlatformState> = Arc::downgrade(self);
        self.queue.push(Box::new(move || {
            if let Some(state) = weak.upgrade()
                && !state.is_released()
            {
                job(&state);
            }
        }));
    }

    fn tick(&self) {
        if self.is_released() {
            return;
        }

        let expired: Vec<ProductUserId> = self.pending_expirations.lock().drain(..).collect();
        if !expired.is_empty() {
            let handlers: Vec<Notify<AuthExpirationCallbackInfo>> = self
                .expiration_handlers
                .lock()
                .iter()
                .map(|(_, handler)| Arc::clone(handler))
                .collect();
            for user in expired {
                self.shared.log(
                    LogCategory::Connect,
                    LogLevel::Info,
                    format!("Auth expiring for product user {}", user),
                );
                let info = AuthExpirationCallbackInfo {
                    local_user_id: user,
                };
                for handler in &handlers {
                    handler(&info);
                }
            }
        }

        self.queue.run_pending();
    }

    /// Injected failure for `op`, if any.
    fn injected(&self, op: SimOp) -> Option<EosResult> {
        self.shared.world.lock().failure(op)
    }

    fn has_account(&self, account: &EpicAccountId) -> bool {
        self.session.lock().accounts.contains(account)
    }

    fn has_connect_user(&self, user: &ProductUserId) -> bool {
        self.session.lock().connect_users.contains(user)
    }

    fn check_account(&self, op: SimOp, account: &EpicAccountId) -> Result<(), EosResult> {
        if let Some(result) = self.injected(op) {
            return Err(result);
        }
        if !self.has_account(account) {
            return Err(EosResult::InvalidUser);
        }
        Ok(())
    }

    fn check_connect_user(&self, op: SimOp, user: &ProductUserId) -> Result<(), EosResult> {
        if let Some(result) = self.injected(op) {
            return Err(result);
        }
        if !self.has_connect_user(user) {
            return Err(EosResult::InvalidUser);
        }
        Ok(())
    }

    fn resolve_login(world: &mut SimWorld, credentials: &Credentials) -> Result<EpicAccountId, EosResult> {
        let token = credentials.token.as_deref().unwrap_or_default();
        let account = match credentials.credential_type {
            LoginCredentialType::ExchangeCode => world
                .exchange_codes
                .remove(token)
                .ok_or(EosResult::AuthExchangeCodeNotFound)?,
            LoginCredentialType::PersistentAuth => match &world.keychain {
                None => return Err(EosResult::NotFound),
                Some(entry) if entry.stale => return Err(EosResult::InvalidAuth),
                Some(entry) => entry.account_id.clone(),
            },
            LoginCredentialType::AccountPortal => {
                world.portal_account.clone().ok_or(EosResult::Canceled)?
            }
            LoginCredentialType::Developer => {
                if credentials.id.as_deref().unwrap_or_default().is_empty() {
                    return Err(EosResult::InvalidParameters);
                }
                world
                    .developer_credentials
                    .get(token)
                    .cloned()
                    .ok_or(EosResult::InvalidCredentials)?
            }
            _ => return Err(EosResult::NotImplemented),
        };

        if !world.accounts.contains_key(&account) {
            return Err(EosResult::InvalidUser);
        }
        if credentials.credential_type != LoginCredentialType::Developer {
            world.keychain = Some(KeychainEntry {
                refresh_token: uuid::Uuid::new_v4().simple().to_string(),
                account_id: account.clone(),
                stale: false,
            });
        }
        Ok(account)
    }

    fn complete_login(&self, credentials: &Credentials) -> LoginCallbackInfo {
        let outcome = match self.injected(SimOp::AuthLogin) {
            Some(result) => Err(result),
            None => Self::resolve_login(&mut self.shared.world.lock(), credentials),
        };
        match outcome {
            Ok(account) => {
                self.session.lock().accounts.insert(account.clone());
                self.shared.log(
                    LogCategory::Auth,
                    LogLevel::Info,
                    format!("Login succeeded for {}", account),
                );
                LoginCallbackInfo {
                    result: EosResult::Success,
                    local_user_id: Some(account),
                }
            }
            Err(result) => {
                self.shared.log(
                    LogCategory::Auth,
                    LogLevel::Warning,
                    format!(
                        "Login with {:?} failed: {}",
                        credentials.credential_type, result
                    ),
                );
                LoginCallbackInfo {
                    result,
                    local_user_id: None,
                }
            }
        }
    }

    fn complete_connect_login(&self, options: &ConnectLoginOptions) -> ConnectLoginCallbackInfo {
        let failed = |result| ConnectLoginCallbackInfo {
            result,
            local_user_id: None,
            continuance_token: None,
        };

        if let Some(result) = self.injected(SimOp::ConnectLogin) {
            return failed(result);
        }
        if options.credentials.credential_type != ExternalCredentialType::EpicIdToken {
            return failed(EosResult::InvalidParameters);
        }
        let Some(account) = account_from_id_token(&options.credentials.token) else {
            return failed(EosResult::ConnectExternalTokenValidationFailed);
        };

        let existing = self.shared.world.lock().product_user(&account).cloned();
        let mut session = self.session.lock();
        match existing {
            Some(user) => {
                session.connect_users.insert(user.clone());
                ConnectLoginCallbackInfo {
                    result: EosResult::Success,
                    local_user_id: Some(user),
                    continuance_token: None,
                }
            }
            None => {
                let token = ContinuanceToken::new(uuid::Uuid::new_v4().simple().to_string());
                session
                    .continuations
                    .insert(token.as_str().to_string(), account);
                ConnectLoginCallbackInfo {
                    result: EosResult::InvalidUser,
                    local_user_id: None,
                    continuance_token: Some(token),
                }
            }
        }
    }

    fn complete_create_user(&self, token: &ContinuanceToken) -> CreateUserCallbackInfo {
        let outcome = (|| {
            if let Some(result) = self.injected(SimOp::CreateUser) {
                return Err(result);
            }
            let account = self
                .session
                .lock()
                .continuations
                .remove(token.as_str())
                .ok_or(EosResult::InvalidParameters)?;

            let mut world = self.shared.world.lock();
            if world.product_users.contains_key(&account) {
                return Err(EosResult::ConnectUserAlreadyExists);
            }
            let user = ProductUserId::generate();
            world.product_users.insert(account, user.clone());
            Ok(user)
        })();

        match outcome {
            Ok(user) => {
                self.session.lock().connect_users.insert(user.clone());
                CreateUserCallbackInfo {
                    result: EosResult::Success,
                    local_user_id: Some(user),
                }
            }
            Err(result) => CreateUserCallbackInfo {
                result,
                local_user_id: None,
            },
        }
    }

    fn complete_read(&self, user: &ProductUserId, options: &ReadFileOptions, on_data: &mut ReadDataCallback) -> EosResult {
        if let Some(result) = self.injected(SimOp::ReadFile) {
            return result;
        }
        if self.options.encryption_key.is_none() {
            return EosResult::PlayerDataStorageEncryptionKeyNotSet;
        }
        if !self.has_connect_user(user) {
            return EosResult::InvalidUser;
        }
        if !valid_filename(&options.filename) {
            return EosResult::PlayerDataStorageFilenameInvalid;
        }
        let Some(data) = self
            .shared
            .world
            .lock()
            .file(user, &options.filename)
            .map(<[u8]>::to_vec)
        else {
            return EosResult::NotFound;
        };

        let chunk_length = match options.read_chunk_length_bytes {
            0 => DEFAULT_CHUNK_LENGTH,
            n => n,
        };
        let total = data.len();
        let mut offset = 0;
        loop {
            let end = (offset + chunk_length).min(total);
            let info = ReadFileDataInfo {
                filename: &options.filename,
                total_file_size: total,
                is_last_chunk: end == total,
                data: &data[offset..end],
            };
            match on_data(&info) {
                ReadResult::ContinueReading => {}
                ReadResult::FailRequest => return EosResult::UnexpectedError,
                ReadResult::CancelRequest => return EosResult::Canceled,
            }
            if end == total {
                return EosResult::Success;
            }
            offset = end;
        }
    }

    fn complete_write(&self, user: &ProductUserId, options: &WriteFileOptions, on_data: &mut WriteDataCallback) -> EosResult {
        if let Some(result) = self.injected(SimOp::WriteFile) {
            return result;
        }
        if self.options.encryption_key.is_none() {
            return EosResult::PlayerDataStorageEncryptionKeyNotSet;
        }
        if !self.has_connect_user(user) {
            return EosResult::InvalidUser;
        }
        if !valid_filename(&options.filename) {
            return EosResult::PlayerDataStorageFilenameInvalid;
        }

        let chunk_length = match options.chunk_length_bytes {
            0 => DEFAULT_CHUNK_LENGTH,
            n => n,
        };
        let mut contents = Vec::new();
        loop {
            let mut chunk = Vec::with_capacity(chunk_length);
            let step = on_data(&mut chunk, chunk_length);
            if chunk.len() > chunk_length {
                return EosResult::InvalidParameters;
            }
            contents.extend_from_slice(&chunk);
            if contents.len() > MAX_FILE_SIZE {
                return EosResult::PlayerDataStorageFileSizeTooLarge;
            }
            match step {
                WriteResult::ContinueWriting if chunk.is_empty() => {
                    return EosResult::UnexpectedError;
                }
                WriteResult::ContinueWriting => {}
                WriteResult::CompleteRequest => break,
                WriteResult::FailRequest => return EosResult::UnexpectedError,
                WriteResult::CancelRequest => return EosResult::Canceled,
            }
        }

        self.shared
            .world
            .lock()
            .files
            .entry(user.clone())
            .or_default()
            .insert(options.filename.clone(), contents);
        EosResult::Success
    }
}

/// Platform handed out by [`super::SimulatedSdk`].
pub struct SimPlatform {
    state: Arc<PlatformState>,
}

impl SimPlatform {
    pub(crate) fn new(state: Arc<PlatformState>) -> Self {
        Self { state }
    }

    /// Callbacks waiting for the next tick.
    pub fn pending_callbacks(&self) -> usize {
        self.state.queue.len()
    }
}

impl Drop for SimPlatform {
    fn drop(&mut self) {
        self.state.release();
    }
}

impl Platform for SimPlatform {
    fn tick(&self) {
        self.state.tick();
    }

    fn application_status(&self) -> ApplicationStatus {
        *self.state.application_status.lock()
    }

    fn set_application_status(&self, status: ApplicationStatus) -> EosResult {
        self.state.shared.record(SimOp::SetApplicationStatus);
        if self.state.is_released() {
            return EosResult::InvalidState;
        }
        if let Some(result) = self.state.injected(SimOp::SetApplicationStatus) {
            return result;
        }
        *self.state.application_status.lock() = status;
        EosResult::Success
    }

    fn network_status(&self) -> NetworkStatus {
        *self.state.network_status.lock()
    }

    fn set_network_status(&self, status: NetworkStatus) -> EosResult {
        self.state.shared.record(SimOp::SetNetworkStatus);
        if self.state.is_released() {
            return EosResult::InvalidState;
        }
        if let Some(result) = self.state.injected(SimOp::SetNetworkStatus) {
            return result;
        }
        *self.state.network_status.lock() = status;
        EosResult::Success
    }

    fn release(&self) {
        self.state.release();
    }

    fn is_released(&self) -> bool {
        self.state.is_released()
    }

    fn auth(&self) -> &dyn AuthInterface {
        self
    }

    fn connect(&self) -> &dyn ConnectInterface {
        self
    }

    fn friends(&self) -> &dyn FriendsInterface {
        self
    }

    fn user_info(&self) -> &dyn UserInfoInterface {
        self
    }

    fn presence(&self) -> &dyn PresenceInterface {
        self
    }

    fn achievements(&self) -> &dyn AchievementsInterface {
        self
    }

    fn stats(&self) -> &dyn StatsInterface {
        self
    }

    fn player_data_storage(&self) -> &dyn PlayerDataStorageInterface {
        self
    }
}

impl AuthInterface for SimPlatform {
    fn login(&self, options: LoginOptions, callback: Callback<LoginCallbackInfo>) {
        self.state
            .shared
            .record_login(options.credentials.credential_type);
        self.state.enqueue(move |state| {
            let info = state.complete_login(&options.credentials);
            callback(info);
        });
    }

    fn logout(&self, local_user_id: &EpicAccountId, callback: Callback<LogoutCallbackInfo>) {
        self.state.shared.record(SimOp::AuthLogout);
        let account = local_user_id.clone();
        self.state.enqueue(move |state| {
            let result = match state.check_account(SimOp::AuthLogout, &account) {
                Ok(()) => {
                    let mut session = state.session.lock();
                    session.accounts.remove(&account);
                    session.friends.remove(&account);
                    session.user_info.retain(|(local, _), _| local != &account);
                    session.presence.retain(|(local, _), _| local != &account);
                    EosResult::Success
                }
                Err(result) => result,
            };
            callback(LogoutCallbackInfo {
                result,
                local_user_id: account,
            });
        });
    }

    fn delete_persistent_auth(
        &self,
        _refresh_token: Option<String>,
        callback: Callback<DeletePersistentAuthCallbackInfo>,
    ) {
        self.state.shared.record(SimOp::DeletePersistentAuth);
        self.state.enqueue(move |state| {
            let result = match state.injected(SimOp::DeletePersistentAuth) {
                Some(result) => result,
                None => {
                    state.shared.world.lock().keychain = None;
                    state.shared.log(
                        LogCategory::Keychain,
                        LogLevel::Info,
                        "Persistent credential removed",
                    );
                    EosResult::Success
                }
            };
            callback(DeletePersistentAuthCallbackInfo { result });
        });
    }

    fn copy_id_token(&self, account_id: &EpicAccountId) -> Result<SdkAllocation<IdToken>, EosResult> {
        if !self.state.has_account(account_id) {
            return Err(EosResult::InvalidUser);
        }
        Ok(self.state.shared.allocations.track(IdToken {
            account_id: account_id.clone(),
            json_web_token: id_token_for(account_id),
        }))
    }

    fn login_status(&self, local_user_id: &EpicAccountId) -> LoginStatus {
        if self.state.has_account(local_user_id) {
            LoginStatus::LoggedIn
        } else {
            LoginStatus::NotLoggedIn
        }
    }
}

impl ConnectInterface for SimPlatform {
    fn login(&self, options: ConnectLoginOptions, callback: Callback<ConnectLoginCallbackInfo>) {
        self.state.shared.record(SimOp::ConnectLogin);
        self.state.enqueue(move |state| {
            let info = state.complete_connect_login(&options);
            callback(info);
        });
    }

    fn create_user(
        &self,
        continuance_token: ContinuanceToken,
        callback: Callback<CreateUserCallbackInfo>,
    ) {
        self.state.shared.record(SimOp::CreateUser);
        self.state.enqueue(move |state| {
            let info = state.complete_create_user(&continuance_token);
            callback(info);
        });
    }

    fn add_notify_auth_expiration(
        &self,
        notification: Notify<AuthExpirationCallbackInfo>,
    ) -> NotificationId {
        if self.state.is_released() {
            return NotificationId::INVALID;
        }
        let id = NotificationId(self.state.next_notification.fetch_add(1, Ordering::SeqCst));
        self.state
            .expiration_handlers
            .lock()
            .push((id, notification));
        id
    }

    fn remove_notify_auth_expiration(&self, id: NotificationId) {
        self.state
            .expiration_handlers
            .lock()
            .retain(|(registered, _)| *registered != id);
    }

    fn is_logged_in(&self, local_user_id: &ProductUserId) -> bool {
        self.state.has_connect_user(local_user_id)
    }
}

impl FriendsInterface for SimPlatform {
    fn query_friends(
        &self,
        local_user_id: &EpicAccountId,
        callback: Callback<QueryFriendsCallbackInfo>,
    ) {
        self.state.shared.record(SimOp::QueryFriends);
        let account = local_user_id.clone();
        self.state.enqueue(move |state| {
            let result = match state.check_account(SimOp::QueryFriends, &account) {
                Ok(()) => {
                    let friends = state
                        .shared
                        .world
                        .lock()
                        .account(&account)
                        .map(|a| a.friends.clone())
                        .unwrap_or_default();
                    state.session.lock().friends.insert(account.clone(), friends);
                    EosResult::Success
                }
                Err(result) => result,
            };
            callback(QueryFriendsCallbackInfo {
                result,
                local_user_id: account,
            });
        });
    }

    fn friends_count(&self, local_user_id: &EpicAccountId) -> usize {
        self.state
            .session
            .lock()
            .friends
            .get(local_user_id)
            .map_or(0, Vec::len)
    }

    fn friend_at_index(&self, local_user_id: &EpicAccountId, index: usize) -> Option<EpicAccountId> {
        self.state
            .session
            .lock()
            .friends
            .get(local_user_id)?
            .get(index)
            .cloned()
    }
}

impl UserInfoInterface for SimPlatform {
    fn query_user_info(
        &self,
        local_user_id: &EpicAccountId,
        target_user_id: &EpicAccountId,
        callback: Callback<QueryUserInfoCallbackInfo>,
    ) {
        self.state.shared.record(SimOp::QueryUserInfo);
        let local = local_user_id.clone();
        let target = target_user_id.clone();
        self.state.enqueue(move |state| {
            let result = match state.check_account(SimOp::QueryUserInfo, &local) {
                Ok(()) => {
                    let info = state.shared.world.lock().account(&target).map(|a| UserInfo {
                        user_id: a.id.clone(),
                        country: a.country.clone(),
                        display_name: Some(a.display_name.clone()),
                        preferred_language: None,
                        nickname: None,
                    });
                    match info {
                        Some(info) => {
                            state
                                .session
                                .lock()
                                .user_info
                                .insert((local.clone(), target.clone()), info);
                            EosResult::Success
                        }
                        None => EosResult::NotFound,
                    }
                }
                Err(result) => result,
            };
            callback(QueryUserInfoCallbackInfo {
                result,
                local_user_id: local,
                target_user_id: target,
            });
        });
    }

    fn copy_user_info(
        &self,
        local_user_id: &EpicAccountId,
        target_user_id: &EpicAccountId,
    ) -> Result<SdkAllocation<UserInfo>, EosResult> {
        let info = self
            .state
            .session
            .lock()
            .user_info
            .get(&(local_user_id.clone(), target_user_id.clone()))
            .cloned()
            .ok_or(EosResult::NotFound)?;
        Ok(self.state.shared.allocations.track(info))
    }
}

impl PresenceInterface for SimPlatform {
    fn query_presence(
        &self,
        local_user_id: &EpicAccountId,
        target_user_id: &EpicAccountId,
        callback: Callback<QueryPresenceCallbackInfo>,
    ) {
        self.state.shared.record(SimOp::QueryPresence);
        let local = local_user_id.clone();
        let target = target_user_id.clone();
        self.state.enqueue(move |state| {
            let result = match state.check_account(SimOp::QueryPresence, &local) {
                Ok(()) => {
                    let world = state.shared.world.lock();
                    match world.account(&target) {
                        Some(account) => {
                            // Accounts that never published presence leave the cache empty.
                            if let Some(status) = account.presence {
                                let info = PresenceInfo {
                                    user_id: target.clone(),
                                    status,
                                    product_id: Some(state.options.product_id.clone()),
                                    rich_text: None,
                                };
                                state
                                    .session
                                    .lock()
                                    .presence
                                    .insert((local.clone(), target.clone()), info);
                            }
                            EosResult::Success
                        }
                        None => EosResult::NotFound,
                    }
                }
                Err(result) => result,
            };
            callback(QueryPresenceCallbackInfo {
                result,
                local_user_id: local,
                target_user_id: target,
            });
        });
    }

    fn has_presence(&self, local_user_id: &EpicAccountId, target_user_id: &EpicAccountId) -> bool {
        self.state
            .session
            .lock()
            .presence
            .contains_key(&(local_user_id.clone(), target_user_id.clone()))
    }

    fn copy_presence(
        &self,
        local_user_id: &EpicAccountId,
        target_user_id: &EpicAccountId,
    ) -> Result<SdkAllocation<PresenceInfo>, EosResult> {
        let info = self
            .state
            .session
            .lock()
            .presence
            .get(&(local_user_id.clone(), target_user_id.clone()))
            .cloned()
            .ok_or(EosResult::NotFound)?;
        Ok(self.state.shared.allocations.track(info))
    }
}

impl AchievementsInterface for SimPlatform {
    fn query_definitions(
        &self,
        local_user_id: &ProductUserId,
        callback: Callback<QueryDefinitionsCallbackInfo>,
    ) {
        self.state.shared.record(SimOp::QueryDefinitions);
        let user = local_user_id.clone();
        self.state.enqueue(move |state| {
            let result = match state.check_connect_user(SimOp::QueryDefinitions, &user) {
                Ok(()) => {
                    let definitions = state.shared.world.lock().definitions.clone();
                    state.session.lock().definitions = definitions;
                    EosResult::Success
                }
                Err(result) => result,
            };
            callback(QueryDefinitionsCallbackInfo { result });
        });
    }

    fn definition_count(&self) -> usize {
        self.state.session.lock().definitions.len()
    }

    fn copy_definition_by_id(
        &self,
        achievement_id: &str,
    ) -> Result<SdkAllocation<Definition>, EosResult> {
        let definition = self
            .state
            .session
            .lock()
            .definitions
            .iter()
            .find(|d| d.achievement_id == achievement_id)
            .cloned()
            .ok_or(EosResult::NotFound)?;
        Ok(self.state.shared.allocations.track(definition))
    }

    fn query_player_achievements(
        &self,
        local_user_id: &ProductUserId,
        target_user_id: &ProductUserId,
        callback: Callback<QueryPlayerAchievementsCallbackInfo>,
    ) {
        self.state.shared.record(SimOp::QueryPlayerAchievements);
        let local = local_user_id.clone();
        let target = target_user_id.clone();
        self.state.enqueue(move |state| {
            let result = match state.check_connect_user(SimOp::QueryPlayerAchievements, &local) {
                Ok(()) => {
                    let records = state.shared.world.lock().player_achievements(&target);
                    state
                        .session
                        .lock()
                        .player_achievements
                        .insert(target.clone(), records);
                    EosResult::Success
                }
                Err(result) => result,
            };
            callback(QueryPlayerAchievementsCallbackInfo {
                result,
                target_user_id: target,
            });
        });
    }

    fn player_achievement_count(&self, target_user_id: &ProductUserId) -> usize {
        self.state
            .session
            .lock()
            .player_achievements
            .get(target_user_id)
            .map_or(0, Vec::len)
    }

    fn copy_player_achievement_by_index(
        &self,
        local_user_id: &ProductUserId,
        target_user_id: &ProductUserId,
        index: usize,
    ) -> Result<SdkAllocation<PlayerAchievement>, EosResult> {
        if !self.state.has_connect_user(local_user_id) {
            return Err(EosResult::InvalidUser);
        }
        let record = self
            .state
            .session
            .lock()
            .player_achievements
            .get(target_user_id)
            .and_then(|records| records.get(index))
            .cloned()
            .ok_or(EosResult::NotFound)?;
        Ok(self.state.shared.allocations.track(record))
    }

    fn unlock_achievements(
        &self,
        user_id: &ProductUserId,
        achievement_ids: Vec<String>,
        callback: Callback<UnlockAchievementsCallbackInfo>,
    ) {
        self.state.shared.record(SimOp::UnlockAchievements);
        let user = user_id.clone();
        self.state.enqueue(move |state| {
            let result = match state.check_connect_user(SimOp::UnlockAchievements, &user) {
                Ok(()) if achievement_ids.is_empty() => EosResult::InvalidParameters,
                Ok(()) => state.shared.world.lock().unlock(&user, &achievement_ids),
                Err(result) => result,
            };
            let achievements_count = if result.is_success() {
                achievement_ids.len()
            } else {
                0
            };
            callback(UnlockAchievementsCallbackInfo {
                result,
                user_id: user,
                achievements_count,
            });
        });
    }
}

impl StatsInterface for SimPlatform {
    /// Stats aggregate as "latest": an ingest replaces the stored value.
    fn ingest_stat(
        &self,
        local_user_id: &ProductUserId,
        target_user_id: &ProductUserId,
        stats: Vec<IngestData>,
        callback: Callback<IngestStatCallbackInfo>,
    ) {
        self.state.shared.record(SimOp::IngestStat);
        let local = local_user_id.clone();
        let target = target_user_id.clone();
        self.state.enqueue(move |state| {
            let result = match state.check_connect_user(SimOp::IngestStat, &local) {
                Ok(()) if stats.is_empty() => EosResult::InvalidParameters,
                Ok(()) => {
                    let mut world = state.shared.world.lock();
                    let stored = world.stats.entry(target.clone()).or_default();
                    for stat in &stats {
                        stored.insert(stat.stat_name.clone(), stat.ingest_amount);
                    }
                    EosResult::Success
                }
                Err(result) => result,
            };
            callback(IngestStatCallbackInfo {
                result,
                local_user_id: local,
                target_user_id: target,
            });
        });
    }

    fn query_stats(
        &self,
        local_user_id: &ProductUserId,
        target_user_id: &ProductUserId,
        stat_names: Option<Vec<String>>,
        callback: Callback<QueryStatsCallbackInfo>,
    ) {
        self.state.shared.record(SimOp::QueryStats);
        let local = local_user_id.clone();
        let target = target_user_id.clone();
        self.state.enqueue(move |state| {
            let result = match state.check_connect_user(SimOp::QueryStats, &local) {
                Ok(()) => {
                    let stats: Vec<Stat> = state
                        .shared
                        .world
                        .lock()
                        .stats
                        .get(&target)
                        .map(|stored| {
                            stored
                                .iter()
                                .filter(|(name, _)| {
                                    stat_names
                                        .as_ref()
                                        .is_none_or(|names| names.iter().any(|n| n == *name))
                                })
                                .map(|(name, value)| Stat {
                                    name: name.clone(),
                                    start_time: None,
                                    end_time: None,
                                    value: *value,
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    state.session.lock().stats.insert(target.clone(), stats);
                    EosResult::Success
                }
                Err(result) => result,
            };
            callback(QueryStatsCallbackInfo {
                result,
                local_user_id: local,
                target_user_id: target,
            });
        });
    }

    fn stats_count(&self, target_user_id: &ProductUserId) -> usize {
        self.state
            .session
            .lock()
            .stats
            .get(target_user_id)
            .map_or(0, Vec::len)
    }

    fn copy_stat_by_name(
        &self,
        target_user_id: &ProductUserId,
        name: &str,
    ) -> Result<SdkAllocation<Stat>, EosResult> {
        let stat = self
            .state
            .session
            .lock()
            .stats
            .get(target_user_id)
            .and_then(|stats| stats.iter().find(|s| s.name == name))
            .cloned()
            .ok_or(EosResult::NotFound)?;
        Ok(self.state.shared.allocations.track(stat))
    }
}

impl PlayerDataStorageInterface for SimPlatform {
    fn read_file(
        &self,
        local_user_id: &ProductUserId,
        options: ReadFileOptions,
        mut on_data: ReadDataCallback,
        callback: Callback<ReadFileCallbackInfo>,
    ) {
        self.state.shared.record(SimOp::ReadFile);
        let user = local_user_id.clone();
        self.state.enqueue(move |state| {
            let result = state.complete_read(&user, &options, &mut on_data);
            callback(ReadFileCallbackInfo {
                result,
                local_user_id: user,
                filename: options.filename,
            });
        });
    }

    fn write_file(
        &self,
        local_user_id: &ProductUserId,
        options: WriteFileOptions,
        mut on_data: WriteDataCallback,
        callback: Callback<WriteFileCallbackInfo>,
    ) {
        self.state.shared.record(SimOp::WriteFile);
        let user = local_user_id.clone();
        self.state.enqueue(move |state| {
            let result = state.complete_write(&user, &options, &mut on_data);
            callback(WriteFileCallbackInfo {
                result,
                local_user_id: user,
                filename: options.filename,
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthScopeFlags;
    use crate::connect::ConnectCredentials;
    use crate::platform::{InitializeOptions, Sdk};
    use crate::sim::{SimAccount, SimulatedSdk};

    fn sdk_with(world: SimWorld) -> SimulatedSdk {
        let sdk = SimulatedSdk::new(world);
        let options = InitializeOptions {
            product_name: "test".to_string(),
            product_version: "1.0".to_string(),
        };
        assert_eq!(sdk.initialize(&options), EosResult::Success);
        sdk
    }

    fn platform_options(encryption_key: Option<&str>) -> PlatformOptions {
        PlatformOptions {
            product_id: "product".to_string(),
            sandbox_id: "sandbox".to_string(),
            deployment_id: "deployment".to_string(),
            encryption_key: encryption_key.map(str::to_string),
            ..Default::default()
        }
    }

    fn login_options(credential_type: LoginCredentialType, token: &str) -> LoginOptions {
        LoginOptions {
            credentials: Credentials {
                id: None,
                token: Some(token.to_string()),
                credential_type,
            },
            scope_flags: AuthScopeFlags::default(),
        }
    }

    fn capture<T: Send + 'static>() -> (Arc<Mutex<Option<T>>>, Callback<T>) {
        let slot = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&slot);
        (slot, Box::new(move |info| *sink.lock() = Some(info)))
    }

    #[test]
    fn test_callbacks_are_delivered_only_on_tick() {
        let account = SimAccount::new("alice");
        let world = SimWorld::new()
            .with_exchange_code("abc", &account.id)
            .with_account(account.clone());
        let sdk = sdk_with(world);
        let platform = sdk.create_platform(&platform_options(None)).unwrap();

        let (slot, callback) = capture::<LoginCallbackInfo>();
        platform
            .auth()
            .login(login_options(LoginCredentialType::ExchangeCode, "abc"), callback);
        assert!(slot.lock().is_none());

        platform.tick();
        let info = slot.lock().take().unwrap();
        assert_eq!(info.result, EosResult::Success);
        assert_eq!(info.local_user_id, Some(account.id.clone()));
        assert_eq!(platform.auth().login_status(&account.id), LoginStatus::LoggedIn);
    }

    #[test]
    fn test_exchange_codes_are_single_use() {
        let account = SimAccount::new("alice");
        let world = SimWorld::new()
            .with_exchange_code("abc", &account.id)
            .with_account(account);
        let sdk = sdk_with(world);
        let platform = sdk.create_platform(&platform_options(None)).unwrap();

        let (first, callback) = capture::<LoginCallbackInfo>();
        platform
            .auth()
            .login(login_options(LoginCredentialType::ExchangeCode, "abc"), callback);
        let (second, callback) = capture::<LoginCallbackInfo>();
        platform
            .auth()
            .login(login_options(LoginCredentialType::ExchangeCode, "abc"), callback);
        platform.tick();

        assert_eq!(first.lock().as_ref().unwrap().result, EosResult::Success);
        assert_eq!(
            second.lock().as_ref().unwrap().result,
            EosResult::AuthExchangeCodeNotFound
        );
        assert!(sdk.with_world(|w| w.keychain().is_some()));
    }

    #[test]
    fn test_release_drops_pending_callbacks() {
        let account = SimAccount::new("alice");
        let world = SimWorld::new().with_keychain(&account.id, false).with_account(account);
        let sdk = sdk_with(world);
        let platform = sdk.create_platform(&platform_options(None)).unwrap();

        let invoked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&invoked);
        platform.auth().login(
            login_options(LoginCredentialType::PersistentAuth, ""),
            Box::new(move |_| flag.store(true, Ordering::SeqCst)),
        );

        platform.release();
        platform.tick();
        assert!(!invoked.load(Ordering::SeqCst));
        assert!(platform.is_released());
        assert_eq!(sdk.live_platforms(), 0);
    }

    #[test]
    fn test_connect_login_for_unknown_user_then_create() {
        let account = SimAccount::new("alice");
        let world = SimWorld::new()
            .with_developer_credential("dev", &account.id)
            .with_account(account.clone());
        let sdk = sdk_with(world);
        let platform = sdk.create_platform(&platform_options(None)).unwrap();

        let mut options = login_options(LoginCredentialType::Developer, "dev");
        options.credentials.id = Some("localhost:6547".to_string());
        platform.auth().login(options, Box::new(|_| {}));
        platform.tick();

        let token = platform.auth().copy_id_token(&account.id).unwrap();
        assert_eq!(sdk.live_allocations(), 1);
        let connect_options = ConnectLoginOptions {
            credentials: ConnectCredentials {
                credential_type: ExternalCredentialType::EpicIdToken,
                token: token.json_web_token.clone(),
            },
        };
        drop(token);
        assert_eq!(sdk.live_allocations(), 0);

        let (login, callback) = capture::<ConnectLoginCallbackInfo>();
        platform.connect().login(connect_options, callback);
        platform.tick();
        let login = login.lock().take().unwrap();
        assert_eq!(login.result, EosResult::InvalidUser);
        let continuance = login.continuance_token.unwrap();

        let (created, callback) = capture::<CreateUserCallbackInfo>();
        platform.connect().create_user(continuance, callback);
        platform.tick();
        let created = created.lock().take().unwrap();
        assert_eq!(created.result, EosResult::Success);

        let user = created.local_user_id.unwrap();
        assert!(platform.connect().is_logged_in(&user));
        assert_eq!(sdk.with_world(|w| w.product_user(&account.id).cloned()), Some(user));
    }

    #[test]
    fn test_storage_requires_encryption_key() {
        let account = SimAccount::new("alice");
        let pid = ProductUserId::generate();
        let world = SimWorld::new()
            .with_product_user(&account.id, pid.clone())
            .with_account(account);
        let sdk = sdk_with(world);
        let platform = sdk.create_platform(&platform_options(None)).unwrap();

        let (slot, callback) = capture::<WriteFileCallbackInfo>();
        platform.player_data_storage().write_file(
            &pid,
            WriteFileOptions {
                filename: "save".to_string(),
                chunk_length_bytes: 0,
            },
            Box::new(|_, _| WriteResult::CompleteRequest),
            callback,
        );
        platform.tick();
        assert_eq!(
            slot.lock().as_ref().unwrap().result,
            EosResult::PlayerDataStorageEncryptionKeyNotSet
        );
    }

    #[test]
    fn test_auth_expiration_is_notified_on_tick() {
        let account = SimAccount::new("alice");
        let pid = ProductUserId::generate();
        let world = SimWorld::new()
            .with_exchange_code("abc", &account.id)
            .with_product_user(&account.id, pid.clone())
            .with_account(account.clone());
        let sdk = sdk_with(world);
        let platform = sdk.create_platform(&platform_options(None)).unwrap();

        platform
            .auth()
            .login(login_options(LoginCredentialType::ExchangeCode, "abc"), Box::new(|_| {}));
        platform.tick();
        let token = platform.auth().copy_id_token(&account.id).unwrap();
        platform.connect().login(
            ConnectLoginOptions {
                credentials: ConnectCredentials {
                    credential_type: ExternalCredentialType::EpicIdToken,
                    token: token.json_web_token.clone(),
                },
            },
            Box::new(|_| {}),
        );
        platform.tick();

        let notified = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&notified);
        let id = platform
            .connect()
            .add_notify_auth_expiration(Arc::new(move |info: &AuthExpirationCallbackInfo| {
                sink.lock().push(info.local_user_id.clone());
            }));
        assert!(id.is_valid());

        sdk.expire_connect_auth(&pid);
        assert!(notified.lock().is_empty());
        platform.tick();
        assert_eq!(notified.lock().as_slice(), &[pid]);
    }
}
