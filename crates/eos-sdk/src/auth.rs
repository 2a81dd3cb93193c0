//! Account-level authentication.

use crate::callback::Callback;
use crate::ids::EpicAccountId;
use crate::memory::SdkAllocation;
use crate::result::EosResult;

/// How the account login is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginCredentialType {
    Password,
    /// One-time code injected by the launcher.
    ExchangeCode,
    /// Refresh token kept in the local keychain.
    PersistentAuth,
    DeviceCode,
    /// Credential served by the local developer authentication tool.
    Developer,
    RefreshToken,
    /// Interactive login through the account portal.
    AccountPortal,
    ExternalAuth,
}

/// Credentials for a login attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub id: Option<String>,
    pub token: Option<String>,
    pub credential_type: LoginCredentialType,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("credential_type", &self.credential_type)
            .finish()
    }
}

/// Permissions requested at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthScopeFlags {
    pub basic_profile: bool,
    pub friends_list: bool,
    pub presence: bool,
}

impl Default for AuthScopeFlags {
    fn default() -> Self {
        Self {
            basic_profile: true,
            friends_list: true,
            presence: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginOptions {
    pub credentials: Credentials,
    pub scope_flags: AuthScopeFlags,
}

#[derive(Debug, Clone)]
pub struct LoginCallbackInfo {
    pub result: EosResult,
    pub local_user_id: Option<EpicAccountId>,
}

#[derive(Debug, Clone)]
pub struct LogoutCallbackInfo {
    pub result: EosResult,
    pub local_user_id: EpicAccountId,
}

#[derive(Debug, Clone)]
pub struct DeletePersistentAuthCallbackInfo {
    pub result: EosResult,
}

/// Identity token for a logged-in account, used to federate it into the
/// game service.
#[derive(Debug, Clone)]
pub struct IdToken {
    pub account_id: EpicAccountId,
    pub json_web_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    NotLoggedIn,
    UsingLocalProfile,
    LoggedIn,
}

pub trait AuthInterface: Send + Sync {
    fn login(&self, options: LoginOptions, callback: Callback<LoginCallbackInfo>);

    fn logout(&self, local_user_id: &EpicAccountId, callback: Callback<LogoutCallbackInfo>);

    /// Remove the persistent credential from the local keychain.
    fn delete_persistent_auth(
        &self,
        refresh_token: Option<String>,
        callback: Callback<DeletePersistentAuthCallbackInfo>,
    );

    fn copy_id_token(&self, account_id: &EpicAccountId) -> Result<SdkAllocation<IdToken>, EosResult>;

    fn login_status(&self, local_user_id: &EpicAccountId) -> LoginStatus;
}
