//! Core login credential types.

use eos_sdk::EosResult;
use eos_sdk::auth::{AuthScopeFlags, Credentials, LoginCredentialType, LoginOptions};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Account login methods understood by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum LoginMethod {
    /// One-time code injected by the launcher.
    ExchangeCode,
    /// Developer authentication tool.
    Developer,
    /// Refresh token from the local keychain; no user interaction.
    PersistentAuth,
    /// Interactive login through the account portal.
    AccountPortal,
}

impl LoginMethod {
    pub fn credential_type(self) -> LoginCredentialType {
        match self {
            Self::ExchangeCode => LoginCredentialType::ExchangeCode,
            Self::Developer => LoginCredentialType::Developer,
            Self::PersistentAuth => LoginCredentialType::PersistentAuth,
            Self::AccountPortal => LoginCredentialType::AccountPortal,
        }
    }
}

/// A resolved first-stage login attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginPlan {
    pub method: LoginMethod,
    pub id: Option<String>,
    pub token: Option<String>,
}

impl std::fmt::Debug for LoginPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginPlan")
            .field("method", &self.method)
            .field("id", &self.id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl LoginPlan {
    pub fn persistent() -> Self {
        Self {
            method: LoginMethod::PersistentAuth,
            id: None,
            token: None,
        }
    }

    pub fn account_portal() -> Self {
        Self {
            method: LoginMethod::AccountPortal,
            id: None,
            token: None,
        }
    }

    pub fn exchange_code(code: impl Into<String>) -> Self {
        Self {
            method: LoginMethod::ExchangeCode,
            id: None,
            token: Some(code.into()),
        }
    }

    pub fn developer(host: impl Into<String>, credential_name: impl Into<String>) -> Self {
        Self {
            method: LoginMethod::Developer,
            id: Some(host.into()),
            token: Some(credential_name.into()),
        }
    }

    pub fn login_options(&self) -> LoginOptions {
        LoginOptions {
            credentials: Credentials {
                id: self.id.clone(),
                token: self.token.clone(),
                credential_type: self.method.credential_type(),
            },
            scope_flags: AuthScopeFlags::default(),
        }
    }
}

/// Whether a failed first-stage login means the cached credential is stale
/// and must be scrubbed before an interactive retry.
pub fn requires_relogin(method: LoginMethod, result: EosResult) -> bool {
    match result {
        EosResult::InvalidAuth | EosResult::AuthExpired | EosResult::AuthInvalidRefreshToken => {
            true
        }
        EosResult::NotFound => method == LoginMethod::PersistentAuth,
        _ => false,
    }
}
