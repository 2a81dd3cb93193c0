//! Adapter error types.

use eos_sdk::EosResult;
use thiserror::Error;

use crate::bridge::BridgeError;
use crate::types::LocalUser;

/// Adapter-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised inside the adapter.
///
/// None of these cross the host boundary; the facade logs them and reports
/// `false` or an empty value.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Platform is not initialized")]
    NotInitialized,

    #[error("{user} has no {identity} identity")]
    MissingIdentity {
        user: LocalUser,
        identity: &'static str,
    },

    #[error("Login already in progress for {0}")]
    LoginPending(LocalUser),

    #[error("{operation} failed: {result}")]
    Sdk {
        operation: &'static str,
        result: EosResult,
    },

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn sdk(operation: &'static str, result: EosResult) -> Self {
        Self::Sdk { operation, result }
    }

    pub fn no_account(user: LocalUser) -> Self {
        Self::MissingIdentity {
            user,
            identity: "account",
        }
    }

    pub fn no_service_identity(user: LocalUser) -> Self {
        Self::MissingIdentity {
            user,
            identity: "service",
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Turn a callback result code into `Ok` or an [`Error::Sdk`].
    pub fn check(operation: &'static str, result: EosResult) -> Result<()> {
        if result.is_success() {
            Ok(())
        } else {
            Err(Self::sdk(operation, result))
        }
    }

    /// Short-circuited locally, without any remote call.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized
                | Self::MissingIdentity { .. }
                | Self::LoginPending(_)
                | Self::InvalidArgument(_)
        )
    }

    /// Might succeed if issued again later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Sdk { result, .. } => matches!(
                result,
                EosResult::NoConnection | EosResult::TooManyRequests | EosResult::TimedOut
            ),
            Self::Bridge(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Settings validation and loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    MissingField(&'static str),

    #[error("Encryption key must be 64 hex digits")]
    InvalidEncryptionKey,

    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_classification() {
        assert!(Error::no_account(LocalUser::default()).is_precondition());
        assert!(Error::LoginPending(LocalUser::default()).is_precondition());
        assert!(!Error::sdk("query_friends", EosResult::NoConnection).is_precondition());

        assert!(Error::sdk("query_friends", EosResult::NoConnection).is_transient());
        assert!(!Error::sdk("query_friends", EosResult::InvalidAuth).is_transient());
        assert!(
            Error::from(BridgeError::TimedOut {
                label: "query_friends",
                after: Duration::from_secs(1),
            })
            .is_transient()
        );
    }

    #[test]
    fn test_check() {
        assert!(Error::check("login", EosResult::Success).is_ok());
        let err = Error::check("login", EosResult::InvalidUser).unwrap_err();
        assert_eq!(err.to_string(), "login failed: EOS_InvalidUser");
    }
}
