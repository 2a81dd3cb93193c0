//! SDK result codes.

use std::fmt;

/// Result code carried by every SDK callback and synchronous call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EosResult {
    Success,
    NoConnection,
    InvalidCredentials,
    InvalidUser,
    InvalidAuth,
    AccessDenied,
    TooManyRequests,
    AlreadyPending,
    InvalidParameters,
    InvalidRequest,
    NotConfigured,
    AlreadyConfigured,
    NotImplemented,
    NotFound,
    TimedOut,
    Canceled,
    InvalidState,
    LimitExceeded,
    UnexpectedError,
    AuthExpired,
    AuthExchangeCodeNotFound,
    AuthInvalidRefreshToken,
    AuthUserInterfaceRequired,
    ConnectExternalTokenValidationFailed,
    ConnectUserAlreadyExists,
    ConnectAuthExpired,
    PlayerDataStorageFilenameInvalid,
    PlayerDataStorageFileSizeTooLarge,
    PlayerDataStorageEncryptionKeyNotSet,
    PlayerDataStorageUserThrottled,
}

impl EosResult {
    /// Stable SDK name of the result code, used in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "EOS_Success",
            Self::NoConnection => "EOS_NoConnection",
            Self::InvalidCredentials => "EOS_InvalidCredentials",
            Self::InvalidUser => "EOS_InvalidUser",
            Self::InvalidAuth => "EOS_InvalidAuth",
            Self::AccessDenied => "EOS_AccessDenied",
            Self::TooManyRequests => "EOS_TooManyRequests",
            Self::AlreadyPending => "EOS_AlreadyPending",
            Self::InvalidParameters => "EOS_InvalidParameters",
            Self::InvalidRequest => "EOS_InvalidRequest",
            Self::NotConfigured => "EOS_NotConfigured",
            Self::AlreadyConfigured => "EOS_AlreadyConfigured",
            Self::NotImplemented => "EOS_NotImplemented",
            Self::NotFound => "EOS_NotFound",
            Self::TimedOut => "EOS_TimedOut",
            Self::Canceled => "EOS_Canceled",
            Self::InvalidState => "EOS_InvalidState",
            Self::LimitExceeded => "EOS_LimitExceeded",
            Self::UnexpectedError => "EOS_UnexpectedError",
            Self::AuthExpired => "EOS_Auth_Expired",
            Self::AuthExchangeCodeNotFound => "EOS_Auth_ExchangeCodeNotFound",
            Self::AuthInvalidRefreshToken => "EOS_Auth_InvalidRefreshToken",
            Self::AuthUserInterfaceRequired => "EOS_Auth_UserInterfaceRequired",
            Self::ConnectExternalTokenValidationFailed => {
                "EOS_Connect_ExternalTokenValidationFailed"
            }
            Self::ConnectUserAlreadyExists => "EOS_Connect_UserAlreadyExists",
            Self::ConnectAuthExpired => "EOS_Connect_AuthExpired",
            Self::PlayerDataStorageFilenameInvalid => "EOS_PlayerDataStorage_FilenameInvalid",
            Self::PlayerDataStorageFileSizeTooLarge => "EOS_PlayerDataStorage_FileSizeTooLarge",
            Self::PlayerDataStorageEncryptionKeyNotSet => {
                "EOS_PlayerDataStorage_EncryptionKeyNotSet"
            }
            Self::PlayerDataStorageUserThrottled => "EOS_PlayerDataStorage_UserThrottled",
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Convert into a `Result`, keeping the code as the error.
    #[inline]
    pub fn ok(self) -> Result<(), EosResult> {
        if self.is_success() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for EosResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for EosResult {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EosResult::Success, "EOS_Success")]
    #[case(EosResult::AuthExpired, "EOS_Auth_Expired")]
    #[case(EosResult::InvalidUser, "EOS_InvalidUser")]
    #[case(
        EosResult::PlayerDataStorageFilenameInvalid,
        "EOS_PlayerDataStorage_FilenameInvalid"
    )]
    fn test_result_names(#[case] result: EosResult, #[case] name: &str) {
        assert_eq!(result.as_str(), name);
        assert_eq!(result.to_string(), name);
    }

    #[test]
    fn test_ok_conversion() {
        assert!(EosResult::Success.ok().is_ok());
        assert_eq!(EosResult::NotFound.ok(), Err(EosResult::NotFound));
    }
}
