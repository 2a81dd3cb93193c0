//! Game-service identity (federated from an external credential).

use crate::callback::{Callback, NotificationId, Notify};
use crate::ids::{ContinuanceToken, ProductUserId};
use crate::result::EosResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalCredentialType {
    /// Account access token.
    Epic,
    /// Account id token from `AuthInterface::copy_id_token`.
    EpicIdToken,
    DeviceIdAccessToken,
}

#[derive(Clone)]
pub struct ConnectCredentials {
    pub credential_type: ExternalCredentialType,
    pub token: String,
}

impl std::fmt::Debug for ConnectCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectCredentials")
            .field("credential_type", &self.credential_type)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ConnectLoginOptions {
    pub credentials: ConnectCredentials,
}

#[derive(Debug, Clone)]
pub struct ConnectLoginCallbackInfo {
    pub result: EosResult,
    pub local_user_id: Option<ProductUserId>,
    /// Present when `result` is `InvalidUser`: the credential is valid but no
    /// game-service user exists for it yet.
    pub continuance_token: Option<ContinuanceToken>,
}

#[derive(Debug, Clone)]
pub struct CreateUserCallbackInfo {
    pub result: EosResult,
    pub local_user_id: Option<ProductUserId>,
}

/// Sent ahead of the game-service session expiring.
#[derive(Debug, Clone)]
pub struct AuthExpirationCallbackInfo {
    pub local_user_id: ProductUserId,
}

pub trait ConnectInterface: Send + Sync {
    fn login(&self, options: ConnectLoginOptions, callback: Callback<ConnectLoginCallbackInfo>);

    fn create_user(
        &self,
        continuance_token: ContinuanceToken,
        callback: Callback<CreateUserCallbackInfo>,
    );

    fn add_notify_auth_expiration(
        &self,
        notification: Notify<AuthExpirationCallbackInfo>,
    ) -> NotificationId;

    fn remove_notify_auth_expiration(&self, id: NotificationId);

    fn is_logged_in(&self, local_user_id: &ProductUserId) -> bool;
}
