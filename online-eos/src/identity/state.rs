//! Per-user identity state.

use eos_sdk::{EosResult, EpicAccountId, NotificationId, ProductUserId};
use strum::Display;

use crate::credentials::LoginMethod;

/// Progress of linking one local user into both identity domains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum IdentityState {
    #[default]
    NoIdentity,
    FirstStagePending {
        method: LoginMethod,
        fallback_used: bool,
    },
    FirstStageAuthenticated,
    SecondStagePending {
        create_attempted: bool,
    },
    Linked,
    Failed {
        reason: EosResult,
    },
}

impl IdentityState {
    /// A login is in flight; new login requests are rejected.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::FirstStagePending { .. }
                | Self::FirstStageAuthenticated
                | Self::SecondStagePending { .. }
        )
    }
}

/// Identity of one local user.
#[derive(Debug, Clone, Default)]
pub struct LocalIdentity {
    pub state: IdentityState,
    pub account_id: Option<EpicAccountId>,
    pub product_user_id: Option<ProductUserId>,
    pub(crate) auth_expiration: Option<NotificationId>,
}

impl LocalIdentity {
    pub fn is_linked(&self) -> bool {
        self.state == IdentityState::Linked && self.product_user_id.is_some()
    }
}
