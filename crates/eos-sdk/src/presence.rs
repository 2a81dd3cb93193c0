//! Presence of remote accounts.

use crate::callback::Callback;
use crate::ids::EpicAccountId;
use crate::memory::SdkAllocation;
use crate::result::EosResult;

/// Presence status as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PresenceStatus {
    Offline,
    Online,
    Away,
    ExtendedAway,
    DoNotDisturb,
}

impl PresenceStatus {
    /// Decode the wire value; unknown values yield `None`.
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Offline),
            1 => Some(Self::Online),
            2 => Some(Self::Away),
            3 => Some(Self::ExtendedAway),
            4 => Some(Self::DoNotDisturb),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceInfo {
    pub user_id: EpicAccountId,
    pub status: PresenceStatus,
    pub product_id: Option<String>,
    pub rich_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QueryPresenceCallbackInfo {
    pub result: EosResult,
    pub local_user_id: EpicAccountId,
    pub target_user_id: EpicAccountId,
}

pub trait PresenceInterface: Send + Sync {
    fn query_presence(
        &self,
        local_user_id: &EpicAccountId,
        target_user_id: &EpicAccountId,
        callback: Callback<QueryPresenceCallbackInfo>,
    );

    /// Whether presence data for `target_user_id` is cached.
    fn has_presence(&self, local_user_id: &EpicAccountId, target_user_id: &EpicAccountId) -> bool;

    fn copy_presence(
        &self,
        local_user_id: &EpicAccountId,
        target_user_id: &EpicAccountId,
    ) -> Result<SdkAllocation<PresenceInfo>, EosResult>;
}
