//! Account profile lookups.

use crate::callback::Callback;
use crate::ids::EpicAccountId;
use crate::memory::SdkAllocation;
use crate::result::EosResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub user_id: EpicAccountId,
    pub country: Option<String>,
    pub display_name: Option<String>,
    pub preferred_language: Option<String>,
    pub nickname: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QueryUserInfoCallbackInfo {
    pub result: EosResult,
    pub local_user_id: EpicAccountId,
    pub target_user_id: EpicAccountId,
}

pub trait UserInfoInterface: Send + Sync {
    fn query_user_info(
        &self,
        local_user_id: &EpicAccountId,
        target_user_id: &EpicAccountId,
        callback: Callback<QueryUserInfoCallbackInfo>,
    );

    fn copy_user_info(
        &self,
        local_user_id: &EpicAccountId,
        target_user_id: &EpicAccountId,
    ) -> Result<SdkAllocation<UserInfo>, EosResult>;
}
