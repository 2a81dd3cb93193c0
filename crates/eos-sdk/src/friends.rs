//! Friends list of an account.

use crate::callback::Callback;
use crate::ids::EpicAccountId;
use crate::result::EosResult;

#[derive(Debug, Clone)]
pub struct QueryFriendsCallbackInfo {
    pub result: EosResult,
    pub local_user_id: EpicAccountId,
}

pub trait FriendsInterface: Send + Sync {
    /// Refresh the cached friends list of `local_user_id`.
    fn query_friends(
        &self,
        local_user_id: &EpicAccountId,
        callback: Callback<QueryFriendsCallbackInfo>,
    );

    /// Number of friends in the cache from the last successful query.
    fn friends_count(&self, local_user_id: &EpicAccountId) -> usize;

    fn friend_at_index(&self, local_user_id: &EpicAccountId, index: usize) -> Option<EpicAccountId>;
}
