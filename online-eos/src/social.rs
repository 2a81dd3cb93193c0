//! Friends, profiles and presence.

use eos_sdk::friends::QueryFriendsCallbackInfo;
use eos_sdk::presence::{PresenceStatus, QueryPresenceCallbackInfo};
use eos_sdk::user_info::QueryUserInfoCallbackInfo;
use eos_sdk::EpicAccountId;
use tracing::{debug, instrument, warn};

use crate::context::PlatformContext;
use crate::error::{Error, Result};
use crate::types::{LocalUser, OnlinePresence, OnlineUser};

/// Map service presence onto the host's four states.
pub fn map_presence(status: Option<PresenceStatus>) -> OnlinePresence {
    match status {
        Some(PresenceStatus::Online) => OnlinePresence::Online,
        Some(PresenceStatus::Away | PresenceStatus::ExtendedAway) => OnlinePresence::Away,
        Some(PresenceStatus::DoNotDisturb) => OnlinePresence::Busy,
        Some(PresenceStatus::Offline) => OnlinePresence::Offline,
        _ => OnlinePresence::Offline,
    }
}

/// Fetch the friends list of `user` with display names and presence.
///
/// Entries whose profile cannot be resolved are skipped. Fails when the list
/// is empty or no entry resolved.
#[instrument(skip(ctx))]
pub fn fetch_friends(ctx: &PlatformContext, user: LocalUser) -> Result<Vec<OnlineUser>> {
    let account = ctx.account_id(user)?;

    let info: QueryFriendsCallbackInfo = ctx.call("query_friends", |platform, done| {
        platform
            .friends()
            .query_friends(&account, Box::new(move |info| done.complete(info)));
    })?;
    Error::check("query_friends", info.result)?;

    let count = ctx.platform().friends().friends_count(&account);
    debug!(count, "Friends list queried");

    let mut friends = Vec::with_capacity(count);
    for index in 0..count {
        let Some(friend) = ctx.platform().friends().friend_at_index(&account, index) else {
            warn!(index, "Friend index out of range");
            continue;
        };
        match resolve_user(ctx, &account, &friend) {
            Ok(record) => friends.push(record),
            Err(e) => warn!(friend = %friend, error = %e, "Skipping friend"),
        }
    }

    if friends.is_empty() {
        return Err(Error::sdk("query_friends", eos_sdk::EosResult::NotFound));
    }
    Ok(friends)
}

/// Profile of the local account.
#[instrument(skip(ctx))]
pub fn fetch_profile(ctx: &PlatformContext, user: LocalUser) -> Result<OnlineUser> {
    let account = ctx.account_id(user)?;
    let mut profile = resolve_user(ctx, &account, &account)?;
    profile.presence = OnlinePresence::Online;
    Ok(profile)
}

/// User-info lookup followed by a presence lookup for `target`.
fn resolve_user(
    ctx: &PlatformContext,
    local: &EpicAccountId,
    target: &EpicAccountId,
) -> Result<OnlineUser> {
    let info: QueryUserInfoCallbackInfo = ctx.call("query_user_info", |platform, done| {
        platform.user_info().query_user_info(
            local,
            target,
            Box::new(move |info| done.complete(info)),
        );
    })?;
    Error::check("query_user_info", info.result)?;

    let name = {
        let user_info = ctx
            .platform()
            .user_info()
            .copy_user_info(local, target)
            .map_err(|result| Error::sdk("copy_user_info", result))?;
        user_info
            .display_name
            .clone()
            .or_else(|| user_info.nickname.clone())
            .unwrap_or_else(|| user_info.user_id.to_string())
    };

    Ok(OnlineUser {
        id: target.to_string(),
        name,
        presence: query_presence(ctx, local, target),
    })
}

fn query_presence(
    ctx: &PlatformContext,
    local: &EpicAccountId,
    target: &EpicAccountId,
) -> OnlinePresence {
    let queried: Result<QueryPresenceCallbackInfo> = ctx.call("query_presence", |platform, done| {
        platform.presence().query_presence(
            local,
            target,
            Box::new(move |info| done.complete(info)),
        );
    });
    match queried {
        Ok(info) if info.result.is_success() => {}
        Ok(info) => {
            debug!(target_user = %target, result = %info.result, "Presence query failed");
            return OnlinePresence::Offline;
        }
        Err(e) => {
            debug!(target_user = %target, error = %e, "Presence query failed");
            return OnlinePresence::Offline;
        }
    }

    let presence = ctx.platform().presence();
    if !presence.has_presence(local, target) {
        return map_presence(None);
    }
    match presence.copy_presence(local, target) {
        Ok(info) => map_presence(Some(info.status)),
        Err(_) => map_presence(None),
    }
}
