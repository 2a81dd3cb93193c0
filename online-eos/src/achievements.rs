//! Achievement sync, unlock and progress.

use std::collections::HashMap;

use eos_sdk::achievements::{
    QueryDefinitionsCallbackInfo, QueryPlayerAchievementsCallbackInfo,
};
use eos_sdk::stats::IngestData;
use eos_sdk::ProductUserId;
use tracing::{debug, error, info, instrument, warn};

use crate::context::PlatformContext;
use crate::error::{Error, Result};
use crate::types::{LocalUser, OnlineAchievement};

/// Fire both prerequisite queries without waiting, so the caches are warm
/// by the time the host asks.
pub(crate) fn prefetch(ctx: &PlatformContext, user: LocalUser, product_user: &ProductUserId) {
    let achievements = ctx.platform().achievements();
    achievements.query_definitions(
        product_user,
        Box::new(move |info| {
            if info.result.is_success() {
                debug!(%user, "Achievement definitions prefetched");
            } else {
                warn!(%user, result = %info.result, "Achievement definitions prefetch failed");
            }
        }),
    );
    achievements.query_player_achievements(
        product_user,
        product_user,
        Box::new(move |info| {
            if info.result.is_success() {
                debug!(%user, "Player achievements prefetched");
            } else {
                warn!(%user, result = %info.result, "Player achievements prefetch failed");
            }
        }),
    );
}

/// Definitions and player progress merged by achievement id.
///
/// Player records without a matching definition are skipped.
#[instrument(skip(ctx))]
pub fn fetch_achievements(ctx: &PlatformContext, user: LocalUser) -> Result<Vec<OnlineAchievement>> {
    let product_user = ctx.product_user_id(user)?;

    let info: QueryDefinitionsCallbackInfo = ctx.call("query_definitions", |platform, done| {
        platform
            .achievements()
            .query_definitions(&product_user, Box::new(move |info| done.complete(info)));
    })?;
    Error::check("query_definitions", info.result)?;

    let info: QueryPlayerAchievementsCallbackInfo =
        ctx.call("query_player_achievements", |platform, done| {
            platform.achievements().query_player_achievements(
                &product_user,
                &product_user,
                Box::new(move |info| done.complete(info)),
            );
        })?;
    Error::check("query_player_achievements", info.result)?;

    let achievements = ctx.platform().achievements();
    let count = achievements.player_achievement_count(&product_user);
    let mut hidden_by_id: HashMap<String, bool> = HashMap::new();
    let mut merged = Vec::with_capacity(count);

    for index in 0..count {
        let record = match achievements.copy_player_achievement_by_index(
            &product_user,
            &product_user,
            index,
        ) {
            Ok(record) => record,
            Err(result) => {
                warn!(index, result = %result, "Failed to copy player achievement");
                continue;
            }
        };

        let is_hidden = match hidden_by_id.get(&record.achievement_id) {
            Some(hidden) => *hidden,
            None => match achievements.copy_definition_by_id(&record.achievement_id) {
                Ok(definition) => {
                    hidden_by_id.insert(record.achievement_id.clone(), definition.is_hidden);
                    definition.is_hidden
                }
                Err(result) => {
                    warn!(achievement = %record.achievement_id, result = %result, "No definition for achievement");
                    continue;
                }
            },
        };

        merged.push(OnlineAchievement {
            identifier: record.achievement_id.clone(),
            name: record.display_name.clone(),
            description: record.description.clone(),
            is_hidden,
            progress: record.progress,
            unlock_time: record.unlock_time,
        });
    }

    debug!(count = merged.len(), "Achievements merged");
    Ok(merged)
}

/// Submit an unlock. The outcome is only logged; callers cannot learn it.
#[instrument(skip(ctx))]
pub fn unlock(ctx: &PlatformContext, user: LocalUser, achievement_id: &str) -> Result<()> {
    if achievement_id.trim().is_empty() {
        return Err(Error::invalid_argument("empty achievement id"));
    }
    let product_user = ctx.product_user_id(user)?;

    let id = achievement_id.to_string();
    ctx.platform().achievements().unlock_achievements(
        &product_user,
        vec![id.clone()],
        Box::new(move |info| {
            if info.result.is_success() {
                info!(achievement = %id, count = info.achievements_count, "Achievement unlocked");
            } else {
                error!(achievement = %id, result = %info.result, "Achievement unlock failed");
            }
        }),
    );
    Ok(())
}

/// Ingested stat amount for a progress fraction.
pub fn progress_to_stat(progress: f32) -> i32 {
    (progress.clamp(0.0, 1.0) * 100.0).round() as i32
}

/// Report progress: a full value unlocks, anything less is ingested as the
/// stat named after the achievement, in percent.
#[instrument(skip(ctx))]
pub fn unlock_progress(
    ctx: &PlatformContext,
    user: LocalUser,
    achievement_id: &str,
    progress: f32,
) -> Result<()> {
    if !progress.is_finite() {
        return Err(Error::invalid_argument("progress is not a number"));
    }
    if progress >= 1.0 {
        return unlock(ctx, user, achievement_id);
    }
    if achievement_id.trim().is_empty() {
        return Err(Error::invalid_argument("empty achievement id"));
    }
    let product_user = ctx.product_user_id(user)?;

    let id = achievement_id.to_string();
    let amount = progress_to_stat(progress);
    ctx.platform().stats().ingest_stat(
        &product_user,
        &product_user,
        vec![IngestData {
            stat_name: id.clone(),
            ingest_amount: amount,
        }],
        Box::new(move |info| {
            if info.result.is_success() {
                debug!(achievement = %id, amount, "Achievement progress ingested");
            } else {
                error!(achievement = %id, result = %info.result, "Achievement progress ingest failed");
            }
        }),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0)]
    #[case(0.5, 50)]
    #[case(0.126, 13)]
    #[case(-1.0, 0)]
    #[case(0.999, 100)]
    fn test_progress_to_stat(#[case] progress: f32, #[case] expected: i32) {
        assert_eq!(progress_to_stat(progress), expected);
    }
}
