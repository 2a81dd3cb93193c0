//! Achievement definitions and per-player progress.

use chrono::{DateTime, Utc};

use crate::callback::Callback;
use crate::ids::ProductUserId;
use crate::memory::SdkAllocation;
use crate::result::EosResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatThreshold {
    pub name: String,
    pub threshold: i32,
}

/// Static definition of an achievement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub achievement_id: String,
    pub unlocked_display_name: String,
    pub unlocked_description: String,
    pub locked_display_name: String,
    pub locked_description: String,
    pub flavor_text: String,
    pub is_hidden: bool,
    pub stat_thresholds: Vec<StatThreshold>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStatInfo {
    pub name: String,
    pub current_value: i32,
    pub threshold_value: i32,
}

/// A player's progress on one achievement.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerAchievement {
    pub achievement_id: String,
    /// Fraction in `[0, 1]`.
    pub progress: f64,
    pub unlock_time: Option<DateTime<Utc>>,
    /// Locked or unlocked display name, depending on state.
    pub display_name: String,
    pub description: String,
    pub stat_info: Vec<PlayerStatInfo>,
}

#[derive(Debug, Clone)]
pub struct QueryDefinitionsCallbackInfo {
    pub result: EosResult,
}

#[derive(Debug, Clone)]
pub struct QueryPlayerAchievementsCallbackInfo {
    pub result: EosResult,
    pub target_user_id: ProductUserId,
}

#[derive(Debug, Clone)]
pub struct UnlockAchievementsCallbackInfo {
    pub result: EosResult,
    pub user_id: ProductUserId,
    pub achievements_count: usize,
}

pub trait AchievementsInterface: Send + Sync {
    fn query_definitions(
        &self,
        local_user_id: &ProductUserId,
        callback: Callback<QueryDefinitionsCallbackInfo>,
    );

    fn definition_count(&self) -> usize;

    fn copy_definition_by_id(
        &self,
        achievement_id: &str,
    ) -> Result<SdkAllocation<Definition>, EosResult>;

    fn query_player_achievements(
        &self,
        local_user_id: &ProductUserId,
        target_user_id: &ProductUserId,
        callback: Callback<QueryPlayerAchievementsCallbackInfo>,
    );

    fn player_achievement_count(&self, target_user_id: &ProductUserId) -> usize;

    fn copy_player_achievement_by_index(
        &self,
        local_user_id: &ProductUserId,
        target_user_id: &ProductUserId,
        index: usize,
    ) -> Result<SdkAllocation<PlayerAchievement>, EosResult>;

    fn unlock_achievements(
        &self,
        user_id: &ProductUserId,
        achievement_ids: Vec<String>,
        callback: Callback<UnlockAchievementsCallbackInfo>,
    );
}
