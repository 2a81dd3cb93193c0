//! Player statistics.

use chrono::{DateTime, Utc};

use crate::callback::Callback;
use crate::ids::ProductUserId;
use crate::memory::SdkAllocation;
use crate::result::EosResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestData {
    pub stat_name: String,
    pub ingest_amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    pub name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub value: i32,
}

#[derive(Debug, Clone)]
pub struct IngestStatCallbackInfo {
    pub result: EosResult,
    pub local_user_id: ProductUserId,
    pub target_user_id: ProductUserId,
}

#[derive(Debug, Clone)]
pub struct QueryStatsCallbackInfo {
    pub result: EosResult,
    pub local_user_id: ProductUserId,
    pub target_user_id: ProductUserId,
}

pub trait StatsInterface: Send + Sync {
    fn ingest_stat(
        &self,
        local_user_id: &ProductUserId,
        target_user_id: &ProductUserId,
        stats: Vec<IngestData>,
        callback: Callback<IngestStatCallbackInfo>,
    );

    /// Query stats of `target_user_id`; `None` queries every stat.
    fn query_stats(
        &self,
        local_user_id: &ProductUserId,
        target_user_id: &ProductUserId,
        stat_names: Option<Vec<String>>,
        callback: Callback<QueryStatsCallbackInfo>,
    );

    fn stats_count(&self, target_user_id: &ProductUserId) -> usize;

    fn copy_stat_by_name(
        &self,
        target_user_id: &ProductUserId,
        name: &str,
    ) -> Result<SdkAllocation<Stat>, EosResult>;
}
