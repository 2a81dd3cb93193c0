//! Player stats.

use eos_sdk::stats::{IngestData, IngestStatCallbackInfo, QueryStatsCallbackInfo};
use tracing::{debug, instrument};

use crate::context::PlatformContext;
use crate::error::{Error, Result};
use crate::types::LocalUser;

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::invalid_argument("empty stat name"));
    }
    Ok(())
}

/// Current value of the stat `name`.
#[instrument(skip(ctx))]
pub fn get_stat(ctx: &PlatformContext, user: LocalUser, name: &str) -> Result<f32> {
    check_name(name)?;
    let product_user = ctx.product_user_id(user)?;

    let info: QueryStatsCallbackInfo = ctx.call("query_stats", |platform, done| {
        platform.stats().query_stats(
            &product_user,
            &product_user,
            Some(vec![name.to_string()]),
            Box::new(move |info| done.complete(info)),
        );
    })?;
    Error::check("query_stats", info.result)?;

    let stat = ctx
        .platform()
        .stats()
        .copy_stat_by_name(&product_user, name)
        .map_err(|result| Error::sdk("copy_stat_by_name", result))?;
    Ok(stat.value as f32)
}

/// Ingest `value` into the stat `name`, rounded to an integer amount.
#[instrument(skip(ctx))]
pub fn set_stat(ctx: &PlatformContext, user: LocalUser, name: &str, value: f32) -> Result<()> {
    check_name(name)?;
    if !value.is_finite() {
        return Err(Error::invalid_argument("stat value is not a number"));
    }
    let product_user = ctx.product_user_id(user)?;
    let amount = value.round() as i32;

    let info: IngestStatCallbackInfo = ctx.call("ingest_stat", |platform, done| {
        platform.stats().ingest_stat(
            &product_user,
            &product_user,
            vec![IngestData {
                stat_name: name.to_string(),
                ingest_amount: amount,
            }],
            Box::new(move |info| done.complete(info)),
        );
    })?;
    Error::check("ingest_stat", info.result)?;
    debug!(amount, "Stat ingested");
    Ok(())
}
