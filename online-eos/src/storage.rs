//! Cloud save games on player data storage.

use std::sync::Arc;

use eos_sdk::storage::{
    DEFAULT_CHUNK_LENGTH, MAX_FILE_SIZE, MAX_FILENAME_LENGTH, ReadFileCallbackInfo,
    ReadFileDataInfo, ReadFileOptions, ReadResult, WriteFileCallbackInfo, WriteFileOptions, WriteResult,
};
use eos_sdk::EosResult;
use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::context::PlatformContext;
use crate::error::{ConfigError, Error, Result};
use crate::types::LocalUser;

/// Reject names the service would refuse or that look like paths.
pub fn validate_save_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_argument("empty save game name"));
    }
    if name.chars().count() > MAX_FILENAME_LENGTH {
        return Err(Error::invalid_argument(format!(
            "save game name longer than {} characters",
            MAX_FILENAME_LENGTH
        )));
    }
    if name.contains(['/', '\\']) || name.chars().any(char::is_control) {
        return Err(Error::invalid_argument(format!(
            "save game name contains a path separator or control character: {:?}",
            name
        )));
    }
    Ok(())
}

fn check_storage(ctx: &PlatformContext) -> Result<()> {
    if !ctx.storage_enabled() {
        return Err(Error::Config(ConfigError::InvalidEncryptionKey));
    }
    Ok(())
}

/// Read the save game `name`. A save that does not exist yet reads as empty.
#[instrument(skip(ctx))]
pub fn get_save_game(ctx: &PlatformContext, user: LocalUser, name: &str) -> Result<Vec<u8>> {
    validate_save_name(name)?;
    check_storage(ctx)?;
    let product_user = ctx.product_user_id(user)?;

    let buffer = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&buffer);
    let info: ReadFileCallbackInfo = ctx.call("read_file", |platform, done| {
        platform.player_data_storage().read_file(
            &product_user,
            ReadFileOptions {
                filename: name.to_string(),
                read_chunk_length_bytes: DEFAULT_CHUNK_LENGTH,
            },
            Box::new(move |chunk: &ReadFileDataInfo<'_>| {
                sink.lock().extend_from_slice(chunk.data);
                ReadResult::ContinueReading
            }),
            Box::new(move |info| done.complete(info)),
        );
    })?;

    if info.result == EosResult::NotFound {
        debug!("Save game does not exist yet");
        return Ok(Vec::new());
    }
    Error::check("read_file", info.result)?;

    let data = std::mem::take(&mut *buffer.lock());
    debug!(bytes = data.len(), "Save game read");
    Ok(data)
}

/// Write `data` as the save game `name`, streamed in chunks.
#[instrument(skip(ctx, data), fields(bytes = data.len()))]
pub fn set_save_game(ctx: &PlatformContext, user: LocalUser, name: &str, data: &[u8]) -> Result<()> {
    validate_save_name(name)?;
    if data.len() > MAX_FILE_SIZE {
        return Err(Error::invalid_argument(format!(
            "save game larger than {} bytes",
            MAX_FILE_SIZE
        )));
    }
    check_storage(ctx)?;
    let product_user = ctx.product_user_id(user)?;

    let contents = data.to_vec();
    let mut offset = 0;
    let writer = move |chunk: &mut Vec<u8>, max_len: usize| {
        let end = (offset + max_len).min(contents.len());
        chunk.extend_from_slice(&contents[offset..end]);
        offset = end;
        if offset == contents.len() {
            WriteResult::CompleteRequest
        } else {
            WriteResult::ContinueWriting
        }
    };
    let info: WriteFileCallbackInfo = ctx.call("write_file", |platform, done| {
        platform.player_data_storage().write_file(
            &product_user,
            WriteFileOptions {
                filename: name.to_string(),
                chunk_length_bytes: DEFAULT_CHUNK_LENGTH,
            },
            Box::new(writer),
            Box::new(move |info| done.complete(info)),
        );
    })?;
    Error::check("write_file", info.result)?;
    debug!("Save game written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("slot1", true)]
    #[case("", false)]
    #[case("saves/slot1", false)]
    #[case("..\\slot1", false)]
    #[case("slot\n1", false)]
    fn test_validate_save_name(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(validate_save_name(name).is_ok(), valid);
    }

    #[test]
    fn test_name_length_limit() {
        assert!(validate_save_name(&"a".repeat(MAX_FILENAME_LENGTH)).is_ok());
        assert!(validate_save_name(&"a".repeat(MAX_FILENAME_LENGTH + 1)).is_err());
    }
}
