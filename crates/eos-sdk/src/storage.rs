//! Per-player cloud file storage.
//!
//! Transfers are chunked: reads push chunks to a data callback, writes pull
//! chunks from one.

use crate::callback::Callback;
use crate::ids::ProductUserId;
use crate::result::EosResult;

/// Longest accepted file name.
pub const MAX_FILENAME_LENGTH: usize = 64;

/// Largest accepted file.
pub const MAX_FILE_SIZE: usize = 64 * 1024 * 1024;

/// Default chunk size for transfers.
pub const DEFAULT_CHUNK_LENGTH: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadResult {
    ContinueReading,
    FailRequest,
    CancelRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    /// The buffer holds the next chunk; more will follow.
    ContinueWriting,
    /// The buffer holds the final chunk (possibly empty).
    CompleteRequest,
    FailRequest,
    CancelRequest,
}

/// One chunk delivered while reading a file.
#[derive(Debug)]
pub struct ReadFileDataInfo<'a> {
    pub filename: &'a str,
    pub total_file_size: usize,
    pub is_last_chunk: bool,
    pub data: &'a [u8],
}

pub type ReadDataCallback = Box<dyn FnMut(&ReadFileDataInfo<'_>) -> ReadResult + Send + 'static>;

/// Fill the buffer with at most `max_len` bytes of the next chunk.
pub type WriteDataCallback =
    Box<dyn FnMut(&mut Vec<u8>, usize) -> WriteResult + Send + 'static>;

#[derive(Debug, Clone)]
pub struct ReadFileOptions {
    pub filename: String,
    pub read_chunk_length_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct WriteFileOptions {
    pub filename: String,
    pub chunk_length_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ReadFileCallbackInfo {
    pub result: EosResult,
    pub local_user_id: ProductUserId,
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct WriteFileCallbackInfo {
    pub result: EosResult,
    pub local_user_id: ProductUserId,
    pub filename: String,
}

pub trait PlayerDataStorageInterface: Send + Sync {
    fn read_file(
        &self,
        local_user_id: &ProductUserId,
        options: ReadFileOptions,
        on_data: ReadDataCallback,
        callback: Callback<ReadFileCallbackInfo>,
    );

    fn write_file(
        &self,
        local_user_id: &ProductUserId,
        options: WriteFileOptions,
        on_data: WriteDataCallback,
        callback: Callback<WriteFileCallbackInfo>,
    );
}
