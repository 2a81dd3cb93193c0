//! SDK log categories, levels and the log callback.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// SDK log categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum LogCategory {
    /// Low level logs unrelated to specific services
    Core,
    Auth,
    Friends,
    Presence,
    UserInfo,
    HttpSerialization,
    Ecom,
    P2P,
    Sessions,
    RateLimiter,
    PlayerDataStorage,
    Analytics,
    Messaging,
    Connect,
    Overlay,
    Achievements,
    Stats,
    Ui,
    Lobby,
    Leaderboards,
    /// Keychain used by the auth interface for persistent credentials
    Keychain,
    IntegratedPlatform,
    TitleStorage,
    Mods,
    AntiCheat,
    Reports,
    Sanctions,
    ProgressionSnapshots,
    Kws,
    Rtc,
    RtcAdmin,
    CustomInvites,
    /// Not a real category: sets the level for every category at once.
    AllCategories,
}

impl LogCategory {
    /// Category name as it appears on SDK log messages.
    pub fn sdk_name(&self) -> String {
        match self {
            Self::Core => "LogEOS".to_string(),
            Self::AllCategories => "LogEOSAll".to_string(),
            other => format!("LogEOS{}", other),
        }
    }
}

/// SDK log levels, ordered by verbosity.
///
/// A message is delivered if its level is at or below the level configured
/// for its category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum LogLevel {
    Off = 0,
    Fatal = 100,
    Error = 200,
    Warning = 300,
    Info = 400,
    Verbose = 500,
    VeryVerbose = 600,
}

/// One message emitted by the SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    /// Category name, e.g. `LogEOSAuth`.
    pub category: String,
    pub message: String,
    pub level: LogLevel,
}

/// Receives SDK log messages. May be invoked from any thread.
pub type LogCallback = Arc<dyn Fn(&LogMessage) + Send + Sync + 'static>;
