//! Value types exchanged with the host.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Host-side handle of a local player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalUser(pub u32);

impl LocalUser {
    /// The first local player; the only one on most platforms.
    pub const PRIMARY: LocalUser = LocalUser(0);
}

impl fmt::Display for LocalUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local user {}", self.0)
    }
}

/// Presence as seen by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum OnlinePresence {
    #[default]
    Offline,
    Online,
    Away,
    Busy,
}

/// A remote or local player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUser {
    /// Textual account id.
    pub id: String,
    pub name: String,
    pub presence: OnlinePresence,
}

/// One achievement, merged from its definition and the player's record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineAchievement {
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub is_hidden: bool,
    /// Fraction in `[0, 1]`.
    pub progress: f64,
    pub unlock_time: Option<DateTime<Utc>>,
}

impl OnlineAchievement {
    pub fn is_unlocked(&self) -> bool {
        self.unlock_time.is_some()
    }
}
