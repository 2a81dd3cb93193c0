//! eos-sdk: typed boundary over the online services SDK.
//!
//! The SDK is callback driven: every remote operation takes an owned
//! completion closure which the runtime invokes from inside
//! [`Platform::tick`]. Nothing is delivered between ticks.
//!
//! ## Core Types
//!
//! - [`Sdk`] - process-level entry point (initialize, shutdown, logging)
//! - [`Platform`] - one platform instance; owns every service interface
//! - [`EosResult`] - result code carried by every callback
//! - [`EpicAccountId`] / [`ProductUserId`] - account and game-service identities
//! - [`SdkAllocation`] - RAII guard for structures copied out of the SDK cache
//!
//! ## Service Interfaces
//!
//! - [`auth::AuthInterface`] - account login, logout, persistent auth
//! - [`connect::ConnectInterface`] - game-service login and user creation
//! - [`friends::FriendsInterface`], [`user_info::UserInfoInterface`],
//!   [`presence::PresenceInterface`] - social graph
//! - [`achievements::AchievementsInterface`], [`stats::StatsInterface`]
//! - [`storage::PlayerDataStorageInterface`] - per-player cloud files
//!
//! ## Simulation
//!
//! - [`sim::SimulatedSdk`] - deterministic in-process runtime used by tests
//!   and tooling

pub mod achievements;
pub mod auth;
pub mod callback;
pub mod connect;
pub mod friends;
pub mod ids;
pub mod logging;
pub mod memory;
pub mod platform;
pub mod presence;
pub mod result;
pub mod sim;
pub mod stats;
pub mod storage;
pub mod user_info;

pub use callback::{Callback, NotificationId, Notify};
pub use ids::{ContinuanceToken, EpicAccountId, IdError, ProductUserId};
pub use logging::{LogCallback, LogCategory, LogLevel, LogMessage};
pub use memory::{AllocationCounter, SdkAllocation};
pub use platform::{
    ApplicationStatus, ClientCredentials, InitializeOptions, NetworkStatus, Platform,
    PlatformFlags, PlatformOptions, Sdk,
};
pub use result::EosResult;
