//! online-eos: online platform adapter for a host engine.
//!
//! Exposes account login, friends, presence, achievements, stats and cloud
//! saves through the fixed [`OnlinePlatform`] plugin surface, on top of the
//! callback-driven SDK modeled by `eos-sdk`.
//!
//! ## Layout
//!
//! - [`credentials`] - which first-stage login to attempt
//! - [`identity`] - two-stage identity linking state machine
//! - [`social`], [`achievements`], [`stats`], [`storage`] - service queries
//! - [`bridge`] - blocking calls over the callback pump
//! - [`lifecycle`] - per-frame tick and application status
//! - [`platform`] - the host-facing facade
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use eos_sdk::sim::{SimWorld, SimulatedSdk};
//! use online_eos::{
//!     EosSettings, FrameSignals, HostEnvironment, LocalUser, OnlinePlatform, OnlinePlatformEos,
//!     RuntimeOptions,
//! };
//!
//! let sdk = Arc::new(SimulatedSdk::new(SimWorld::new()));
//! let mut platform = OnlinePlatformEos::new(
//!     sdk,
//!     EosSettings::from_env(),
//!     RuntimeOptions::default(),
//!     HostEnvironment::from_process(),
//! );
//! if platform.initialize() {
//!     platform.user_login(LocalUser::PRIMARY);
//!     platform.on_update(FrameSignals::foreground());
//! }
//! ```

pub mod achievements;
pub mod bridge;
pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod logging;
pub mod platform;
pub mod social;
pub mod stats;
pub mod storage;
pub mod types;

pub use config::{EosSettings, HostEnvironment, RuntimeOptions};
pub use error::{ConfigError, Error, Result};
pub use identity::IdentityState;
pub use lifecycle::FrameSignals;
pub use platform::{OnlinePlatform, OnlinePlatformEos};
pub use types::{LocalUser, OnlineAchievement, OnlinePresence, OnlineUser};
