//! First-stage login credentials.
//!
//! # Architecture
//!
//! - [`LaunchArgs`]: Launch argument lookup (`-KEY=value` / `-KEY value`)
//! - [`LoginMethod`]: The account login methods the adapter supports
//! - [`LoginPlan`]: A resolved first-stage login attempt
//! - [`CredentialResolver`]: Picks the plan from launch arguments
//! - [`requires_relogin`]: Stale credential classification

mod launch_args;
mod resolver;
mod types;

pub use launch_args::LaunchArgs;
pub use resolver::{AUTH_LOGIN, AUTH_PASSWORD, AUTH_TYPE, CredentialResolver};
pub use types::{LoginMethod, LoginPlan, requires_relogin};
