//! Login method resolver.
//!
//! Resolves which first-stage login to attempt from the launch arguments.

use std::str::FromStr;

use tracing::{debug, warn};

use super::launch_args::LaunchArgs;
use super::types::{LoginMethod, LoginPlan};

/// Login method hint injected by the launcher.
pub const AUTH_TYPE: &str = "AUTH_TYPE";

/// Exchange code, or developer credential name.
pub const AUTH_PASSWORD: &str = "AUTH_PASSWORD";

/// Developer authentication tool host.
pub const AUTH_LOGIN: &str = "AUTH_LOGIN";

/// Resolves the first-stage login for a launch.
pub struct CredentialResolver {
    args: LaunchArgs,
}

impl CredentialResolver {
    pub fn new(args: LaunchArgs) -> Self {
        Self { args }
    }

    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        Self::new(LaunchArgs::parse(args))
    }

    /// Pick the login to attempt.
    ///
    /// # Corner Cases
    /// - No `AUTH_TYPE`, or one that does not parse: persistent login
    /// - Exchange code without `AUTH_PASSWORD`: persistent login
    /// - Developer without `AUTH_LOGIN` or `AUTH_PASSWORD`: persistent login
    pub fn resolve(&self) -> LoginPlan {
        let Some(raw_method) = self.args.get(AUTH_TYPE) else {
            debug!("No login method injected, using persistent credential");
            return LoginPlan::persistent();
        };
        let Ok(method) = LoginMethod::from_str(raw_method.trim()) else {
            warn!(method = %raw_method, "Unknown login method, using persistent credential");
            return LoginPlan::persistent();
        };

        let plan = match method {
            LoginMethod::ExchangeCode => self.args.get(AUTH_PASSWORD).map(LoginPlan::exchange_code),
            LoginMethod::Developer => self
                .args
                .get(AUTH_LOGIN)
                .zip(self.args.get(AUTH_PASSWORD))
                .map(|(host, name)| LoginPlan::developer(host, name)),
            LoginMethod::PersistentAuth => Some(LoginPlan::persistent()),
            LoginMethod::AccountPortal => Some(LoginPlan::account_portal()),
        };

        match plan {
            Some(plan) => {
                debug!(method = %plan.method, "Resolved login method");
                plan
            }
            None => {
                warn!(method = %method, "Incomplete login arguments, using persistent credential");
                LoginPlan::persistent()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[], LoginMethod::PersistentAuth)]
    #[case(&["-AUTH_TYPE=exchangecode", "-AUTH_PASSWORD=abc123"], LoginMethod::ExchangeCode)]
    #[case(&["-AUTH_TYPE=exchangecode"], LoginMethod::PersistentAuth)]
    #[case(&["-AUTH_TYPE=bogus", "-AUTH_PASSWORD=abc123"], LoginMethod::PersistentAuth)]
    #[case(&["-AUTH_PASSWORD=abc123"], LoginMethod::PersistentAuth)]
    #[case(&["-AUTH_TYPE", "developer", "-AUTH_LOGIN", "localhost:6547", "-AUTH_PASSWORD", "dev"], LoginMethod::Developer)]
    #[case(&["-AUTH_TYPE=developer", "-AUTH_PASSWORD=dev"], LoginMethod::PersistentAuth)]
    #[case(&["-auth_type=AccountPortal"], LoginMethod::AccountPortal)]
    fn test_resolve(#[case] args: &[&str], #[case] expected: LoginMethod) {
        let plan = CredentialResolver::from_args(args).resolve();
        assert_eq!(plan.method, expected);
    }

    #[test]
    fn test_exchange_code_carries_token() {
        let plan = CredentialResolver::from_args(&["-AUTH_TYPE=exchangecode", "-AUTH_PASSWORD=abc123"])
            .resolve();
        assert_eq!(plan.token.as_deref(), Some("abc123"));
        assert_eq!(plan.id, None);
    }

    #[test]
    fn test_developer_carries_host_and_name() {
        let plan = CredentialResolver::from_args(&[
            "-AUTH_TYPE=developer",
            "-AUTH_LOGIN=localhost:6547",
            "-AUTH_PASSWORD=dev",
        ])
        .resolve();
        assert_eq!(plan.id.as_deref(), Some("localhost:6547"));
        assert_eq!(plan.token.as_deref(), Some("dev"));
    }
}
