//! Blocking calls over the callback-driven SDK.
//!
//! SDK callbacks are only delivered from inside [`Platform::tick`]. A host
//! call that needs a result synchronously issues the SDK call, then blocks on
//! a completion channel while a worker task on a dedicated one-thread tokio
//! runtime keeps ticking the platform. Every wait is bounded by a timeout; a
//! callback arriving after its caller gave up is discarded.

use std::sync::Arc;
use std::time::Duration;

use eos_sdk::Platform;
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::RuntimeOptions;

/// Name of the worker thread that pumps the SDK during bridged calls.
pub const BRIDGE_THREAD_NAME: &str = "eos-bridge";

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{label} did not complete within {after:?}")]
    TimedOut {
        label: &'static str,
        after: Duration,
    },

    /// The SDK dropped the callback without invoking it, e.g. because the
    /// platform was released.
    #[error("{label} was dropped before completing")]
    Dropped { label: &'static str },

    #[error("Bridge runtime error: {0}")]
    Runtime(String),
}

impl BridgeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Sending half of a bridged call, moved into the SDK callback.
pub struct Completion<T> {
    tx: oneshot::Sender<T>,
}

impl<T> Completion<T> {
    /// Hand the callback payload to the waiting caller.
    pub fn complete(self, value: T) {
        // The caller may already have timed out.
        let _ = self.tx.send(value);
    }
}

pub struct SyncBridge {
    runtime: Option<Runtime>,
    timeout: Duration,
    pump_interval: Duration,
}

impl SyncBridge {
    pub fn new(options: &RuntimeOptions) -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(BRIDGE_THREAD_NAME)
            .enable_time()
            .build()?;
        Ok(Self {
            runtime: Some(runtime),
            timeout: options.bridge_timeout,
            pump_interval: options.pump_interval,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue an SDK call and block until its callback fires.
    ///
    /// `dispatch` receives the [`Completion`] to move into the SDK callback.
    /// Must not be called from inside a tokio runtime.
    pub fn call<T, F>(
        &self,
        label: &'static str,
        platform: &Arc<dyn Platform>,
        dispatch: F,
    ) -> Result<T, BridgeError>
    where
        T: Send + 'static,
        F: FnOnce(Completion<T>),
    {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| BridgeError::Runtime("runtime is shut down".to_string()))?;

        let (tx, mut rx) = oneshot::channel();
        dispatch(Completion { tx });

        let platform = Arc::clone(platform);
        let timeout = self.timeout;
        let pump_interval = self.pump_interval;
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(pump_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let wait = async {
                loop {
                    tokio::select! {
                        biased;
                        completed = &mut rx => {
                            return completed.map_err(|_| BridgeError::Dropped { label });
                        }
                        _ = ticker.tick() => platform.tick(),
                    }
                }
            };

            match tokio::time::timeout(timeout, wait).await {
                Ok(result) => result,
                Err(_) => Err(BridgeError::TimedOut {
                    label,
                    after: timeout,
                }),
            }
        });

        let result = runtime
            .block_on(task)
            .map_err(|e| BridgeError::Runtime(e.to_string()))?;
        match &result {
            Ok(_) => debug!(call = label, "Bridged call completed"),
            Err(e) => warn!(call = label, error = %e, "Bridged call failed"),
        }
        result
    }
}

impl Drop for SyncBridge {
    fn drop(&mut self) {
        // May run on a thread inside an async context; never block here.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eos_sdk::auth::{AuthScopeFlags, Credentials, LoginCallbackInfo, LoginCredentialType, LoginOptions};
    use eos_sdk::sim::{SimAccount, SimWorld, SimulatedSdk};
    use eos_sdk::{EosResult, InitializeOptions, PlatformOptions, Sdk};

    fn platform(world: SimWorld) -> (SimulatedSdk, Arc<dyn Platform>) {
        let sdk = SimulatedSdk::new(world);
        sdk.initialize(&InitializeOptions {
            product_name: "bridge".to_string(),
            product_version: "1".to_string(),
        });
        let platform = sdk
            .create_platform(&PlatformOptions {
                product_id: "p".to_string(),
                sandbox_id: "s".to_string(),
                deployment_id: "d".to_string(),
                ..Default::default()
            })
            .unwrap();
        (sdk, platform)
    }

    fn login(token: &str) -> LoginOptions {
        LoginOptions {
            credentials: Credentials {
                id: None,
                token: Some(token.to_string()),
                credential_type: LoginCredentialType::ExchangeCode,
            },
            scope_flags: AuthScopeFlags::default(),
        }
    }

    #[test]
    fn test_call_returns_callback_payload() {
        let account = SimAccount::new("alice");
        let (_sdk, platform) = platform(
            SimWorld::new()
                .with_exchange_code("abc", &account.id)
                .with_account(account.clone()),
        );
        let bridge = SyncBridge::new(&RuntimeOptions::default()).unwrap();

        let info: LoginCallbackInfo = bridge
            .call("login", &platform, |done| {
                platform
                    .auth()
                    .login(login("abc"), Box::new(move |info| done.complete(info)))
            })
            .unwrap();
        assert_eq!(info.result, EosResult::Success);
        assert_eq!(info.local_user_id, Some(account.id));
    }

    #[test]
    fn test_call_times_out_when_callback_never_fires() {
        let (_sdk, platform) = platform(SimWorld::new());
        let options = RuntimeOptions::default().with_bridge_timeout(Duration::from_millis(50));
        let bridge = SyncBridge::new(&options).unwrap();

        // Holding the completion without ever invoking it.
        let parked = parking_lot::Mutex::new(None);
        let err = bridge
            .call::<(), _>("never", &platform, |done| {
                *parked.lock() = Some(done);
            })
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_released_platform_reports_dropped() {
        let (_sdk, platform) = platform(SimWorld::new());
        let bridge = SyncBridge::new(&RuntimeOptions::default()).unwrap();

        let err = bridge
            .call("login", &platform, |done| {
                platform
                    .auth()
                    .login(login("abc"), Box::new(move |info: LoginCallbackInfo| {
                        done.complete(info)
                    }));
                platform.release();
            })
            .unwrap_err();
        assert!(matches!(err, BridgeError::Dropped { label: "login" }));
    }
}
