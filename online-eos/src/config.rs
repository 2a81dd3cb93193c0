//! Settings, runtime options and the host environment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Default time a bridged call may take before it is abandoned.
pub const DEFAULT_BRIDGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval at which the bridge worker pumps the SDK while waiting.
pub const DEFAULT_PUMP_INTERVAL: Duration = Duration::from_millis(5);

/// Length of a valid storage encryption key in hex digits.
pub const ENCRYPTION_KEY_LENGTH: usize = 64;

/// Product settings registered with the online service.
///
/// Values are handed to the SDK verbatim.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EosSettings {
    pub product_name: String,
    pub product_version: String,
    pub product_id: String,
    pub sandbox_id: String,
    pub deployment_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// 64 hex digits; without it cloud saves are unavailable.
    pub encryption_key: Option<String>,
}

impl fmt::Debug for EosSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EosSettings")
            .field("product_name", &self.product_name)
            .field("product_version", &self.product_version)
            .field("product_id", &self.product_id)
            .field("sandbox_id", &self.sandbox_id)
            .field("deployment_id", &self.deployment_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl EosSettings {
    /// Load settings from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&text)?;
        debug!(path = %path.display(), "Loaded settings file");
        Ok(settings)
    }

    /// Load settings from `EOS_*` environment variables, reading a `.env`
    /// file first if one exists.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup using the `EOS_*` names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).unwrap_or_default();
        Self {
            product_name: get("EOS_PRODUCT_NAME"),
            product_version: get("EOS_PRODUCT_VERSION"),
            product_id: get("EOS_PRODUCT_ID"),
            sandbox_id: get("EOS_SANDBOX_ID"),
            deployment_id: get("EOS_DEPLOYMENT_ID"),
            client_id: get("EOS_CLIENT_ID"),
            client_secret: get("EOS_CLIENT_SECRET"),
            encryption_key: lookup("EOS_ENCRYPTION_KEY").filter(|k| !k.is_empty()),
        }
    }

    /// Reject settings missing a required identifier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("product_name", &self.product_name),
            ("product_id", &self.product_id),
            ("sandbox_id", &self.sandbox_id),
            ("deployment_id", &self.deployment_id),
            ("client_id", &self.client_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(name));
            }
        }
        Ok(())
    }

    /// The encryption key, if it is present and well formed.
    pub fn storage_encryption_key(&self) -> Result<&str, ConfigError> {
        match self.encryption_key.as_deref() {
            Some(key)
                if key.len() == ENCRYPTION_KEY_LENGTH
                    && key.chars().all(|c| c.is_ascii_hexdigit()) =>
            {
                Ok(key)
            }
            _ => Err(ConfigError::InvalidEncryptionKey),
        }
    }
}

/// Tuning of the adapter runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub bridge_timeout: Duration,
    pub pump_interval: Duration,
    /// Run as a dedicated server (no local accounts, no overlay).
    pub is_server: bool,
    pub disable_overlay: bool,
    /// Milliseconds of SDK work per tick; 0 means unbounded.
    pub tick_budget_ms: u32,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            bridge_timeout: DEFAULT_BRIDGE_TIMEOUT,
            pump_interval: DEFAULT_PUMP_INTERVAL,
            is_server: false,
            disable_overlay: true,
            tick_budget_ms: 0,
        }
    }
}

impl RuntimeOptions {
    pub fn with_bridge_timeout(mut self, timeout: Duration) -> Self {
        self.bridge_timeout = timeout;
        self
    }
}

/// What the host process provides.
#[derive(Debug, Clone, Default)]
pub struct HostEnvironment {
    pub launch_args: Vec<String>,
    /// Where the SDK may keep its caches.
    pub temp_dir: PathBuf,
    pub headless: bool,
}

impl HostEnvironment {
    pub fn new(launch_args: Vec<String>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            launch_args,
            temp_dir: temp_dir.into(),
            headless: false,
        }
    }

    /// Environment of the running process.
    pub fn from_process() -> Self {
        Self::new(std::env::args().skip(1).collect(), std::env::temp_dir())
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }
}
