//! Client configuration

use crate::{CustodyError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default API host
pub const DEFAULT_HOST: &str = "https://openapi.chainup.com/";
/// Default WaaS API version prefix
pub const DEFAULT_VERSION: &str = "v2";
/// Default request charset
pub const DEFAULT_CHARSET: &str = "utf-8";
/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which custody product the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Wallet-as-a-Service, paths are prefixed with the API version
    #[default]
    Waas,
    /// MPC wallets, paths are appended to the host as-is
    Mpc,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Waas => "waas",
            Platform::Mpc => "mpc",
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = CustodyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "waas" => Ok(Platform::Waas),
            "mpc" => Ok(Platform::Mpc),
            other => Err(CustodyError::config(format!(
                "unknown platform '{}', expected 'waas' or 'mpc'",
                other
            ))),
        }
    }
}

/// Custody API client configuration
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CustodyConfig {
    pub platform: Platform,
    /// Application ID issued by the custody platform
    pub app_id: String,
    /// API host, always stored with a trailing `/`
    #[serde(deserialize_with = "deserialize_host")]
    pub host: String,
    /// API version prefix (WaaS only)
    pub version: String,
    /// Charset reported in every request body
    pub charset: String,
    /// Local RSA private key used to encrypt requests
    pub private_key: String,
    /// Platform RSA public key used to decrypt responses and notifications
    pub public_key: String,
    /// Optional RSA private key for transaction signatures
    pub sign_private_key: String,
    #[serde(rename = "timeout_secs", deserialize_with = "deserialize_timeout")]
    pub timeout: Duration,
    /// Log request and response previews at debug level
    pub debug: bool,
}

impl std::fmt::Debug for CustodyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustodyConfig")
            .field("platform", &self.platform)
            .field("app_id", &self.app_id)
            .field("host", &self.host)
            .field("version", &self.version)
            .field("charset", &self.charset)
            .field("private_key", &redact(&self.private_key))
            .field("public_key", &redact(&self.public_key))
            .field("sign_private_key", &redact(&self.sign_private_key))
            .field("timeout", &self.timeout)
            .field("debug", &self.debug)
            .finish()
    }
}

fn redact(key: &str) -> &'static str {
    if key.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            app_id: String::new(),
            host: DEFAULT_HOST.to_string(),
            version: DEFAULT_VERSION.to_string(),
            charset: DEFAULT_CHARSET.to_string(),
            private_key: String::new(),
            public_key: String::new(),
            sign_private_key: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            debug: false,
        }
    }
}

impl CustodyConfig {
    /// Create a config for `platform` with the given application ID
    pub fn new(platform: Platform, app_id: impl Into<String>) -> Self {
        Self {
            platform,
            app_id: app_id.into(),
            ..Default::default()
        }
    }

    /// WaaS config shortcut
    pub fn waas(app_id: impl Into<String>) -> Self {
        Self::new(Platform::Waas, app_id)
    }

    /// MPC config shortcut
    pub fn mpc(app_id: impl Into<String>) -> Self {
        Self::new(Platform::Mpc, app_id)
    }

    /// Load a config from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Build a config from `CUSTODY_*` environment variables.
    ///
    /// Unset variables keep their defaults; nothing is validated here.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(platform) = lookup("CUSTODY_PLATFORM") {
            config.platform = platform.parse()?;
        }
        if let Some(app_id) = lookup("CUSTODY_APP_ID") {
            config.app_id = app_id;
        }
        if let Some(host) = lookup("CUSTODY_HOST") {
            config = config.with_host(host);
        }
        if let Some(version) = lookup("CUSTODY_VERSION") {
            config.version = version;
        }
        if let Some(private_key) = lookup("CUSTODY_PRIVATE_KEY") {
            config.private_key = private_key;
        }
        if let Some(public_key) = lookup("CUSTODY_PUBLIC_KEY") {
            config.public_key = public_key;
        }
        if let Some(sign_private_key) = lookup("CUSTODY_SIGN_PRIVATE_KEY") {
            config.sign_private_key = sign_private_key;
        }
        if let Some(timeout) = lookup("CUSTODY_TIMEOUT_SECS") {
            let secs = timeout.trim().parse::<u64>().map_err(|_| {
                CustodyError::config(format!("CUSTODY_TIMEOUT_SECS is not a number: {}", timeout))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(debug) = lookup("CUSTODY_DEBUG") {
            config.debug = matches!(debug.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    /// Set the API host; a trailing `/` is appended when missing
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = normalize_host(host.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    pub fn with_private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = key.into();
        self
    }

    pub fn with_public_key(mut self, key: impl Into<String>) -> Self {
        self.public_key = key.into();
        self
    }

    pub fn with_sign_private_key(mut self, key: impl Into<String>) -> Self {
        self.sign_private_key = key.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Validate the configuration.
    ///
    /// Key requirements are skipped when a custom crypto provider supplies
    /// the key operations.
    pub fn validate(&self, custom_provider: bool) -> Result<()> {
        if self.host.is_empty() {
            return Err(CustodyError::config("host is required"));
        }

        let parsed = url::Url::parse(&self.host)
            .map_err(|e| CustodyError::config(format!("invalid host '{}': {}", self.host, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(CustodyError::config(
                "host must start with http:// or https://",
            ));
        }

        if self.app_id.trim().is_empty() {
            return Err(CustodyError::config("app_id is required"));
        }

        if !custom_provider {
            if self.private_key.trim().is_empty() {
                return Err(CustodyError::config(
                    "private_key is required (or provide a crypto provider)",
                ));
            }
            if self.platform == Platform::Waas && self.public_key.trim().is_empty() {
                return Err(CustodyError::config(
                    "public_key is required (or provide a crypto provider)",
                ));
            }
        }

        Ok(())
    }

    /// Full endpoint URL for an API path
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        match self.platform {
            Platform::Waas => format!("{}{}/{}", self.host, self.version, path),
            Platform::Mpc => format!("{}{}", self.host, path),
        }
    }
}

fn normalize_host(host: String) -> String {
    if host.is_empty() || host.ends_with('/') {
        host
    } else {
        format!("{}/", host)
    }
}

fn deserialize_host<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    String::deserialize(deserializer).map(normalize_host)
}

fn deserialize_timeout<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}
