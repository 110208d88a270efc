//! Appliance connection configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use oneview_common::{Error, Result};

/// OneView appliance connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplianceConfig {
    /// Appliance hostname or IP address
    pub hostname: Option<String>,

    /// Credentials
    pub credentials: Credentials,

    /// Value sent as `X-API-Version`
    pub api_version: u32,

    /// When false, mutating requests carry `If-Match: *`
    pub validate_etag: bool,

    /// PEM bundle to trust. Without one, the appliance's certificate is not verified.
    pub ssl_certificate: Option<PathBuf>,

    /// Task polling
    pub tasks: TaskConfig,
}

impl Default for ApplianceConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            credentials: Credentials::default(),
            api_version: 300,
            validate_etag: true,
            ssl_certificate: None,
            tasks: TaskConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth_login_domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Delay between task polls
    pub poll_interval_ms: u64,

    /// Upper bound on a task wait; unbounded when unset
    pub timeout_secs: Option<u64>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            timeout_secs: None,
        }
    }
}

/// Values that take precedence over the config file (flags, environment, module params)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigOverrides {
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth_login_domain: Option<String>,
    pub api_version: Option<u32>,
    pub validate_etag: Option<bool>,
}

impl ApplianceConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Err(Error::InvalidConfig(format!(
                "config file {} does not exist",
                path.display()
            )))
        }
    }

    /// Apply overrides on top of the loaded values
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(hostname) = &overrides.hostname {
            self.hostname = Some(hostname.clone());
        }
        if let Some(username) = &overrides.username {
            self.credentials.username = Some(username.clone());
        }
        if let Some(password) = &overrides.password {
            self.credentials.password = Some(password.clone());
        }
        if let Some(domain) = &overrides.auth_login_domain {
            self.credentials.auth_login_domain = Some(domain.clone());
        }
        if let Some(api_version) = overrides.api_version {
            self.api_version = api_version;
        }
        if let Some(validate_etag) = overrides.validate_etag {
            self.validate_etag = validate_etag;
        }
        self
    }

    /// Check that everything needed to log in is present
    pub fn validate(&self) -> Result<()> {
        match self.hostname.as_deref() {
            Some(h) if !h.trim().is_empty() => {}
            _ => return Err(Error::InvalidConfig("hostname is required".into())),
        }
        if self.credentials.username.as_deref().unwrap_or("").is_empty() {
            return Err(Error::InvalidConfig("credentials.username is required".into()));
        }
        if self.credentials.password.is_none() {
            return Err(Error::InvalidConfig("credentials.password is required".into()));
        }
        if self.api_version == 0 {
            return Err(Error::InvalidConfig("api_version must be positive".into()));
        }
        Ok(())
    }

    /// Base URL of the appliance REST API
    pub fn base_url(&self) -> Result<String> {
        let hostname = self
            .hostname
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig("hostname is required".into()))?
            .trim_end_matches('/');
        if hostname.starts_with("http://") || hostname.starts_with("https://") {
            Ok(hostname.to_string())
        } else {
            Ok(format!("https://{}", hostname))
        }
    }
}
