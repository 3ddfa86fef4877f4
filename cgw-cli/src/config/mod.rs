//! Configuration loading
//!
//! Settings come from, highest precedence first: command-line flags,
//! `CGW_*` environment variables (clap reads both, after `.env` is loaded),
//! and the TOML file at `<config dir>/cgw-cli/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use serde::Deserialize;

use crate::api::{CgwClient, RequestLogging, ResilienceConfig, RetryConfig};

pub const APP_DIR: &str = "cgw-cli";
pub const CONFIG_FILE: &str = "config.toml";

/// `[gateway]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Set to `false` to accept self-signed certificates
    pub verify_tls: Option<bool>,
}

/// `[logging]` table: request logging of the Gateway client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    pub requests: Option<bool>,
    pub error_bodies: Option<bool>,
}

impl LoggingSection {
    fn build(&self) -> RequestLogging {
        let defaults = RequestLogging::default();
        RequestLogging {
            requests: self.requests.unwrap_or(defaults.requests),
            error_bodies: self.error_bodies.unwrap_or(defaults.error_bodies),
        }
    }
}

/// Named starting point for `[retry]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryPreset {
    #[default]
    Default,
    Conservative,
    Aggressive,
    Disabled,
}

impl RetryPreset {
    fn config(self) -> RetryConfig {
        match self {
            Self::Default => RetryConfig::default(),
            Self::Conservative => RetryConfig::conservative(),
            Self::Aggressive => RetryConfig::aggressive(),
            Self::Disabled => RetryConfig::disabled(),
        }
    }
}

/// `[retry]` table; unset fields keep the preset's values
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    #[serde(default)]
    pub preset: RetryPreset,
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
    pub jitter: Option<bool>,
}

impl RetrySection {
    fn build(&self) -> RetryConfig {
        let mut retry = self.preset.config();
        if let Some(attempts) = self.max_attempts {
            retry.max_attempts = attempts.max(1);
        }
        if let Some(ms) = self.base_delay_ms {
            retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.max_delay_ms {
            retry.max_delay = Duration::from_millis(ms);
        }
        if let Some(multiplier) = self.backoff_multiplier {
            retry.backoff_multiplier = multiplier;
        }
        if let Some(jitter) = self.jitter {
            retry.jitter = jitter;
        }
        retry
    }
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl FileConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid configuration file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("In config file {}", path.display()))
    }

    /// Load an explicitly given file, or the default one if it exists
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                log::debug!("Using config file {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Skip TLS certificate checks regardless of the file
    pub insecure: bool,
}

/// Fully resolved settings for one run
#[derive(Clone)]
pub struct Config {
    pub hostname: String,
    pub username: String,
    pub password: String,
    pub retry: RetryConfig,
    pub logging: RequestLogging,
    pub verify_tls: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("retry", &self.retry)
            .field("logging", &self.logging)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

impl Config {
    /// Merge overrides over the file, prompting for a missing password when
    /// attached to a terminal
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Result<Self> {
        Self::resolve_with(overrides, file, prompt_password)
    }

    pub fn resolve_with<P>(overrides: Overrides, file: FileConfig, prompt: P) -> Result<Self>
    where
        P: FnOnce(&str, &str) -> Result<Option<String>>,
    {
        let pick = |cli: Option<String>, file: Option<String>| {
            cli.filter(|v| !v.is_empty())
                .or(file.filter(|v| !v.is_empty()))
        };

        let hostname = pick(overrides.hostname, file.gateway.hostname)
            .context("No content gateway hostname found (use --hostname or CGW_HOSTNAME)")?;
        let username = pick(overrides.username, file.gateway.username)
            .context("username / password not found (use --username or CGW_USERNAME)")?;
        let password = match pick(overrides.password, file.gateway.password) {
            Some(password) => password,
            None => prompt(&hostname, &username)?
                .filter(|p| !p.is_empty())
                .context("username / password not found (use --password or CGW_PASSWORD)")?,
        };

        Ok(Self {
            hostname,
            username,
            password,
            retry: file.retry.build(),
            logging: file.logging.build(),
            verify_tls: !overrides.insecure && file.gateway.verify_tls.unwrap_or(true),
        })
    }

    pub fn resilience(&self) -> ResilienceConfig {
        ResilienceConfig {
            retry: self.retry.clone(),
            logging: self.logging,
            verify_tls: self.verify_tls,
        }
    }

    pub fn client(&self) -> Result<CgwClient> {
        CgwClient::new(
            &self.hostname,
            &self.username,
            &self.password,
            self.resilience(),
        )
        .context("Failed to create content gateway client")
    }
}

fn prompt_password(hostname: &str, username: &str) -> Result<Option<String>> {
    if !std::io::stdin().is_terminal() {
        return Ok(None);
    }
    let password = rpassword::prompt_password(format!("Password for {}@{}: ", username, hostname))
        .context("Failed to read password")?;
    Ok(Some(password))
}
