//! Connection settings for the A-Parser API.
//!
//! A `ClientConfig` is resolved once by the host (from the environment, a
//! TOML file, or explicit values) and then handed to the client, which never
//! mutates it.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::action::Action;
use crate::error::ConfigError;

pub const ENV_HOST: &str = "APARSER_HOST";
pub const ENV_PASSWORD: &str = "APARSER_PASSWORD";
pub const ENV_TIMEOUT: &str = "APARSER_TIMEOUT";
pub const ENV_LONG_TIMEOUT: &str = "APARSER_LONG_TIMEOUT";

/// Timeout for `ping` and `info` unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Time limit for a single `call`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallTimeout {
    /// Whatever the config gives the action (see `ClientConfig::timeout_for`).
    #[default]
    Default,
    /// No limit for this call, whatever the config says.
    Unbounded,
    After(Duration),
}

impl CallTimeout {
    pub fn resolve(self, config: &ClientConfig, action: Action) -> Option<Duration> {
        match self {
            CallTimeout::Default => config.timeout_for(action),
            CallTimeout::Unbounded => None,
            CallTimeout::After(d) => Some(d),
        }
    }
}

impl From<Duration> for CallTimeout {
    fn from(d: Duration) -> Self {
        CallTimeout::After(d)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    host: String,
    password: String,
    timeout: Option<Duration>,
    long_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            password: password.into(),
            timeout: Some(DEFAULT_TIMEOUT),
            long_timeout: None,
        }
    }

    /// Resolve from `APARSER_HOST`, `APARSER_PASSWORD`, `APARSER_TIMEOUT`
    /// and `APARSER_LONG_TIMEOUT`. Timeouts are whole seconds, `0` meaning
    /// no limit.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup(ENV_HOST).ok_or(ConfigError::MissingVar(ENV_HOST))?;
        let password = lookup(ENV_PASSWORD).unwrap_or_default();
        let mut config = Self::new(host, password);
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            config.timeout = parse_secs(ENV_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LONG_TIMEOUT) {
            config.long_timeout = parse_secs(ENV_LONG_TIMEOUT, &raw)?;
        }
        Ok(config)
    }

    /// Parse a TOML document. `${VAR}` references inside `host` and
    /// `password` are expanded from the environment after parsing, so the
    /// substituted values are taken literally.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Self::from_toml_with(toml_str, |name| std::env::var(name).ok())
    }

    fn from_toml_with(
        toml_str: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut file: FileConfig = toml::from_str(toml_str)?;
        file.host = expand_vars(&file.host, &lookup);
        file.password = expand_vars(&file.password, &lookup);
        Ok(file.into())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Timeout for lightweight actions. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timeout for every action that is not lightweight. `None` waits
    /// indefinitely.
    pub fn with_long_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.long_timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn long_timeout(&self) -> Option<Duration> {
        self.long_timeout
    }

    /// The timeout a call to `action` gets when the caller does not pass one.
    pub fn timeout_for(&self, action: Action) -> Option<Duration> {
        if action.is_lightweight() {
            self.timeout
        } else {
            self.long_timeout
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("long_timeout", &self.long_timeout)
            .finish()
    }
}

/// On-disk shape of the config file.
#[derive(Debug, Deserialize)]
struct FileConfig {
    host: String,
    #[serde(default)]
    password: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default)]
    long_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl From<FileConfig> for ClientConfig {
    fn from(file: FileConfig) -> Self {
        ClientConfig::new(file.host, file.password)
            .with_timeout(secs(file.timeout_secs))
            .with_long_timeout(secs(file.long_timeout_secs))
    }
}

fn secs(n: u64) -> Option<Duration> {
    (n > 0).then(|| Duration::from_secs(n))
}

fn parse_secs(name: &'static str, raw: &str) -> Result<Option<Duration>, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(secs)
        .map_err(|_| ConfigError::InvalidVar {
            name,
            value: raw.to_string(),
        })
}

/// Expand `${VAR}` patterns through `lookup`.
///
/// Unknown variables are replaced with an empty string.
fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            if let Some(val) = lookup(&var_name) {
                result.push_str(&val);
            }
        } else {
            result.push(ch);
        }
    }

    result
}
