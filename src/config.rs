use std::env;

use crate::error::{RelayError, Result};
use crate::logger::{LogLevel, LoggerConfig};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash-image-preview:free";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub timeout_secs: u64,
    /// Variables that were set but could not be parsed.
    pub invalid_vars: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origin: String,
    pub invalid_vars: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub openrouter: OpenRouterConfig,
    pub logger: LoggerConfig,
    pub invalid_vars: Vec<String>,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        OpenRouterConfig {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            invalid_vars: Vec::new(),
        }
    }
}

impl OpenRouterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so callers can supply values
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut invalid_vars = Vec::new();

        OpenRouterConfig {
            api_key: non_empty(lookup("OPENROUTER_API_KEY")),
            base_url: non_empty(lookup("OPENROUTER_BASE_URL")).unwrap_or(defaults.base_url),
            default_model: non_empty(lookup("OPENROUTER_DEFAULT_MODEL"))
                .unwrap_or(defaults.default_model),
            timeout_secs: parse_var(&lookup, "OPENROUTER_TIMEOUT_SECS", &mut invalid_vars)
                .unwrap_or(defaults.timeout_secs),
            invalid_vars,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            invalid_vars: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut invalid_vars = Vec::new();

        ServerConfig {
            host: non_empty(lookup("HOST")).unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", &mut invalid_vars).unwrap_or(defaults.port),
            allowed_origin: non_empty(lookup("ALLOWED_ORIGIN")).unwrap_or(defaults.allowed_origin),
            invalid_vars,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origin = origin.into();
        self
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            openrouter: OpenRouterConfig::default(),
            logger: LoggerConfig::default(),
            invalid_vars: Vec::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut invalid_vars = Vec::new();

        let mut logger = match non_empty(lookup("LOG_FORMAT")) {
            Some(format) => LoggerConfig::from_format(&format).unwrap_or_else(|| {
                invalid_vars.push(format!("LOG_FORMAT={:?}", format));
                LoggerConfig::default()
            }),
            None => LoggerConfig::default(),
        };
        if let Some(level) = non_empty(lookup("LOG_LEVEL")) {
            match LogLevel::parse(&level) {
                Some(level) => logger = logger.with_level(level),
                None => invalid_vars.push(format!("LOG_LEVEL={:?}", level)),
            }
        }

        Config {
            server: ServerConfig::from_lookup(&lookup),
            openrouter: OpenRouterConfig::from_lookup(&lookup),
            logger,
            invalid_vars,
        }
    }

    pub fn with_server(mut self, config: ServerConfig) -> Self {
        self.server = config;
        self
    }

    pub fn with_openrouter(mut self, config: OpenRouterConfig) -> Self {
        self.openrouter = config;
        self
    }

    pub fn with_logger(mut self, config: LoggerConfig) -> Self {
        self.logger = config;
        self
    }

    /// Checks everything the binary needs before it binds a socket.
    pub fn validate(&self) -> Result<()> {
        let invalid: Vec<&str> = self
            .invalid_vars
            .iter()
            .chain(&self.server.invalid_vars)
            .chain(&self.openrouter.invalid_vars)
            .map(String::as_str)
            .collect();
        if !invalid.is_empty() {
            return Err(RelayError::ConfigError(format!(
                "Unparseable environment variables: {}",
                invalid.join(", ")
            )));
        }
        if self.openrouter.api_key.is_none() {
            return Err(RelayError::ConfigError(
                "OPENROUTER_API_KEY is not set".into(),
            ));
        }
        if self.openrouter.timeout_secs == 0 {
            return Err(RelayError::ConfigError(
                "OPENROUTER_TIMEOUT_SECS must be greater than zero".into(),
            ));
        }
        let origin = self.server.allowed_origin.as_str();
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(RelayError::ConfigError(format!(
                "ALLOWED_ORIGIN must be an http(s) origin, got {:?}",
                origin
            )));
        }
        Ok(())
    }
}

/// Parses `key` when it is set, noting it in `invalid_vars` if it doesn't parse.
fn parse_var<F, T>(lookup: &F, key: &str, invalid_vars: &mut Vec<String>) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = non_empty(lookup(key))?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            invalid_vars.push(format!("{}={:?}", key, raw));
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
