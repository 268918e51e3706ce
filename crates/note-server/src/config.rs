//! Server configuration, loaded from the environment

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_REDIS_HOST: &str = "localhost";
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Storage backend variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Redis,
    Gcs,
}

impl BackendKind {
    /// Exact match on a recognised `BACKEND` value
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "memory" => Some(BackendKind::Memory),
            "redis" => Some(BackendKind::Redis),
            "gcs" => Some(BackendKind::Gcs),
            _ => None,
        }
    }

    /// Parse a `BACKEND` value. Anything unrecognised falls back to memory.
    pub fn from_config_value(value: &str) -> Self {
        Self::parse(value).unwrap_or(BackendKind::Memory)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Redis => write!(f, "redis"),
            BackendKind::Gcs => write!(f, "gcs"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub backend: String,
    pub bind_address: String,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_url: Option<String>,
    pub bucket: Option<String>,
    pub storage_emulator_host: Option<String>,
    pub gcs_access_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            redis_host: DEFAULT_REDIS_HOST.to_string(),
            redis_port: DEFAULT_REDIS_PORT,
            redis_url: None,
            bucket: None,
            storage_emulator_host: None,
            gcs_access_token: None,
        }
    }
}

impl Settings {
    /// Load settings from environment variables (`BACKEND`, `BIND_ADDRESS`, ...)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(Environment::default()))
    }

    /// Apply defaults on top of the given sources and deserialize
    pub fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder
            .set_default("backend", "memory")?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("redis_host", DEFAULT_REDIS_HOST)?
            .set_default("redis_port", i64::from(DEFAULT_REDIS_PORT))?
            .build()?
            .try_deserialize()?;

        Ok(settings.normalized())
    }

    pub fn backend_kind(&self) -> BackendKind {
        BackendKind::from_config_value(&self.backend)
    }

    /// Redis connection URL; an explicit `REDIS_URL` wins over host/port
    pub fn redis_url(&self) -> String {
        match &self.redis_url {
            Some(url) => url.clone(),
            None => format!("redis://{}:{}/", self.redis_host, self.redis_port),
        }
    }

    // Empty env vars count as unset
    fn normalized(mut self) -> Self {
        for field in [
            &mut self.redis_url,
            &mut self.bucket,
            &mut self.storage_emulator_host,
            &mut self.gcs_access_token,
        ] {
            if field.as_deref().map(str::trim) == Some("") {
                *field = None;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_with(overrides: &[(&str, &str)]) -> Settings {
        let mut builder = Config::builder();
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value).unwrap();
        }
        Settings::build(builder).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = build_with(&[]);
        assert_eq!(settings.backend_kind(), BackendKind::Memory);
        assert_eq!(settings.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(settings.redis_url(), "redis://localhost:6379/");
        assert!(settings.bucket.is_none());
    }

    #[test]
    fn test_backend_values() {
        assert_eq!(BackendKind::from_config_value("memory"), BackendKind::Memory);
        assert_eq!(BackendKind::from_config_value("redis"), BackendKind::Redis);
        assert_eq!(BackendKind::from_config_value("gcs"), BackendKind::Gcs);
        assert_eq!(BackendKind::from_config_value("postgres"), BackendKind::Memory);
        assert_eq!(BackendKind::from_config_value(""), BackendKind::Memory);
    }

    #[test]
    fn test_backend_values_match_exactly() {
        for value in ["REDIS", "Redis", " gcs ", "gcs\n", "MEMORY"] {
            assert_eq!(BackendKind::parse(value), None, "value: {:?}", value);
            assert_eq!(BackendKind::from_config_value(value), BackendKind::Memory);
        }
    }

    #[test]
    fn test_overrides() {
        let settings = build_with(&[
            ("backend", "gcs"),
            ("bucket", "notes-bucket"),
            ("redis_host", "cache"),
            ("redis_port", "6380"),
            ("gcs_access_token", ""),
        ]);
        assert_eq!(settings.backend_kind(), BackendKind::Gcs);
        assert_eq!(settings.bucket.as_deref(), Some("notes-bucket"));
        assert_eq!(settings.redis_url(), "redis://cache:6380/");
        assert!(settings.gcs_access_token.is_none());
    }

    #[test]
    fn test_explicit_redis_url_wins() {
        let settings = build_with(&[("redis_url", "redis://:secret@db:6379/2")]);
        assert_eq!(settings.redis_url(), "redis://:secret@db:6379/2");
    }
}
