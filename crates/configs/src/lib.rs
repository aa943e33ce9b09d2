//! # Settings
//!
//! Layered configuration, later sources winning:
//!
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `config/{HOTEL_ENV}.toml` (optional, `HOTEL_ENV` defaults to `development`)
//! 4. `HOTEL__SECTION__KEY` environment variables, e.g. `HOTEL__DATABASE__URL`
//!
//! A `.env` file in the working directory is loaded into the environment first.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub use secrecy::ExposeSecret;

const ENV_PREFIX: &str = "HOTEL";
const PROFILE_VAR: &str = "HOTEL_ENV";
const DEFAULT_PROFILE: &str = "development";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub booking: BookingSettings,
    pub session: SessionSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Connection string; never logged.
    pub url: SecretString,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: SecretString::from("postgres://localhost:5432/bookings".to_string()),
            max_connections: 10,
            acquire_timeout_secs: 3,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BookingSettings {
    /// Upper bound on any single store call, in milliseconds.
    pub storage_timeout_ms: u64,
    pub mail_from: String,
    pub owner_email: String,
    /// Mails waiting for the transport; further mails are dropped.
    pub mail_queue: usize,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            storage_timeout_ms: 3000,
            mail_from: "reservations@bookings.local".to_string(),
            owner_email: "owner@bookings.local".to_string(),
            mail_queue: 256,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub cookie_name: String,
    /// Idle lifetime of a session, in seconds.
    pub lifetime_secs: u64,
    pub secure_cookie: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: "booking_session".to_string(),
            lifetime_secs: 86_400,
            secure_cookie: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Fallback filter when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Loads from `./config`, the process environment and `.env`.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env is normal outside development.
        let _ = dotenvy::dotenv();
        let profile = std::env::var(PROFILE_VAR).unwrap_or_else(|_| DEFAULT_PROFILE.to_string());
        Self::load_from(Path::new("config"), &profile, env_source())
    }

    /// Loads from an explicit directory and environment source.
    pub fn load_from(dir: &Path, profile: &str, env: Environment) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(profile)).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be positive".into()));
        }
        if self.booking.storage_timeout_ms == 0 {
            return Err(ConfigError::Invalid("booking.storage_timeout_ms must be positive".into()));
        }
        if self.booking.mail_queue == 0 {
            return Err(ConfigError::Invalid("booking.mail_queue must be positive".into()));
        }
        if self.session.lifetime_secs == 0 {
            return Err(ConfigError::Invalid("session.lifetime_secs must be positive".into()));
        }
        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::Invalid("session.cookie_name must not be empty".into()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|err| ConfigError::Invalid(format!("server address: {err}")))
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.booking.storage_timeout_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.database.acquire_timeout_secs)
    }

    pub fn session_lifetime(&self) -> Duration {
        Duration::from_secs(self.session.lifetime_secs)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_source().source(Some(map))
    }

    fn no_files() -> &'static Path {
        Path::new("does-not-exist")
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let settings = Settings::load_from(no_files(), "test", env(&[])).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.storage_timeout(), Duration::from_secs(3));
        assert_eq!(settings.session.cookie_name, "booking_session");
        assert_eq!(
            settings.database.url.expose_secret(),
            "postgres://localhost:5432/bookings"
        );
        assert_eq!(settings.bind_address().unwrap().port(), 8080);
    }

    #[test]
    fn environment_overrides_nested_keys() {
        let settings = Settings::load_from(
            no_files(),
            "test",
            env(&[
                ("HOTEL__SERVER__PORT", "9090"),
                ("HOTEL__BOOKING__OWNER_EMAIL", "me@here.com"),
                ("HOTEL__LOG__JSON", "true"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.booking.owner_email, "me@here.com");
        assert!(settings.log.json);
    }

    #[test]
    fn rejects_zero_timeouts() {
        let err = Settings::load_from(
            no_files(),
            "test",
            env(&[("HOTEL__BOOKING__STORAGE_TIMEOUT_MS", "0")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn mail_queue_must_hold_something() {
        let settings = Settings::load_from(no_files(), "test", env(&[])).unwrap();
        assert_eq!(settings.booking.mail_queue, 256);

        let err = Settings::load_from(no_files(), "test", env(&[("HOTEL__BOOKING__MAIL_QUEUE", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("mail_queue")));
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let settings = Settings::default();
        assert!(!format!("{settings:?}").contains("localhost:5432"));
    }
}
