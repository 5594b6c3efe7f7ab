//! Connection configuration for the relational store.
//!
//! [`StoreArgs`] can be flattened into a host CLI; every flag falls back to a
//! `STEAMLENS_DB_*` environment variable.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use clap::{Args, Parser};
use steamlens_store::schema::Dialect;
use url::Url;

const DEFAULT_DB_HOST: &str = "127.0.0.1";
const DEFAULT_DB_PORT: u16 = 3306;
const DEFAULT_DB_NAME: &str = "steam_games";
const DEFAULT_DB_USER: &str = "root";
const DEFAULT_DB_CHARSET: &str = "utf8mb4";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
const DEFAULT_MAX_LIFETIME_SECS: u64 = 30 * 60;
const IN_MEMORY_URL: &str = "sqlite::memory:";

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Full connection URL; overrides the individual MySQL settings.
    #[arg(long, env = "STEAMLENS_DB_URL", hide_env_values = true)]
    pub db_url: Option<String>,

    #[arg(long, env = "STEAMLENS_DB_HOST", default_value = DEFAULT_DB_HOST)]
    pub db_host: String,

    #[arg(long, env = "STEAMLENS_DB_PORT", default_value_t = DEFAULT_DB_PORT)]
    pub db_port: u16,

    #[arg(long, env = "STEAMLENS_DB_NAME", default_value = DEFAULT_DB_NAME)]
    pub db_name: String,

    #[arg(long, env = "STEAMLENS_DB_USER", default_value = DEFAULT_DB_USER)]
    pub db_user: String,

    #[arg(long, env = "STEAMLENS_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    #[arg(long, env = "STEAMLENS_DB_CHARSET", default_value = DEFAULT_DB_CHARSET)]
    pub db_charset: String,

    #[arg(
        long,
        env = "STEAMLENS_DB_MAX_CONNECTIONS",
        default_value_t = DEFAULT_MAX_CONNECTIONS
    )]
    pub db_max_connections: u32,

    #[arg(
        long,
        env = "STEAMLENS_DB_ACQUIRE_TIMEOUT_SECS",
        default_value_t = DEFAULT_ACQUIRE_TIMEOUT_SECS
    )]
    pub db_acquire_timeout_secs: u64,

    /// Seconds an idle pooled connection is kept; 0 keeps it forever.
    #[arg(
        long,
        env = "STEAMLENS_DB_IDLE_TIMEOUT_SECS",
        default_value_t = DEFAULT_IDLE_TIMEOUT_SECS
    )]
    pub db_idle_timeout_secs: u64,
}

#[derive(Parser, Debug)]
#[command(name = "steamlens")]
struct EnvArgs {
    #[command(flatten)]
    store: StoreArgs,
}

/// Validated store configuration.
#[derive(Clone)]
pub struct StoreConfig {
    pub url: String,
    pub dialect: Dialect,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
            Self::Parse(message) => write!(f, "failed to read configuration: {message}"),
        }
    }
}

impl Error for ConfigError {}

impl StoreConfig {
    /// Reads the configuration from `STEAMLENS_DB_*` environment variables.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is malformed or a setting is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let args = EnvArgs::try_parse_from(["steamlens"])
            .map_err(|err| ConfigError::Parse(err.to_string()))?;
        Self::try_from(args.store)
    }

    /// Single-connection in-memory SQLite store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            url: IN_MEMORY_URL.to_string(),
            dialect: Dialect::Sqlite,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            idle_timeout: None,
            max_lifetime: None,
        }
    }

    /// Connection URL with any password masked, safe for logs.
    #[must_use]
    pub fn redacted_url(&self) -> String {
        match Url::parse(&self.url) {
            Ok(mut url) if url.password().is_some() => {
                let _ = url.set_password(Some("***"));
                url.into()
            }
            Ok(url) => url.into(),
            Err(_) => self.dialect.to_string(),
        }
    }
}

impl TryFrom<StoreArgs> for StoreConfig {
    type Error = ConfigError;

    fn try_from(args: StoreArgs) -> Result<Self, Self::Error> {
        if args.db_max_connections == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "STEAMLENS_DB_MAX_CONNECTIONS",
                value: args.db_max_connections.to_string(),
            });
        }

        let url = match args.db_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => mysql_url(&args)?,
        };
        let dialect = Dialect::from_url(&url).ok_or_else(|| ConfigError::InvalidSetting {
            name: "STEAMLENS_DB_URL",
            value: url.split_once(':').map_or("<no scheme>", |(scheme, _)| scheme).to_string(),
        })?;

        let idle_timeout = if args.db_idle_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(args.db_idle_timeout_secs))
        };

        let mut config = Self {
            url,
            dialect,
            max_connections: args.db_max_connections,
            acquire_timeout: Duration::from_secs(args.db_acquire_timeout_secs),
            idle_timeout,
            max_lifetime: Some(Duration::from_secs(DEFAULT_MAX_LIFETIME_SECS)),
        };
        // Every connection to an in-memory database opens a fresh database.
        if is_in_memory(&config.url) {
            config.max_connections = 1;
            config.idle_timeout = None;
            config.max_lifetime = None;
        }
        Ok(config)
    }
}

fn mysql_url(args: &StoreArgs) -> Result<String, ConfigError> {
    let host = required(&args.db_host, "STEAMLENS_DB_HOST")?;
    let database = required(&args.db_name, "STEAMLENS_DB_NAME")?;
    let user = required(&args.db_user, "STEAMLENS_DB_USER")?;
    let charset = required(&args.db_charset, "STEAMLENS_DB_CHARSET")?;

    let mut url = Url::parse("mysql://localhost").map_err(|err| ConfigError::Parse(err.to_string()))?;
    url.set_host(Some(host)).map_err(|_| ConfigError::InvalidSetting {
        name: "STEAMLENS_DB_HOST",
        value: host.to_string(),
    })?;
    url.set_port(Some(args.db_port))
        .map_err(|()| ConfigError::InvalidSetting {
            name: "STEAMLENS_DB_PORT",
            value: args.db_port.to_string(),
        })?;
    url.set_username(user).map_err(|()| ConfigError::InvalidSetting {
        name: "STEAMLENS_DB_USER",
        value: user.to_string(),
    })?;
    if let Some(password) = args.db_password.as_deref().filter(|value| !value.is_empty()) {
        url.set_password(Some(password))
            .map_err(|()| ConfigError::InvalidSetting {
                name: "STEAMLENS_DB_PASSWORD",
                value: "***".to_string(),
            })?;
    }
    url.set_path(&format!("/{database}"));
    url.query_pairs_mut().append_pair("charset", charset);
    Ok(url.into())
}

fn required<'a>(value: &'a str, name: &'static str) -> Result<&'a str, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingSetting(name));
    }
    Ok(trimmed)
}

fn is_in_memory(url: &str) -> bool {
    url.starts_with("sqlite:") && (url.contains(":memory:") || url.contains("mode=memory"))
}
