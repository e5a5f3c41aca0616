use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Settings that have no default and must come from the environment.
pub const REQUIRED_KEYS: [&str; 4] = ["APP_SECRET_KEY", "DATABASE_URL", "ADMIN_PASSWORD", "RESEND_API_KEY"];

/// Every variable the loader reads. Names are matched exactly; anything else,
/// including a lower-case spelling of a known name, is ignored.
pub const SETTING_KEYS: [&str; 27] = [
    "APP_NAME",
    "APP_ENV",
    "APP_SECRET_KEY",
    "APP_DEBUG",
    "APP_URL",
    "DATABASE_URL",
    "DATABASE_POOL_SIZE",
    "DATABASE_MAX_OVERFLOW",
    "ADMIN_USERNAME",
    "ADMIN_EMAIL",
    "ADMIN_PASSWORD",
    "RESEND_API_KEY",
    "RESEND_FROM_EMAIL",
    "RESEND_FROM_NAME",
    "MAX_UPLOAD_SIZE",
    "ALLOWED_EXTENSIONS",
    "UPLOAD_PATH",
    "QR_CODE_PATH",
    "JWT_ACCESS_TOKEN_EXPIRE_MINUTES",
    "JWT_REFRESH_TOKEN_EXPIRE_DAYS",
    "CORS_ORIGINS",
    "RATE_LIMIT_REQUESTS",
    "RATE_LIMIT_PERIOD",
    "TRUSTED_PROXIES",
    "LOG_LEVEL",
    "LOG_FILE",
    "RENDER_APP_URL",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {key}")]
    Missing { key: &'static str },
    #[error("required setting {key} is empty")]
    Empty { key: &'static str },
    #[error("invalid setting {key}: {reason}")]
    OutOfRange { key: &'static str, reason: String },
    #[error("invalid configuration: {0}")]
    Source(#[from] ::config::ConfigError),
    #[error("failed to create directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Process-wide configuration, read once at startup and never mutated.
///
/// Field names are the lower-cased environment variable names, so
/// `DATABASE_POOL_SIZE` populates `database_pool_size`.
#[derive(Clone, Deserialize)]
pub struct Settings {
    pub app_name: String,
    pub app_env: String,
    pub app_secret_key: String,
    pub app_debug: bool,
    pub app_url: String,

    pub database_url: String,
    pub database_pool_size: u32,
    pub database_max_overflow: u32,

    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: String,

    pub resend_api_key: String,
    pub resend_from_email: String,
    pub resend_from_name: String,

    pub max_upload_size: u64,
    pub allowed_extensions: String,
    pub upload_path: PathBuf,
    pub qr_code_path: PathBuf,

    pub jwt_access_token_expire_minutes: i64,
    pub jwt_refresh_token_expire_days: i64,
    pub cors_origins: String,

    pub rate_limit_requests: u32,
    pub rate_limit_period: u64,
    /// Peers whose `X-Forwarded-For` / `X-Real-IP` headers are believed
    pub trusted_proxies: String,

    pub log_level: String,
    pub log_file: PathBuf,

    pub render_app_url: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("app_name", &self.app_name)
            .field("app_env", &self.app_env)
            .field("app_secret_key", &"[REDACTED]")
            .field("app_debug", &self.app_debug)
            .field("app_url", &self.app_url)
            .field("database_url", &"[REDACTED]")
            .field("database_pool_size", &self.database_pool_size)
            .field("database_max_overflow", &self.database_max_overflow)
            .field("admin_username", &self.admin_username)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &"[REDACTED]")
            .field("resend_api_key", &"[REDACTED]")
            .field("resend_from_email", &self.resend_from_email)
            .field("resend_from_name", &self.resend_from_name)
            .field("max_upload_size", &self.max_upload_size)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("upload_path", &self.upload_path)
            .field("qr_code_path", &self.qr_code_path)
            .field("jwt_access_token_expire_minutes", &self.jwt_access_token_expire_minutes)
            .field("jwt_refresh_token_expire_days", &self.jwt_refresh_token_expire_days)
            .field("cors_origins", &self.cors_origins)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_period", &self.rate_limit_period)
            .field("trusted_proxies", &self.trusted_proxies)
            .field("log_level", &self.log_level)
            .field("log_file", &self.log_file)
            .field("render_app_url", &self.render_app_url)
            .finish()
    }
}

impl Settings {
    /// Reads `.env` (if present) and the process environment, then creates the
    /// log, upload and QR-code directories.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Self::from_env()?;
        settings.ensure_directories()?;
        Ok(settings)
    }

    /// Same as [`Settings::load`] but reads variables from `vars` instead of the
    /// process environment.
    pub fn load_from(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let settings = Self::from_source(vars)?;
        settings.ensure_directories()?;
        Ok(settings)
    }

    /// Parses and validates settings from the environment without touching the
    /// filesystem.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Existing variables win over .env entries
        let _ = dotenvy::dotenv();
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
        build(known_vars(vars))
    }

    pub fn from_source(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        build(known_vars(vars))
    }

    /// `ALLOWED_EXTENSIONS` split on commas, trimmed, in source order.
    pub fn allowed_extensions_list(&self) -> Vec<String> {
        split_list(&self.allowed_extensions)
    }

    /// `CORS_ORIGINS` split on commas, trimmed, in source order.
    pub fn cors_origins_list(&self) -> Vec<String> {
        split_list(&self.cors_origins)
    }

    /// `TRUSTED_PROXIES` as addresses. Entries are checked at load time.
    pub fn trusted_proxies_list(&self) -> Vec<IpAddr> {
        split_list(&self.trusted_proxies).iter().filter_map(|ip| ip.parse().ok()).collect()
    }

    /// Upper bound for the connection pool: base size plus overflow.
    pub fn database_max_connections(&self) -> u32 {
        self.database_pool_size.saturating_add(self.database_max_overflow)
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// Tracing filter directive derived from `LOG_LEVEL` and `APP_DEBUG`.
    ///
    /// Accepts the usual Python level names (`WARNING`, `CRITICAL`) as well as
    /// tracing's own. Unknown names fall back to `info`.
    pub fn log_directive(&self) -> String {
        let level = if self.app_debug {
            "debug"
        } else {
            match self.log_level.trim().to_ascii_lowercase().as_str() {
                "trace" => "trace",
                "debug" => "debug",
                "warn" | "warning" => "warn",
                "error" | "critical" | "fatal" => "error",
                _ => "info",
            }
        };
        format!("{level},tower_http={level}")
    }

    /// Creates the log file's parent, the upload root and the QR-code root.
    /// Directories that already exist are left alone.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        let log_dir = self.log_file.parent().filter(|p| !p.as_os_str().is_empty());
        for dir in log_dir.into_iter().chain([self.upload_path.as_path(), self.qr_code_path.as_path()]) {
            create_dir(dir)?;
        }
        Ok(())
    }
}

/// Keeps only the variables named exactly as in [`SETTING_KEYS`]. The `config`
/// crate lower-cases environment keys, so filtering has to happen first.
fn known_vars(vars: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
    vars.into_iter().filter(|(key, _)| SETTING_KEYS.contains(&key.as_str())).collect()
}

fn build(vars: HashMap<String, String>) -> Result<Settings, ConfigError> {
    let defaults: &str = include_str!("../config/default.toml");
    let cfg = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        .add_source(::config::Environment::default().source(Some(vars)))
        .build()?;

    for key in REQUIRED_KEYS {
        match cfg.get_string(&key.to_ascii_lowercase()) {
            Ok(value) if value.trim().is_empty() => return Err(ConfigError::Empty { key }),
            Ok(_) => {}
            Err(::config::ConfigError::NotFound(_)) => return Err(ConfigError::Missing { key }),
            Err(e) => return Err(e.into()),
        }
    }

    let settings: Settings = cfg.try_deserialize()?;
    validate(&settings)?;
    Ok(settings)
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.database_pool_size == 0 {
        return Err(ConfigError::OutOfRange { key: "DATABASE_POOL_SIZE", reason: "must be > 0".into() });
    }
    if settings.max_upload_size == 0 {
        return Err(ConfigError::OutOfRange { key: "MAX_UPLOAD_SIZE", reason: "must be > 0".into() });
    }
    if settings.rate_limit_requests == 0 {
        return Err(ConfigError::OutOfRange { key: "RATE_LIMIT_REQUESTS", reason: "must be > 0".into() });
    }
    if settings.rate_limit_period == 0 {
        return Err(ConfigError::OutOfRange { key: "RATE_LIMIT_PERIOD", reason: "must be > 0".into() });
    }
    if settings.jwt_access_token_expire_minutes <= 0 {
        return Err(ConfigError::OutOfRange {
            key: "JWT_ACCESS_TOKEN_EXPIRE_MINUTES",
            reason: "must be > 0".into(),
        });
    }
    if settings.jwt_refresh_token_expire_days <= 0 {
        return Err(ConfigError::OutOfRange {
            key: "JWT_REFRESH_TOKEN_EXPIRE_DAYS",
            reason: "must be > 0".into(),
        });
    }
    for entry in split_list(&settings.trusted_proxies) {
        if entry.parse::<IpAddr>().is_err() {
            return Err(ConfigError::OutOfRange {
                key: "TRUSTED_PROXIES",
                reason: format!("'{}' is not an IP address", entry),
            });
        }
    }
    if settings.is_production() && settings.app_debug {
        tracing::warn!("APP_DEBUG is enabled while APP_ENV=production");
    }
    Ok(())
}

/// Splits a comma-delimited setting. Elements are trimmed and kept in order;
/// interior empty elements are kept, and only a blank input yields no elements.
pub fn split_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|item| item.trim().to_string()).collect()
}

fn create_dir(path: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })
}

/// Filesystem location of a SQLite database URL, or `None` for in-memory and
/// non-SQLite URLs.
pub fn sqlite_file_path(url: &str) -> Option<&Path> {
    let rest = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(Path::new(path))
}

pub fn ensure_sqlite_parent_dir(url: &str) -> Result<(), ConfigError> {
    if let Some(parent) = sqlite_file_path(url).and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            create_dir(parent)?;
        }
    }
    Ok(())
}
