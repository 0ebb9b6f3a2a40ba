use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use runlet_core::scripting::python::DEFAULT_PYTHON;
use runlet_core::worker_pool::{PoolConfig, PoolConfigError, DEFAULT_QUEUE_CAPACITY};

use crate::auth::bootstrap::DEFAULT_ADMIN_PASSWORD;
use crate::auth::jwt::{JwtConfig, DEFAULT_EXPIRY_HOURS, MAX_EXPIRY_HOURS};

/// Default per-run limit: one hour.
const DEFAULT_SCRIPT_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error(transparent)]
    Pool(#[from] PoolConfigError),
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// SQLite connection URL.
    pub database_url: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for running scripts before killing them.
    pub shutdown_timeout_secs: u64,
    /// Worker count and queue depth.
    pub worker_pool: PoolConfig,
    /// Per-run limit in seconds, `0` for none.
    pub script_timeout_secs: u64,
    /// Python interpreter used for `python` scripts.
    pub python_interpreter: String,
    /// Directory holding the built frontend.
    pub static_dir: PathBuf,
    /// JWT token configuration.
    pub jwt: JwtConfig,
    /// Account seeded on first start.
    pub admin_username: String,
    pub admin_password: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                              |
    /// |-------------------------|--------------------------------------|
    /// | `HOST`                  | `0.0.0.0`                            |
    /// | `PORT`                  | `8080`                               |
    /// | `DATABASE_URL`          | `sqlite://data/scripts.db?mode=rwc`  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`              |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                                 |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                                 |
    /// | `WORKER_POOL_SIZE`      | number of CPUs                       |
    /// | `WORKER_QUEUE_CAPACITY` | `1024`                               |
    /// | `SCRIPT_TIMEOUT_SECS`   | `3600` (`0` disables)                |
    /// | `PYTHON_INTERPRETER`    | `python3` (`python` on Windows)      |
    /// | `STATIC_DIR`            | `dist`                               |
    /// | `JWT_SECRET`            | **required**                         |
    /// | `JWT_EXPIRY_HOURS`      | `24` (1 to 8760)                     |
    /// | `ADMIN_USERNAME`        | `admin`                              |
    /// | `ADMIN_PASSWORD`        | `admin`                              |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_string("HOST", "0.0.0.0");
        let port: u16 = env_parse("PORT", 8080)?;
        let database_url = env_or_string("DATABASE_URL", "sqlite://data/scripts.db?mode=rwc");

        let cors_origins: Vec<String> = env_or_string("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(bad) = cors_origins
            .iter()
            .find(|o| HeaderValue::from_str(o).is_err())
        {
            return Err(ConfigError::Invalid {
                key: "CORS_ORIGINS",
                value: bad.clone(),
            });
        }

        let request_timeout_secs = env_parse("REQUEST_TIMEOUT_SECS", 30)?;
        let shutdown_timeout_secs = env_parse("SHUTDOWN_TIMEOUT_SECS", 30)?;

        let defaults = PoolConfig::with_cpu_workers();
        let worker_pool = PoolConfig {
            workers: env_parse("WORKER_POOL_SIZE", defaults.workers)?,
            queue_capacity: env_parse("WORKER_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?,
        };
        worker_pool.validate()?;

        let script_timeout_secs = env_parse("SCRIPT_TIMEOUT_SECS", DEFAULT_SCRIPT_TIMEOUT_SECS)?;
        let python_interpreter = env_or_string("PYTHON_INTERPRETER", DEFAULT_PYTHON);
        let static_dir = PathBuf::from(env_or_string("STATIC_DIR", "dist"));

        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        if secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        let jwt = JwtConfig {
            secret,
            expiry_hours: check_expiry_hours(env_parse(
                "JWT_EXPIRY_HOURS",
                DEFAULT_EXPIRY_HOURS,
            )?)?,
        };

        Ok(Self {
            host,
            port,
            database_url,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            worker_pool,
            script_timeout_secs,
            python_interpreter,
            static_dir,
            jwt,
            admin_username: env_or_string("ADMIN_USERNAME", "admin"),
            admin_password: env_or_string("ADMIN_PASSWORD", DEFAULT_ADMIN_PASSWORD),
        })
    }

    /// Per-run limit handed to the process runner.
    pub fn script_timeout(&self) -> Option<Duration> {
        (self.script_timeout_secs > 0).then(|| Duration::from_secs(self.script_timeout_secs))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn check_expiry_hours(hours: i64) -> Result<i64, ConfigError> {
    if (1..=MAX_EXPIRY_HOURS).contains(&hours) {
        Ok(hours)
    } else {
        Err(ConfigError::Invalid {
            key: "JWT_EXPIRY_HOURS",
            value: hours.to_string(),
        })
    }
}

fn env_or_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn base_config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            cors_origins: vec![],
            request_timeout_secs: 30,
            shutdown_timeout_secs: 7,
            worker_pool: PoolConfig {
                workers: 1,
                queue_capacity: 1,
            },
            script_timeout_secs: 0,
            python_interpreter: DEFAULT_PYTHON.to_string(),
            static_dir: PathBuf::from("dist"),
            jwt: JwtConfig {
                secret: "s".to_string(),
                expiry_hours: 1,
            },
            admin_username: "admin".to_string(),
            admin_password: "admin".to_string(),
        }
    }

    #[test]
    fn zero_script_timeout_disables_limit() {
        assert_eq!(base_config().script_timeout(), None);
    }

    #[test]
    fn script_timeout_in_seconds() {
        let config = ServerConfig {
            script_timeout_secs: 90,
            ..base_config()
        };
        assert_eq!(config.script_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(7));
    }

    #[test]
    fn unparsable_value_is_reported() {
        // Unique key so parallel tests cannot interfere.
        std::env::set_var("RUNLET_TEST_UNPARSABLE_PORT", "eighty");
        let result: Result<u16, _> = env_parse("RUNLET_TEST_UNPARSABLE_PORT", 1);
        assert_matches!(
            result,
            Err(ConfigError::Invalid { key: "RUNLET_TEST_UNPARSABLE_PORT", value }) if value == "eighty"
        );
    }

    #[test]
    fn missing_value_uses_default() {
        let result: Result<u64, _> = env_parse("RUNLET_TEST_UNSET_VALUE", 42);
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn expiry_hours_are_bounded() {
        assert_eq!(check_expiry_hours(24).unwrap(), 24);
        assert_eq!(check_expiry_hours(MAX_EXPIRY_HOURS).unwrap(), MAX_EXPIRY_HOURS);
        for bad in [0, -1, MAX_EXPIRY_HOURS + 1, i64::MAX] {
            assert_matches!(
                check_expiry_hours(bad),
                Err(ConfigError::Invalid { key: "JWT_EXPIRY_HOURS", .. })
            );
        }
    }
}
