// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults and the validated [`AppConfig`].
//! Configuration is loaded once at startup; invalid values stop the process.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATABASE_URL` | `redb://<path>` or bare path of the audit database | `./data/audit.redb` |
//! | `DB_CONNECT_TIMEOUT_MS` | Bound on the one-time database creation | `3000` |
//! | `AUDIT_EMAIL_MODE` | Email redaction mode (`full` or `partial`) | `partial` |
//! | `AUDIT_DEFAULT_PAGE_SIZE` | Default audit page size | `20` |
//! | `AUDIT_MAX_PAGE_SIZE` | Maximum audit page size (≥ default) | `100` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

use crate::audit::{EmailMode, InvalidPageConfig, PageConfig, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::logging::LogFormat;

/// Environment variable name for the audit database location.
///
/// # Default
/// `./data/audit.redb`
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Environment variable name for the database creation timeout, in milliseconds.
pub const DB_CONNECT_TIMEOUT_MS_ENV: &str = "DB_CONNECT_TIMEOUT_MS";

/// Environment variable name for the email redaction mode.
///
/// Only `full` and `partial` are accepted; there is no silent fallback.
pub const AUDIT_EMAIL_MODE_ENV: &str = "AUDIT_EMAIL_MODE";

pub const AUDIT_DEFAULT_PAGE_SIZE_ENV: &str = "AUDIT_DEFAULT_PAGE_SIZE";
pub const AUDIT_MAX_PAGE_SIZE_ENV: &str = "AUDIT_MAX_PAGE_SIZE";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATABASE_URL: &str = "./data/audit.redb";
pub const DEFAULT_DB_CONNECT_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not valid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("invalid audit page sizes: {0}")]
    PageSizes(#[from] InvalidPageConfig),
}

fn invalid(var: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub connect_timeout: Duration,
    pub email_mode: EmailMode,
    pub page_config: PageConfig,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names. Unset and blank values
    /// take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let database_url = get(DATABASE_URL_ENV).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let timeout_ms = match get(DB_CONNECT_TIMEOUT_MS_ENV) {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| invalid(DB_CONNECT_TIMEOUT_MS_ENV, e))?,
            None => DEFAULT_DB_CONNECT_TIMEOUT_MS,
        };
        if timeout_ms == 0 {
            return Err(invalid(DB_CONNECT_TIMEOUT_MS_ENV, "must be greater than zero"));
        }

        let email_mode = match get(AUDIT_EMAIL_MODE_ENV) {
            Some(raw) => raw
                .parse::<EmailMode>()
                .map_err(|e| invalid(AUDIT_EMAIL_MODE_ENV, e))?,
            None => EmailMode::default(),
        };

        let default_size = parse_or(&get, AUDIT_DEFAULT_PAGE_SIZE_ENV, DEFAULT_PAGE_SIZE)?;
        let max_size = parse_or(&get, AUDIT_MAX_PAGE_SIZE_ENV, MAX_PAGE_SIZE)?;
        let page_config = PageConfig::new(default_size, max_size)?;

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&get, PORT_ENV, DEFAULT_PORT)?;

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|e| invalid(LOG_FORMAT_ENV, e))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            database_url,
            connect_timeout: Duration::from_millis(timeout_ms),
            email_mode,
            page_config,
            host,
            port,
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<G, T>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(var) {
        Some(raw) => raw.parse::<T>().map_err(|e| invalid(var, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.connect_timeout, Duration::from_millis(3000));
        assert_eq!(config.email_mode, EmailMode::Partial);
        assert_eq!(config.page_config.default_size(), 20);
        assert_eq!(config.page_config.max_size(), 100);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = load(&[
            (DATABASE_URL_ENV, "redb:///tmp/audit.redb"),
            (DB_CONNECT_TIMEOUT_MS_ENV, "250"),
            (AUDIT_EMAIL_MODE_ENV, "full"),
            (AUDIT_DEFAULT_PAGE_SIZE_ENV, "10"),
            (AUDIT_MAX_PAGE_SIZE_ENV, "50"),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9000"),
            (LOG_FORMAT_ENV, "json"),
        ])
        .unwrap();
        assert_eq!(config.database_url, "redb:///tmp/audit.redb");
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.email_mode, EmailMode::Full);
        assert_eq!(config.page_config.default_size(), 10);
        assert_eq!(config.page_config.max_size(), 50);
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn unknown_email_mode_is_rejected() {
        let err = load(&[(AUDIT_EMAIL_MODE_ENV, "hashed")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { var: AUDIT_EMAIL_MODE_ENV, .. }
        ));
    }

    #[test]
    fn max_below_default_is_rejected() {
        let err = load(&[
            (AUDIT_DEFAULT_PAGE_SIZE_ENV, "50"),
            (AUDIT_MAX_PAGE_SIZE_ENV, "10"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::PageSizes(_)));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        assert!(load(&[(PORT_ENV, "eighty")]).is_err());
        assert!(load(&[(DB_CONNECT_TIMEOUT_MS_ENV, "0")]).is_err());
        assert!(load(&[(AUDIT_DEFAULT_PAGE_SIZE_ENV, "-1")]).is_err());
    }
}
