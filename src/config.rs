// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the ledger database | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `PAYSTACK_SECRET_KEY` | Paystack secret API key | Required |
//! | `PAYSTACK_BASE_URL` | Paystack API base URL (override for testing) | `https://api.paystack.co` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;

/// Environment variable name for the ledger data directory path.
///
/// The ledger database file (`ledger.redb`) is created inside this
/// directory on first startup.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the Paystack secret API key.
pub const PAYSTACK_SECRET_KEY_ENV: &str = "PAYSTACK_SECRET_KEY";

/// Environment variable name for overriding the Paystack API base URL.
pub const PAYSTACK_BASE_URL_ENV: &str = "PAYSTACK_BASE_URL";

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: String,
    pub paystack_secret_key: String,
    pub paystack_base_url: Option<String>,
    pub log_format: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
    #[error("environment variable {0} has an invalid value: {1}")]
    InvalidVar(&'static str, String),
}

impl ServerConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidVar("PORT", raw))?,
            Err(_) => 8080,
        };
        let data_dir = env::var(DATA_DIR_ENV).unwrap_or_else(|_| "/data".to_string());
        let paystack_secret_key = env::var(PAYSTACK_SECRET_KEY_ENV)
            .map_err(|_| ConfigError::MissingVar(PAYSTACK_SECRET_KEY_ENV))?;
        let paystack_base_url = env::var(PAYSTACK_BASE_URL_ENV).ok();
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

        Ok(Self {
            host,
            port,
            data_dir,
            paystack_secret_key,
            paystack_base_url,
            log_format,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
