use std::{env, net::SocketAddr, path::PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha512};
use tracing::warn;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_UPLOAD_DIR: &str = "data/uploads";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("TOKEN_SECRET is unsuitable for production: {0}")]
    WeakSecret(&'static str),
}

/// Signing material and lifetime for session tokens.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: Vec<u8>,
    pub ttl: chrono::Duration,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub token: TokenConfig,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub auto_migrate: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let is_production = environment == "production";

        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let mut bind_addr: SocketAddr = parse_or("BIND_ADDR", &lookup, || {
            DEFAULT_BIND_ADDR.parse().map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: DEFAULT_BIND_ADDR.to_string(),
            })
        })?;
        // PORT wins over the port in BIND_ADDR, as hosting platforms only set PORT.
        if let Some(port) = lookup("PORT") {
            let port: u16 = port.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: port.clone(),
            })?;
            bind_addr.set_port(port);
        }

        let ttl_hours: i64 = parse_or("TOKEN_TTL_HOURS", &lookup, || Ok(DEFAULT_TOKEN_TTL_HOURS))?;
        if ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_HOURS",
                value: ttl_hours.to_string(),
            });
        }

        let secret = match lookup("TOKEN_SECRET").filter(|secret| !secret.is_empty()) {
            Some(secret) => {
                if is_production {
                    validate_production_secret(&secret)?;
                }
                key_from_secret_bytes(&decode_secret_bytes(&secret))
            }
            None if is_production => return Err(ConfigError::Missing("TOKEN_SECRET")),
            None => {
                warn!("TOKEN_SECRET not set; generating ephemeral key (development only)");
                let mut bytes = vec![0u8; 64];
                rand::thread_rng().fill_bytes(&mut bytes);
                bytes
            }
        };

        let upload_dir = lookup("UPLOAD_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR));

        let max_upload_bytes =
            parse_or("MAX_UPLOAD_BYTES", &lookup, || Ok(DEFAULT_MAX_UPLOAD_BYTES))?;

        let auto_migrate = lookup("AUTO_MIGRATE")
            .map(|value| flag_enabled(&value))
            .unwrap_or(false);

        Ok(AppConfig {
            environment,
            database_url,
            bind_addr,
            token: TokenConfig {
                secret,
                ttl: chrono::Duration::hours(ttl_hours),
            },
            upload_dir,
            max_upload_bytes,
            auto_migrate,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<T, F, D>(key: &'static str, lookup: &F, default: D) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
    D: FnOnce() -> Result<T, ConfigError>,
{
    match lookup(key).filter(|value| !value.is_empty()) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => default(),
    }
}

fn flag_enabled(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "True")
}

fn validate_production_secret(secret: &str) -> Result<(), ConfigError> {
    if decode_secret_bytes(secret).len() < MIN_SECRET_BYTES {
        return Err(ConfigError::WeakSecret("must be at least 32 bytes"));
    }

    let lowered = secret.to_ascii_lowercase();
    if lowered.contains("example") || lowered.contains("changeme") || lowered.contains("default") {
        return Err(ConfigError::WeakSecret("appears to be a default value"));
    }

    Ok(())
}

fn decode_secret_bytes(secret: &str) -> Vec<u8> {
    STANDARD
        .decode(secret.as_bytes())
        .unwrap_or_else(|_| secret.as_bytes().to_vec())
}

fn key_from_secret_bytes(bytes: &[u8]) -> Vec<u8> {
    if bytes.len() >= 64 {
        bytes.to_vec()
    } else {
        Sha512::digest(bytes).to_vec()
    }
}
