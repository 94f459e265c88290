use std::env;

use log::warn;
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:8080,http://localhost:5173,http://127.0.0.1:8080,http://127.0.0.1:5173";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    MongoDb { uri: String, database: String },
    Memory,
}

#[derive(Clone)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

#[derive(Clone)]
pub struct Config {
    pub storage: Storage,
    pub host: String,
    pub port: u16,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    /// `None` switches the Google routes off.
    pub google: Option<GoogleCredentials>,
    pub frontend_url: String,
    pub cors_origins: Vec<String>,
    pub bypass_auth: bool,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let storage = match var("STORAGE_BACKEND").as_deref() {
            None | Some("mongodb") => Storage::MongoDb {
                uri: var("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?,
                database: var("DATABASE_NAME").unwrap_or_else(|| "projexia".to_string()),
            },
            Some("memory") => Storage::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let port = parse_or("PORT", var("PORT"), 5000u16)?;
        let session_ttl_hours = parse_or("SESSION_TTL_HOURS", var("SESSION_TTL_HOURS"), 24i64)?;
        if session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                name: "SESSION_TTL_HOURS",
                value: session_ttl_hours.to_string(),
            });
        }

        let bcrypt_cost = parse_or("BCRYPT_COST", var("BCRYPT_COST"), 10u32)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let bypass_auth = parse_or("BYPASS_AUTH", var("BYPASS_AUTH"), false)?;

        let session_secret = match var("SESSION_SECRET") {
            Some(secret) => secret,
            None => {
                warn!("SESSION_SECRET is not set; sessions will not survive a restart");
                format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
            }
        };

        let google = match (var("GOOGLE_CLIENT_ID"), var("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GoogleCredentials {
                client_id,
                client_secret,
                callback_url: var("GOOGLE_CALLBACK_URL").unwrap_or_else(|| {
                    "http://localhost:5000/api/auth/google/callback".to_string()
                }),
            }),
            _ => None,
        };

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Config {
            storage,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            session_secret,
            session_ttl_hours,
            google,
            frontend_url: var("FRONTEND_URL").unwrap_or_else(|| "http://localhost:8080".to_string()),
            cors_origins,
            bypass_auth,
            bcrypt_cost,
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
