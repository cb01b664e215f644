use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub csrf_secret: String,
    /// Role value whose holders only see rows matching their permission tokens.
    pub restricted_role: String,
    /// Scopes the admin listing to one bot when set.
    pub bot_id: Option<i64>,
    pub max_record_count: i64,
    pub order_type: String,
    pub uploads_dir: Option<String>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let storage_backend: StorageBackend =
            get_env_parse_or("STORAGE_BACKEND", StorageBackend::Postgres)?;
        let database_url = env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(Error::Config(
                "Missing environment variable: DATABASE_URL".to_string(),
            ));
        }

        let jwt_secret = get_env("JWT_SECRET")?;
        let csrf_secret = env::var("CSRF_SECRET").unwrap_or_else(|_| jwt_secret.clone());

        let bot_id = match env::var("BOT_ID") {
            Ok(raw) => Some(
                raw.trim()
                    .parse()
                    .map_err(|e| Error::Config(format!("Invalid value for BOT_ID: {}", e)))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:5000"),
            storage_backend,
            database_url,
            jwt_secret,
            csrf_secret,
            restricted_role: get_env_or("RESTRICTED_ROLE", "2"),
            bot_id,
            max_record_count: get_env_parse_or("MAX_RECORD_COUNT", 20)?,
            order_type: parse_order_type(&get_env_or("ORDER_TYPE", "ASC"))?,
            uploads_dir: env::var("UPLOADS_DIR").ok(),
            log_format: get_env_parse_or("LOG_FORMAT", LogFormat::Pretty)?,
        })
    }
}

fn parse_order_type(raw: &str) -> Result<String> {
    let upper = raw.trim().to_ascii_uppercase();
    match upper.as_str() {
        "ASC" | "DESC" => Ok(upper),
        _ => Err(Error::Config(format!("Invalid value for ORDER_TYPE: {}", raw))),
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
