use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub webhook_secret: String,
    pub db_max_connections: u32,
    pub admin_rps: u32,
    pub ingest_rps: u32,
    /// Pause between consecutive remote calls inside one batch request.
    pub batch_delay_ms: u64,
    pub batch_chunk_size: usize,
    /// Upper bound on rows pulled before in-memory filtering.
    pub list_fetch_limit: i64,
    pub pending_plan_ttl_days: i64,
    pub expiry_sweep_secs: u64,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            webhook_secret: get_env("WEBHOOK_SECRET")?,
            db_max_connections: get_env_parse_or("DB_MAX_CONNECTIONS", 20)?,
            admin_rps: get_env_parse_or("ADMIN_RPS", 50)?,
            ingest_rps: get_env_parse_or("INGEST_RPS", 100)?,
            batch_delay_ms: get_env_parse_or("BATCH_DELAY_MS", 400)?,
            batch_chunk_size: get_env_parse_or("BATCH_CHUNK_SIZE", 50)?,
            list_fetch_limit: get_env_parse_or("LIST_FETCH_LIMIT", 1000)?,
            pending_plan_ttl_days: get_env_parse_or("PENDING_PLAN_TTL_DAYS", 30)?,
            expiry_sweep_secs: get_env_parse_or("EXPIRY_SWEEP_SECS", 3600)?,
            log_format: get_env_parse_or("LOG_FORMAT", LogFormat::Pretty)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
