use std::{fmt::Display, path::PathBuf, str::FromStr};

use anyhow::anyhow;
use tracing::info;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DATABASE_URL: &str = "sqlite://profiles.db?mode=rwc";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_SESSION_MINUTES: i64 = 60;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 16;

#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub public_base_url: String,
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub session_minutes: i64,
    pub db_max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_owned(),
            admin_username: DEFAULT_ADMIN_USERNAME.to_owned(),
            admin_password: None,
            session_minutes: DEFAULT_SESSION_MINUTES,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn load() -> anyhow::Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            bind_addr: try_load("BIND_ADDR", defaults.bind_addr)?,
            database_url: try_load("DATABASE_URL", defaults.database_url)?,
            upload_dir: try_load("UPLOAD_DIR", defaults.upload_dir.display().to_string())?,
            max_upload_bytes: try_load("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            public_base_url: try_load::<String>("PUBLIC_BASE_URL", defaults.public_base_url)?
                .trim_end_matches('/')
                .to_owned(),
            admin_username: try_load("ADMIN_USERNAME", defaults.admin_username)?,
            admin_password: var("ADMIN_PASSWORD").filter(|password| !password.is_empty()),
            session_minutes: try_load("SESSION_MINUTES", defaults.session_minutes)?,
            db_max_connections: try_load("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    dotenv::var(key).ok()
}

fn try_load<T>(key: &str, default: impl Into<T> + Display) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = var(key) else {
        info!("{key} not set, using default: {default}");
        return Ok(default.into());
    };

    raw.parse()
        .map_err(|e| anyhow!("invalid {key} value {raw:?}: {e}"))
}
