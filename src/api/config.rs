use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};

/// Runtime configuration, read once at startup from the environment
/// (a `.env` file is loaded beforehand in `main`).
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Optional bootstrap credentials; seeds the first admin account
    /// when the admin table is empty.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            database_url: try_load("DATABASE_URL", "sqlite://portal.db"),
            port: try_load("PORT", "8080"),
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("invalid {key} value: {e}");
        })
        .expect("environment misconfigured")
}
