use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::dispatch::DispatchConfig;
use crate::error::{config_error, Error};
use crate::sweeper::SweeperConfig;

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub dispatch: DispatchConfig,
    pub sweeper: SweeperConfig,
}

impl Config {
    /// Environment-driven configuration with coded defaults; without a
    /// `DATABASE_URL` the engine falls back to the in-memory store.
    pub fn from_env() -> Result<Self, Error> {
        let bind_addr = env_or("BIND_ADDR", "127.0.0.1:3000")?
            .parse()
            .map_err(|_| config_error("invalid BIND_ADDR"))?;

        let database_url = match env::var("DATABASE_URL") {
            Ok(url) => Some(url),
            Err(env::VarError::NotPresent) => None,
            Err(err) => return Err(err.into()),
        };

        let defaults = DispatchConfig::default();
        let dispatch = DispatchConfig {
            initial_radius_km: parse_or("DISPATCH_INITIAL_RADIUS_KM", defaults.initial_radius_km)?,
            radius_step_km: parse_or("DISPATCH_RADIUS_STEP_KM", defaults.radius_step_km)?,
            max_radius_km: parse_or("DISPATCH_MAX_RADIUS_KM", defaults.max_radius_km)?,
            max_fanout: parse_or("DISPATCH_MAX_FANOUT", defaults.max_fanout)?,
            freshness_window: chrono::Duration::minutes(parse_or(
                "DISPATCH_FRESHNESS_MINUTES",
                10,
            )?),
        };

        let sweeper = SweeperConfig {
            interval: std::time::Duration::from_secs(parse_or("SWEEPER_INTERVAL_SECONDS", 300)?),
            timeout: chrono::Duration::minutes(parse_or("SWEEPER_TIMEOUT_MINUTES", 10)?),
        };

        Ok(Self {
            bind_addr,
            database_url,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5)?,
            dispatch,
            sweeper,
        })
    }
}

fn env_or(key: &str, default: &str) -> Result<String, Error> {
    match env::var(key) {
        Ok(value) => Ok(value),
        Err(env::VarError::NotPresent) => Ok(default.into()),
        Err(err) => Err(err.into()),
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, Error> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| config_error(format!("invalid {}", key))),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err.into()),
    }
}
