//! Config module contains the top-level config for the app.
use std::env;

use config_crate::{Config as RawConfig, ConfigError, Environment, File};

/// Basic settings - HTTP binding address and database DSN
#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub host: String,
    pub port: String,
    pub database: String,
    pub thread_count: usize,
}

/// Search index settings
#[derive(Debug, Deserialize, Clone)]
pub struct Search {
    pub address: String,
    pub index: String,
    pub timeout_ms: u64,
}

/// Listings behaviour settings
#[derive(Debug, Deserialize, Clone)]
pub struct Listings {
    /// Upper bound for category and location lineage walks
    pub max_tree_depth: usize,
    pub default_per_page: i64,
    pub max_per_page: i64,
}

/// Service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: Server,
    pub search: Search,
    pub listings: Listings,
}

impl Config {
    /// Creates config from base.toml, which are overwritten by <env>.toml, where env is one of development,
    /// test, production. After that it could be overwritten by env variables like LISTINGS_SERVER__PORT
    /// (this will override `server.port` field in config).
    pub fn new() -> Result<Self, ConfigError> {
        let env = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Config::with_env(env)
    }

    pub fn with_env(env: impl Into<String>) -> Result<Self, ConfigError> {
        let mut s = RawConfig::new();

        s.merge(File::with_name("config/base"))?;
        // Optional file specific for environment
        s.merge(File::with_name(&format!("config/{}", env.into())).required(false))?;
        s.merge(Environment::with_prefix("LISTINGS").separator("__"))?;
        s.try_into()
    }

    pub fn search_timeout(&self) -> ::std::time::Duration {
        ::std::time::Duration::from_millis(self.search.timeout_ms)
    }
}
