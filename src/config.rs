//! Runtime settings, read from an optional `settings.toml` and then from the
//! environment (`SUPABASE_URL`, `SUPABASE_KEY`, `BIND_ADDRESS`, ...).

use std::net::SocketAddr;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub supabase_url: String,
    pub supabase_key: String,
    pub bind_address: SocketAddr,
    pub bootstrap_schema: bool,
    pub seed_demo: bool,
    pub memory_store: bool,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("supabase_url", "")?
            .set_default("supabase_key", "")?
            .set_default("bind_address", "127.0.0.1:3000")?
            .set_default("bootstrap_schema", false)?
            .set_default("seed_demo", true)?
            .set_default("memory_store", false)?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Only presence is checked; the values are handed to the database
    /// client and the api key guard as they are.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supabase_key.trim().is_empty() {
            return Err(ConfigError::NotFound("supabase_key".to_string()));
        }
        if !self.memory_store && self.supabase_url.trim().is_empty() {
            return Err(ConfigError::NotFound("supabase_url".to_string()));
        }
        Ok(())
    }

    /// Settings for an in-process run against the memory store.
    pub fn in_memory<S: Into<String>>(key: S) -> Self {
        Self {
            supabase_url: String::new(),
            supabase_key: key.into(),
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            bootstrap_schema: false,
            seed_demo: true,
            memory_store: true,
        }
    }
}
