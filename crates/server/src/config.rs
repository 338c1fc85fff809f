//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

const ENV_PREFIX: &str = "RIGHTSIZE";

/// Server configuration, read from `RIGHTSIZE_*` environment variables
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    /// Name attached to every structured log record
    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port serving the API, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_service_name() -> String {
    "rightsize-server".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            bind_address: default_bind_address(),
            api_port: default_api_port(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_source(None)
    }

    /// Load from an explicit variable map instead of the process environment
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_source(Some(vars))
    }

    fn from_source(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .context("failed to read server configuration")?;

        config
            .try_deserialize()
            .context("invalid server configuration")
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.api_port)
    }
}
