use std::path::Path;

use gatehouse_net::Limits;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub greeting: String,
    pub listen: ListenConfig,
    pub limits: Limits,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            greeting: "Hello, World!".to_string(),
            listen: ListenConfig::default(),
            limits: Limits::default(),
        }
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ListenConfig {
    pub fn parse(raw: &str) -> Result<Self, ServerError> {
        let (host, port) = raw
            .rsplit_once(':')
            .ok_or_else(|| ServerError::Config(format!("listen address {raw} has no port")))?;
        let port = port
            .parse()
            .map_err(|_| ServerError::Config(format!("invalid listen port in {raw}")))?;
        if host.is_empty() {
            return Err(ServerError::Config(format!("listen address {raw} has no host")));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&raw).map_err(|err| ServerError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_create(path: &Path) -> Result<Self, ServerError> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ServerError> {
        let contents =
            toml::to_string_pretty(self).map_err(|err| ServerError::Config(err.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if let Some(name) = self.limits.first_zero_limit() {
            return Err(ServerError::Config(format!("limit {name} must be positive")));
        }
        if self.listen.host.is_empty() {
            return Err(ServerError::Config("listen host is empty".to_string()));
        }
        Ok(())
    }
}
