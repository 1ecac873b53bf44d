//! Proxy settings from a `key=value` file.
//!
//! Recognized keys: `proxy_address`, `proxy_type` (default `http`),
//! `proxy_username`, `proxy_password`. Without `proxy_address` requests go
//! direct.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{LlmError, LlmResult};

#[derive(Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub address: String,
    pub scheme: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxySettings {
    /// Parse the config text. `None` when no address is configured.
    pub fn parse(text: &str) -> Option<Self> {
        let config: HashMap<&str, &str> = text
            .lines()
            .filter_map(|line| line.trim().split_once('='))
            .map(|(key, value)| (key.trim(), value.trim()))
            .collect();

        let non_empty = |key: &str| {
            config
                .get(key)
                .filter(|value| !value.is_empty())
                .map(|value| value.to_string())
        };

        let address = non_empty("proxy_address")?;
        Some(Self {
            address,
            scheme: non_empty("proxy_type").unwrap_or_else(|| "http".to_string()),
            username: non_empty("proxy_username"),
            password: non_empty("proxy_password"),
        })
    }

    /// Read the config file; a missing file means no proxy.
    pub async fn load(path: impl AsRef<Path>) -> LlmResult<Option<Self>> {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No proxy config at {}, connecting directly", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Credentials are used only when both username and password are set.
    fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    pub fn url(&self) -> String {
        match self.credentials() {
            Some((user, pass)) => format!("{}://{}:{}@{}", self.scheme, user, pass, self.address),
            None => format!("{}://{}", self.scheme, self.address),
        }
    }

    /// Proxy URL with the password masked, for logs.
    pub fn redacted_url(&self) -> String {
        match self.credentials() {
            Some((user, _)) => format!("{}://{}:***@{}", self.scheme, user, self.address),
            None => format!("{}://{}", self.scheme, self.address),
        }
    }

    pub fn to_reqwest(&self) -> LlmResult<reqwest::Proxy> {
        let proxy = reqwest::Proxy::all(format!("{}://{}", self.scheme, self.address))
            .map_err(|e| LlmError::InvalidProxy(format!("{}: {}", self.redacted_url(), e)))?;
        Ok(match self.credentials() {
            Some((user, pass)) => proxy.basic_auth(user, pass),
            None => proxy,
        })
    }
}

impl std::fmt::Debug for ProxySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.redacted_url())
    }
}
