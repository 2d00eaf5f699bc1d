//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Recruitment API client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL all endpoints are joined onto
    pub api_base_url: String,
    /// Agency code used when none is given
    pub default_agency: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// User-Agent header
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/".into(),
            default_agency: None,
            request_timeout_secs: 30,
            user_agent: format!("recruit-forms/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Load from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL with a trailing slash, so relative joins keep its path
    pub fn normalized_base_url(&self) -> String {
        let mut base = self.api_base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config: ClientConfig = serde_json::from_str(r#"{"api_base_url": "https://jobs.example.org/api"}"#).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.normalized_base_url(), "https://jobs.example.org/api/");
        assert!(config.default_agency.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("recruit-forms-config-{}.json", std::process::id()));
        let config = ClientConfig { default_agency: Some("upsc".into()), ..Default::default() };
        config.save(&path).unwrap();
        assert_eq!(ClientConfig::load(&path).unwrap(), config);
        let _ = std::fs::remove_file(&path);
    }
}
