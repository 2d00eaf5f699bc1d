//! CLI Configuration

use recruit_forms::ClientConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Keys accepted by `recruit config set/get`
pub const KEYS: [&str; 4] = ["api_url", "agency", "default_format", "log_level"];

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub api_url: Option<String>,
    pub agency: Option<String>,
    pub default_format: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self, String> {
        let path = Self::config_path(profile)?;
        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| e.to_string())?;
            toml::from_str(&content).map_err(|e| e.to_string())
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, profile: Option<&str>) -> Result<PathBuf, String> {
        let path = Self::config_path(profile)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(&path, content).map_err(|e| e.to_string())?;
        Ok(path)
    }

    pub fn get(&self, key: &str) -> Result<Option<&str>, String> {
        let value = match key {
            "api_url" => &self.api_url,
            "agency" => &self.agency,
            "default_format" => &self.default_format,
            "log_level" => &self.log_level,
            _ => return Err(format!("Unknown config key: {}", key)),
        };
        Ok(value.as_deref())
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), String> {
        let slot = match key {
            "api_url" => &mut self.api_url,
            "agency" => &mut self.agency,
            "default_format" => {
                if crate::output::OutputFormat::parse(&value).is_none() {
                    return Err(format!("Unknown output format: {}", value));
                }
                &mut self.default_format
            }
            "log_level" => &mut self.log_level,
            _ => return Err(format!("Unknown config key: {}", key)),
        };
        *slot = Some(value);
        Ok(())
    }

    /// HTTP client settings of `profile`; defaults when the file is absent
    pub fn load_client(profile: Option<&str>) -> Result<ClientConfig, String> {
        let path = Self::client_path(profile)?;
        if path.exists() {
            ClientConfig::load(&path).map_err(|e| format!("{}: {}", path.display(), e))
        } else {
            Ok(ClientConfig::default())
        }
    }

    pub fn save_client(client: &ClientConfig, profile: Option<&str>) -> Result<PathBuf, String> {
        let path = Self::client_path(profile)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        client.save(&path).map_err(|e| e.to_string())?;
        Ok(path)
    }

    fn config_path(profile: Option<&str>) -> Result<PathBuf, String> {
        Ok(Self::dir()?.join(Self::file_name("config", "toml", profile)))
    }

    fn client_path(profile: Option<&str>) -> Result<PathBuf, String> {
        Ok(Self::dir()?.join(Self::file_name("client", "json", profile)))
    }

    fn dir() -> Result<PathBuf, String> {
        let home = dirs::home_dir().ok_or("Cannot find home directory")?;
        Ok(home.join(".recruit"))
    }

    fn file_name(stem: &str, ext: &str, profile: Option<&str>) -> String {
        match profile {
            Some(p) => format!("{}.{}.{}", stem, p, ext),
            None => format!("{}.{}", stem, ext),
        }
    }
}
