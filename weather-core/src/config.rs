use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LANG: &str = "ja";
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_STATIC_DIR: &str = "public";

pub const ENV_PORT: &str = "PORT";
pub const ENV_API_KEY: &str = "OPENWEATHERMAP_API_KEY";
pub const ENV_LANG: &str = "WEATHER_LANG";
pub const ENV_UPSTREAM_URL: &str = "OPENWEATHERMAP_BASE_URL";
pub const ENV_PROXY_URL: &str = "WEATHER_PROXY_URL";
pub const ENV_STATIC_DIR: &str = "WEATHER_STATIC_DIR";

/// Top-level configuration stored on disk, overlaid by the process environment.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// port = 3000
/// lang = "ja"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// OpenWeatherMap credential injected by the proxy.
    pub api_key: Option<String>,
    pub port: Option<u16>,
    /// Response language requested from the upstream provider.
    pub lang: Option<String>,
    pub upstream_url: Option<String>,
    /// Where the terminal client reaches the proxy.
    pub proxy_url: Option<String>,
    pub static_dir: Option<PathBuf>,
}

/// Everything the proxy needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub port: u16,
    pub api_key: String,
    pub lang: String,
    pub upstream_url: String,
    pub static_dir: PathBuf,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-task", "weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding client-local state such as the search history.
    pub fn data_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    /// Overlay environment variables on top of the file values.
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(ENV_PORT).filter(|p| !p.trim().is_empty()) {
            let port = port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("{ENV_PORT} must be a valid port number, got '{port}'"))?;
            self.port = Some(port);
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(lang) = lookup(ENV_LANG).filter(|l| !l.is_empty()) {
            self.lang = Some(lang);
        }
        if let Some(url) = lookup(ENV_UPSTREAM_URL).filter(|u| !u.is_empty()) {
            self.upstream_url = Some(url);
        }
        if let Some(url) = lookup(ENV_PROXY_URL).filter(|u| !u.is_empty()) {
            self.proxy_url = Some(url);
        }
        if let Some(dir) = lookup(ENV_STATIC_DIR).filter(|d| !d.is_empty()) {
            self.static_dir = Some(PathBuf::from(dir));
        }

        Ok(self)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn lang(&self) -> &str {
        self.lang.as_deref().unwrap_or(DEFAULT_LANG)
    }

    pub fn upstream_url(&self) -> &str {
        self.upstream_url.as_deref().unwrap_or(DEFAULT_UPSTREAM_URL)
    }

    pub fn proxy_url(&self) -> String {
        match &self.proxy_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port()),
        }
    }

    /// Resolve the settings the proxy server runs with. Fails without an API key.
    pub fn server_settings(&self) -> Result<ServerSettings> {
        let api_key = self.api_key.clone().ok_or_else(|| {
            anyhow!(
                "No upstream API key configured.\n\
                 Hint: set {ENV_API_KEY} or run `weather configure` and enter your API key."
            )
        })?;

        Ok(ServerSettings {
            port: self.port(),
            api_key,
            lang: self.lang().to_string(),
            upstream_url: self.upstream_url().to_string(),
            static_dir: self
                .static_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
        })
    }
}
