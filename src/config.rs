use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::charts::ChartTheme;

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults; the config file is optional.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Custom database path (overrides XDG default).
    pub db_path: Option<PathBuf>,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Chart rendering settings.
    pub charts: ChartConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    /// Multiplier applied to every font size.
    pub font_scale: f64,
    /// Render the four charts concurrently.
    pub parallel: bool,
    /// Extra TrueType files to try before the system locations.
    pub font_paths: Vec<PathBuf>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            font_scale: 1.2,
            parallel: false,
            font_paths: Vec::new(),
        }
    }
}

impl ChartConfig {
    pub fn theme(&self) -> ChartTheme {
        ChartTheme::default().with_font_scale(self.font_scale)
    }
}

impl AppConfig {
    /// Load config from `~/.config/moodplot/config.toml`, then apply
    /// environment overrides.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::parse(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// `DB_DATABASE` replaces the database path, `PORT` the server port.
    /// An unparseable port is ignored with a warning.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("DB_DATABASE").filter(|p| !p.is_empty()) {
            log::debug!("DB_DATABASE overrides db_path");
            self.db_path = Some(PathBuf::from(path));
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => log::warn!("Ignoring invalid PORT value: {port}"),
            }
        }
    }

    /// Database path: explicit override, then config, then XDG default.
    pub fn resolve_db_path(&self, cli_override: Option<PathBuf>) -> PathBuf {
        cli_override
            .or_else(|| self.db_path.clone())
            .unwrap_or_else(default_db_path)
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Resolve the default database path using XDG data directory.
pub fn default_db_path() -> PathBuf {
    if let Some(dirs) = ProjectDirs::from("", "", crate::APP_NAME) {
        dirs.data_dir().join("moodplot.db")
    } else {
        // Fallback: current directory
        PathBuf::from("moodplot.db")
    }
}
