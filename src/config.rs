use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use crate::processing::types::DEFAULT_AUTO_LAP_DISTANCE;

/// Path of an optional TOML settings file.
pub const CONFIG_VAR: &str = "FITPACER_CONFIG";
pub const ADDR_VAR: &str = "FITPACER_ADDR";
pub const MAX_UPLOAD_BYTES_VAR: &str = "FITPACER_MAX_UPLOAD_BYTES";
pub const MAX_DOWNLOADS_VAR: &str = "FITPACER_MAX_DOWNLOADS";
pub const AUTO_LAP_METERS_VAR: &str = "FITPACER_AUTO_LAP_METERS";

/// Environment variables and the settings keys they override.
const ENV_KEYS: [(&str, &str); 4] = [
    (ADDR_VAR, "addr"),
    (MAX_UPLOAD_BYTES_VAR, "max_upload_bytes"),
    (MAX_DOWNLOADS_VAR, "max_downloads"),
    (AUTO_LAP_METERS_VAR, "auto_lap_meters"),
];

/// Server settings. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_addr")]
    pub addr: SocketAddr,
    /// Largest accepted request body.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Rewritten files kept for download; the oldest is dropped first.
    #[serde(default = "default_max_downloads")]
    pub max_downloads: usize,
    /// Auto-lap threshold in meters for kilometer paces. Mile paces always
    /// close laps every mile.
    #[serde(default = "default_auto_lap_meters")]
    pub auto_lap_meters: f64,
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_max_upload_bytes() -> usize {
    32 * 1024 * 1024
}

fn default_max_downloads() -> usize {
    32
}

fn default_auto_lap_meters() -> f64 {
    DEFAULT_AUTO_LAP_DISTANCE
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            max_upload_bytes: default_max_upload_bytes(),
            max_downloads: default_max_downloads(),
            auto_lap_meters: default_auto_lap_meters(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "cannot read settings file: {err}"),
            ConfigError::Parse(err) => write!(f, "invalid settings file: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(text).map_err(ConfigError::Parse)?;
        Self::from_table(table)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&text)
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Settings from the file named by `FITPACER_CONFIG` (if any), overridden
    /// by the `FITPACER_*` variables that `lookup` resolves. A file or value
    /// that cannot be used is logged and its defaults apply.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut table = match lookup(CONFIG_VAR) {
            Some(path) => match read_table(&path) {
                Ok(table) => table,
                Err(err) => {
                    tracing::warn!(path = %path, error = %err, "ignoring settings file");
                    toml::Table::new()
                }
            },
            None => toml::Table::new(),
        };

        for (variable, key) in ENV_KEYS {
            let Some(raw) = lookup(variable) else {
                continue;
            };
            let value = env_value(&raw);
            let single = toml::Table::from_iter([(key.to_string(), value.clone())]);
            match Self::from_table(single) {
                Ok(_) => {
                    table.insert(key.to_string(), value);
                }
                Err(err) => {
                    tracing::warn!(
                        variable,
                        value = %raw,
                        error = %err,
                        "ignoring invalid setting"
                    );
                }
            }
        }

        Self::from_table(table).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "using default settings");
            Self::default()
        })
    }

    fn from_table(table: toml::Table) -> Result<Self, ConfigError> {
        let config = toml::Value::Table(table)
            .try_into::<AppConfig>()
            .map_err(ConfigError::Parse)?;
        Ok(config.checked())
    }

    /// Replace values that parse but cannot be used with their defaults.
    fn checked(mut self) -> Self {
        if self.max_upload_bytes == 0 {
            tracing::warn!(key = "max_upload_bytes", "must be positive, using default");
            self.max_upload_bytes = default_max_upload_bytes();
        }
        if self.max_downloads == 0 {
            tracing::warn!(key = "max_downloads", "must be positive, using default");
            self.max_downloads = default_max_downloads();
        }
        if !(self.auto_lap_meters.is_finite() && self.auto_lap_meters > 0.0) {
            tracing::warn!(
                key = "auto_lap_meters",
                value = self.auto_lap_meters,
                "must be positive, using default"
            );
            self.auto_lap_meters = default_auto_lap_meters();
        }
        self
    }
}

fn read_table(path: &str) -> Result<toml::Table, ConfigError> {
    let text = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&text).map_err(ConfigError::Parse)
}

/// Environment values carry no type; numbers become TOML numbers and
/// anything else a string.
fn env_value(raw: &str) -> toml::Value {
    let raw = raw.trim();
    if let Ok(integer) = raw.parse::<i64>() {
        toml::Value::Integer(integer)
    } else if let Ok(float) = raw.parse::<f64>() {
        toml::Value::Float(float)
    } else {
        toml::Value::String(raw.to_string())
    }
}
