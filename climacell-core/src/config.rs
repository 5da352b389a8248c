use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

use crate::error::{Error, Result};

/// Default ClimaCell API root.
pub const DEFAULT_BASE_URL: &str = "https://api.climacell.co/v3/";

/// Default measurement convention applied to returned values.
pub const DEFAULT_UNIT_SYSTEM: &str = "si";

/// Fields requested from the data layers unless the caller picks their own.
// TODO: Conditionally add more fields when available.
pub const DEFAULT_FIELDS: [&str; 11] = [
    "temp",
    "feels_like",
    "humidity",
    "wind_speed",
    "wind_direction",
    "baro_pressure",
    "precipitation",
    "sunrise",
    "sunset",
    "visibility",
    "weather_code",
];

const ENV_API_KEY: &str = "CLIMACELL_KEY";
const ENV_GEOCODER_KEY: &str = "OPENCAGE_KEY";
const ENV_UNIT_SYSTEM: &str = "CLIMACELL_UNIT_SYSTEM";
const ENV_BASE_URL: &str = "CLIMACELL_BASE_URL";

/// Raw configuration values as they appear in one source.
///
/// Both the on-disk TOML file and the environment are read into this shape
/// before being merged into [`Settings`]. It is also what
/// `climacell configure` persists.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoredSettings {
    pub api_key: Option<String>,
    pub geocoder_key: Option<String>,
    pub unit_system: Option<String>,
    pub base_url: Option<String>,
}

impl StoredSettings {
    /// Load the config file, or return an empty record if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|err| {
            Error::Config(format!("failed to read config file {}: {err}", path.display()))
        })?;

        toml::from_str(&contents).map_err(|err| {
            Error::Config(format!("failed to parse config file {}: {err}", path.display()))
        })
    }

    /// Save to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                Error::Config(format!(
                    "failed to create config directory {}: {err}",
                    parent.display()
                ))
            })?;
        }

        let toml = toml::to_string_pretty(self)
            .map_err(|err| Error::Config(format!("failed to serialize configuration: {err}")))?;

        fs::write(&path, toml).map_err(|err| {
            Error::Config(format!("failed to write config file {}: {err}", path.display()))
        })
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "climacell", "climacell-cli")
            .ok_or_else(|| Error::Config("could not determine platform config directory".into()))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Read the documented environment variables. Empty values count as unset.
    fn from_env() -> Self {
        Self {
            api_key: env_var(ENV_API_KEY),
            geocoder_key: env_var(ENV_GEOCODER_KEY),
            unit_system: env_var(ENV_UNIT_SYSTEM),
            base_url: env_var(ENV_BASE_URL),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// Validated, immutable configuration.
///
/// Constructed once at process start and read-only afterwards; every other
/// component takes it by reference.
#[derive(Debug, Clone)]
pub struct Settings {
    base_url: String,
    api_key: String,
    geocoder_key: Option<String>,
    unit_system: String,
    fields: Vec<String>,
}

impl Settings {
    /// Load from the config file with environment overrides layered on top.
    ///
    /// Fails fast with [`Error::Config`] when no API key is present in
    /// either source.
    pub fn load() -> Result<Self> {
        Self::merge(StoredSettings::load()?, StoredSettings::from_env())
    }

    /// Explicit constructor with the built-in defaults; useful for tests and
    /// for embedding the library.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            geocoder_key: None,
            unit_system: DEFAULT_UNIT_SYSTEM.to_string(),
            fields: DEFAULT_FIELDS.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn with_geocoder_key(mut self, key: impl Into<String>) -> Self {
        self.geocoder_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_unit_system(mut self, unit_system: impl Into<String>) -> Self {
        self.unit_system = unit_system.into();
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    /// Merge two sources; `env` wins over `file`, built-in defaults fill the
    /// rest.
    fn merge(file: StoredSettings, env: StoredSettings) -> Result<Self> {
        let api_key = env
            .api_key
            .or(file.api_key)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "{ENV_API_KEY} is not set and no API key is stored; run `climacell configure`"
                ))
            })?;

        let mut settings = Settings::new(api_key);
        if let Some(key) = env.geocoder_key.or(file.geocoder_key).filter(|k| !k.is_empty()) {
            settings = settings.with_geocoder_key(key);
        }
        if let Some(unit_system) = env.unit_system.or(file.unit_system) {
            settings = settings.with_unit_system(unit_system);
        }
        if let Some(base_url) = env.base_url.or(file.base_url) {
            settings = settings.with_base_url(base_url);
        }

        Ok(settings)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn geocoder_key(&self) -> Option<&str> {
        self.geocoder_key.as_deref()
    }

    pub fn unit_system(&self) -> &str {
        &self.unit_system
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}
