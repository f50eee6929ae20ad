use log::{debug, warn};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub const SETTINGS_STORE_PATH: &str = "settings_store.json";
pub const APP_DIR_NAME: &str = "selection-explainer";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    OpenAI,
}

impl Provider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Some(Provider::Gemini),
            "openai" => Some(Provider::OpenAI),
            _ => None,
        }
    }

    /// Stored identifier, as written to the settings file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAI => "openai",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gemini => write!(f, "Gemini"),
            Provider::OpenAI => write!(f, "OpenAI"),
        }
    }
}

// Accepts any casing ("OpenAI", "openai") so hand-edited files still load.
impl<'de> Deserialize<'de> for Provider {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ProviderVisitor;

        impl<'de> Visitor<'de> for ProviderVisitor {
            type Value = Provider;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a provider name (\"gemini\" or \"openai\")")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Provider, E> {
                Provider::parse(value)
                    .ok_or_else(|| E::unknown_variant(value, &["gemini", "openai"]))
            }
        }

        deserializer.deserialize_str(ProviderVisitor)
    }
}

/// Persisted user configuration. Field names match the stored keys.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, deserialize_with = "lenient_provider")]
    pub provider: Provider,
    #[serde(default)]
    pub gemini_key: String,
    #[serde(default)]
    pub openai_key: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
}

// An unknown provider resets only this field; the stored keys stay usable.
fn lenient_provider<'de, D>(deserializer: D) -> Result<Provider, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    match serde_json::from_value::<Provider>(raw.clone()) {
        Ok(provider) => Ok(provider),
        Err(e) => {
            warn!("Unknown provider {} in settings, using default: {}", raw, e);
            Ok(Provider::default())
        }
    }
}

fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.to_string()
}

pub fn get_default_settings() -> Settings {
    Settings {
        provider: Provider::Gemini,
        gemini_key: String::new(),
        openai_key: String::new(),
        openai_model: default_openai_model(),
    }
}

impl Default for Settings {
    fn default() -> Self {
        get_default_settings()
    }
}

impl Settings {
    /// The key configured for `provider`, if any.
    pub fn api_key(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::Gemini => self.gemini_key.trim(),
            Provider::OpenAI => self.openai_key.trim(),
        };
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    /// The OpenAI model, falling back to the default when the stored value is blank.
    pub fn openai_model(&self) -> &str {
        let model = self.openai_model.trim();
        if model.is_empty() {
            DEFAULT_OPENAI_MODEL
        } else {
            model
        }
    }
}

enum Backing {
    File(PathBuf),
    Memory(RwLock<Settings>),
}

/// Key-value settings store. The request path only reads; the options surface writes.
pub struct SettingsStore {
    backing: Backing,
}

pub fn default_store_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(SETTINGS_STORE_PATH))
}

impl SettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            backing: Backing::File(path.into()),
        }
    }

    pub fn in_memory(settings: Settings) -> Self {
        Self {
            backing: Backing::Memory(RwLock::new(settings)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::File(path) => Some(path),
            Backing::Memory(_) => None,
        }
    }

    /// Reads the current settings. Missing keys take their defaults and a missing
    /// or unparseable file yields the defaults outright.
    pub async fn get_settings(&self) -> Settings {
        match &self.backing {
            Backing::Memory(lock) => lock.read().unwrap_or_else(|e| e.into_inner()).clone(),
            Backing::File(path) => match tokio::fs::read_to_string(path).await {
                Ok(contents) => match serde_json::from_str::<Settings>(&contents) {
                    Ok(settings) => {
                        debug!("Loaded settings from {}", path.display());
                        settings
                    }
                    Err(e) => {
                        warn!("Failed to parse settings at {}: {}", path.display(), e);
                        get_default_settings()
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("No settings at {}, using defaults", path.display());
                    get_default_settings()
                }
                Err(e) => {
                    warn!("Failed to read settings at {}: {}", path.display(), e);
                    get_default_settings()
                }
            },
        }
    }

    pub async fn write_settings(&self, settings: &Settings) -> io::Result<()> {
        match &self.backing {
            Backing::Memory(lock) => {
                *lock.write().unwrap_or_else(|e| e.into_inner()) = settings.clone();
                Ok(())
            }
            Backing::File(path) => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                let json = serde_json::to_string_pretty(settings)?;
                tokio::fs::write(path, json).await?;
                debug!("Wrote settings to {}", path.display());
                Ok(())
            }
        }
    }
}
