use log::{error, info};
use std::time::Duration;

use crate::settings::{Provider, Settings, SettingsStore, DEFAULT_OPENAI_MODEL};

/// How long a status message stays visible after a save attempt.
pub const STATUS_DISPLAY: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub display_for: Duration,
}

impl StatusMessage {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
            display_for: STATUS_DISPLAY,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
            display_for: STATUS_DISPLAY,
        }
    }
}

/// The options page form. Fields hold raw input until `save` trims them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsForm {
    pub provider: Provider,
    pub gemini_key: String,
    pub openai_key: String,
    pub openai_model: String,
}

impl From<Settings> for OptionsForm {
    fn from(settings: Settings) -> Self {
        Self {
            provider: settings.provider,
            gemini_key: settings.gemini_key,
            openai_key: settings.openai_key,
            openai_model: settings.openai_model,
        }
    }
}

impl OptionsForm {
    pub async fn restore(store: &SettingsStore) -> Self {
        store.get_settings().await.into()
    }

    /// Only the selected provider's section is shown.
    pub fn shows_section(&self, provider: Provider) -> bool {
        self.provider == provider
    }

    fn to_settings(&self) -> Settings {
        let model = self.openai_model.trim();
        Settings {
            provider: self.provider,
            gemini_key: self.gemini_key.trim().to_string(),
            openai_key: self.openai_key.trim().to_string(),
            openai_model: if model.is_empty() {
                DEFAULT_OPENAI_MODEL.to_string()
            } else {
                model.to_string()
            },
        }
    }

    pub fn validate(&self) -> Option<&'static str> {
        let settings = self.to_settings();
        match settings.provider {
            Provider::Gemini if settings.gemini_key.is_empty() => {
                Some("please enter a Gemini API key")
            }
            Provider::OpenAI if settings.openai_key.is_empty() => {
                Some("please enter an OpenAI API key")
            }
            _ => None,
        }
    }

    /// Validates and persists the form. Nothing is written when validation fails.
    pub async fn save(&self, store: &SettingsStore) -> StatusMessage {
        if let Some(message) = self.validate() {
            return StatusMessage::error(message);
        }

        match store.write_settings(&self.to_settings()).await {
            Ok(()) => {
                info!("Saved settings (provider: {})", self.provider.as_str());
                StatusMessage::ok("settings saved")
            }
            Err(e) => {
                error!("Failed to save settings: {}", e);
                StatusMessage::error(format!("failed to save settings: {}", e))
            }
        }
    }
}
