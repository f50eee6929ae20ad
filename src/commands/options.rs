use crate::providers::get_available_providers;
use crate::settings::{Provider, SettingsStore};
use crate::ui::{OptionsForm, StatusMessage};

/// Changes requested from the command line; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct OptionsUpdate {
    pub provider: Option<Provider>,
    pub gemini_key: Option<String>,
    pub openai_key: Option<String>,
    pub openai_model: Option<String>,
}

fn mask_key(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return "(not set)".to_string();
    }
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{}", tail)
}

pub async fn show_options(store: &SettingsStore) -> String {
    let form = OptionsForm::restore(store).await;
    let mut lines = vec![format!("provider: {}", form.provider.as_str())];

    for info in get_available_providers() {
        if !form.shows_section(info.id) {
            continue;
        }
        match info.id {
            Provider::Gemini => {
                lines.push(format!("geminiKey: {}", mask_key(&form.gemini_key)));
            }
            Provider::OpenAI => {
                lines.push(format!("openaiKey: {}", mask_key(&form.openai_key)));
                lines.push(format!("openaiModel: {}", form.openai_model));
            }
        }
        lines.push(format!("models: {}", info.models.join(", ")));
        lines.push(format!("get a key at: {}", info.api_key_url));
    }

    if let Some(path) = store.path() {
        lines.push(format!("stored in: {}", path.display()));
    }
    lines.join("\n")
}

pub async fn set_options(store: &SettingsStore, update: OptionsUpdate) -> StatusMessage {
    let mut form = OptionsForm::restore(store).await;
    if let Some(provider) = update.provider {
        form.provider = provider;
    }
    if let Some(key) = update.gemini_key {
        form.gemini_key = key;
    }
    if let Some(key) = update.openai_key {
        form.openai_key = key;
    }
    if let Some(model) = update.openai_model {
        form.openai_model = model;
    }
    form.save(store).await
}
