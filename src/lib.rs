pub mod bridge;
pub mod commands;
pub mod dispatch;
pub mod error;
pub mod providers;
pub mod request;
pub mod settings;
pub mod ui;

pub use dispatch::Dispatcher;
pub use error::ExplainError;
pub use request::{Action, NormalizedRequest, RawRequest, Response};
pub use settings::{Provider, Settings, SettingsStore};
