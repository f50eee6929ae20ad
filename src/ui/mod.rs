//! Page-side state: selection tracking, the explanation modal and the options form.

pub mod modal;
pub mod options;
pub mod render;
pub mod selection;

pub use modal::{Entry, Key, ModalPresenter, ModalState, PendingRequest, Phase, SessionId};
pub use options::{OptionsForm, StatusMessage};
pub use selection::{SelectionDetector, TriggerPosition};
