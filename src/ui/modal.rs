use log::debug;

use crate::request::{RawRequest, Response};

pub const EMPTY_SELECTION_ALERT: &str = "please select some text to explain";
const EXPLAINING_LABEL: &str = "Explaining...";
const ANSWERING_LABEL: &str = "Answering...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingAnswer,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Open(Phase),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    User(String),
    Answer(String),
    Error(String),
}

/// Identifies one open/close cycle of the modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

/// A request the caller must send over the bridge, tagged with the session
/// whose transcript the answer belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub session: SessionId,
    pub request: RawRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Other,
}

/// The explanation dialog.
///
/// At most one request is outstanding: while an answer is pending the chat
/// controls are disabled and further sends are ignored. Answers that arrive
/// for an earlier session (the modal was closed or reopened meanwhile) are
/// dropped.
#[derive(Debug)]
pub struct ModalPresenter {
    state: ModalState,
    session: u64,
    selection: String,
    transcript: Vec<Entry>,
    loading_label: Option<&'static str>,
}

impl Default for ModalPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalPresenter {
    pub fn new() -> Self {
        Self {
            state: ModalState::Closed,
            session: 0,
            selection: String::new(),
            transcript: Vec::new(),
            loading_label: None,
        }
    }

    pub fn state(&self) -> ModalState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ModalState::Open(_))
    }

    /// Chat input and send button are disabled while an answer is pending.
    pub fn controls_disabled(&self) -> bool {
        self.state == ModalState::Open(Phase::AwaitingAnswer)
    }

    pub fn transcript(&self) -> &[Entry] {
        &self.transcript
    }

    pub fn selection(&self) -> &str {
        &self.selection
    }

    pub fn loading_label(&self) -> Option<&'static str> {
        self.loading_label
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.is_open().then_some(SessionId(self.session))
    }

    /// Opens a fresh dialog for `text` and returns the explain request to send.
    /// An empty selection leaves the modal closed and returns the alert to show.
    pub fn open(&mut self, text: &str) -> Result<PendingRequest, &'static str> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EMPTY_SELECTION_ALERT);
        }

        if self.is_open() {
            self.close();
        }

        self.session += 1;
        self.selection = text.to_string();
        self.transcript = vec![Entry::User(self.selection.clone())];
        self.loading_label = Some(EXPLAINING_LABEL);
        self.state = ModalState::Open(Phase::AwaitingAnswer);
        debug!("Modal opened (session {})", self.session);

        Ok(PendingRequest {
            session: SessionId(self.session),
            request: RawRequest::explain(self.selection.clone()),
        })
    }

    /// Queues a follow-up question grounded in the original selection. Returns
    /// `None` when the modal is closed, an answer is pending, or `input` is blank.
    pub fn send_chat(&mut self, input: &str) -> Option<PendingRequest> {
        if self.state != ModalState::Open(Phase::Idle) {
            return None;
        }
        let query = input.trim();
        if query.is_empty() {
            return None;
        }

        self.transcript.push(Entry::User(query.to_string()));
        self.loading_label = Some(ANSWERING_LABEL);
        self.state = ModalState::Open(Phase::AwaitingAnswer);

        Some(PendingRequest {
            session: SessionId(self.session),
            request: RawRequest::chat(self.selection.clone(), query),
        })
    }

    /// Records the answer for `session`. Returns `false` when the answer is stale
    /// and was discarded.
    pub fn apply_response(&mut self, session: SessionId, response: Response) -> bool {
        if self.current_session() != Some(session) || !self.controls_disabled() {
            debug!("Discarding stale response for {:?}", session);
            return false;
        }

        self.transcript.push(match response {
            Response::Result(answer) => Entry::Answer(answer),
            Response::Error(message) => Entry::Error(message),
        });
        self.loading_label = None;
        self.state = ModalState::Open(Phase::Idle);
        true
    }

    pub fn close(&mut self) {
        if self.is_open() {
            debug!("Modal closed (session {})", self.session);
        }
        self.state = ModalState::Closed;
        self.transcript.clear();
        self.loading_label = None;
    }

    /// Keyboard handling for the dialog. `Enter` submits `input`.
    pub fn handle_key(&mut self, key: Key, input: &str) -> Option<PendingRequest> {
        match key {
            Key::Escape => {
                self.close();
                None
            }
            Key::Enter => self.send_chat(input),
            Key::Other => None,
        }
    }
}
