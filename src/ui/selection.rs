/// Offset of the trigger from the pointer, in page pixels.
pub const TRIGGER_OFFSET: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerPosition {
    pub x: f64,
    pub y: f64,
}

/// Tracks the last non-empty selection and where the floating trigger sits.
#[derive(Debug, Default)]
pub struct SelectionDetector {
    selection: String,
    trigger: Option<TriggerPosition>,
}

impl SelectionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &str {
        &self.selection
    }

    /// Where the trigger is shown, or `None` while hidden.
    pub fn trigger(&self) -> Option<TriggerPosition> {
        self.trigger
    }

    /// Pointer released at page coordinates `(x, y)` with `selected` as the
    /// current selection. Blank selections leave the previous state alone.
    pub fn on_pointer_up(&mut self, selected: &str, x: f64, y: f64) -> Option<TriggerPosition> {
        let text = selected.trim();
        if text.is_empty() {
            return None;
        }
        self.selection = text.to_string();
        let position = TriggerPosition {
            x: x + TRIGGER_OFFSET,
            y: y + TRIGGER_OFFSET,
        };
        self.trigger = Some(position);
        Some(position)
    }

    /// Pointer pressed somewhere on the page; anywhere but the trigger hides it.
    pub fn on_pointer_down(&mut self, on_trigger: bool) {
        if !on_trigger {
            self.trigger = None;
        }
    }

    /// The trigger was activated: hides it and hands back the selection to explain.
    pub fn activate(&mut self) -> String {
        self.trigger = None;
        self.selection.clone()
    }
}
