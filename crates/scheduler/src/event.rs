use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopupKind {
    Image,
    Text,
}

impl PopupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PopupKind::Image => "image",
            PopupKind::Text => "text",
        }
    }
}

impl fmt::Display for PopupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupPayload {
    Image(PathBuf),
    Text(String),
}

impl PopupPayload {
    pub fn kind(&self) -> PopupKind {
        match self {
            PopupPayload::Image(_) => PopupKind::Image,
            PopupPayload::Text(_) => PopupKind::Text,
        }
    }
}

/// One unit of "show this" work. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupEvent {
    payload: PopupPayload,
    display: Duration,
}

impl PopupEvent {
    pub fn new(payload: PopupPayload, display: Duration) -> Self {
        debug_assert!(!display.is_zero(), "popup display duration must be > 0");
        Self { payload, display }
    }

    pub fn payload(&self) -> &PopupPayload {
        &self.payload
    }

    pub fn display(&self) -> Duration {
        self.display
    }

    pub fn kind(&self) -> PopupKind {
        self.payload.kind()
    }

    pub fn into_parts(self) -> (PopupPayload, Duration) {
        (self.payload, self.display)
    }
}
