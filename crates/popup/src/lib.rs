//! Popup presentation for popcycle.
//!
//! [`Dispatcher`] is the only owner of the queue read ends and of popup
//! windows. [`run_event_loop`] drives it from the winit event loop on the
//! calling (UI) thread.

use std::path::PathBuf;
use std::time::Duration;

pub mod dispatcher;
pub mod draw;
pub mod window;

pub use dispatcher::{Dispatcher, PopupFactory, PopupId, TickReport};
pub use draw::Canvas;
pub use window::{run_event_loop, WinitPopup};

#[derive(Debug, thiserror::Error)]
pub enum PopupError {
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to create popup window: {0}")]
    Window(String),
    #[error("popup surface error: {0}")]
    Surface(String),
}

#[derive(Debug, Clone, Copy)]
pub struct UiConfig {
    pub tick: Duration,
    pub max_image_size: (u32, u32),
}

impl UiConfig {
    pub fn from_settings(settings: &popconfig::UiSettings) -> Self {
        Self {
            tick: settings.tick,
            max_image_size: settings.max_image_size,
        }
    }
}
