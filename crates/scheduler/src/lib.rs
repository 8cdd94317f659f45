//! Background producers for popcycle.
//!
//! Every loop in this crate runs on its own OS thread and suspends only in
//! [`StopSignal::wait`]. Popup events leave through an [`event_queue`] whose
//! reader belongs to the UI thread.

pub mod content;
pub mod event;
pub mod interval;
pub mod queue;
pub mod rotator;
pub mod stop;

pub use content::{
    ContentError, ContentSource, ImageFolder, TextPool, IMAGE_EXTENSIONS, WALLPAPER_EXTENSIONS,
};
pub use event::{PopupEvent, PopupKind, PopupPayload};
pub use interval::{sample_interval, IntervalScheduler};
pub use queue::{event_queue, QueueReader, QueueWriter};
pub use rotator::{RotationOutcome, WallpaperRotator, WallpaperSetter};
pub use stop::{stop_pair, StopHandle, StopSignal};
