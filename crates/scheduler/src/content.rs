use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::{debug, warn};

use crate::event::{PopupKind, PopupPayload};

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];
pub const WALLPAPER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("failed to list {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("message pool must contain at least one message")]
    EmptyPool,
}

/// Something a scheduler can ask for one piece of popup content per cycle.
pub trait ContentSource {
    fn kind(&self) -> PopupKind;

    /// `None` means nothing to show this cycle.
    fn produce(&mut self, rng: &mut dyn rand::RngCore) -> Option<PopupPayload>;
}

/// A directory scanned on every call for files with an allowed extension.
#[derive(Debug, Clone)]
pub struct ImageFolder {
    dir: PathBuf,
    extensions: &'static [&'static str],
}

impl ImageFolder {
    pub fn new(dir: impl Into<PathBuf>, extensions: &'static [&'static str]) -> Self {
        Self {
            dir: dir.into(),
            extensions,
        }
    }

    pub fn popup_images(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, IMAGE_EXTENSIONS)
    }

    pub fn wallpapers(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, WALLPAPER_EXTENSIONS)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| ext.eq_ignore_ascii_case(allowed))
            })
            .unwrap_or(false)
    }

    /// Matching files, sorted. A missing folder yields an empty list.
    pub fn candidates(&self) -> Result<Vec<PathBuf>, ContentError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|source| ContentError::ReadDir {
            path: self.dir.clone(),
            source,
        })?;

        let mut found: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && self.accepts(path))
            .collect();
        found.sort();
        Ok(found)
    }

    /// Uniform pick with replacement. Listing failures count as "no candidate".
    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<PathBuf> {
        let candidates = match self.candidates() {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(error = %err, "image folder unavailable; skipping");
                return None;
            }
        };

        if candidates.is_empty() {
            debug!(folder = %self.dir.display(), "no matching files");
            return None;
        }

        let index = rng.gen_range(0..candidates.len());
        candidates.into_iter().nth(index)
    }
}

impl ContentSource for ImageFolder {
    fn kind(&self) -> PopupKind {
        PopupKind::Image
    }

    fn produce(&mut self, rng: &mut dyn rand::RngCore) -> Option<PopupPayload> {
        self.pick_random(rng).map(PopupPayload::Image)
    }
}

/// Fixed, non-empty pool of text messages.
#[derive(Debug, Clone)]
pub struct TextPool {
    messages: Vec<String>,
}

impl TextPool {
    pub fn new<I, S>(messages: I) -> Result<Self, ContentError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let messages: Vec<String> = messages.into_iter().map(Into::into).collect();
        if messages.is_empty() {
            return Err(ContentError::EmptyPool);
        }
        Ok(Self { messages })
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let index = rng.gen_range(0..self.messages.len());
        self.messages[index].clone()
    }
}

impl ContentSource for TextPool {
    fn kind(&self) -> PopupKind {
        PopupKind::Text
    }

    fn produce(&mut self, rng: &mut dyn rand::RngCore) -> Option<PopupPayload> {
        Some(PopupPayload::Text(self.pick_random(rng)))
    }
}
