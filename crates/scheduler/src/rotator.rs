use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::content::ImageFolder;
use crate::stop::StopSignal;

/// Applies an image as the desktop background. Must report failure instead of
/// panicking.
pub trait WallpaperSetter {
    fn set_wallpaper(&self, path: &Path) -> bool;
}

impl<F> WallpaperSetter for F
where
    F: Fn(&Path) -> bool,
{
    fn set_wallpaper(&self, path: &Path) -> bool {
        self(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    Applied(PathBuf),
    NoCandidates,
    Failed(PathBuf),
}

pub struct WallpaperRotator<W> {
    folder: ImageFolder,
    setter: W,
    interval: Duration,
    rng: StdRng,
}

impl<W: WallpaperSetter> WallpaperRotator<W> {
    pub fn new(folder: ImageFolder, setter: W, interval: Duration, seed: u64) -> Self {
        Self {
            folder,
            setter,
            interval,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Rescans the folder and hands one random candidate to the setter.
    pub fn rotate_once(&mut self) -> RotationOutcome {
        let Some(choice) = self.folder.pick_random(&mut self.rng) else {
            return RotationOutcome::NoCandidates;
        };

        let target = absolute_path(&choice);
        if self.setter.set_wallpaper(&target) {
            RotationOutcome::Applied(target)
        } else {
            RotationOutcome::Failed(target)
        }
    }

    /// Rotates immediately, then once per interval until `stop` fires.
    pub fn run(mut self, stop: StopSignal) {
        info!(
            folder = %self.folder.dir().display(),
            interval_secs = self.interval.as_secs(),
            "wallpaper rotator started"
        );
        loop {
            match self.rotate_once() {
                RotationOutcome::Applied(path) => {
                    info!(path = %path.display(), "wallpaper changed");
                }
                RotationOutcome::NoCandidates => {
                    debug!(
                        folder = %self.folder.dir().display(),
                        "no wallpaper candidates; skipping rotation"
                    );
                }
                RotationOutcome::Failed(path) => {
                    warn!(
                        path = %path.display(),
                        "failed to apply wallpaper; retrying next interval"
                    );
                }
            }
            if !stop.wait(self.interval) {
                break;
            }
        }
        info!("wallpaper rotator stopped");
    }
}

impl<W: WallpaperSetter + Send + 'static> WallpaperRotator<W> {
    pub fn spawn(self, stop: StopSignal) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("popcycle-wallpaper".into())
            .spawn(move || self.run(stop))
    }
}

fn absolute_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
