use std::path::Path;

use scheduler::WallpaperSetter;
use tracing::warn;

/// Sets the desktop background through the platform's wallpaper API.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopWallpaper;

impl WallpaperSetter for DesktopWallpaper {
    fn set_wallpaper(&self, path: &Path) -> bool {
        if !path.is_file() {
            warn!(path = %path.display(), "wallpaper file does not exist");
            return false;
        }
        let path_str = path.display().to_string();
        match wallpaper::set_from_path(&path_str) {
            Ok(()) => true,
            Err(err) => {
                warn!(path = %path_str, error = %err, "desktop rejected wallpaper");
                false
            }
        }
    }
}
