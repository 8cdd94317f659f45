use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "POPCYCLE_CONFIG_DIR";
pub const ENV_BASE_DIR: &str = "POPCYCLE_BASE_DIR";
pub const CONFIG_FILE_NAME: &str = "popcycle.toml";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "popcycle";
const APPLICATION: &str = "popcycle";

/// Where configuration lives and what relative content folders resolve
/// against.
#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    base_dir: PathBuf,
}

impl AppPaths {
    /// `base_override` (from the command line) wins over the environment,
    /// which wins over the executable's directory.
    pub fn discover(base_override: Option<PathBuf>) -> Result<Self> {
        let config_dir = match env_override(ENV_CONFIG_DIR) {
            Some(dir) => dir,
            None => ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
                .ok_or_else(|| anyhow!("failed to determine user directories"))?
                .config_dir()
                .to_path_buf(),
        };

        let base_dir = match base_override.or_else(|| env_override(ENV_BASE_DIR)) {
            Some(dir) => dir,
            None => executable_dir().context("failed to resolve popcycle base directory")?,
        };

        Ok(Self {
            config_dir,
            base_dir,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Absolute folders are kept; relative ones hang off the base directory.
    pub fn resolve(&self, folder: &Path) -> PathBuf {
        if folder.is_absolute() {
            folder.to_path_buf()
        } else {
            self.base_dir.join(folder)
        }
    }
}

#[cfg(test)]
impl AppPaths {
    pub fn from_raw(config_dir: PathBuf, base_dir: PathBuf) -> Self {
        Self {
            config_dir,
            base_dir,
        }
    }
}

fn executable_dir() -> Result<PathBuf> {
    let exe = env::current_exe().context("failed to locate the running executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe.display()))
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
