use std::fs;
use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use popconfig::PopConfig;
use popup::UiConfig;
use scheduler::{
    event_queue, stop_pair, ImageFolder, IntervalScheduler, StopSignal, TextPool,
    WallpaperRotator,
};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::desktop::DesktopWallpaper;
use crate::paths::AppPaths;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// An explicit `--config` must exist; the default location is optional.
pub fn load_config(args: &RunArgs, paths: &AppPaths) -> Result<(PopConfig, ConfigSource)> {
    let (path, required) = match &args.config {
        Some(path) => (path.clone(), true),
        None => (paths.config_file(), false),
    };

    if !required && !path.exists() {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
        return Ok((PopConfig::default(), ConfigSource::Defaults));
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = PopConfig::from_toml_str(&contents)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok((config, ConfigSource::File(path)))
}

pub fn seed_from_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover(args.base_dir.clone())?;
    let (config, source) = load_config(&args, &paths)?;
    let seed = args.seed.unwrap_or_else(seed_from_time);
    tracing::info!(
        config = %source,
        base_dir = %paths.base_dir().display(),
        seed,
        "starting popcycle"
    );

    let (image_writer, image_reader) = event_queue();
    let (text_writer, text_reader) = event_queue();
    let (stop, signal) = stop_pair();
    let mut workers: Vec<JoinHandle<()>> = Vec::new();

    if config.images.enabled {
        let folder = ImageFolder::popup_images(paths.resolve(&config.images.folder));
        let scheduler =
            IntervalScheduler::new(folder, image_writer, config.image_intervals(), seed);
        workers.push(
            scheduler
                .spawn(signal.clone())
                .context("failed to spawn image scheduler")?,
        );
    } else {
        tracing::info!("image popups disabled");
    }

    if config.text.enabled {
        let pool = TextPool::new(config.text.messages.iter().cloned())
            .context("text popups enabled without messages")?;
        let scheduler = IntervalScheduler::new(
            pool,
            text_writer,
            config.text_intervals(),
            seed.wrapping_add(1),
        );
        workers.push(
            scheduler
                .spawn(signal.clone())
                .context("failed to spawn text scheduler")?,
        );
    } else {
        tracing::info!("text popups disabled");
    }

    if let Some(worker) = spawn_rotator(&args, &config, &paths, seed, signal)? {
        workers.push(worker);
    }

    let outcome = popup::run_event_loop(
        image_reader,
        text_reader,
        UiConfig::from_settings(&config.ui),
    );

    stop.stop();
    for worker in workers {
        if worker.join().is_err() {
            tracing::warn!("background worker panicked");
        }
    }
    tracing::info!("popcycle exited");
    outcome
}

fn spawn_rotator(
    args: &RunArgs,
    config: &PopConfig,
    paths: &AppPaths,
    seed: u64,
    signal: StopSignal,
) -> Result<Option<JoinHandle<()>>> {
    if args.no_wallpaper {
        tracing::info!("wallpaper rotation disabled (--no-wallpaper)");
        return Ok(None);
    }
    if !config.wallpaper_active() {
        tracing::info!("wallpaper rotation disabled by configuration");
        return Ok(None);
    }

    let folder = ImageFolder::wallpapers(paths.resolve(&config.wallpaper.folder));
    let rotator = WallpaperRotator::new(
        folder,
        DesktopWallpaper,
        config.wallpaper.interval,
        seed.wrapping_add(2),
    );
    let handle = rotator
        .spawn(signal)
        .context("failed to spawn wallpaper rotator")?;
    Ok(Some(handle))
}

/// Loads and validates configuration, then reports what a run would use.
pub fn check(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover(args.base_dir.clone())?;
    let (config, source) = load_config(&args, &paths)?;

    println!("config: {source}");
    println!("config directory: {}", paths.config_dir().display());
    println!("base directory: {}", paths.base_dir().display());

    let images = ImageFolder::popup_images(paths.resolve(&config.images.folder));
    report_folder("images", config.images.enabled, &images)?;

    if config.text.enabled {
        println!("text: {} message(s)", config.text.messages.len());
    } else {
        println!("text: disabled");
    }

    let wallpapers = ImageFolder::wallpapers(paths.resolve(&config.wallpaper.folder));
    let rotating = config.wallpaper_active() && !args.no_wallpaper;
    report_folder("wallpaper", rotating, &wallpapers)?;

    println!("ui tick: {}", humanize(config.ui.tick));
    Ok(())
}

/// Prints the effective configuration as TOML.
pub fn print_config(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover(args.base_dir.clone())?;
    let (config, source) = load_config(&args, &paths)?;
    let rendered = config
        .to_toml_string()
        .context("failed to render configuration as TOML")?;
    println!("# source: {source}");
    print!("{rendered}");
    Ok(())
}

fn report_folder(label: &str, enabled: bool, folder: &ImageFolder) -> Result<()> {
    if !enabled {
        println!("{label}: disabled");
        return Ok(());
    }
    let candidates = folder
        .candidates()
        .with_context(|| format!("failed to list {label} folder"))?;
    let note = if folder.dir().is_dir() { "" } else { " (missing)" };
    println!(
        "{label}: {}{note} ({} candidate(s))",
        folder.dir().display(),
        candidates.len()
    );
    Ok(())
}

fn humanize(duration: std::time::Duration) -> String {
    if duration.subsec_nanos() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
