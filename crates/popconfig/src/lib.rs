use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level `popcycle.toml` contents. Fixed at start-up.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PopConfig {
    pub version: u32,
    #[serde(default)]
    pub images: ImagePopups,
    #[serde(default)]
    pub text: TextPopups,
    #[serde(default)]
    pub wallpaper: WallpaperRotation,
    #[serde(default)]
    pub ui: UiSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImagePopups {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_image_folder")]
    pub folder: PathBuf,
    #[serde(
        default = "default_image_min_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub min_interval: Duration,
    #[serde(
        default = "default_image_max_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub max_interval: Duration,
    #[serde(
        default = "default_image_display",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub display: Duration,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TextPopups {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(
        default = "default_text_min_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub min_interval: Duration,
    #[serde(
        default = "default_text_max_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub max_interval: Duration,
    #[serde(
        default = "default_text_display",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub display: Duration,
    #[serde(default = "default_messages")]
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WallpaperRotation {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_wallpaper_folder")]
    pub folder: PathBuf,
    #[serde(
        default = "default_wallpaper_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UiSettings {
    #[serde(
        default = "default_tick",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub tick: Duration,
    #[serde(default = "default_max_image_size")]
    pub max_image_size: (u32, u32),
}

/// Interval bounds and display time for one popup kind, as consumed by a
/// background scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalSettings {
    pub min_interval: Duration,
    pub max_interval: Duration,
    pub display: Duration,
}

pub const DEFAULT_MESSAGES: &[&str] = &[
    "Time to stretch!",
    "Drink some water.",
    "Look away from the screen for twenty seconds.",
    "Roll your shoulders back.",
    "How is your posture?",
    "Take a deep breath.",
    "Blink a few times.",
    "Stand up for a minute.",
    "Did you save your work?",
    "Good time for a short walk.",
];

fn default_true() -> bool {
    true
}

fn default_image_folder() -> PathBuf {
    PathBuf::from("images")
}

fn default_wallpaper_folder() -> PathBuf {
    PathBuf::from("wallpaper")
}

fn default_image_min_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_image_max_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_image_display() -> Duration {
    Duration::from_millis(3000)
}

fn default_text_min_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_text_max_interval() -> Duration {
    Duration::from_secs(45)
}

fn default_text_display() -> Duration {
    Duration::from_millis(4000)
}

fn default_wallpaper_interval() -> Duration {
    Duration::from_secs(7 * 3600)
}

fn default_tick() -> Duration {
    Duration::from_millis(100)
}

fn default_max_image_size() -> (u32, u32) {
    (800, 600)
}

fn default_messages() -> Vec<String> {
    DEFAULT_MESSAGES.iter().map(|m| m.to_string()).collect()
}

impl Default for ImagePopups {
    fn default() -> Self {
        Self {
            enabled: true,
            folder: default_image_folder(),
            min_interval: default_image_min_interval(),
            max_interval: default_image_max_interval(),
            display: default_image_display(),
        }
    }
}

impl Default for TextPopups {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval: default_text_min_interval(),
            max_interval: default_text_max_interval(),
            display: default_text_display(),
            messages: default_messages(),
        }
    }
}

impl Default for WallpaperRotation {
    fn default() -> Self {
        Self {
            enabled: true,
            folder: default_wallpaper_folder(),
            interval: default_wallpaper_interval(),
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            tick: default_tick(),
            max_image_size: default_max_image_size(),
        }
    }
}

impl Default for PopConfig {
    fn default() -> Self {
        Self {
            version: 1,
            images: ImagePopups::default(),
            text: TextPopups::default(),
            wallpaper: WallpaperRotation::default(),
            ui: UiSettings::default(),
        }
    }
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl PopConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: PopConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn image_intervals(&self) -> IntervalSettings {
        IntervalSettings {
            min_interval: self.images.min_interval,
            max_interval: self.images.max_interval,
            display: self.images.display,
        }
    }

    pub fn text_intervals(&self) -> IntervalSettings {
        IntervalSettings {
            min_interval: self.text.min_interval,
            max_interval: self.text.max_interval,
            display: self.text.display,
        }
    }

    /// Wallpaper rotation is active only when enabled with a non-zero interval.
    pub fn wallpaper_active(&self) -> bool {
        self.wallpaper.enabled && !self.wallpaper.interval.is_zero()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        validate_intervals("images", &self.image_intervals())?;
        validate_intervals("text", &self.text_intervals())?;

        if self.images.enabled && self.images.folder.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("images.folder may not be empty".into()));
        }

        if self.text.enabled {
            if self.text.messages.is_empty() {
                return Err(ConfigError::Invalid(
                    "text.messages must contain at least one message".into(),
                ));
            }
            if self.text.messages.iter().any(|m| m.trim().is_empty()) {
                return Err(ConfigError::Invalid(
                    "text.messages contains an empty message".into(),
                ));
            }
        }

        if self.wallpaper.enabled && self.wallpaper.folder.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "wallpaper.folder may not be empty".into(),
            ));
        }

        if self.ui.tick.is_zero() {
            return Err(ConfigError::Invalid("ui.tick must be greater than zero".into()));
        }

        let (width, height) = self.ui.max_image_size;
        if width == 0 || height == 0 {
            return Err(ConfigError::Invalid(
                "ui.max_image_size dimensions must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

fn validate_intervals(section: &str, intervals: &IntervalSettings) -> Result<(), ConfigError> {
    // Delays are drawn in whole seconds.
    for (key, value) in [
        ("min_interval", intervals.min_interval),
        ("max_interval", intervals.max_interval),
    ] {
        if value.subsec_nanos() != 0 {
            return Err(ConfigError::Invalid(format!(
                "{section}.{key} ({}) must be a whole number of seconds",
                humantime::format_duration(value)
            )));
        }
    }

    if intervals.min_interval > intervals.max_interval {
        return Err(ConfigError::Invalid(format!(
            "{section}.min_interval ({}) exceeds {section}.max_interval ({})",
            humantime::format_duration(intervals.min_interval),
            humantime::format_duration(intervals.max_interval)
        )));
    }

    if intervals.display.is_zero() {
        return Err(ConfigError::Invalid(format!(
            "{section}.display must be greater than zero"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[images]
folder = "pics"
min_interval = 5
max_interval = "1m"
display = "2500ms"

[text]
min_interval = "15s"
max_interval = "45s"
display = 4
messages = ["hello", "stretch"]

[wallpaper]
folder = "/srv/walls"
interval = "7h"

[ui]
tick = "50ms"
max_image_size = [640, 480]
"#;

    #[test]
    fn parses_sample_config() {
        let config = PopConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.images.folder, PathBuf::from("pics"));
        assert_eq!(config.images.min_interval, Duration::from_secs(5));
        assert_eq!(config.images.max_interval, Duration::from_secs(60));
        assert_eq!(config.images.display, Duration::from_millis(2500));
        assert_eq!(config.text.display, Duration::from_secs(4));
        assert_eq!(config.text.messages, vec!["hello", "stretch"]);
        assert_eq!(config.wallpaper.interval, Duration::from_secs(7 * 3600));
        assert_eq!(config.ui.tick, Duration::from_millis(50));
        assert_eq!(config.ui.max_image_size, (640, 480));
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = PopConfig::from_toml_str("version = 1").unwrap();
        assert_eq!(config.images.folder, PathBuf::from("images"));
        assert_eq!(config.images.min_interval, Duration::from_secs(10));
        assert_eq!(config.images.max_interval, Duration::from_secs(30));
        assert_eq!(config.images.display, Duration::from_millis(3000));
        assert_eq!(config.text.min_interval, Duration::from_secs(15));
        assert_eq!(config.text.max_interval, Duration::from_secs(45));
        assert_eq!(config.text.display, Duration::from_millis(4000));
        assert_eq!(config.text.messages.len(), DEFAULT_MESSAGES.len());
        assert_eq!(config.wallpaper.folder, PathBuf::from("wallpaper"));
        assert_eq!(config.wallpaper.interval, Duration::from_secs(7 * 3600));
        assert_eq!(config.ui.tick, Duration::from_millis(100));
        assert!(config.wallpaper_active());
    }

    #[test]
    fn rejects_inverted_interval() {
        let err = PopConfig::from_toml_str(
            r#"
version = 1

[images]
min_interval = 30
max_interval = 10
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("images.min_interval"));
    }

    #[test]
    fn accepts_zero_width_interval() {
        let config = PopConfig::from_toml_str(
            r#"
version = 1

[images]
min_interval = 0
max_interval = 0
display = "1s"
"#,
        )
        .unwrap();
        assert!(config.images.min_interval.is_zero());
        assert!(config.images.max_interval.is_zero());
    }

    #[test]
    fn rejects_zero_display_and_tick() {
        let display = PopConfig::from_toml_str(
            r#"
version = 1

[text]
display = 0
"#,
        )
        .unwrap_err();
        assert!(matches!(display, ConfigError::Invalid(_)));

        let tick = PopConfig::from_toml_str(
            r#"
version = 1

[ui]
tick = "0ms"
"#,
        )
        .unwrap_err();
        assert!(matches!(tick, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_message_pool_only_when_text_enabled() {
        let enabled = PopConfig::from_toml_str(
            r#"
version = 1

[text]
messages = []
"#,
        )
        .unwrap_err();
        assert!(matches!(enabled, ConfigError::Invalid(_)));

        let disabled = PopConfig::from_toml_str(
            r#"
version = 1

[text]
enabled = false
messages = []
"#,
        );
        assert!(disabled.is_ok());
    }

    #[test]
    fn rejects_unknown_version_and_keys() {
        assert!(matches!(
            PopConfig::from_toml_str("version = 2").unwrap_err(),
            ConfigError::Invalid(_)
        ));
        assert!(matches!(
            PopConfig::from_toml_str("version = 1\n[images]\nspeed = 3\n").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn zero_wallpaper_interval_disables_rotation() {
        let config = PopConfig::from_toml_str(
            r#"
version = 1

[wallpaper]
interval = 0
"#,
        )
        .unwrap();
        assert!(!config.wallpaper_active());
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let rendered = PopConfig::default().to_toml_string().unwrap();
        let parsed = PopConfig::from_toml_str(&rendered).expect("reparse defaults");
        assert_eq!(parsed.ui.tick, Duration::from_millis(100));
        assert_eq!(parsed.wallpaper.interval, Duration::from_secs(7 * 3600));
    }

    #[test]
    fn rejects_fractional_interval_bounds() {
        let err = PopConfig::from_toml_str(
            r#"
version = 1
[images]
min_interval = "1500ms"
max_interval = "1800ms"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("images.min_interval"), "{err}");

        let err = PopConfig::from_toml_str(
            "version = 1\n[text]\nmin_interval = 2\nmax_interval = 2.5\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("text.max_interval"), "{err}");
    }

    #[test]
    fn sub_second_display_is_still_allowed() {
        let config =
            PopConfig::from_toml_str("version = 1\n[images]\ndisplay = \"250ms\"\n").unwrap();
        assert_eq!(config.images.display, Duration::from_millis(250));
    }

    #[test]
    fn out_of_range_float_durations_are_errors() {
        for value in ["inf", "1e300"] {
            let input = format!("version = 1\n[images]\ndisplay = {value}\n");
            let err = PopConfig::from_toml_str(&input).unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)), "{value}: {err}");
        }
    }
}
