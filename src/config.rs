//src/config.rs
use comfy_table::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use thiserror::Error;
use tracing::warn;

use crate::gemini::DEFAULT_MODEL;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_CONFIG_DIR: &str = "gym-tracker";
const CONFIG_ENV_VAR: &str = "GYM_TRACKER_CONFIG_DIR"; // Environment variable name
const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not determine configuration directory.")]
    CannotDetermineConfigDir,
    #[error("I/O error accessing config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file (TOML): {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize config data (TOML): {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Invalid color name: {0}")]
    InvalidColor(String),
    #[error("Invalid bodyweight input: {0}")]
    InvalidBodyweightInput(String),
    #[error("Exercise count must be between 1 and {max}, got {got}")]
    InvalidExerciseCount { got: u32, max: u32 },
    #[error("No API key configured. Set `api_key` in {0:?} or the GEMINI_API_KEY environment variable.")]
    ApiKeyNotSet(PathBuf),
}

pub const MAX_EXERCISE_COUNT: u32 = 12;

// Define standard colors using strum for easy iteration/parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum StandardColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    DarkGrey,
    DarkRed,
    DarkGreen,
    DarkYellow,
    DarkBlue,
    DarkMagenta,
    DarkCyan,
    Grey,
}

// Helper to convert our enum to comfy_table::Color
impl From<StandardColor> for Color {
    fn from(value: StandardColor) -> Self {
        match value {
            StandardColor::Black => Self::Black,
            StandardColor::Red => Self::Red,
            StandardColor::Green => Self::Green,
            StandardColor::Yellow => Self::Yellow,
            StandardColor::Blue => Self::Blue,
            StandardColor::Magenta => Self::Magenta,
            StandardColor::Cyan => Self::Cyan,
            StandardColor::White => Self::White,
            StandardColor::DarkGrey => Self::DarkGrey,
            StandardColor::DarkRed => Self::DarkRed,
            StandardColor::DarkGreen => Self::DarkGreen,
            StandardColor::DarkYellow => Self::DarkYellow,
            StandardColor::DarkBlue => Self::DarkBlue,
            StandardColor::DarkMagenta => Self::DarkMagenta,
            StandardColor::DarkCyan => Self::DarkCyan,
            StandardColor::Grey => Self::Grey,
        }
    }
}

// Helper to parse a string into our StandardColor enum
pub fn parse_color(color_str: &str) -> Result<StandardColor, Error> {
    StandardColor::iter()
        .find(|color| format!("{color:?}").eq_ignore_ascii_case(color_str.trim()))
        .ok_or_else(|| Error::InvalidColor(color_str.to_string()))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)] // Ensure defaults are used if fields are missing
pub struct Theme {
    pub header_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header_color: "Red".to_string(),
        }
    }
}

impl Theme {
    /// Header color for tables; an unknown name falls back to the default.
    #[must_use]
    pub fn header_color(&self) -> Color {
        parse_color(&self.header_color).map_or_else(
            |e| {
                warn!("{e}, using default header color");
                Color::Red
            },
            Color::from,
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)] // Ensure defaults are used if fields are missing
pub struct Config {
    /// Kilograms. Used for calorie estimates; 70 when unset.
    pub bodyweight: Option<f64>,
    /// Gemini key. The GEMINI_API_KEY / API_KEY environment variables take over when unset.
    pub api_key: Option<String>,
    pub model: String,
    /// Exercises per AI-generated session when `--count` is not given.
    pub default_exercise_count: u32,
    /// Accept 0 kg sets for bodyweight movements.
    pub allow_zero_weight: bool,

    // Theming
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bodyweight: None,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            default_exercise_count: 5,
            allow_zero_weight: false,
            theme: Theme::default(),
        }
    }
}

impl Config {
    /// The configured key, else the first non-empty key from the environment.
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .filter_map(|var| std::env::var(var).ok())
                    .find(|k| !k.trim().is_empty())
            })
    }
}

/// Determines the path to the configuration file.
/// Exposed at crate root as get_config_path_util
pub fn get_config_path() -> Result<PathBuf, Error> {
    let config_dir_override = std::env::var(CONFIG_ENV_VAR).ok();

    let config_dir_path = if let Some(path_str) = config_dir_override {
        let path = PathBuf::from(path_str);
        if !path.is_dir() {
            warn!(
                "Environment variable {} points to '{}', which is not a directory. Trying to create it.",
                CONFIG_ENV_VAR,
                path.display()
            );
            fs::create_dir_all(&path)?;
        }
        path
    } else {
        let base_config_dir = dirs::config_dir().ok_or(Error::CannotDetermineConfigDir)?;
        base_config_dir.join(APP_CONFIG_DIR)
    };

    if !config_dir_path.exists() {
        fs::create_dir_all(&config_dir_path)?;
    }

    Ok(config_dir_path.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from the TOML file at the given path.
/// Exposed at crate root as load_config_util
pub fn load_config(config_path: &Path) -> Result<Config, Error> {
    if config_path.exists() {
        let config_content = fs::read_to_string(config_path)?;
        // serde(default) fills in missing fields
        let config: Config = toml::from_str(&config_content).map_err(Error::TomlParse)?;
        Ok(config)
    } else {
        // Don't print here, let caller decide how to inform user
        let default_config = Config::default();
        save_config(config_path, &default_config)?;
        Ok(default_config)
    }
}

/// Saves the configuration to the TOML file.
/// Exposed at crate root as save_config_util
pub fn save_config(config_path: &Path, config: &Config) -> Result<(), Error> {
    if let Some(parent_dir) = config_path.parent() {
        if !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
        }
    }
    let config_content = toml::to_string_pretty(config).map_err(Error::TomlSerialize)?;
    fs::write(config_path, config_content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = toml::from_str("bodyweight = 81.0\n").unwrap();
        assert_eq!(config.bodyweight, Some(81.0));
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.default_exercise_count, 5);
        assert!(!config.allow_zero_weight);
    }

    #[test]
    fn test_parse_color_ignores_case() {
        assert_eq!(parse_color("darkblue").unwrap(), StandardColor::DarkBlue);
        assert!(matches!(parse_color("plaid"), Err(Error::InvalidColor(_))));
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("gym-tracker-config-{}", std::process::id()));
        let path = dir.join(CONFIG_FILE_NAME);
        let created = load_config(&path).unwrap();
        assert_eq!(created, Config::default());

        let mut changed = created;
        changed.bodyweight = Some(64.5);
        changed.theme.header_color = "Cyan".to_string();
        save_config(&path, &changed).unwrap();
        assert_eq!(load_config(&path).unwrap(), changed);
        let _ = fs::remove_dir_all(dir);
    }
}
