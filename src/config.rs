//! User settings, read from `<config dir>/keycalc/config.toml`.
//!
//! ```toml
//! digits = 8
//! debug = false
//! history = true
//!
//! [colours]
//! value = [255, 255, 255]
//! error = [220, 100, 90]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use colored::{ColoredString, Colorize};
use serde::Deserialize;
use thiserror::Error;

use crate::format::{DEFAULT_DIGITS, MAX_DIGITS};

pub type Rgb = (u8, u8, u8);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Colours {
    pub expression: Rgb,
    pub value: Rgb,
    pub error: Rgb,
    pub message: Rgb,
    pub pass: Rgb,
    pub fail: Rgb,
}

impl Default for Colours {
    fn default() -> Self {
        Colours {
            expression: (0xB4, 0xB4, 0xB4), // Light gray
            value: (0xFF, 0xFF, 0xFF),      // White
            error: (0xDC, 0x64, 0x5A),      // Soft red
            message: (0x78, 0xB4, 0x78),    // Soft green
            pass: (0x50, 0xC8, 0x50),       // Green
            fail: (0xFF, 0x14, 0x00),       // Bright red
        }
    }
}

pub fn paint(text: &str, colour: Rgb) -> ColoredString {
    text.truecolor(colour.0, colour.1, colour.2)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub digits: usize,
    pub debug: bool,
    pub history: bool,
    pub colours: Colours,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            digits: DEFAULT_DIGITS,
            debug: false,
            history: true,
            colours: Colours::default(),
        }
    }
}

impl Settings {
    /// Loads the user's config file, or the defaults when there is none.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(text)?;
        if settings.digits > MAX_DIGITS {
            return Err(ConfigError::Invalid(format!(
                "digits must be at most {}, got {}",
                MAX_DIGITS, settings.digits
            )));
        }
        Ok(settings)
    }

    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("keycalc").join("config.toml"))
    }

    pub fn history_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("keycalc").join("history"))
    }
}
