//! User-level settings (`$INOX_HOME/settings.toml`).
//!
//! These are the defaults every project starts from: board, port, baud rate,
//! and where to find `arduino-cli`.
//!
//! ```toml
//! board = "arduino:avr:uno"
//! port = "/dev/ttyACM0"
//! baudrate = 115200
//! cli_path = "/opt/arduino/arduino-cli"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub board: String,
    pub port: Option<String>,
    pub baudrate: u32,
    pub cli_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            board: "arduino:avr:uno".to_string(),
            port: None,
            baudrate: 9600,
            cli_path: PathBuf::from("arduino-cli"),
        }
    }
}

impl Settings {
    /// Load settings from `home`. A missing file yields defaults.
    pub fn load(home: &Path) -> Result<Self> {
        let path = home.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {} - check its syntax", path.display()))?;

        if settings.baudrate == 0 {
            tracing::warn!(path = %path.display(), "baudrate 0 in settings, using 9600");
            settings.baudrate = Self::default().baudrate;
        }
        Ok(settings)
    }
}

/// Root directory for settings and caches: `$INOX_HOME`, else `~/.inox`.
pub fn inox_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os("INOX_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".inox"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.cli_path, PathBuf::from("arduino-cli"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "board = \"esp32:esp32:esp32\"\nbaudrate = 115200\n",
        )
        .unwrap();

        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.board, "esp32:esp32:esp32");
        assert_eq!(settings.baudrate, 115200);
        assert_eq!(settings.port, None);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "board = ").unwrap();
        assert!(Settings::load(dir.path()).is_err());
    }

    #[test]
    fn test_zero_baudrate_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "baudrate = 0\n").unwrap();
        assert_eq!(Settings::load(dir.path()).unwrap().baudrate, 9600);
    }
}
