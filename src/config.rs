//! Project configuration (`arduino.json`).
//!
//! The effective configuration starts from [`Settings`] and is overridden,
//! field by field, by the project file. Every change is written back
//! immediately.

use anyhow::{Context, Result, bail};
use colored::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::settings::Settings;

pub const PROJECT_FILE: &str = "arduino.json";

/// On-disk shape; every key is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProjectFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    board: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    baudrate: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub board: String,
    pub port: Option<String>,
    pub baudrate: u32,
    path: PathBuf,
}

impl ProjectConfig {
    /// Build the effective configuration for `project_dir`.
    ///
    /// A corrupt project file is reported and ignored.
    pub fn load(project_dir: &Path, settings: &Settings) -> Self {
        let path = project_dir.join(PROJECT_FILE);
        let mut config = Self {
            board: settings.board.clone(),
            port: settings.port.clone(),
            baudrate: settings.baudrate,
            path,
        };

        let Ok(content) = fs::read_to_string(&config.path) else {
            return config;
        };

        let file: ProjectFile = match serde_json::from_str(&content) {
            Ok(file) => file,
            Err(e) => {
                eprintln!(
                    "{} Ignoring {}: {}",
                    "!".yellow(),
                    config.path.display(),
                    e
                );
                return config;
            }
        };

        if let Some(board) = file.board.filter(|b| !b.trim().is_empty()) {
            config.board = board;
        }
        if file.port.is_some() {
            config.port = file.port.filter(|p| !p.trim().is_empty());
        }
        match file.baudrate {
            Some(0) => eprintln!(
                "{} Ignoring baudrate 0 in {}",
                "!".yellow(),
                config.path.display()
            ),
            Some(rate) => config.baudrate = rate,
            None => {}
        }
        config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn save(&self) -> Result<()> {
        let file = ProjectFile {
            board: Some(self.board.clone()),
            port: self.port.clone(),
            baudrate: Some(self.baudrate),
        };
        let json = serde_json::to_string_pretty(&file)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, json + "\n")
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "saved project config");
        Ok(())
    }

    pub fn set_board(&mut self, fqbn: &str) -> Result<()> {
        let fqbn = fqbn.trim();
        if fqbn.is_empty() {
            bail!("Board FQBN cannot be empty");
        }
        self.board = fqbn.to_string();
        self.save()
    }

    pub fn set_port(&mut self, port: &str) -> Result<()> {
        let port = port.trim();
        if port.is_empty() {
            bail!("Port cannot be empty");
        }
        self.port = Some(port.to_string());
        self.save()
    }

    pub fn set_baudrate(&mut self, baudrate: u32) -> Result<()> {
        if baudrate == 0 {
            bail!("Baud rate must be a positive integer");
        }
        self.baudrate = baudrate;
        self.save()
    }
}
