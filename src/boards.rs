//! Board listing.
//!
//! Boards come from `arduino-cli board listall --format json`, cached through
//! [`crate::cache::ListCache`]. When the tool is missing and nothing is cached,
//! a fixed set of common boards is offered instead.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::cache::ListSource;
use crate::runner::ArduinoCli;

/// Boards offered when no listing can be obtained: `(name, fqbn)`.
pub const DEFAULT_BOARDS: [(&str, &str); 12] = [
    ("Arduino Uno", "arduino:avr:uno"),
    ("Arduino Mega or Mega 2560", "arduino:avr:mega"),
    ("Arduino Nano", "arduino:avr:nano"),
    ("Arduino Leonardo", "arduino:avr:leonardo"),
    ("Arduino Micro", "arduino:avr:micro"),
    ("Arduino Mini", "arduino:avr:mini"),
    ("Arduino Pro or Pro Mini", "arduino:avr:pro"),
    ("Arduino Uno R4 WiFi", "arduino:renesas_uno:unor4wifi"),
    ("Arduino Uno R4 Minima", "arduino:renesas_uno:minima"),
    ("Arduino Nano 33 IoT", "arduino:samd:nano_33_iot"),
    ("ESP32 Dev Module", "esp32:esp32:esp32"),
    ("NodeMCU 1.0 (ESP-12E Module)", "esp8266:esp8266:nodemcuv2"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub name: String,
    pub fqbn: String,
    pub label: String,
}

impl Board {
    pub fn new(name: impl Into<String>, fqbn: impl Into<String>) -> Self {
        let name = name.into();
        let fqbn = fqbn.into();
        let label = format!("{} ({})", name, fqbn);
        Self { name, fqbn, label }
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}

pub fn default_boards() -> Vec<Board> {
    DEFAULT_BOARDS
        .iter()
        .map(|(name, fqbn)| Board::new(*name, *fqbn))
        .collect()
}

/// Parse `board listall --format json`.
///
/// Accepts `{"boards": [...]}` as well as a bare array. Entries without an
/// FQBN (platforms that are not installed) are skipped, duplicates dropped.
pub fn parse_board_listing(value: &Value) -> Vec<Board> {
    let entries = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map
            .get("boards")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    let mut seen = HashSet::new();
    entries
        .iter()
        .filter_map(|entry| {
            let fqbn = entry.get("fqbn")?.as_str()?.trim();
            if fqbn.is_empty() {
                return None;
            }
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())
                .unwrap_or(fqbn);
            Some(Board::new(name, fqbn))
        })
        .filter(|board| seen.insert(board.fqbn.clone()))
        .collect()
}

pub struct BoardSource<'a> {
    cli: &'a ArduinoCli,
}

impl<'a> BoardSource<'a> {
    pub fn new(cli: &'a ArduinoCli) -> Self {
        Self { cli }
    }
}

impl ListSource for BoardSource<'_> {
    type Item = Board;

    fn name(&self) -> &'static str {
        "boards"
    }

    fn fetch(&self) -> Result<Vec<Board>> {
        let json = self.cli.run_json(&["board", "listall", "--format", "json"])?;
        let boards = parse_board_listing(&json);
        // An empty listing means no cores are installed; not worth caching.
        if boards.is_empty() {
            bail!("arduino-cli reported no boards (install a core with `arduino-cli core install`)");
        }
        Ok(boards)
    }

    fn defaults(&self) -> Vec<Board> {
        default_boards()
    }
}
