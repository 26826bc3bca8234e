//! Serial port detection via `arduino-cli board list`.

use anyhow::Result;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use crate::runner::{ArduinoCli, CliError};

/// `board list` probes every port; give up after this long.
pub const PORT_LIST_TIMEOUT: Duration = Duration::from_secs(5);

static PORT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(/dev/\S+|COM\d+\b)").expect("port pattern is valid"));

/// List serial ports the tool can see, within [`PORT_LIST_TIMEOUT`].
///
/// The JSON listing is tried first. If it cannot be parsed the plain text
/// table is scanned for lines that begin with a device path or `COMn`.
pub fn list_ports(cli: &ArduinoCli) -> Result<Vec<String>> {
    list_ports_within(cli, PORT_LIST_TIMEOUT)
}

/// [`list_ports`] with an explicit budget shared by both attempts.
pub fn list_ports_within(cli: &ArduinoCli, timeout: Duration) -> Result<Vec<String>> {
    let deadline = Instant::now() + timeout;
    match cli.run_captured_with_timeout(&["board", "list", "--format", "json"], timeout) {
        Ok(out) => match serde_json::from_str::<Value>(&out) {
            Ok(json) => return Ok(parse_port_json(&json)),
            Err(err) => tracing::debug!(%err, "port listing is not json, falling back to text"),
        },
        Err(err @ (CliError::NotFound(_) | CliError::Timeout { .. })) => return Err(err.into()),
        Err(err) => tracing::debug!(%err, "json port listing failed, falling back to text"),
    }

    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return Err(CliError::Timeout {
            command: cli.describe(&["board", "list"]),
            timeout,
        }
        .into());
    }
    let text = cli.run_captured_with_timeout(&["board", "list"], remaining)?;
    Ok(parse_port_lines(&text))
}

/// Extract port addresses from `board list --format json`.
///
/// Handles `{"detected_ports": [{"port": {"address": ..}}]}` as well as the
/// older bare array of `{"port": {"address": ..}}` or `{"address": ..}`.
pub fn parse_port_json(value: &Value) -> Vec<String> {
    let entries = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map
            .get("detected_ports")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    let mut ports: Vec<String> = Vec::new();
    for entry in entries {
        let address = entry
            .get("port")
            .and_then(|p| p.get("address"))
            .or_else(|| entry.get("address"))
            .and_then(Value::as_str);
        if let Some(address) = address
            && !address.is_empty()
            && !ports.iter().any(|p| p == address)
        {
            ports.push(address.to_string());
        }
    }
    ports
}

/// Pick port names out of the human-readable `board list` table.
pub fn parse_port_lines(text: &str) -> Vec<String> {
    let mut ports: Vec<String> = Vec::new();
    for line in text.lines() {
        if let Some(m) = PORT_LINE.captures(line.trim_start()).and_then(|c| c.get(1)) {
            let port = m.as_str();
            if !ports.iter().any(|p| p == port) {
                ports.push(port.to_string());
            }
        }
    }
    ports
}
