//! Library listing and management.
//!
//! A library entry is assembled from three `arduino-cli` calls whose JSON is
//! shaped differently and has changed between tool versions:
//!
//! - `lib search --format json`: the index (`{"libraries": [...]}`)
//! - `lib list --format json`: installed libraries (bare array, or
//!   `{"installed_libraries": [...]}`)
//! - `outdated --format json`: libraries with updates (bare array, or
//!   `{"libraries": [...], "platforms": [...]}`)
//!
//! The three sets are joined by library name.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::cache::ListSource;
use crate::runner::{ArduinoCli, CliError, OutputSink};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    pub installed_version: Option<String>,
    pub installed: bool,
    pub update_available: bool,
    pub latest_version: Option<String>,
}

impl Library {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            installed_version: None,
            installed: false,
            update_available: false,
            latest_version: None,
        }
    }

    /// One-line description for pickers and tables.
    pub fn label(&self) -> String {
        let mut label = self.name.clone();
        match (&self.installed_version, self.installed) {
            (Some(v), true) => label.push_str(&format!(" [installed {}]", v)),
            (None, true) => label.push_str(" [installed]"),
            _ => {
                if let Some(latest) = &self.latest_version {
                    label.push_str(&format!(" {}", latest));
                }
            }
        }
        if self.update_available
            && let Some(latest) = &self.latest_version
        {
            label.push_str(&format!(" (update: {})", latest));
        }
        label
    }
}

impl std::fmt::Display for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Elements of a listing that is either a bare array or an object holding
/// the array under one of `keys`.
fn elements<'a>(value: &'a Value, keys: &[&str]) -> &'a [Value] {
    match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => keys
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    }
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut cur = value;
    for key in path {
        cur = cur.get(*key)?;
    }
    cur.as_str().filter(|s| !s.is_empty())
}

/// Parse versions like `1.2` or `2.0.0-beta` leniently for ordering.
fn lenient_version(raw: &str) -> Option<semver::Version> {
    if let Ok(v) = semver::Version::parse(raw) {
        return Some(v);
    }
    let (core, _) = raw.split_once('-').unwrap_or((raw, ""));
    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0");
    }
    semver::Version::parse(&parts.join(".")).ok()
}

/// Latest version advertised by a search result.
fn latest_of(entry: &Value) -> Option<String> {
    if let Some(v) = str_at(entry, &["latest", "version"]) {
        return Some(v.to_string());
    }

    let versions: Vec<String> = match entry.get("releases") {
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|r| str_at(r, &["version"]).map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    versions
        .into_iter()
        .max_by(|a, b| match (lenient_version(a), lenient_version(b)) {
            (Some(va), Some(vb)) => va.cmp(&vb),
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (None, None) => a.cmp(b),
        })
}

/// Join search, installed and outdated listings by library name.
pub fn join_libraries(search: &Value, installed: &Value, outdated: &Value) -> Vec<Library> {
    let mut by_name: HashMap<String, Library> = HashMap::new();

    for entry in elements(search, &["libraries"]) {
        let Some(name) = str_at(entry, &["name"]) else {
            continue;
        };
        let lib = by_name
            .entry(name.to_string())
            .or_insert_with(|| Library::named(name));
        if lib.latest_version.is_none() {
            lib.latest_version = latest_of(entry);
        }
    }

    for entry in elements(installed, &["installed_libraries", "libraries"]) {
        let Some(name) =
            str_at(entry, &["library", "name"]).or_else(|| str_at(entry, &["name"]))
        else {
            continue;
        };
        let version = str_at(entry, &["library", "version"])
            .or_else(|| str_at(entry, &["version"]))
            .map(str::to_string);
        let lib = by_name
            .entry(name.to_string())
            .or_insert_with(|| Library::named(name));
        lib.installed = true;
        lib.installed_version = version;
    }

    for entry in elements(outdated, &["libraries"]) {
        let Some(name) = str_at(entry, &["library", "name"]).or_else(|| str_at(entry, &["name"]))
        else {
            continue;
        };
        let latest = str_at(entry, &["release", "version"])
            .or_else(|| str_at(entry, &["latest", "version"]))
            .map(str::to_string);
        let lib = by_name
            .entry(name.to_string())
            .or_insert_with(|| Library::named(name));
        lib.installed = true;
        if lib.installed_version.is_none() {
            lib.installed_version = str_at(entry, &["library", "version"]).map(str::to_string);
        }
        lib.update_available = true;
        if latest.is_some() {
            lib.latest_version = latest;
        }
    }

    let mut libs: Vec<Library> = by_name.into_values().collect();
    libs.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    libs
}

pub struct LibrarySource<'a> {
    cli: &'a ArduinoCli,
}

impl<'a> LibrarySource<'a> {
    pub fn new(cli: &'a ArduinoCli) -> Self {
        Self { cli }
    }
}

impl ListSource for LibrarySource<'_> {
    type Item = Library;

    fn name(&self) -> &'static str {
        "libraries"
    }

    fn fetch(&self) -> Result<Vec<Library>> {
        let search = self.cli.run_json(&["lib", "search", "--format", "json"])?;
        let installed = self.cli.run_json(&["lib", "list", "--format", "json"])?;
        let outdated = self.cli.run_json(&["outdated", "--format", "json"])?;
        Ok(join_libraries(&search, &installed, &outdated))
    }
}

/// `lib install <name>[@<version>]`
pub fn install(
    cli: &ArduinoCli,
    name: &str,
    version: Option<&str>,
    sink: &mut dyn OutputSink,
) -> Result<(), CliError> {
    let spec = match version {
        Some(v) => format!("{}@{}", name, v),
        None => name.to_string(),
    };
    cli.run_streaming(&["lib", "install", &spec], sink)
}

pub fn upgrade(cli: &ArduinoCli, name: &str, sink: &mut dyn OutputSink) -> Result<(), CliError> {
    cli.run_streaming(&["lib", "upgrade", name], sink)
}

pub fn uninstall(cli: &ArduinoCli, name: &str, sink: &mut dyn OutputSink) -> Result<(), CliError> {
    cli.run_streaming(&["lib", "uninstall", name], sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn find<'a>(libs: &'a [Library], name: &str) -> &'a Library {
        libs.iter().find(|l| l.name == name).unwrap()
    }

    #[test]
    fn test_join_across_current_shapes() {
        let search = json!({
            "libraries": [
                { "name": "Servo", "latest": { "version": "1.2.1" } },
                { "name": "ArduinoJson", "latest": { "version": "7.0.4" } },
                { "name": "FastLED", "latest": { "version": "3.6.0" } }
            ]
        });
        let installed = json!({
            "installed_libraries": [
                { "library": { "name": "Servo", "version": "1.2.1" } },
                { "library": { "name": "ArduinoJson", "version": "6.21.0" } }
            ]
        });
        let outdated = json!({
            "libraries": [
                { "library": { "name": "ArduinoJson", "version": "6.21.0" }, "release": { "version": "7.0.4" } }
            ],
            "platforms": []
        });

        let libs = join_libraries(&search, &installed, &outdated);
        assert_eq!(libs.len(), 3);

        let servo = find(&libs, "Servo");
        assert!(servo.installed);
        assert!(!servo.update_available);
        assert_eq!(servo.installed_version.as_deref(), Some("1.2.1"));

        let json_lib = find(&libs, "ArduinoJson");
        assert!(json_lib.installed);
        assert!(json_lib.update_available);
        assert_eq!(json_lib.installed_version.as_deref(), Some("6.21.0"));
        assert_eq!(json_lib.latest_version.as_deref(), Some("7.0.4"));

        let fastled = find(&libs, "FastLED");
        assert!(!fastled.installed);
        assert_eq!(fastled.installed_version, None);
        assert_eq!(fastled.latest_version.as_deref(), Some("3.6.0"));
    }

    #[test]
    fn test_join_across_legacy_shapes() {
        let search = json!({
            "libraries": [
                { "name": "Servo", "releases": { "1.1.8": {}, "1.2.0": {}, "1.10.0": {} } }
            ]
        });
        let installed = json!([
            { "library": { "name": "Servo", "version": "1.1.8" } },
            { "library": { "name": "LocalLib", "version": "0.1" } }
        ]);
        let outdated = json!([
            { "library": { "name": "Servo", "version": "1.1.8" }, "release": { "version": "1.10.0" } }
        ]);

        let libs = join_libraries(&search, &installed, &outdated);
        assert_eq!(libs.len(), 2);

        let servo = find(&libs, "Servo");
        assert!(servo.update_available);
        assert_eq!(servo.latest_version.as_deref(), Some("1.10.0"));

        // installed but not in the index
        let local = find(&libs, "LocalLib");
        assert!(local.installed);
        assert_eq!(local.installed_version.as_deref(), Some("0.1"));
    }

    #[test]
    fn test_releases_ordered_semantically() {
        let entry = json!({ "releases": { "1.9": {}, "1.10": {}, "1.2.3": {} } });
        assert_eq!(latest_of(&entry).as_deref(), Some("1.10"));
    }

    #[test]
    fn test_output_sorted_case_insensitively() {
        let search = json!({ "libraries": [ { "name": "zeta" }, { "name": "Alpha" }, { "name": "beta" } ] });
        let libs = join_libraries(&search, &json!([]), &json!([]));
        let names: Vec<&str> = libs.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_malformed_elements_are_skipped() {
        let search = json!({ "libraries": [ { "nope": 1 }, "string", { "name": "Ok" } ] });
        let installed = json!({ "installed_libraries": [ { "library": {} } ] });
        let outdated = json!(null);
        let libs = join_libraries(&search, &installed, &outdated);
        assert_eq!(libs.len(), 1);
        assert_eq!(libs[0].name, "Ok");
    }

    #[test]
    fn test_label_reflects_state() {
        let mut lib = Library::named("Servo");
        lib.latest_version = Some("1.2.1".to_string());
        assert_eq!(lib.label(), "Servo 1.2.1");

        lib.installed = true;
        lib.installed_version = Some("1.1.0".to_string());
        lib.update_available = true;
        assert_eq!(lib.label(), "Servo [installed 1.1.0] (update: 1.2.1)");
    }

    #[test]
    fn test_lenient_version() {
        assert_eq!(lenient_version("1.2"), Some(semver::Version::new(1, 2, 0)));
        assert_eq!(lenient_version("3"), Some(semver::Version::new(3, 0, 0)));
        assert!(lenient_version("1.2.3.4").is_none());
        assert!(lenient_version("abc").is_none());
    }
}
