//! Sketch discovery.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

/// Find the `.ino` sketch for a project directory.
///
/// `dir/<dirname>.ino` is preferred, then any sketch in `dir`, then one in
/// `dir/src`. Within a directory the alphabetically first sketch wins so the
/// choice is stable.
pub fn find_sketch(dir: &Path) -> Result<PathBuf> {
    let dir_name = dir.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let named = dir.join(format!("{}.ino", dir_name));
    if named.is_file() {
        return Ok(named);
    }

    if let Some(path) = first_ino(dir)? {
        return Ok(path);
    }

    let src_dir = dir.join("src");
    if src_dir.is_dir()
        && let Some(path) = first_ino(&src_dir)?
    {
        return Ok(path);
    }

    bail!(
        "No .ino sketch found in {}. Create one or run from the sketch directory.",
        dir.display()
    )
}

/// Directory `arduino-cli` should be given for a sketch file.
pub fn sketch_dir(sketch: &Path) -> &Path {
    sketch.parent().unwrap_or(sketch)
}

fn first_ino(dir: &Path) -> Result<Option<PathBuf>> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "ino"))
        .collect();
    found.sort();
    Ok(found.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_sketch_in_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blink.ino"), "void setup() {}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let sketch = find_sketch(dir.path()).unwrap();
        assert_eq!(sketch.file_name().unwrap(), "blink.ino");
        assert_eq!(sketch_dir(&sketch), dir.path());
    }

    #[test]
    fn test_finds_sketch_in_src() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src").join("main.ino"), "").unwrap();

        let sketch = find_sketch(dir.path()).unwrap();
        assert!(sketch.ends_with("src/main.ino"));
    }

    #[test]
    fn test_choice_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("zeta.ino"), "").unwrap();
        fs::write(dir.path().join("alpha.ino"), "").unwrap();

        let sketch = find_sketch(dir.path()).unwrap();
        assert_eq!(sketch.file_name().unwrap(), "alpha.ino");
    }

    #[test]
    fn test_sketch_named_after_directory_wins() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("blink");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("aaa_helpers.ino"), "").unwrap();
        fs::write(dir.join("blink.ino"), "").unwrap();

        let sketch = find_sketch(&dir).unwrap();
        assert_eq!(sketch.file_name().unwrap(), "blink.ino");
    }

    #[test]
    fn test_missing_sketch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_sketch(dir.path()).unwrap_err();
        assert!(err.to_string().contains("No .ino sketch"));
    }
}
