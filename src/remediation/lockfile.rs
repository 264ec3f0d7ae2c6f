use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};

pub const LOCK_FILE: &str = "poetry.lock";
pub const MANIFEST_FILE: &str = "pyproject.toml";

static NAME_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("valid separator regex"));

/// PEP 503 name normalization: `Foo.Bar_baz` -> `foo-bar-baz`.
pub fn normalize_package_name(name: &str) -> String {
    NAME_SEPARATORS
        .replace_all(&name.trim().to_lowercase(), "-")
        .into_owned()
}

#[derive(Deserialize)]
struct LockFileDocument {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

#[derive(Deserialize)]
struct LockedPackage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: Option<toml::Value>,
}

/// Installed versions keyed by normalized package name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockSnapshot {
    versions: HashMap<String, String>,
}

impl LockSnapshot {
    /// Read a snapshot from `path`. A missing lock file is an empty snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::LockFile(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let document: LockFileDocument = toml::from_str(content)?;

        let versions = document
            .package
            .into_iter()
            .filter_map(|package| {
                let name = normalize_package_name(&package.name);
                let version = package.version?.as_str()?.to_string();
                (!name.is_empty()).then_some((name, version))
            })
            .collect();

        Ok(Self { versions })
    }

    /// Version of `package`, looked up by normalized name.
    pub fn version_of(&self, package: &str) -> Option<&str> {
        self.versions
            .get(&normalize_package_name(package))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// Digest over the Poetry manifest and lock file, used to tell whether an
/// update attempt changed anything. Absent files hash differently from
/// empty ones.
pub fn manifest_fingerprint(workdir: &Path) -> Result<String> {
    let mut hasher = Sha256::new();

    for file in [MANIFEST_FILE, LOCK_FILE] {
        let path = workdir.join(file);
        hasher.update(file.as_bytes());
        match std::fs::read(&path) {
            Ok(bytes) => {
                hasher.update([1u8]);
                hasher.update((bytes.len() as u64).to_le_bytes());
                hasher.update(&bytes);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                hasher.update([0u8]);
            }
            Err(e) => {
                return Err(AppError::LockFile(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        }
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const LOCK: &str = r#"
[[package]]
name = "Jinja2"
version = "3.1.2"
description = "A very fast and expressive template engine."
optional = false

[[package]]
name = "typing_extensions"
version = "4.9.0"

[[package]]
name = "broken"
version = 3

[metadata]
lock-version = "2.0"
python-versions = "^3.11"
"#;

    #[test]
    fn test_normalize_package_name() {
        assert_eq!(normalize_package_name("Jinja2"), "jinja2");
        assert_eq!(normalize_package_name(" typing_extensions "), "typing-extensions");
        assert_eq!(normalize_package_name("zope.interface"), "zope-interface");
        assert_eq!(normalize_package_name("a-_.b"), "a-b");
    }

    #[test]
    fn test_parse_lock_snapshot() {
        let snapshot = LockSnapshot::parse(LOCK).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.version_of("jinja2"), Some("3.1.2"));
        assert_eq!(snapshot.version_of("Typing.Extensions"), Some("4.9.0"));
        assert_eq!(snapshot.version_of("broken"), None);
    }

    #[test]
    fn test_missing_lock_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = LockSnapshot::load(&tmp.path().join(LOCK_FILE)).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_malformed_lock_file_is_error() {
        assert!(LockSnapshot::parse("[[package]\nname = ").is_err());
    }

    #[test]
    fn test_fingerprint_tracks_lock_changes() {
        let tmp = tempfile::tempdir().unwrap();
        let absent = manifest_fingerprint(tmp.path()).unwrap();

        fs::write(tmp.path().join(LOCK_FILE), "").unwrap();
        let empty = manifest_fingerprint(tmp.path()).unwrap();
        assert_ne!(absent, empty);

        fs::write(tmp.path().join(LOCK_FILE), LOCK).unwrap();
        let before = manifest_fingerprint(tmp.path()).unwrap();
        assert_eq!(before, manifest_fingerprint(tmp.path()).unwrap());

        fs::write(tmp.path().join(LOCK_FILE), LOCK.replace("3.1.2", "3.1.3")).unwrap();
        assert_ne!(before, manifest_fingerprint(tmp.path()).unwrap());
    }
}
