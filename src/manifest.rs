//! Project manifest discovery and dependency lookup.

use anyhow::Context;
use std::path::{Path, PathBuf};

use crate::engine::ManifestSource;
use crate::errors::GateError;

/// What the manifest declares about the tracked dependency.
#[derive(Debug, Clone)]
pub struct ManifestInfo {
    /// The declared version or range, verbatim (e.g. `^12.0.0`).
    pub declaration: String,
    /// Directory containing the manifest; the test cycle runs here.
    pub project_dir: PathBuf,
    pub manifest_path: PathBuf,
}

/// Dependency maps searched, in precedence order. The tracked framework is
/// conventionally a peer dependency, but may live in any of them.
const DEPENDENCY_KEYS: &[&str] = &["peerDependencies", "dependencies", "devDependencies"];

/// Manifest reader that walks upward from a start directory to the nearest
/// `package.json`.
pub struct PackageManifest {
    start_dir: PathBuf,
    package: String,
}

impl PackageManifest {
    pub fn new(start_dir: PathBuf, package: impl Into<String>) -> Self {
        Self {
            start_dir,
            package: package.into(),
        }
    }
}

fn find_manifest(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = Some(start_dir);
    while let Some(current) = dir {
        let candidate = current.join("package.json");
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

impl ManifestSource for PackageManifest {
    fn read_declaration(&self) -> Result<ManifestInfo, GateError> {
        let manifest_path =
            find_manifest(&self.start_dir).ok_or_else(|| GateError::ManifestNotFound {
                start_dir: self.start_dir.clone(),
            })?;

        let content = std::fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
        let manifest: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

        let declaration = DEPENDENCY_KEYS
            .iter()
            .find_map(|key| {
                manifest
                    .get(key)
                    .and_then(|deps| deps.get(&self.package))
                    .and_then(|version| version.as_str())
            })
            .ok_or_else(|| GateError::DependencyMissing {
                path: manifest_path.clone(),
                package: self.package.clone(),
            })?
            .to_string();

        let project_dir = manifest_path
            .parent()
            .context("Manifest has no parent directory")?
            .to_path_buf();

        Ok(ManifestInfo {
            declaration,
            project_dir,
            manifest_path,
        })
    }
}
