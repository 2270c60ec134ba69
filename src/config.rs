//! Configuration for the compatibility gate.
//!
//! All recognized options live in an explicit [`Config`] struct that is
//! passed into the engine's entry points — nothing reads process state ad
//! hoc mid-cycle. Settings are layered (file → environment → CLI):
//!
//! ```toml
//! # compat.toml
//! [upstream]
//! owner = "vercel"
//! repo = "next.js"
//! package = "next"
//!
//! [commands]
//! install = "npm install --no-save {package}@{version}"
//! unit_test = "npm run test-unit"
//! integration_test = "npm run test-integration"
//!
//! [store]
//! path = "flags.db"
//! no_write = false
//! ```
//!
//! Environment: `COMPAT_DB` (store connection string), `COMPAT_NO_DB_WRITE`
//! (write suppression), `GH_TOKEN` / `GITHUB_TOKEN` (release source auth).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "compat.toml";

/// The upstream project whose releases are tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// GitHub repository owner
    #[serde(default = "default_owner")]
    pub owner: String,
    /// GitHub repository name
    #[serde(default = "default_repo")]
    pub repo: String,
    /// Package name as declared in the project manifest
    #[serde(default = "default_package")]
    pub package: String,
}

fn default_owner() -> String {
    "vercel".to_string()
}

fn default_repo() -> String {
    "next.js".to_string()
}

fn default_package() -> String {
    "next".to_string()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            package: default_package(),
        }
    }
}

/// Shell commands executed by the test runner.
///
/// The install command supports `{package}` and `{version}` placeholders,
/// substituted at run time with the tracked package and the candidate
/// release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    #[serde(default = "default_install")]
    pub install: String,
    #[serde(default = "default_unit_test")]
    pub unit_test: String,
    #[serde(default = "default_integration_test")]
    pub integration_test: String,
}

fn default_install() -> String {
    "npm install --no-save {package}@{version}".to_string()
}

fn default_unit_test() -> String {
    "npm run test-unit".to_string()
}

fn default_integration_test() -> String {
    "npm run test-integration".to_string()
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            install: default_install(),
            unit_test: default_unit_test(),
            integration_test: default_integration_test(),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database path. Absent → persistence is skipped entirely.
    #[serde(default)]
    pub path: Option<String>,
    /// Suppress writes while still reading (dry-run verification).
    #[serde(default)]
    pub no_write: bool,
}

/// Contents of `compat.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompatToml {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl CompatToml {
    /// Load `compat.toml` from the project directory, falling back to
    /// defaults if the file does not exist.
    pub fn load_or_default(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Resolved runtime configuration for one gate run.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub verbose: bool,
    /// Store connection string; `None` disables persistence.
    pub store_path: Option<String>,
    /// Log write intent without touching the store.
    pub suppress_writes: bool,
    /// Optional token for the release source. Absence only downgrades the
    /// lookup to an unauthenticated call with lower rate limits.
    pub github_token: Option<String>,
    pub upstream: UpstreamConfig,
    pub commands: CommandsConfig,
}

impl Config {
    /// Resolve configuration for the given project directory.
    ///
    /// `store_override` and `no_write_flag` come from the CLI and take
    /// precedence over both the environment and `compat.toml`.
    pub fn load(
        project_dir: PathBuf,
        verbose: bool,
        store_override: Option<String>,
        no_write_flag: bool,
    ) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;

        let file = CompatToml::load_or_default(&project_dir)?;

        let store_path = store_override
            .or_else(|| std::env::var("COMPAT_DB").ok().filter(|s| !s.is_empty()))
            .or(file.store.path);

        let suppress_writes =
            no_write_flag || std::env::var("COMPAT_NO_DB_WRITE").is_ok() || file.store.no_write;

        let github_token = std::env::var("GH_TOKEN")
            .or_else(|_| std::env::var("GITHUB_TOKEN"))
            .ok()
            .filter(|t| !t.is_empty());

        Ok(Self {
            project_dir,
            verbose,
            store_path,
            suppress_writes,
            github_token,
            upstream: file.upstream,
            commands: file.commands,
        })
    }
}
