//! The compatibility decision engine.
//!
//! Combines the release resolver, the compat store, the manifest reader and
//! the test runner into one sequential cycle:
//!
//! ```text
//! Idle → Resolving → Deciding → Testing → Committing → Done
//!                        └─────────────────────────────↗ (no new release)
//! ```
//!
//! `Failed` is reachable from any state; a failed cycle never writes to the
//! store, so the previously persisted version stays authoritative. The
//! engine is the only component that mutates persisted state.

use std::path::Path;

use crate::errors::GateError;
use crate::manifest::ManifestInfo;
use crate::release::ReleaseVersion;

/// Where a cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Resolving,
    Deciding,
    Testing,
    Committing,
    Done,
    Failed,
}

/// What happened to the store write of a successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The compat flag was upserted.
    Persisted,
    /// Persistence is configured but writes are suppressed (dry run).
    Suppressed,
    /// No store is configured; the cycle ran without a durable commit.
    Unconfigured,
}

/// Result of one install-then-test execution.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    /// Whether an install was performed (false when the declared version
    /// already matched the candidate).
    pub installed: bool,
    /// Captured stdout/stderr of the executed commands.
    pub output: String,
}

/// Result of a successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// The persisted compat version already equals the latest release;
    /// nothing was installed, tested or written. The common outcome on
    /// repeated runs.
    UpToDate { version: ReleaseVersion },
    /// A test cycle ran against `version` and passed.
    Verified {
        version: ReleaseVersion,
        installed: bool,
        write: WriteStatus,
    },
}

/// Resolves the latest upstream release. Read-only.
#[async_trait::async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn latest_release(&self) -> Result<ReleaseVersion, GateError>;
}

/// Reads and writes the persisted compat flag.
pub trait CompatStore {
    /// `None` when no record exists or the store is unconfigured.
    fn read_compat(&self) -> Result<Option<ReleaseVersion>, GateError>;
    /// Upsert; a no-op (with the corresponding status) when unconfigured
    /// or suppressed.
    fn write_compat(&self, version: &ReleaseVersion) -> Result<WriteStatus, GateError>;
}

/// Locates the project manifest and the declared dependency version.
pub trait ManifestSource {
    fn read_declaration(&self) -> Result<ManifestInfo, GateError>;
}

/// Executes one install + test cycle. Atomic from the engine's point of
/// view: no partial credit for "install succeeded, tests failed".
#[async_trait::async_trait]
pub trait TestRunner: Send + Sync {
    async fn install_and_test(
        &self,
        target: &ReleaseVersion,
        declared: &str,
        project_dir: &Path,
    ) -> Result<TestOutcome, GateError>;
}

/// Orchestrates one compatibility cycle. Strictly sequential; the engine
/// is the sole active task and imposes no timeouts of its own.
pub struct DecisionEngine<'a> {
    release: &'a dyn ReleaseSource,
    store: &'a dyn CompatStore,
    manifest: &'a dyn ManifestSource,
    runner: &'a dyn TestRunner,
    state: CycleState,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(
        release: &'a dyn ReleaseSource,
        store: &'a dyn CompatStore,
        manifest: &'a dyn ManifestSource,
        runner: &'a dyn TestRunner,
    ) -> Self {
        Self {
            release,
            store,
            manifest,
            runner,
            state: CycleState::Idle,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Run one cycle to completion.
    pub async fn run(&mut self) -> Result<CycleReport, GateError> {
        match self.cycle().await {
            Ok(report) => {
                self.state = CycleState::Done;
                Ok(report)
            }
            Err(e) => {
                self.state = CycleState::Failed;
                Err(e)
            }
        }
    }

    async fn cycle(&mut self) -> Result<CycleReport, GateError> {
        self.state = CycleState::Resolving;
        let latest = self.release.latest_release().await?;
        let last_tested = self.store.read_compat()?;

        self.state = CycleState::Deciding;
        if last_tested.as_ref() == Some(&latest) {
            return Ok(CycleReport::UpToDate { version: latest });
        }

        // A new (or never-tested) release. The manifest is only consulted
        // now, so the idempotent path never touches the filesystem.
        let manifest = self.manifest.read_declaration()?;

        self.state = CycleState::Testing;
        let outcome = self
            .runner
            .install_and_test(&latest, &manifest.declaration, &manifest.project_dir)
            .await?;

        // The write happens only after a fully successful test cycle;
        // crash safety is by ordering, not by transaction.
        self.state = CycleState::Committing;
        let write = self.store.write_compat(&latest)?;

        Ok(CycleReport::Verified {
            version: latest,
            installed: outcome.installed,
            write,
        })
    }
}
