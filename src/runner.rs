//! Install + test execution for one candidate release.
//!
//! Commands run through `sh -c` in the project directory with stdout and
//! stderr captured; captured output travels with any failure so a CI log
//! shows why the candidate was rejected.

use anyhow::Context;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::Config;
use crate::engine::{TestOutcome, TestRunner};
use crate::errors::{GateError, TestPhase};
use crate::release::ReleaseVersion;

/// Runs the install and test commands from the configuration.
pub struct ShellTestRunner {
    install: String,
    unit_test: String,
    integration_test: String,
    package: String,
    verbose: bool,
}

impl ShellTestRunner {
    pub fn new(config: &Config) -> Self {
        Self {
            install: config.commands.install.clone(),
            unit_test: config.commands.unit_test.clone(),
            integration_test: config.commands.integration_test.clone(),
            package: config.upstream.package.clone(),
            verbose: config.verbose,
        }
    }

    fn install_command(&self, version: &ReleaseVersion) -> String {
        self.install
            .replace("{package}", &self.package)
            .replace("{version}", version.as_str())
    }

    async fn run_command(&self, command: &str, dir: &Path) -> Result<(i32, String), GateError> {
        if self.verbose {
            eprintln!("[runner] Executing: {command}");
        }

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to spawn command: {command}"))?;

        let exit_code = output.status.code().unwrap_or(-1);
        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if self.verbose {
            eprintln!("[runner] Completed with exit code: {exit_code}");
        }

        Ok((exit_code, text))
    }
}

#[async_trait::async_trait]
impl TestRunner for ShellTestRunner {
    /// One all-or-nothing test cycle against `target`.
    ///
    /// The install is skipped when the manifest already declares exactly
    /// the target version — install is the expensive, flaky step. The test
    /// commands always run: an install from an earlier run is never trusted
    /// as still valid for this cycle.
    async fn install_and_test(
        &self,
        target: &ReleaseVersion,
        declared: &str,
        project_dir: &Path,
    ) -> Result<TestOutcome, GateError> {
        let mut installed = false;
        let mut combined = String::new();

        if target.as_str() != declared {
            let command = self.install_command(target);
            let (exit_code, output) = self.run_command(&command, project_dir).await?;
            if exit_code != 0 {
                return Err(GateError::InstallFailed {
                    package: self.package.clone(),
                    version: target.as_str().to_string(),
                    exit_code,
                    output,
                });
            }
            combined.push_str(&output);
            installed = true;
        }

        for (phase, command) in [
            (TestPhase::Unit, &self.unit_test),
            (TestPhase::Integration, &self.integration_test),
        ] {
            let (exit_code, output) = self.run_command(command, project_dir).await?;
            if exit_code != 0 {
                return Err(GateError::TestFailed {
                    phase,
                    exit_code,
                    output,
                });
            }
            combined.push_str(&output);
        }

        Ok(TestOutcome {
            installed,
            output: combined,
        })
    }
}
