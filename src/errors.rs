//! Typed error hierarchy for the compatibility gate.
//!
//! One top-level enum covers the whole cycle; each variant corresponds to a
//! collaborator that can abort the run:
//! - `UpstreamUnavailable` — release lookup failures (network, auth, rate limit)
//! - `StoreUnavailable` — compat store open/query failures
//! - `ManifestNotFound` / `DependencyMissing` — manifest reader failures
//! - `InstallFailed` / `TestFailed` — test runner failures, with captured output

use std::path::PathBuf;
use thiserror::Error;

/// Which test command of the cycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    Unit,
    Integration,
}

impl std::fmt::Display for TestPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestPhase::Unit => write!(f, "unit"),
            TestPhase::Integration => write!(f, "integration"),
        }
    }
}

/// Errors that abort a compatibility cycle.
///
/// There is no local recovery: every variant propagates to the caller
/// (library mode) or terminates the process with exit code 1 (CLI mode).
/// A cycle that fails never writes to the compat store.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Failed to fetch latest upstream release: {0}")]
    UpstreamUnavailable(#[source] anyhow::Error),

    #[error("Compat store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),

    #[error("No package manifest found searching upward from {start_dir}")]
    ManifestNotFound { start_dir: PathBuf },

    #[error("Manifest at {path} declares no version for package '{package}'")]
    DependencyMissing { path: PathBuf, package: String },

    #[error("Install of {package}@{version} failed with exit code {exit_code}")]
    InstallFailed {
        package: String,
        version: String,
        exit_code: i32,
        output: String,
    },

    #[error("{phase} tests failed with exit code {exit_code}")]
    TestFailed {
        phase: TestPhase,
        exit_code: i32,
        output: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_unavailable_is_matchable() {
        let err = GateError::UpstreamUnavailable(anyhow::anyhow!("connection refused"));
        match &err {
            GateError::UpstreamUnavailable(e) => {
                assert!(e.to_string().contains("connection refused"));
            }
            _ => panic!("Expected UpstreamUnavailable variant"),
        }
    }

    #[test]
    fn manifest_not_found_carries_start_dir() {
        let err = GateError::ManifestNotFound {
            start_dir: PathBuf::from("/work/project"),
        };
        match &err {
            GateError::ManifestNotFound { start_dir } => {
                assert_eq!(start_dir, &PathBuf::from("/work/project"));
            }
            _ => panic!("Expected ManifestNotFound"),
        }
        assert!(err.to_string().contains("/work/project"));
    }

    #[test]
    fn dependency_missing_names_the_package() {
        let err = GateError::DependencyMissing {
            path: PathBuf::from("/work/project/package.json"),
            package: "next".to_string(),
        };
        assert!(err.to_string().contains("next"));
        assert!(err.to_string().contains("package.json"));
    }

    #[test]
    fn install_failed_carries_exit_code_and_output() {
        let err = GateError::InstallFailed {
            package: "next".to_string(),
            version: "13.0.0".to_string(),
            exit_code: 1,
            output: "ERESOLVE unable to resolve dependency tree".to_string(),
        };
        match &err {
            GateError::InstallFailed {
                exit_code, output, ..
            } => {
                assert_eq!(*exit_code, 1);
                assert!(output.contains("ERESOLVE"));
            }
            _ => panic!("Expected InstallFailed"),
        }
        assert!(err.to_string().contains("next@13.0.0"));
    }

    #[test]
    fn test_failed_names_the_phase() {
        let err = GateError::TestFailed {
            phase: TestPhase::Integration,
            exit_code: 2,
            output: "3 failing".to_string(),
        };
        assert!(err.to_string().contains("integration"));
        assert!(err.to_string().contains("2"));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(TestPhase::Unit.to_string(), "unit");
        assert_eq!(TestPhase::Integration.to_string(), "integration");
    }

    #[test]
    fn converts_from_anyhow() {
        let err: GateError = anyhow::anyhow!("unexpected").into();
        assert!(matches!(err, GateError::Other(_)));
    }

    #[test]
    fn gate_error_implements_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        let err = GateError::StoreUnavailable(anyhow::anyhow!("locked"));
        assert_std_error(&err);
    }
}
