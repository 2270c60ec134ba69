pub mod config;
pub mod engine;
pub mod errors;
pub mod manifest;
pub mod release;
pub mod runner;
pub mod store;

pub use config::Config;
pub use engine::{CycleReport, CycleState, WriteStatus};
pub use errors::GateError;
pub use release::ReleaseVersion;

use engine::DecisionEngine;
use manifest::PackageManifest;
use release::GitHubReleases;
use runner::ShellTestRunner;
use store::FlagStore;

/// Run one compatibility cycle with the given configuration.
///
/// Library entry point: errors surface to the caller and nothing exits the
/// process. On success the only durable side effect is the compat flag
/// upsert, subject to the configuration's persistence settings.
pub async fn run_cycle(config: &Config) -> Result<CycleReport, GateError> {
    let release = GitHubReleases::new(&config.upstream, config.github_token.clone());
    let store = FlagStore::from_config(config)?;
    let manifest = PackageManifest::new(config.project_dir.clone(), config.upstream.package.as_str());
    let runner = ShellTestRunner::new(config);

    let mut engine = DecisionEngine::new(&release, &store, &manifest, &runner);
    engine.run().await
}
