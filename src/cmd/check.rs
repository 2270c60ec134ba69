//! One compatibility cycle — `compat-gate check`.

use anyhow::Result;
use compat_gate::{Config, CycleReport, WriteStatus, run_cycle};

pub async fn cmd_check(config: &Config) -> Result<()> {
    if config.github_token.is_none() {
        eprintln!(
            "  {}",
            console::style("warning: no access token; using unauthenticated release lookups")
                .yellow()
        );
    }

    if config.verbose {
        println!(
            "Tracking {}/{} (package '{}')",
            config.upstream.owner, config.upstream.repo, config.upstream.package
        );
        println!("Project: {}", config.project_dir.display());
        match &config.store_path {
            Some(path) => println!("Store: {path}"),
            None => println!("Store: (not configured)"),
        }
    }

    let report = run_cycle(config).await?;

    match &report {
        CycleReport::UpToDate { version } => {
            println!(
                "{} {} already verified; no new release",
                console::style("✓").green(),
                version
            );
        }
        CycleReport::Verified {
            version,
            installed,
            write,
        } => {
            if config.verbose {
                if *installed {
                    println!("Installed candidate {version}");
                } else {
                    println!("Declared version already matches {version}; install skipped");
                }
            }
            println!(
                "{} {} is compatible",
                console::style("✓").green(),
                version
            );
            match write {
                WriteStatus::Persisted => {
                    println!("  compat flag updated to \"{version}\"");
                }
                WriteStatus::Suppressed => {
                    println!(
                        "  {}",
                        console::style("store write suppressed (dry run)").dim()
                    );
                }
                WriteStatus::Unconfigured => {
                    println!(
                        "  {}",
                        console::style("no store configured; result not persisted").dim()
                    );
                }
            }
        }
    }

    Ok(())
}
