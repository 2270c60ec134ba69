//! Configuration display — `compat-gate config`.

use anyhow::Result;
use compat_gate::Config;

use crate::ConfigCommands;

pub fn cmd_config(config: &Config, command: Option<ConfigCommands>) -> Result<()> {
    match command.unwrap_or(ConfigCommands::Show) {
        ConfigCommands::Show => show_config(config),
    }
}

fn show_config(config: &Config) -> Result<()> {
    println!("{}", console::style("Upstream").bold());
    println!("  owner: {}", config.upstream.owner);
    println!("  repo: {}", config.upstream.repo);
    println!("  package: {}", config.upstream.package);

    println!("{}", console::style("Commands").bold());
    println!("  install: {}", config.commands.install);
    println!("  unit_test: {}", config.commands.unit_test);
    println!("  integration_test: {}", config.commands.integration_test);

    println!("{}", console::style("Store").bold());
    match &config.store_path {
        Some(path) => println!("  path: {path}"),
        None => println!("  path: (not configured)"),
    }
    println!("  no_write: {}", config.suppress_writes);

    println!("{}", console::style("Auth").bold());
    println!(
        "  token: {}",
        if config.github_token.is_some() {
            "(set)"
        } else {
            "(not set)"
        }
    );

    Ok(())
}
