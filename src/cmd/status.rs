//! Persisted state display — `compat-gate status`.

use anyhow::Result;
use compat_gate::Config;
use compat_gate::store::FlagStore;

pub fn cmd_status(config: &Config) -> Result<()> {
    let store = FlagStore::from_config(config)?;

    if !store.is_configured() {
        println!("Persistence not configured (set COMPAT_DB, --store, or [store] path)");
        return Ok(());
    }

    match store.read_record()? {
        Some(record) => {
            println!(
                "compat: {}",
                console::style(format!("\"{}\"", record.value)).green()
            );
            println!("updated: {}", record.updated_at);
        }
        None => {
            println!("No compatible version recorded yet");
        }
    }

    Ok(())
}
