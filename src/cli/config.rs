//! Config CLI command.

use crate::Result;
use crate::config::BatchConfig;

/// Prints the effective configuration and where it was looked for.
pub fn execute(config: &BatchConfig, show: bool) -> Result<()> {
    if !show {
        println!("Use --show to print the effective configuration");
        return Ok(());
    }

    println!("{config}");
    println!();
    println!("Config files searched:");
    for path in BatchConfig::default_paths() {
        let marker = if path.exists() { "found" } else { "missing" };
        println!("  {} ({marker})", path.display());
    }
    Ok(())
}
