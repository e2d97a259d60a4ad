//! Region CLI command.

use super::Workspace;
use crate::config::BatchConfig;
use crate::storage::CatalogBackend;
use crate::{Error, Result};
use std::path::Path;

/// Adds a region to the catalog snapshot.
///
/// Region names must be unique: price columns resolve regions by name.
pub fn add(config: &BatchConfig, catalog: Option<&Path>, name: &str, currency: &str) -> Result<()> {
    let currency = currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::InvalidInput(format!(
            "currency must be a three-letter code, got {currency:?}"
        )));
    }
    let workspace = Workspace::open(config, catalog)?;
    if workspace.catalog.find_region_by_name(name)?.is_some() {
        return Err(Error::InvalidInput(format!("region {name} already exists")));
    }
    let region = workspace.catalog.add_region(name, currency);
    workspace.save_catalog()?;

    println!(
        "Region added: {} ({}, {})",
        region.name,
        region.id,
        region.currency_code.to_uppercase()
    );
    Ok(())
}

/// Lists regions in the catalog snapshot.
pub fn list(config: &BatchConfig, catalog: Option<&Path>) -> Result<()> {
    let workspace = Workspace::open(config, catalog)?;
    let regions = workspace.catalog.snapshot().regions;
    if regions.is_empty() {
        println!("No regions in {}", workspace.catalog_path().display());
        return Ok(());
    }
    for region in regions {
        println!(
            "{}\t{}\t{}",
            region.id,
            region.name,
            region.currency_code.to_uppercase()
        );
    }
    Ok(())
}
