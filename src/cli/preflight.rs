//! Pre-flight checks before running a query.
//!
//! Validates that the API key and course catalog are in place before any
//! request is sent, so failures are reported up front.

use crate::config::Settings;
use crate::error::{LektorError, Result};

/// Requirements for different commands.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Queries need an API key and a catalog.
    Query,
    /// Outline lookups only read the catalog.
    Outline,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Query => {
            settings.api_key()?;
            check_catalog(settings)?;
        }
        Operation::Outline => {
            check_catalog(settings)?;
        }
    }
    Ok(())
}

fn check_catalog(settings: &Settings) -> Result<()> {
    let path = settings.catalog_path();
    if path.exists() {
        Ok(())
    } else {
        Err(LektorError::Config(format!(
            "Course catalog not found at {}. Set [store] catalog_path in the config.",
            path.display()
        )))
    }
}
