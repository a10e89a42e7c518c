//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use crate::store::MemoryCourseStore;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings, path: Option<&str>) -> Result<()> {
    let config_path = match path {
        Some(p) => Settings::expand_path(p),
        None => Settings::default_config_path(),
    };

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
            println!("{}", catalog_summary(&settings));
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                Output::warning(&format!(
                    "Config already exists at {}. Use --force to overwrite.",
                    config_path.display()
                ));
                return Ok(());
            }

            settings.save_to(&config_path)?;
            Output::info(&format!("Wrote config to {}", config_path.display()));
        }
    }

    Ok(())
}

/// One-line TOML comment describing the configured catalog.
fn catalog_summary(settings: &Settings) -> String {
    let path = settings.catalog_path();
    match MemoryCourseStore::from_json_file(&path) {
        Ok(store) => format!("# catalog: {} ({} courses)", path.display(), store.course_count()),
        Err(e) => format!("# catalog: {} ({})", path.display(), e),
    }
}
