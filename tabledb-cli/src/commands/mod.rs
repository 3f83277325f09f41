pub mod ddl;
pub mod install;
pub mod prepare;
pub mod tables;

use anyhow::{Context, Result};
use std::path::Path;
use tabledb::{Connection, DatabasesConfig};

/// Connect the named database of a configuration file, or its default
pub async fn connect(config_path: &Path, database: Option<&str>) -> Result<Connection> {
    let config = DatabasesConfig::from_file(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let (name, db_config) = match database {
        Some(name) => config
            .get(name)
            .map(|c| (name.to_string(), c.clone()))
            .with_context(|| {
                format!(
                    "Database '{}' is not configured. Available: {}",
                    name,
                    config.list_names().join(", ")
                )
            })?,
        None => config
            .get_default()
            .map(|(name, c)| (name.clone(), c.clone()))
            .context("No database configured")?,
    };

    log::debug!("Connecting database '{}'", name);
    Ok(Connection::connect(name, db_config).await?)
}
