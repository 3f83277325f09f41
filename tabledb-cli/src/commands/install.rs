//! Install and uninstall tables described by schema files

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tabledb::{Connection, CreateStatus, DropStatus, Schema};

async fn prepare_connection(
    schema_file: &Path,
    config: &Path,
    database: Option<&str>,
) -> Result<(Connection, String)> {
    let schema = Schema::from_file(schema_file)
        .with_context(|| format!("Failed to load schema {}", schema_file.display()))?;
    let mut db = super::connect(config, database).await?;
    let basename = db.register_schema(schema).basename().to_string();
    Ok((db, basename))
}

pub async fn install(schema_file: PathBuf, config: PathBuf, database: Option<String>) -> Result<()> {
    let (mut db, basename) = prepare_connection(&schema_file, &config, database.as_deref()).await?;
    let name = db.filter_table_name(&basename);

    match db.create_table(&basename).await? {
        CreateStatus::Failed => anyhow::bail!(
            "Creating {} failed: {}",
            name,
            db.last_error().unwrap_or("table missing after CREATE")
        ),
        status => println!("✅ {}: {}", name, status),
    }
    Ok(())
}

pub async fn uninstall(schema_file: PathBuf, config: PathBuf, database: Option<String>) -> Result<()> {
    let (mut db, basename) = prepare_connection(&schema_file, &config, database.as_deref()).await?;
    let name = db.filter_table_name(&basename);

    match db.drop_table(&basename).await? {
        DropStatus::Failed => anyhow::bail!(
            "Dropping {} failed: {}",
            name,
            db.last_error().unwrap_or("table still installed after DROP")
        ),
        status => println!("✅ {}: {}", name, status),
    }
    Ok(())
}
