use anyhow::Result;
use std::path::PathBuf;

/// List installed tables
pub async fn run(config: PathBuf, database: Option<String>) -> Result<()> {
    let mut db = super::connect(&config, database.as_deref()).await?;
    let tables = db.installed_tables().await?;

    if tables.is_empty() {
        println!("No tables found in database '{}'.", db.name());
        return Ok(());
    }

    println!("📋 Tables in database '{}' ({}):\n", db.name(), db.backend());
    for table in tables {
        println!("  {}", table);
    }
    Ok(())
}
