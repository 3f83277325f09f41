//! Render table DDL from schema files without touching a database

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use tabledb::query::create_dialect;
use tabledb::{DatabaseBackend, DdlWriter, Schema};

#[derive(Debug, Args)]
pub struct DdlCommand {
    #[command(subcommand)]
    pub action: DdlAction,
}

#[derive(Debug, Subcommand)]
pub enum DdlAction {
    /// CREATE TABLE, plus CREATE INDEX where keys cannot be inline
    Create {
        /// Schema definition (.yaml, .yml or .toml)
        schema_file: PathBuf,

        #[command(flatten)]
        target: Target,

        /// Default character set (MySQL/MariaDB)
        #[arg(long)]
        charset: Option<String>,

        /// Default collation (MySQL/MariaDB)
        #[arg(long)]
        collate: Option<String>,
    },

    /// DROP TABLE
    Drop {
        /// Schema definition (.yaml, .yml or .toml)
        schema_file: PathBuf,

        #[command(flatten)]
        target: Target,
    },
}

#[derive(Debug, Args)]
pub struct Target {
    /// Backend to render for (mysql, mariadb, postgres, sqlite)
    #[arg(short, long, default_value = "mysql")]
    pub backend: String,

    /// Table prefix
    #[arg(short, long, default_value = "")]
    pub prefix: String,
}

impl Target {
    fn load(&self, schema_file: &Path) -> Result<(DatabaseBackend, Schema)> {
        let backend: DatabaseBackend = self.backend.parse()?;
        let mut schema = Schema::from_file(schema_file)
            .with_context(|| format!("Failed to load schema {}", schema_file.display()))?;
        schema.set_table_prefix(&self.prefix);
        Ok((backend, schema))
    }
}

impl DdlCommand {
    pub fn execute(self) -> Result<()> {
        match self.action {
            DdlAction::Create {
                schema_file,
                target,
                charset,
                collate,
            } => {
                let (backend, schema) = target.load(&schema_file)?;
                let dialect = create_dialect(backend);
                let statements = DdlWriter::new(dialect.as_ref())
                    .charset(charset.as_deref())
                    .collate(collate.as_deref())
                    .create_table_statements(&schema);
                println!("{}", statements.join("\n"));
            }
            DdlAction::Drop {
                schema_file,
                target,
            } => {
                let (backend, schema) = target.load(&schema_file)?;
                let dialect = create_dialect(backend);
                println!("{};", DdlWriter::new(dialect.as_ref()).drop_table(&schema));
            }
        }
        Ok(())
    }
}
