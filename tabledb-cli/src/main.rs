use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::ddl::DdlCommand;

#[derive(Parser)]
#[command(name = "tabledb")]
#[command(about = "Render DDL, prepare statements and install table schemas")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print CREATE TABLE or DROP TABLE statements for a schema file
    Ddl(DdlCommand),

    /// Substitute arguments into a %d/%f/%s template
    Prepare {
        /// Statement template
        template: String,

        /// Values for the placeholders, in order
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,

        /// Backend whose escaping rules apply
        #[arg(short, long, default_value = "mysql")]
        backend: String,
    },

    /// List the tables installed in a configured database
    Tables {
        /// Database configuration file
        #[arg(short, long, default_value = "tabledb.toml")]
        config: PathBuf,

        /// Named database (defaults to the configured default)
        #[arg(short, long)]
        database: Option<String>,
    },

    /// Create the table of a schema file unless it is installed
    Install {
        /// Schema definition (.yaml, .yml or .toml)
        schema_file: PathBuf,

        /// Database configuration file
        #[arg(short, long, default_value = "tabledb.toml")]
        config: PathBuf,

        /// Named database (defaults to the configured default)
        #[arg(short, long)]
        database: Option<String>,
    },

    /// Drop the table of a schema file if it is installed
    Uninstall {
        /// Schema definition (.yaml, .yml or .toml)
        schema_file: PathBuf,

        /// Database configuration file
        #[arg(short, long, default_value = "tabledb.toml")]
        config: PathBuf,

        /// Named database (defaults to the configured default)
        #[arg(short, long)]
        database: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Ddl(ddl) => ddl.execute(),
        Commands::Prepare {
            template,
            args,
            backend,
        } => commands::prepare::run(&template, &args, &backend),
        Commands::Tables { config, database } => commands::tables::run(config, database).await,
        Commands::Install {
            schema_file,
            config,
            database,
        } => commands::install::install(schema_file, config, database).await,
        Commands::Uninstall {
            schema_file,
            config,
            database,
        } => commands::install::uninstall(schema_file, config, database).await,
    }
}
