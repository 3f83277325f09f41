use anyhow::Result;
use tabledb::query::create_dialect;
use tabledb::{prepare, DatabaseBackend, SqlValue};

/// Print `template` with `args` substituted
pub fn run(template: &str, args: &[String], backend: &str) -> Result<()> {
    let backend: DatabaseBackend = backend.parse()?;
    let dialect = create_dialect(backend);
    let args: Vec<SqlValue> = args.iter().map(SqlValue::from).collect();

    println!("{}", prepare(dialect.as_ref(), template, &args)?);
    Ok(())
}
