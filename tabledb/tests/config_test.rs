use std::io::Write;
use tabledb::{DatabaseRegistry, DatabasesConfig, Schema};

#[test]
fn databases_load_from_toml_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
[blog]
url = "mysql://wp@localhost/blog"
table_prefix = "wp_"
charset = "utf8mb4"
collate = "utf8mb4_unicode_ci"
save_queries = true

[archive]
url = "sqlite://archive.db"
is_default = true
"#
    )
    .unwrap();

    let config = DatabasesConfig::from_file(file.path()).unwrap();
    assert_eq!(config.list_names(), vec!["blog", "archive"]);

    let blog = config.get("blog").unwrap();
    assert_eq!(blog.collate.as_deref(), Some("utf8mb4_unicode_ci"));
    assert!(blog.save_queries);
    assert!(!blog.suppress_errors);
    assert_eq!(config.get_default().unwrap().0, "archive");
}

#[test]
fn invalid_pool_bounds_are_rejected() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        "[main]\nurl = \"sqlite::memory:\"\nmin_connections = 5\nmax_connections = 2\n"
    )
    .unwrap();

    let err = DatabasesConfig::from_file(file.path()).unwrap_err();
    assert_eq!(err.error_code(), "E_CONFIG");
}

#[test]
fn missing_config_file_keeps_the_io_error() {
    let err = DatabasesConfig::from_file("/nonexistent/tabledb.toml").unwrap_err();
    assert_eq!(err.error_code(), "E_IO");
    assert!(err.to_string().contains("/nonexistent/tabledb.toml"));
}

#[test]
fn schemas_load_by_extension() {
    let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(
        yaml,
        r#"
table: comments
columns:
  id: bigint(20) unsigned NOT NULL AUTO_INCREMENT
  post_id: bigint(20) unsigned NOT NULL
  body: text
primary_key: id
keys:
  post: post_id
relations:
  - type: one_to_many
    column: post_id
    foreign_table: posts
    foreign_key: id
"#
    )
    .unwrap();

    let schema = Schema::from_file(yaml.path()).unwrap();
    assert_eq!(schema.basename(), "comments");
    assert_eq!(schema.keys()["post"], vec!["post_id"]);
    assert!(schema.relations_to("posts").is_some());

    let txt = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    assert_eq!(
        Schema::from_file(txt.path()).unwrap_err().error_code(),
        "E_SCHEMA"
    );
}

#[tokio::test]
async fn registry_connects_every_database() {
    let config = DatabasesConfig::from_toml_str(
        r#"
[main]
url = "sqlite::memory:"
table_prefix = "m_"

[logs]
url = "sqlite::memory:"
is_default = true
"#,
    )
    .unwrap();

    let registry = DatabaseRegistry::from_config(&config).await.unwrap();
    assert_eq!(registry.list_databases().await, vec!["main", "logs"]);
    assert_eq!(registry.default_name().await.as_deref(), Some("logs"));

    let main = registry.get("main").await.unwrap();
    assert_eq!(main.lock().await.prefix(), "m_");

    let logs = registry.get_default().await.unwrap();
    {
        let mut db = logs.lock().await;
        assert_eq!(db.query("SELECT 1 AS one").await.unwrap(), 1);
    }

    assert!(registry.remove("logs").await.is_err());
    assert!(registry.remove("main").await.is_ok());
    assert!(!registry.has_database("main").await);
}
