use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const POSTS_YAML: &str = r#"
table: posts
columns:
  id: INTEGER NOT NULL
  title: varchar(255) NOT NULL
  author_id: INTEGER
primary_key: id
keys:
  author_idx: author_id
"#;

fn tabledb() -> Command {
    Command::cargo_bin("tabledb").unwrap()
}

fn write_fixtures(dir: &Path) {
    fs::write(dir.join("posts.yaml"), POSTS_YAML).unwrap();
    fs::write(
        dir.join("tabledb.toml"),
        format!(
            "[main]\nurl = \"sqlite://{}?mode=rwc\"\ntable_prefix = \"t_\"\n",
            dir.join("test.db").display()
        ),
    )
    .unwrap();
}

#[test]
fn prints_mysql_create_table() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    tabledb()
        .args(["ddl", "create", "posts.yaml", "--prefix", "wp_"])
        .args(["--charset", "utf8mb4"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("CREATE TABLE wp_posts (\n  id INTEGER NOT NULL,"))
        .stdout(predicate::str::contains("\n  PRIMARY KEY  (id),"))
        .stdout(predicate::str::contains("\n  KEY author_idx (author_id)\n)"))
        .stdout(predicate::str::contains(") DEFAULT CHARACTER SET utf8mb4;"));
}

#[test]
fn sqlite_indexes_are_separate_statements() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    tabledb()
        .args(["ddl", "create", "posts.yaml", "--backend", "sqlite"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("KEY author_idx").not())
        .stdout(predicate::str::contains(
            "CREATE INDEX author_idx ON posts (author_id);",
        ));
}

#[test]
fn prints_drop_table() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    tabledb()
        .args(["ddl", "drop", "posts.yaml", "-p", "wp_"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout("DROP TABLE wp_posts;\n");
}

#[test]
fn prepare_escapes_for_the_backend() {
    tabledb()
        .args([
            "prepare",
            "SELECT * FROM posts WHERE id = %d AND title = %s",
            "5",
            "a'b",
            "--backend",
            "postgres",
        ])
        .assert()
        .success()
        .stdout("SELECT * FROM posts WHERE id = 5 AND title = 'a''b'\n");
}

#[test]
fn prepare_reports_missing_arguments() {
    tabledb()
        .args(["prepare", "id = %d AND title = %s", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expects 2 arguments, 1 given"));
}

#[test]
fn unknown_backend_fails() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    tabledb()
        .args(["ddl", "create", "posts.yaml", "--backend", "oracle"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown database backend 'oracle'"));
}

#[test]
fn install_list_and_uninstall() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    tabledb()
        .args(["install", "posts.yaml"])
        .current_dir(dir.path())
        .env_remove("DATABASE_URL")
        .env_remove("TABLEDB_DATABASE_URL")
        .env_remove("TABLEDB_TABLE_PREFIX")
        .assert()
        .success()
        .stdout(predicate::str::contains("t_posts: created"));

    tabledb()
        .args(["install", "posts.yaml", "--database", "main"])
        .current_dir(dir.path())
        .env_remove("DATABASE_URL")
        .env_remove("TABLEDB_DATABASE_URL")
        .env_remove("TABLEDB_TABLE_PREFIX")
        .assert()
        .success()
        .stdout(predicate::str::contains("t_posts: already installed"));

    tabledb()
        .args(["tables"])
        .current_dir(dir.path())
        .env_remove("DATABASE_URL")
        .env_remove("TABLEDB_DATABASE_URL")
        .env_remove("TABLEDB_TABLE_PREFIX")
        .assert()
        .success()
        .stdout(predicate::str::contains("  t_posts"));

    tabledb()
        .args(["uninstall", "posts.yaml"])
        .current_dir(dir.path())
        .env_remove("DATABASE_URL")
        .env_remove("TABLEDB_DATABASE_URL")
        .env_remove("TABLEDB_TABLE_PREFIX")
        .assert()
        .success()
        .stdout(predicate::str::contains("t_posts: dropped"));
}

#[test]
fn unknown_database_lists_the_configured_ones() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    tabledb()
        .args(["tables", "--database", "archive"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Available: main"));
}
