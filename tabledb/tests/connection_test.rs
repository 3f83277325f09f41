mod common;

use common::{mock_connection, posts_schema};
use serde_json::json;
use tabledb::{
    record, ColumnFormat, CreateStatus, DatabaseBackend, DropStatus, Error, Formats, QueryError,
    SqlValue,
};

#[tokio::test]
async fn insert_infers_formats_from_the_registered_schema() {
    let (mut db, mock) = mock_connection(DatabaseBackend::MySQL, "wp_");
    db.register_schema(posts_schema());

    let affected = db
        .insert(
            "posts",
            &record! { "title" => "O'Reilly", "id" => "12abc", "price" => "3.5" },
            &Formats::Infer,
        )
        .await
        .unwrap();

    assert_eq!(affected, 1);
    assert_eq!(
        mock.last().unwrap(),
        "INSERT INTO wp_posts (title, id, price) VALUES ('O\\'Reilly', 12, 3.500000)"
    );
    assert_eq!(db.insert_id(), Some(1));
    assert_eq!(db.rows_affected(), 1);
}

#[tokio::test]
async fn partial_formats_fall_back_per_column() {
    let (mut db, mock) = mock_connection(DatabaseBackend::MySQL, "wp_");
    db.register_schema(posts_schema());

    db.insert(
        "posts",
        &record! { "author_id" => "7x", "price" => "2", "note" => 4 },
        &Formats::PerColumn(vec![ColumnFormat::Integer]),
    )
    .await
    .unwrap();

    assert_eq!(
        mock.last().unwrap(),
        "INSERT INTO wp_posts (author_id, price, note) VALUES (7, 2.000000, '4')"
    );
}

#[tokio::test]
async fn unregistered_tables_are_used_verbatim() {
    let (mut db, mock) = mock_connection(DatabaseBackend::SQLite, "wp_");

    db.update(
        "options",
        &record! { "value" => "on" },
        &record! { "name" => "it's" },
        &Formats::Infer,
        &Formats::Infer,
    )
    .await
    .unwrap();
    db.delete("options", &record! { "id" => 3 }, &ColumnFormat::Integer.into())
        .await
        .unwrap();

    assert_eq!(
        mock.executed(),
        vec![
            "UPDATE options SET value = 'on' WHERE name = 'it''s'",
            "DELETE FROM options WHERE id = 3",
        ]
    );
}

#[tokio::test]
async fn update_field_targets_one_column() {
    let (mut db, mock) = mock_connection(DatabaseBackend::MySQL, "");
    db.register_schema(posts_schema());

    db.update_field("posts", "author_id", 9, &record! { "id" => 1 })
        .await
        .unwrap();

    assert_eq!(
        mock.last().unwrap(),
        "UPDATE posts SET author_id = 9 WHERE id = 1"
    );
}

#[tokio::test]
async fn failed_insert_clears_insert_id_and_logs_the_error() {
    let (mut db, mock) = mock_connection(DatabaseBackend::MySQL, "");
    db.register_schema(posts_schema());

    db.insert("posts", &record! { "title" => "a" }, &Formats::Infer)
        .await
        .unwrap();
    assert_eq!(db.insert_id(), Some(1));

    mock.fail_on("INSERT");
    assert!(!db.suppress_errors(true));
    let err = db
        .insert("posts", &record! { "title" => "b" }, &Formats::Infer)
        .await
        .unwrap_err();

    assert!(err.is_database_error());
    assert_eq!(db.insert_id(), None);
    assert!(db.last_error().unwrap().contains("mock failure"));
    assert_eq!(db.error_log().len(), 1);
    assert_eq!(
        db.error_log().last().unwrap().query,
        "INSERT INTO posts (title) VALUES ('b')"
    );
    assert_eq!(db.num_queries(), 2);
}

#[tokio::test]
async fn builder_errors_do_not_reach_the_database() {
    let (mut db, mock) = mock_connection(DatabaseBackend::Postgres, "");

    let err = db
        .replace("posts", &record! { "id" => 1 }, &Formats::Infer)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Query(QueryError::UnsupportedFeature { .. })
    ));

    let err = db
        .delete("posts", &record! {}, &Formats::Infer)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "E_INVALID_STATEMENT");

    assert!(mock.executed().is_empty());
    assert_eq!(db.num_queries(), 0);
}

#[tokio::test]
async fn result_accessors_read_the_last_result() {
    let (mut db, mock) = mock_connection(DatabaseBackend::MySQL, "");
    mock.push_rows(vec![
        json!({"id": 1, "title": "first"}),
        json!({"id": 2, "title": ""}),
        json!({"id": 1, "title": "dup"}),
    ]);

    assert_eq!(db.query("SELECT id, title FROM posts").await.unwrap(), 3);
    assert_eq!(db.num_rows(), 3);

    assert_eq!(
        db.get_var(None, 1, 0).await.unwrap().map(|v| v.as_text()),
        Some("first".to_string())
    );
    // empty strings read as missing
    assert_eq!(db.get_var(None, 1, 1).await.unwrap(), None);
    assert_eq!(db.get_var(None, 5, 0).await.unwrap(), None);

    let ids: Vec<String> = db
        .get_col(None, 0)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.map(|v| v.integer_literal()).unwrap_or_default())
        .collect();
    assert_eq!(ids, vec!["1", "2", "1"]);

    let keyed = db.get_results_keyed(None).await.unwrap();
    assert_eq!(keyed.len(), 2);
    assert_eq!(keyed["1"]["title"], json!("first"));

    let row = db.get_row(None, 1).await.unwrap().unwrap();
    assert_eq!(row["id"], json!(2));
    assert_eq!(mock.executed().len(), 1);
}

#[tokio::test]
async fn statements_are_classified() {
    let (mut db, mock) = mock_connection(DatabaseBackend::MySQL, "");
    mock.push_rows(vec![json!({"a": 1}), json!({"a": 2})]);

    assert_eq!(db.query("CREATE TABLE x (a int)").await.unwrap(), 0);
    assert_eq!(db.query("DELETE FROM x WHERE a = 1").await.unwrap(), 1);
    assert_eq!(db.insert_id(), None);
    assert_eq!(db.query("SELECT a FROM x").await.unwrap(), 2);
    assert_eq!(db.last_query(), Some("SELECT a FROM x"));
    assert_eq!(db.saved_queries().len(), 3);
}

#[tokio::test]
async fn create_and_drop_report_their_status() {
    let (mut db, mock) = mock_connection(DatabaseBackend::MySQL, "wp_");
    db.register_schema(posts_schema());

    // not installed, then installed after CREATE
    mock.push_rows(vec![]);
    mock.push_rows(vec![json!({"Tables_in_wp": "wp_posts"})]);
    assert_eq!(db.create_table("posts").await.unwrap(), CreateStatus::Created);
    assert!(mock.executed()[1].starts_with("CREATE TABLE wp_posts ("));

    mock.push_rows(vec![json!({"Tables_in_wp": "wp_posts"})]);
    assert_eq!(
        db.create_table("posts").await.unwrap(),
        CreateStatus::AlreadyInstalled
    );

    mock.push_rows(vec![json!({"Tables_in_wp": "wp_posts"})]);
    mock.push_rows(vec![]);
    assert_eq!(db.drop_table("posts").await.unwrap(), DropStatus::Dropped);
    assert_eq!(
        mock.executed().iter().filter(|s| *s == "DROP TABLE wp_posts").count(),
        1
    );

    mock.push_rows(vec![]);
    assert_eq!(db.drop_table("posts").await.unwrap(), DropStatus::NotInstalled);

    assert!(matches!(
        db.create_table("missing").await,
        Err(Error::UnknownTable(_))
    ));
}

#[tokio::test]
async fn failing_create_reports_failed() {
    let (mut db, mock) = mock_connection(DatabaseBackend::MySQL, "");
    db.register_schema(posts_schema());
    mock.fail_on("CREATE TABLE");
    db.suppress_errors(true);

    mock.push_rows(vec![]);
    assert_eq!(db.create_table("posts").await.unwrap(), CreateStatus::Failed);
    assert!(db.last_error().is_some());
    assert!(!mock.executed().iter().any(|s| s.starts_with("DROP TABLE")));
}

#[tokio::test]
async fn failing_index_drops_the_new_table() {
    let (mut db, mock) = mock_connection(DatabaseBackend::SQLite, "");
    db.register_schema(posts_schema());
    mock.fail_on("CREATE INDEX");
    db.suppress_errors(true);

    mock.push_rows(vec![]);
    assert_eq!(db.create_table("posts").await.unwrap(), CreateStatus::Failed);
    assert!(db.last_error().unwrap().contains("CREATE INDEX author ON posts"));

    let executed = mock.executed();
    assert!(executed[1].starts_with("CREATE TABLE posts ("));
    assert!(executed[2].starts_with("CREATE INDEX author ON posts"));
    assert_eq!(executed.last().unwrap(), "DROP TABLE posts");

    // the next install starts from scratch
    mock.push_rows(vec![]);
    assert_eq!(db.create_table("posts").await.unwrap(), CreateStatus::Failed);
    assert!(mock.executed()[5].starts_with("CREATE TABLE posts ("));
}

#[tokio::test]
async fn prefix_changes_rename_registered_tables() {
    let (mut db, mock) = mock_connection(DatabaseBackend::MySQL, "wp_");
    db.register_schema(posts_schema());

    assert_eq!(db.filter_table_name("posts"), "wp_posts");
    assert_eq!(db.filter_table_name("other"), "other");
    assert!(db.is_valid_table("wp_posts"));
    assert!(!db.is_valid_table("posts"));

    assert!(matches!(db.set_prefix("bad-prefix"), Err(Error::InvalidPrefix(_))));
    assert_eq!(db.prefix(), "wp_");

    assert_eq!(db.set_prefix("site2_").unwrap(), "wp_");
    assert_eq!(db.table_names()["posts"], "site2_posts");
    assert_eq!(db.schema("site2_posts").unwrap().basename(), "posts");

    db.table("posts")
        .unwrap()
        .delete(&record! { "id" => 4 }, &Formats::Infer)
        .await
        .unwrap();
    assert_eq!(mock.last().unwrap(), "DELETE FROM site2_posts WHERE id = 4");
    assert!(db.table("nope").is_err());
}

#[tokio::test]
async fn table_facade_selects_through_the_schema() {
    let (mut db, mock) = mock_connection(DatabaseBackend::SQLite, "");
    db.register_schema(posts_schema());
    mock.push_rows(vec![json!({"id": 3, "title": "x"})]);

    let mut posts = db.table("posts").unwrap();
    assert_eq!(posts.schema().unwrap().primary_key(), Some("id"));
    let rows = posts
        .select(&["id", "title"], &record! { "author_id" => "5" })
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        posts.prepare("SELECT * FROM posts WHERE title = %s", &[SqlValue::from("a'b")])
            .unwrap(),
        "SELECT * FROM posts WHERE title = 'a''b'"
    );

    assert_eq!(
        mock.last().unwrap(),
        "SELECT id, title FROM posts WHERE author_id = 5"
    );
}

#[tokio::test]
async fn charset_collate_only_for_mysql() {
    let (db, _) = mock_connection(DatabaseBackend::Postgres, "");
    assert_eq!(db.charset_collate(), "");
}

struct AuthorStamp {
    calls: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

impl tabledb::ModelHooks for AuthorStamp {
    fn before_insert(&self, data: &mut tabledb::Record) -> tabledb::Result<()> {
        data.insert("author_id".to_string(), 42.into());
        Ok(())
    }

    fn after_insert(&self, outcome: &tabledb::Result<u64>) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("insert ok={}", outcome.is_ok()));
    }

    fn before_delete(&self, _conditions: &mut tabledb::Record) -> tabledb::Result<()> {
        Err(Error::validation("posts are archived, not deleted"))
    }
}

#[tokio::test]
async fn model_hooks_wrap_writes() {
    let (mut db, mock) = mock_connection(DatabaseBackend::MySQL, "");
    db.register_schema(posts_schema());

    let calls = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let posts = tabledb::Model::for_table(&db, "posts")
        .unwrap()
        .with_hooks(AuthorStamp {
            calls: calls.clone(),
        });

    posts
        .insert(&mut db, &record! { "title" => "hello" })
        .await
        .unwrap();
    assert_eq!(
        mock.last().unwrap(),
        "INSERT INTO posts (title, author_id) VALUES ('hello', 42)"
    );
    assert_eq!(*calls.lock().unwrap(), vec!["insert ok=true"]);

    let err = posts
        .delete(&mut db, &record! { "id" => 1 })
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "E_VALIDATION");
    assert_eq!(mock.executed().len(), 1);
}

#[tokio::test]
async fn model_validates_typed_columns() {
    let (mut db, mock) = mock_connection(DatabaseBackend::MySQL, "");
    let schema = tabledb::Schema::builder("posts")
        .typed_column(
            tabledb::Column::new("id", tabledb::ColumnKind::BigInt)
                .length("20")
                .unwrap()
                .auto_increment()
                .primary_key(),
        )
        .typed_column(
            tabledb::Column::new("status", tabledb::ColumnKind::Enum)
                .enum_values(["draft", "publish"]),
        )
        .build()
        .unwrap();
    db.register_schema(schema);
    let posts = tabledb::Model::for_table(&db, "posts").unwrap();

    let err = posts
        .insert(&mut db, &record! { "status" => "bogus" })
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "E_VALIDATION");
    assert!(mock.executed().is_empty());

    posts
        .update_field(&mut db, "status", "publish", &record! { "id" => 3 })
        .await
        .unwrap();
    assert_eq!(
        mock.last().unwrap(),
        "UPDATE posts SET status = 'publish' WHERE id = 3"
    );
}
