use rusqlite::Connection;
use taskstore_core::db::{
    applied_migrations, apply_migrations, open_db, open_db_in_memory, open_db_with,
    DirectoryMigrations, EmbeddedMigrations, Migration, MigrationSource,
};
use taskstore_core::model::task::parse_timestamp;
use taskstore_core::DbError;

#[test]
fn open_db_in_memory_applies_bundled_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_table_exists(&conn, "tasks");
    assert_table_exists(&conn, "schema_migrations");
    assert_eq!(
        recorded_names(&conn),
        vec!["0001_create_tasks.sql", "0002_add_tenant_column.sql"]
    );
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");

    let first = open_db(&path).unwrap();
    let names_after_first = recorded_names(&first);
    drop(first);

    let mut second = open_db(&path).unwrap();
    assert_eq!(recorded_names(&second), names_after_first);

    let report = apply_migrations(&mut second, &EmbeddedMigrations::bundled()).unwrap();
    assert!(report.is_noop());
    assert_eq!(report.already_applied, names_after_first);
}

#[test]
fn recorded_migration_is_never_rerun_even_if_script_changes() {
    let mut conn = Connection::open_in_memory().unwrap();
    let original = vec![Migration::new("0001_a.sql", "CREATE TABLE a (x INTEGER);")];
    apply_migrations(&mut conn, &original).unwrap();

    let rewritten = vec![Migration::new("0001_a.sql", "CREATE TABLE b (x INTEGER);")];
    let report = apply_migrations(&mut conn, &rewritten).unwrap();

    assert!(report.is_noop());
    assert_table_exists(&conn, "a");
    assert_table_missing(&conn, "b");
}

#[test]
fn pending_migrations_run_in_lexicographic_order() {
    let mut conn = Connection::open_in_memory().unwrap();
    let source = vec![
        Migration::new("0010_index.sql", "CREATE INDEX idx_a_y ON a (y);"),
        Migration::new("0002_column.sql", "ALTER TABLE a ADD COLUMN y TEXT;"),
        Migration::new("0001_table.sql", "CREATE TABLE a (x INTEGER);"),
    ];

    let report = apply_migrations(&mut conn, &source).unwrap();

    assert_eq!(
        report.applied,
        vec!["0001_table.sql", "0002_column.sql", "0010_index.sql"]
    );
    assert_eq!(recorded_names(&conn), report.applied);
}

#[test]
fn only_new_migrations_run_on_later_startups() {
    let mut conn = Connection::open_in_memory().unwrap();
    let mut source = vec![Migration::new("0001_table.sql", "CREATE TABLE a (x INTEGER);")];
    apply_migrations(&mut conn, &source).unwrap();

    source.push(Migration::new("0002_seed.sql", "INSERT INTO a (x) VALUES (1);"));
    let report = apply_migrations(&mut conn, &source).unwrap();
    assert_eq!(report.applied, vec!["0002_seed.sql"]);
    assert_eq!(report.already_applied, vec!["0001_table.sql"]);

    let again = apply_migrations(&mut conn, &source).unwrap();
    assert!(again.is_noop());
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM a;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn failing_migration_is_rolled_back_and_not_recorded() {
    let mut conn = Connection::open_in_memory().unwrap();
    let broken = vec![
        Migration::new("0001_ok.sql", "CREATE TABLE a (x INTEGER);"),
        Migration::new(
            "0002_broken.sql",
            "CREATE TABLE c (x INTEGER); INSERT INTO missing_table VALUES (1);",
        ),
    ];

    let err = apply_migrations(&mut conn, &broken).unwrap_err();
    assert!(matches!(err, DbError::MigrationFailed { ref name, .. } if name == "0002_broken.sql"));
    assert_eq!(recorded_names(&conn), vec!["0001_ok.sql"]);
    assert_table_exists(&conn, "a");
    assert_table_missing(&conn, "c");

    let fixed = vec![
        Migration::new("0001_ok.sql", "CREATE TABLE a (x INTEGER);"),
        Migration::new("0002_broken.sql", "CREATE TABLE c (x INTEGER);"),
    ];
    let report = apply_migrations(&mut conn, &fixed).unwrap();
    assert_eq!(report.applied, vec!["0002_broken.sql"]);
    assert_table_exists(&conn, "c");
}

#[test]
fn duplicate_names_in_source_are_rejected_before_running_anything() {
    let mut conn = Connection::open_in_memory().unwrap();
    let source = vec![
        Migration::new("0001_a.sql", "CREATE TABLE a (x INTEGER);"),
        Migration::new("0001_a.sql", "CREATE TABLE b (x INTEGER);"),
    ];

    let err = apply_migrations(&mut conn, &source).unwrap_err();

    assert!(matches!(err, DbError::DuplicateMigration(ref name) if name == "0001_a.sql"));
    assert_table_missing(&conn, "a");
    assert!(recorded_names(&conn).is_empty());
}

#[test]
fn recorded_names_missing_from_source_are_ignored() {
    let mut conn = Connection::open_in_memory().unwrap();
    apply_migrations(
        &mut conn,
        &vec![Migration::new("0001_gone.sql", "CREATE TABLE gone (x INTEGER);")],
    )
    .unwrap();

    let report = apply_migrations(
        &mut conn,
        &vec![Migration::new("0002_new.sql", "CREATE TABLE fresh (x INTEGER);")],
    )
    .unwrap();

    assert_eq!(report.applied, vec!["0002_new.sql"]);
    assert_eq!(recorded_names(&conn), vec!["0001_gone.sql", "0002_new.sql"]);
}

#[test]
fn directory_migrations_drive_a_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let migrations_dir = dir.path().join("migrations");
    std::fs::create_dir(&migrations_dir).unwrap();
    for migration in EmbeddedMigrations::bundled().migrations().unwrap() {
        std::fs::write(migrations_dir.join(&migration.name), migration.sql).unwrap();
    }
    std::fs::write(migrations_dir.join("notes.txt"), "not a migration").unwrap();

    let path = dir.path().join("tasks.db");
    let source = DirectoryMigrations::new(&migrations_dir);
    let conn = open_db_with(&path, &source).unwrap();

    assert_table_exists(&conn, "tasks");
    assert_eq!(
        recorded_names(&conn),
        vec!["0001_create_tasks.sql", "0002_add_tenant_column.sql"]
    );
}

#[test]
fn applied_migrations_carry_sortable_timestamps() {
    let conn = open_db_in_memory().unwrap();

    let records = applied_migrations(&conn).unwrap();

    assert_eq!(records.len(), 2);
    for record in &records {
        assert!(parse_timestamp(&record.applied_at).is_some());
    }
    assert!(records[0].applied_at <= records[1].applied_at);
}

fn recorded_names(conn: &Connection) -> Vec<String> {
    applied_migrations(conn)
        .unwrap()
        .into_iter()
        .map(|record| record.name)
        .collect()
}

fn table_exists(conn: &Connection, table_name: &str) -> bool {
    conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table_name],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        == 1
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert!(table_exists(conn, table_name), "table {table_name} does not exist");
}

fn assert_table_missing(conn: &Connection, table_name: &str) {
    assert!(!table_exists(conn, table_name), "table {table_name} should not exist");
}
