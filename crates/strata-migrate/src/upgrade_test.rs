use super::*;
use crate::lock::with_schema_lock;
use crate::progress::ProgressRecorder;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use strata_db::{DbResult, DuckDbBackend, Row};
use tempfile::TempDir;

/// Counts every statement that may write.
struct CountingDb {
    inner: DuckDbBackend,
    writes: AtomicUsize,
}

#[async_trait]
impl Database for CountingDb {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(sql).await
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.execute_batch(sql).await
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>> {
        self.inner.query_rows(sql).await
    }

    async fn schema_exists(&self, schema: &str) -> DbResult<bool> {
        self.inner.schema_exists(schema).await
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.inner.relation_exists(name).await
    }

    fn db_type(&self) -> &'static str {
        "counting"
    }
}

fn v(n: u32) -> SchemaVersion {
    SchemaVersion::new(n).unwrap()
}

fn water() -> SchemaName {
    SchemaName::parse("water").unwrap()
}

fn upgrade_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, sql) in files {
        std::fs::write(dir.path().join(name), sql).unwrap();
    }
    dir
}

/// A database with `schema.pipe` installed at `version`.
async fn installed(schema: &str, version: u32) -> DuckDbBackend {
    let db = DuckDbBackend::in_memory().unwrap();
    let schema = SchemaName::parse(schema).unwrap();
    db.execute_batch(&format!("CREATE SCHEMA {schema}; CREATE TABLE {schema}.pipe (id INTEGER);"))
        .await
        .unwrap();
    metadata::record_version(&db, &schema, v(version), metadata::now())
        .await
        .unwrap();
    db
}

fn options(target: u32) -> UpgradeOptions {
    UpgradeOptions {
        schema: water(),
        target: v(target),
    }
}

async fn current(db: &dyn Database, schema: &SchemaName) -> Option<SchemaVersion> {
    metadata::current_version(db, schema).await.unwrap()
}

fn catalog(dir: &Path) -> VersionCatalog {
    VersionCatalog::new(dir)
}

#[test]
fn test_step_script_appends_version_update() {
    let at = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(13, 0, 0)
        .unwrap();
    let expected_update = "UPDATE water.metadata SET version = '7', \
        version_date = TIMESTAMP '2024-05-01 13:00:00' WHERE status = 1;\n";

    assert_eq!(
        step_script("SELECT 1;\n\n", &water(), v(7), at),
        format!("SELECT 1;\n{expected_update}")
    );
    assert_eq!(
        step_script("SELECT 1", &water(), v(7), at),
        format!("SELECT 1\n;\n{expected_update}")
    );
}

#[tokio::test]
async fn test_plan_selects_pending_between_current_and_target() {
    let dir = upgrade_dir(&[
        ("upgrade_to_3.sql", "SELECT 3;"),
        ("upgrade_to_5.sql", "SELECT 5;"),
        ("upgrade_to_7.sql", "SELECT 7;"),
        ("upgrade_to_9.sql", "SELECT 9;"),
    ]);
    let db = installed("water", 4).await;
    let catalog = catalog(dir.path());
    let upgrader = Upgrader::new(&db, &catalog, water(), "strata_lock");

    let plan = upgrader.plan(&options(7)).await.unwrap();
    assert_eq!(plan.current, v(4));
    let pending: Vec<u32> = plan.pending.iter().map(|m| m.target_version.get()).collect();
    assert_eq!(pending, vec![5, 7]);
}

#[tokio::test]
async fn test_applies_pending_steps_in_order() {
    let dir = upgrade_dir(&[
        ("upgrade_to_2.sql", "ALTER TABLE water.pipe ADD COLUMN diameter INTEGER;"),
        ("upgrade_to_3.sql", "UPDATE water.pipe SET diameter = 100;\nCREATE TABLE water.valve (id INTEGER);"),
    ]);
    let db = installed("water", 1).await;
    let catalog = catalog(dir.path());
    let recorder = ProgressRecorder::new();

    let report = Upgrader::new(&db, &catalog, water(), "strata_lock")
        .with_progress(&recorder)
        .upgrade(&options(3))
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.version, Some(v(3)));
    assert_eq!(report.steps_applied, 2);
    assert_eq!(current(&db, &water()).await, Some(v(3)));
    assert_eq!(metadata::active_record_count(&db, &water()).await.unwrap(), 1);
    assert!(db.relation_exists("water.valve").await.unwrap());
    assert_eq!(
        recorder.names_with(StepOutcome::Success),
        vec!["upgrade_to_2.sql", "upgrade_to_3.sql"]
    );
}

#[tokio::test]
async fn test_up_to_date_executes_no_statement() {
    let dir = upgrade_dir(&[("upgrade_to_2.sql", "CREATE TABLE water.valve (id INTEGER);")]);
    let db = CountingDb {
        inner: installed("water", 2).await,
        writes: AtomicUsize::new(0),
    };
    let catalog = catalog(dir.path());

    let report = Upgrader::new(&db, &catalog, water(), "strata_lock")
        .upgrade(&options(2))
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.message, UP_TO_DATE);
    assert_eq!(report.steps_applied, 0);
    assert_eq!(db.writes.load(Ordering::SeqCst), 0);
    assert!(!db.inner.relation_exists("water.valve").await.unwrap());
}

#[tokio::test]
async fn test_missing_install_is_precondition() {
    let dir = upgrade_dir(&[("upgrade_to_2.sql", "SELECT 1;")]);
    let db = CountingDb {
        inner: DuckDbBackend::in_memory().unwrap(),
        writes: AtomicUsize::new(0),
    };
    let catalog = catalog(dir.path());

    let err = Upgrader::new(&db, &catalog, water(), "strata_lock")
        .upgrade(&options(2))
        .await
        .unwrap_err();

    assert!(matches!(err, MigrateError::Precondition(_)), "got {err}");
    assert_eq!(db.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_newer_install_is_precondition() {
    let dir = upgrade_dir(&[]);
    let db = installed("water", 5).await;
    let catalog = catalog(dir.path());

    let err = Upgrader::new(&db, &catalog, water(), "strata_lock")
        .upgrade(&options(3))
        .await
        .unwrap_err();

    assert!(matches!(err, MigrateError::Precondition(_)), "got {err}");
    assert_eq!(current(&db, &water()).await, Some(v(5)));
}

#[tokio::test]
async fn test_failing_step_keeps_last_completed_version() {
    let dir = upgrade_dir(&[
        ("upgrade_to_2.sql", "CREATE TABLE water.valve (id INTEGER);"),
        (
            "upgrade_to_3.sql",
            "CREATE TABLE water.half (id INTEGER);\nINSERT INTO water.missing VALUES (1);",
        ),
        ("upgrade_to_4.sql", "CREATE TABLE water.hydrant (id INTEGER);"),
    ]);
    let db = installed("water", 1).await;
    let catalog = catalog(dir.path());
    let recorder = ProgressRecorder::new();

    let err = Upgrader::new(&db, &catalog, water(), "strata_lock")
        .with_progress(&recorder)
        .upgrade(&options(4))
        .await
        .unwrap_err();

    match &err {
        MigrateError::Upgrade { file, .. } => assert_eq!(file, "upgrade_to_3.sql"),
        other => panic!("expected Upgrade error, got {other:?}"),
    }
    assert_eq!(current(&db, &water()).await, Some(v(2)));
    assert!(db.relation_exists("water.valve").await.unwrap());
    // The failed step is rolled back as a whole and nothing after it runs
    assert!(!db.relation_exists("water.half").await.unwrap());
    assert!(!db.relation_exists("water.hydrant").await.unwrap());
    assert_eq!(recorder.names_with(StepOutcome::Failed), vec!["upgrade_to_3.sql"]);

    // The lock is released, so a fixed file can be retried
    std::fs::write(
        dir.path().join("upgrade_to_3.sql"),
        "CREATE TABLE water.half (id INTEGER);",
    )
    .unwrap();
    let report = Upgrader::new(&db, &catalog, water(), "strata_lock")
        .upgrade(&options(4))
        .await
        .unwrap();
    assert_eq!(report.steps_applied, 2);
    assert_eq!(current(&db, &water()).await, Some(v(4)));
}

#[tokio::test]
async fn test_blank_file_is_skipped() {
    let dir = upgrade_dir(&[
        ("upgrade_to_2.sql", "\n  \n"),
        ("upgrade_to_3.sql", "CREATE TABLE water.valve (id INTEGER);"),
    ]);
    let db = installed("water", 1).await;
    let catalog = catalog(dir.path());
    let recorder = ProgressRecorder::new();

    let report = Upgrader::new(&db, &catalog, water(), "strata_lock")
        .with_progress(&recorder)
        .upgrade(&options(3))
        .await
        .unwrap();

    assert_eq!(report.steps_applied, 1);
    assert_eq!(recorder.names_with(StepOutcome::Skipped), vec!["upgrade_to_2.sql"]);
    assert_eq!(current(&db, &water()).await, Some(v(3)));
}

#[tokio::test]
async fn test_finalize_records_target_past_last_file() {
    let dir = upgrade_dir(&[("upgrade_to_2.sql", "CREATE TABLE water.valve (id INTEGER);")]);
    let db = installed("water", 1).await;
    let catalog = catalog(dir.path());

    let report = Upgrader::new(&db, &catalog, water(), "strata_lock")
        .upgrade(&options(3))
        .await
        .unwrap();

    assert_eq!(report.steps_applied, 1);
    assert_eq!(report.version, Some(v(3)));
    assert_eq!(current(&db, &water()).await, Some(v(3)));
}

#[tokio::test]
async fn test_files_above_target_are_not_applied() {
    let dir = upgrade_dir(&[
        ("upgrade_to_2.sql", "CREATE TABLE water.valve (id INTEGER);"),
        ("upgrade_to_3.sql", "CREATE TABLE water.hydrant (id INTEGER);"),
    ]);
    let db = installed("water", 1).await;
    let catalog = catalog(dir.path());

    Upgrader::new(&db, &catalog, water(), "strata_lock")
        .upgrade(&options(2))
        .await
        .unwrap();

    assert_eq!(current(&db, &water()).await, Some(v(2)));
    assert!(!db.relation_exists("water.hydrant").await.unwrap());
}

#[tokio::test]
async fn test_upgrade_under_custom_schema() {
    let dir = upgrade_dir(&[(
        "upgrade_to_2.sql",
        "ALTER TABLE water.pipe ADD COLUMN diameter INTEGER;\nCREATE SCHEMA water_extra;",
    )]);
    let db = installed("custom", 1).await;
    let catalog = catalog(dir.path());
    let custom = SchemaName::parse("custom").unwrap();

    Upgrader::new(&db, &catalog, water(), "strata_lock")
        .upgrade(&UpgradeOptions {
            schema: custom.clone(),
            target: v(2),
        })
        .await
        .unwrap();

    assert_eq!(current(&db, &custom).await, Some(v(2)));
    assert!(db.schema_exists("custom_extra").await.unwrap());
    assert!(!db.schema_exists("water_extra").await.unwrap());
    let rows = db
        .query_rows(
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE table_schema = 'custom' AND table_name = 'pipe' AND column_name = 'diameter'",
        )
        .await
        .unwrap();
    assert_eq!(rows[0][0].as_deref(), Some("1"));
}

#[tokio::test]
async fn test_locked_schema_is_rejected() {
    let dir = upgrade_dir(&[("upgrade_to_2.sql", "CREATE TABLE water.valve (id INTEGER);")]);
    let db = installed("water", 1).await;
    let catalog = catalog(dir.path());

    let result = with_schema_lock(&db, "strata_lock", "water", async {
        Upgrader::new(&db, &catalog, water(), "strata_lock")
            .upgrade(&options(2))
            .await
    })
    .await;

    assert!(matches!(result, Err(MigrateError::Locked { .. })));
    assert_eq!(current(&db, &water()).await, Some(v(1)));
}
