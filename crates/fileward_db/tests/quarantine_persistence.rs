use fileward_db::{FilewardDb, SqlIdent};
use tempfile::TempDir;

fn table() -> SqlIdent {
    SqlIdent::parse("quarantined_files").expect("valid table name")
}

#[tokio::test]
async fn committed_records_survive_reopen() {
    let tmp = TempDir::new().expect("create temp dir");
    let db_path = tmp.path().join("records.sqlite3");

    let db = FilewardDb::open_path(&db_path).await.expect("open db");
    db.quarantine_ensure_table(&table()).await.expect("ensure table");

    let mut tx = db.quarantine_begin(&table()).await.expect("begin");
    let id = tx.append("orphan.csv", 1_000).await.expect("append");
    tx.commit().await.expect("commit");
    db.close().await;

    let reopened = FilewardDb::open_existing(&db_path).await.expect("reopen");
    let rows = reopened.quarantine_list_all(&table()).await.expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, id);
    assert_eq!(rows[0].file_name, "orphan.csv");
    assert_eq!(rows[0].quarantined_at, 1_000);
}

#[tokio::test]
async fn rolled_back_deletes_keep_records() {
    let tmp = TempDir::new().expect("create temp dir");
    let db = FilewardDb::open_path(tmp.path().join("records.sqlite3"))
        .await
        .expect("open db");
    db.quarantine_ensure_table(&table()).await.expect("ensure table");

    let mut tx = db.quarantine_begin(&table()).await.expect("begin");
    let first = tx.append("a.bin", 10).await.expect("append a");
    let second = tx.append("b.bin", 20).await.expect("append b");
    tx.commit().await.expect("commit");

    let mut tx = db.quarantine_begin(&table()).await.expect("begin delete");
    assert!(tx.delete(first).await.expect("delete a"));
    assert!(tx.delete(second).await.expect("delete b"));
    tx.rollback().await.expect("rollback");

    assert_eq!(db.quarantine_count(&table()).await.expect("count"), 2);
}

#[tokio::test]
async fn missing_quarantine_table_is_an_error() {
    let db = FilewardDb::open_memory().await.expect("open db");

    let result = db.quarantine_list_older_than(&table(), i64::MAX).await;
    assert!(result.is_err());
}
