//! Live-database checks. Set `STEPLIX_DB_HOST` (and the other `STEPLIX_DB_*`
//! variables as needed) to run them; otherwise every test is skipped.

use std::time::Duration;
use steplix::{Database, DatabaseConfig, GenericClient, OrmError, OrmResult, RowExt};

fn env_config() -> Option<DatabaseConfig> {
    std::env::var("STEPLIX_DB_HOST").ok()?;
    Some(DatabaseConfig::from_env().expect("invalid STEPLIX_DB_* configuration"))
}

async fn try_connect_with(pool_size: Option<usize>) -> Option<Database> {
    let mut config = env_config()?;
    if let Some(size) = pool_size {
        config = config.pool(size);
    }
    let db = Database::connect(config)
        .await
        .expect("Failed to connect with STEPLIX_DB_* settings");
    Some(db)
}

async fn try_connect(use_pool: bool) -> Option<Database> {
    try_connect_with(use_pool.then_some(4)).await
}

async fn count_rows(db: &Database, table: &str) -> i64 {
    let row = db
        .query_one(&format!("SELECT COUNT(*) AS total FROM {table}"), &[])
        .await
        .unwrap();
    row.try_get_column::<i64>("total").unwrap()
}

async fn in_transaction(db: &Database) -> bool {
    // A transaction that already wrote has an xid; a fresh single-statement
    // transaction does not.
    let row = db
        .query_one(
            "SELECT txid_current_if_assigned() IS NOT NULL AS open",
            &[],
        )
        .await
        .unwrap();
    row.try_get_column::<bool>("open").unwrap()
}

fn table_name(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

#[tokio::test]
async fn ping_and_alive() {
    let Some(db) = try_connect(false).await else {
        eprintln!("STEPLIX_DB_HOST not set; skipping");
        return;
    };

    let table = table_name("steplix_alive");
    db.batch_execute(&format!("CREATE TABLE {table} (id INT)"))
        .await
        .unwrap();

    assert!(db.ping().await.unwrap());
    assert!(db.is_alive().await.unwrap());

    db.batch_execute(&format!("DROP TABLE {table}")).await.unwrap();
    db.end().await.unwrap();
}

#[tokio::test]
async fn empty_database_is_not_alive() {
    let Some(config) = env_config() else {
        eprintln!("STEPLIX_DB_HOST not set; skipping");
        return;
    };
    let admin = Database::connect(config.clone()).await.unwrap();
    let name = table_name("steplix_empty");
    if let Err(err) = admin.batch_execute(&format!("CREATE DATABASE {name}")).await {
        eprintln!("cannot create a database ({err}); skipping");
        admin.end().await.unwrap();
        return;
    }

    let empty = Database::connect(DatabaseConfig {
        database: name.clone(),
        ..config
    })
    .await
    .unwrap();
    assert!(empty.ping().await.unwrap());
    assert!(!empty.is_alive().await.unwrap());
    empty.end().await.unwrap();

    admin
        .batch_execute(&format!("DROP DATABASE {name}"))
        .await
        .unwrap();
    admin.end().await.unwrap();
}

#[tokio::test]
async fn end_closes_and_reconnect_reopens() {
    let Some(db) = try_connect(true).await else {
        eprintln!("STEPLIX_DB_HOST not set; skipping");
        return;
    };

    db.end().await.unwrap();
    assert!(!db.is_connected().await);

    let err = db.query("SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, OrmError::Connection(_)));
    assert!(matches!(db.end().await, Err(OrmError::Connection(_))));

    db.reconnect().await.unwrap();
    assert!(db.ping().await.unwrap());
    db.end().await.unwrap();
}

#[tokio::test]
async fn transaction_commits_on_ok() {
    let Some(db) = try_connect(true).await else {
        eprintln!("STEPLIX_DB_HOST not set; skipping");
        return;
    };
    let table = table_name("steplix_tx_commit");
    db.batch_execute(&format!("CREATE TABLE {table} (id BIGSERIAL PRIMARY KEY, n INT NOT NULL)"))
        .await
        .unwrap();

    let inserted = db
        .transaction(|conn| {
            let table = table.clone();
            async move {
                conn.execute(&format!("INSERT INTO {table} (n) VALUES (1), (2)"), &[])
                    .await
            }
        })
        .await
        .unwrap();
    assert_eq!(inserted, 2);

    let row = db
        .query_one(&format!("SELECT COUNT(*) AS total FROM {table}"), &[])
        .await
        .unwrap();
    assert_eq!(row.try_get_column::<i64>("total").unwrap(), 2);

    db.batch_execute(&format!("DROP TABLE {table}")).await.unwrap();
    db.end().await.unwrap();
}

#[tokio::test]
async fn transaction_rolls_back_on_err() {
    let Some(db) = try_connect(true).await else {
        eprintln!("STEPLIX_DB_HOST not set; skipping");
        return;
    };
    let table = table_name("steplix_tx_rollback");
    db.batch_execute(&format!("CREATE TABLE {table} (id BIGSERIAL PRIMARY KEY, n INT NOT NULL)"))
        .await
        .unwrap();

    let result: OrmResult<()> = db
        .transaction(|conn| {
            let table = table.clone();
            async move {
                conn.execute(&format!("INSERT INTO {table} (n) VALUES (1)"), &[])
                    .await?;
                Err(OrmError::Other("abort".into()))
            }
        })
        .await;
    assert!(matches!(result, Err(OrmError::Other(ref msg)) if msg == "abort"));

    let row = db
        .query_one(&format!("SELECT COUNT(*) AS total FROM {table}"), &[])
        .await
        .unwrap();
    assert_eq!(row.try_get_column::<i64>("total").unwrap(), 0);

    db.batch_execute(&format!("DROP TABLE {table}")).await.unwrap();
    db.end().await.unwrap();
}

#[tokio::test]
async fn unique_violation_is_classified() {
    let Some(db) = try_connect(false).await else {
        eprintln!("STEPLIX_DB_HOST not set; skipping");
        return;
    };
    let table = table_name("steplix_unique");
    db.batch_execute(&format!("CREATE TABLE {table} (email TEXT UNIQUE)"))
        .await
        .unwrap();

    let insert = format!("INSERT INTO {table} (email) VALUES ('a@b.c')");
    db.execute(&insert, &[]).await.unwrap();
    let err = db.execute(&insert, &[]).await.unwrap_err();
    assert!(
        matches!(err, OrmError::UniqueViolation(_)),
        "unexpected error: {err}"
    );

    db.batch_execute(&format!("DROP TABLE {table}")).await.unwrap();
    db.end().await.unwrap();
}

async fn abandon_transaction(db: &Database, table: &str) {
    let table = table.to_string();
    let outcome = tokio::time::timeout(
        Duration::from_millis(200),
        db.transaction(|conn| async move {
            conn.execute(&format!("INSERT INTO {table} (n) VALUES (1)"), &[])
                .await?;
            std::future::pending::<()>().await;
            Ok(())
        }),
    )
    .await;
    assert!(outcome.is_err(), "transaction should have timed out");
}

#[tokio::test]
async fn abandoned_transaction_on_shared_client_is_rolled_back() {
    let Some(db) = try_connect(false).await else {
        eprintln!("STEPLIX_DB_HOST not set; skipping");
        return;
    };
    let table = table_name("steplix_tx_abandoned");
    db.batch_execute(&format!("CREATE TABLE {table} (id BIGSERIAL PRIMARY KEY, n INT NOT NULL)"))
        .await
        .unwrap();

    abandon_transaction(&db, &table).await;

    assert!(!in_transaction(&db).await);
    assert_eq!(count_rows(&db, &table).await, 0);

    db.batch_execute(&format!("DROP TABLE {table}")).await.unwrap();
    db.end().await.unwrap();
}

#[tokio::test]
async fn abandoned_transaction_on_pooled_connection_is_rolled_back() {
    // One connection, so the next statement reuses the abandoned one.
    let Some(db) = try_connect_with(Some(1)).await else {
        eprintln!("STEPLIX_DB_HOST not set; skipping");
        return;
    };
    let table = table_name("steplix_tx_abandoned_pool");
    db.batch_execute(&format!("CREATE TABLE {table} (id BIGSERIAL PRIMARY KEY, n INT NOT NULL)"))
        .await
        .unwrap();

    abandon_transaction(&db, &table).await;

    assert!(!in_transaction(&db).await);
    assert_eq!(count_rows(&db, &table).await, 0);

    db.batch_execute(&format!("DROP TABLE {table}")).await.unwrap();
    db.end().await.unwrap();
}
