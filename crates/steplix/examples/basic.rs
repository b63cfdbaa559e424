//! Basic usage example for steplix
//!
//! Run with: cargo run --example basic -p steplix
//!
//! Connection settings come from `STEPLIX_DB_*` variables (a `.env` file is
//! loaded first), e.g.:
//! STEPLIX_DB_HOST=localhost
//! STEPLIX_DB_NAME=steplix_example
//! STEPLIX_DB_PASSWORD=postgres
//!
//! Set `LOG_DATABASE=1` and `RUST_LOG=steplix.sql=debug` to print the SQL.

use steplix::{
    Database, DatabaseConfig, FromRow, GenericClient, Model, ModelOptions, OrmError, Record,
    StatementOptions, literal, map,
};

#[derive(Debug, FromRow, Record)]
#[orm(table = "users")]
#[allow(dead_code)]
struct User {
    id: i64,
    username: String,
    email: Option<String>,
    active: bool,
}

#[tokio::main]
async fn main() -> Result<(), OrmError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = DatabaseConfig::from_env()?;
    let db = Database::connect(config).await?;

    println!("alive: {}", db.is_alive().await?);

    db.batch_execute(
        "CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            username TEXT NOT NULL,
            email TEXT,
            active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ
        )",
    )
    .await?;
    db.batch_execute("DELETE FROM users").await?;

    let users = Model::<User>::of(db.clone());

    // ============================================
    // Create
    // ============================================
    println!("=== create ===");
    let alice = users
        .create(
            &map! {
                "username" => "alice",
                "email" => "alice@example.com",
                "created_at" => literal("NOW()"),
            },
            ModelOptions::new(),
        )
        .await?
        .ok_or_else(|| OrmError::not_found("inserted user"))?;
    println!("{alice:?}");

    let inserted = users
        .create_many(
            &[
                map! { "username" => "bob", "email" => Option::<&str>::None },
                map! { "username" => "carol", "email" => "carol@example.com" },
            ],
            ModelOptions::new(),
        )
        .await?;
    println!("inserted {inserted} more");

    // ============================================
    // Read
    // ============================================
    println!("\n=== find ===");
    let with_email = users
        .find(ModelOptions::new().query(
            StatementOptions::new()
                .filter(map! { "email" => map! { "IS NOT" => steplix::Value::Null } })
                .order_by("username"),
        ))
        .await?;
    for user in &with_email {
        println!("{user:?}");
    }

    let total = users.count(ModelOptions::new()).await?;
    println!("total users: {total}");

    // ============================================
    // Update / delete inside a transaction
    // ============================================
    println!("\n=== transaction ===");
    let removed = users
        .transaction(|conn| {
            let scoped = users.on(conn);
            async move {
                scoped
                    .update_raw(&map! { "active" => false }, alice.id, ModelOptions::new())
                    .await?;
                scoped
                    .destroy_by("username", "bob", ModelOptions::new())
                    .await
            }
        })
        .await?;
    println!("removed {removed}");

    let inactive = users
        .exist(ModelOptions::new().filter(map! { "active" => false }))
        .await?;
    println!("any inactive: {inactive}");

    db.end().await?;
    Ok(())
}
