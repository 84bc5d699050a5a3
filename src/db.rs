use anyhow::Result;
use sea_orm::{Database, DatabaseConnection};

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let conn = Database::connect(database_url).await?;
    Ok(conn)
}

/// Applies the SQL files under `migrations/` through the connection's
/// underlying sqlx pool.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(conn.get_postgres_connection_pool())
        .await?;
    tracing::info!("schema is up to date");
    Ok(())
}
