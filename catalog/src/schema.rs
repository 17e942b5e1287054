use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};

/// Creates the `products` table and loads the demo rows.
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn initialize(pool: &PgPool) -> Result<(), MigrateError> {
    tracing::info!("applying {} schema migrations", MIGRATOR.iter().count());
    MIGRATOR.run(pool).await?;
    tracing::info!("schema initialization completed");
    Ok(())
}
