use crate::config::DatabaseConfig;
use crate::metrics_defs::{DB_LOOKUP_DURATION, DB_LOOKUP_MISS};
use crate::product::Product;
use async_trait::async_trait;
use shared::{counter, histogram};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Instant;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read access to product records.
///
/// A missing row is `Ok(None)`. Only failures to reach or query the store are
/// errors, and they are returned as-is without retrying.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, StoreError>;
}

pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        PgProductRepository { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, StoreError> {
        tracing::debug!("fetching product {id} from the database");
        let start = Instant::now();

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        histogram!(DB_LOOKUP_DURATION).record(start.elapsed().as_secs_f64());
        if product.is_none() {
            counter!(DB_LOOKUP_MISS).increment(1);
        }

        Ok(product)
    }
}

/// Builds the connection pool. The pool connects lazily, so an unreachable
/// database surfaces on the first query rather than here.
pub fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_lazy(&config.url)?;

    Ok(pool)
}
