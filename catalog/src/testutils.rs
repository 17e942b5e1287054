use crate::external::{EXTERNAL_ERROR_SENTINEL, ProductSource};
use crate::product::Product;
use crate::store::{ProductRepository, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory product table.
pub struct StaticRepository {
    rows: HashMap<i64, Product>,
}

impl StaticRepository {
    pub fn empty() -> Self {
        StaticRepository {
            rows: HashMap::new(),
        }
    }

    pub fn with(products: Vec<Product>) -> Self {
        StaticRepository {
            rows: products.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}

#[async_trait]
impl ProductRepository for StaticRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, StoreError> {
        Ok(self.rows.get(&id).cloned())
    }
}

/// Behaves like a database that cannot hand out connections.
pub struct FailingRepository;

#[async_trait]
impl ProductRepository for FailingRepository {
    async fn find_by_id(&self, _id: i64) -> Result<Option<Product>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

pub struct StaticSource {
    body: String,
}

impl StaticSource {
    pub fn ok(body: &str) -> Self {
        StaticSource { body: body.into() }
    }

    pub fn failing() -> Self {
        StaticSource {
            body: EXTERNAL_ERROR_SENTINEL.into(),
        }
    }
}

#[async_trait]
impl ProductSource for StaticSource {
    async fn fetch_product(&self, _id: i64) -> String {
        self.body.clone()
    }
}

/// Records how many times the external service was called.
pub struct CountingSource {
    body: String,
    calls: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(body: &str) -> Self {
        CountingSource {
            body: body.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl ProductSource for CountingSource {
    async fn fetch_product(&self, _id: i64) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.body.clone()
    }
}
