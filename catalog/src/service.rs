use crate::external::ProductSource;
use crate::product::Product;
use crate::store::{ProductRepository, StoreError};
use std::sync::Arc;

/// Answers product lookups from the database, the external product service,
/// or both. Holds no state of its own, so clones are cheap and share the
/// underlying collaborators.
#[derive(Clone)]
pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
    source: Arc<dyn ProductSource>,
}

impl ProductService {
    pub fn new(repository: Arc<dyn ProductRepository>, source: Arc<dyn ProductSource>) -> Self {
        ProductService { repository, source }
    }

    pub async fn fetch_from_db(&self, id: i64) -> Result<String, StoreError> {
        let product = self.repository.find_by_id(id).await?;
        Ok(db_line(id, product.as_ref()))
    }

    pub async fn fetch_from_external(&self, id: i64) -> String {
        self.source.fetch_product(id).await
    }

    /// Both lookups always run: a missing row still fetches the external
    /// product, and a failed external call still reports the row.
    pub async fn fetch_combined(&self, id: i64) -> Result<String, StoreError> {
        tracing::debug!("combining product info for id {id} from the database and external service");

        let (product, external) =
            tokio::join!(self.repository.find_by_id(id), self.source.fetch_product(id));

        let db_info = db_line(id, product?.as_ref());
        Ok(format!("{db_info}\n[External] {external}"))
    }
}

fn db_line(id: i64, product: Option<&Product>) -> String {
    match product {
        Some(product) => format!("[DB] {} - ₹{}", product.name, product.display_price()),
        None => format!("Product with ID {id} not found in DB"),
    }
}
