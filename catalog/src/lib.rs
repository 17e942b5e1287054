pub mod api;
pub mod config;
pub mod external;
pub mod fault_injection;
pub mod metrics_defs;
pub mod product;
pub mod schema;
pub mod service;
pub mod store;

#[cfg(test)]
mod testutils;

use external::HttpProductClient;
use service::ProductService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use store::{PgProductRepository, StoreError};

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] config::ValidationError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("could not build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("API server error: {0}")]
    Api(#[from] api::CatalogApiError),
}

/// Runs the product API, and the admin listener when one is configured,
/// until either of them fails.
pub async fn run(config: config::Config) -> Result<(), CatalogError> {
    config.validate()?;

    let pool = store::connect(&config.database)?;
    if config.database.run_migrations {
        schema::initialize(&pool).await?;
    }

    let client = HttpProductClient::new(&config.external_product_service)?;
    let service = ProductService::new(
        Arc::new(PgProductRepository::new(pool.clone())),
        Arc::new(client),
    );

    let listener = api::bind(&config.listener).await?;
    if config.fault_injection.startup_latency.is_some() {
        let fault_injection = config.fault_injection.clone();
        tokio::spawn(async move {
            fault_injection::apply_startup_latency(&fault_injection).await;
        });
    }

    let api_task = async { api::serve(listener, service).await.map_err(CatalogError::from) };

    match &config.admin_listener {
        Some(admin) => {
            let admin_service: AdminService<_, CatalogError> =
                AdminService::new(move || !pool.is_closed());
            let admin_task = run_http_service(&admin.host, admin.port, admin_service);
            tokio::try_join!(api_task, admin_task)?;
        }
        None => api_task.await?,
    }

    Ok(())
}
