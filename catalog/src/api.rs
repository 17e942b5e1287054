use crate::config::Listener as ListenerConfig;
use crate::service::ProductService;
use crate::store::StoreError;
use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tokio::net::TcpListener;

#[derive(thiserror::Error, Debug)]
pub enum CatalogApiError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub fn router(service: ProductService) -> Router {
    Router::new()
        .route("/products/fetch", get(fetch_from_external))
        .route("/products/db/{id}", get(fetch_from_db))
        .route("/products/combined/{id}", get(fetch_combined))
        .with_state(service)
}

pub async fn bind(listener: &ListenerConfig) -> Result<TcpListener, CatalogApiError> {
    let addr = format!("{}:{}", listener.host, listener.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("product API listening on {addr}");
    Ok(listener)
}

pub async fn serve(listener: TcpListener, service: ProductService) -> Result<(), CatalogApiError> {
    axum::serve(listener, router(service)).await?;
    Ok(())
}

#[derive(Deserialize, Debug)]
struct FetchParams {
    #[serde(rename = "productId")]
    product_id: i64,
}

async fn fetch_from_external(
    State(service): State<ProductService>,
    Query(params): Query<FetchParams>,
) -> String {
    tracing::info!("fetching product from external API for id {}", params.product_id);
    service.fetch_from_external(params.product_id).await
}

async fn fetch_from_db(
    State(service): State<ProductService>,
    Path(id): Path<i64>,
) -> Result<String, StoreError> {
    tracing::info!("fetching product from DB for id {id}");
    service.fetch_from_db(id).await
}

async fn fetch_combined(
    State(service): State<ProductService>,
    Path(id): Path<i64>,
) -> Result<String, StoreError> {
    tracing::info!("fetching combined product info for id {id}");
    service.fetch_combined(id).await
}

/// Body of every 500. The underlying database error is only logged.
pub const STORE_FAILURE_BODY: &str = "Product lookup failed";

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        tracing::error!("product lookup failed: {self}");
        (StatusCode::INTERNAL_SERVER_ERROR, STORE_FAILURE_BODY).into_response()
    }
}
