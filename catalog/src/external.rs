use crate::config::ExternalServiceConfig;
use crate::metrics_defs::{EXTERNAL_FETCH_DURATION, EXTERNAL_FETCH_ERROR};
use async_trait::async_trait;
use shared::{counter, histogram};
use std::time::Instant;

/// Returned in place of a product body whenever the external service
/// cannot be reached or answers with an error.
pub const EXTERNAL_ERROR_SENTINEL: &str = "External product service error";

/// A remote source of product representations.
///
/// Implementations never fail: every transport or status error is reported
/// in-band as [`EXTERNAL_ERROR_SENTINEL`].
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn fetch_product(&self, id: i64) -> String;
}

#[derive(Clone)]
pub struct HttpProductClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProductClient {
    pub fn new(config: &ExternalServiceConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .http1_only()
            .build()?;

        let base_url = config.url.as_str().trim_end_matches('/').to_string();
        tracing::info!("external product service base URL resolved as {base_url}");

        Ok(HttpProductClient { client, base_url })
    }

    fn product_url(&self, id: i64) -> String {
        format!("{}/api/products/{id}", self.base_url)
    }

    async fn try_fetch(&self, id: i64) -> Result<String, reqwest::Error> {
        let response = self
            .client
            .get(self.product_url(id))
            .send()
            .await?
            .error_for_status()?;

        response.text().await
    }
}

#[async_trait]
impl ProductSource for HttpProductClient {
    async fn fetch_product(&self, id: i64) -> String {
        tracing::info!("calling external product service for id {id}");
        let start = Instant::now();
        let result = self.try_fetch(id).await;
        histogram!(EXTERNAL_FETCH_DURATION).record(start.elapsed().as_secs_f64());

        match result {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("failed to call external product API for id {id}: {e}");
                counter!(EXTERNAL_FETCH_ERROR).increment(1);
                EXTERNAL_ERROR_SENTINEL.to_string()
            }
        }
    }
}
