//! Latency injection through a Toxiproxy instance sitting between the service
//! and its database. Used by integration tests and the `retail latency` tool
//! to check how lookups behave on a slow store.
use crate::config::FaultInjectionConfig;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(thiserror::Error, Debug)]
pub enum FaultInjectionError {
    #[error("toxiproxy request failed: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("toxiproxy answered {status}: {message}")]
    Api { status: StatusCode, message: String },
}

#[derive(Serialize)]
struct NewProxy<'a> {
    name: &'a str,
    listen: &'a str,
    upstream: &'a str,
    enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Toxic {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub stream: String,
    pub toxicity: f64,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

impl Toxic {
    /// Delays every response chunk travelling from the upstream to the client.
    pub fn downstream_latency(name: &str, latency_ms: u64) -> Self {
        Toxic {
            name: name.to_string(),
            kind: "latency".into(),
            stream: "downstream".into(),
            toxicity: 1.0,
            attributes: serde_json::json!({ "latency": latency_ms, "jitter": 0 }),
        }
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, FaultInjectionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(FaultInjectionError::Api { status, message })
}

#[derive(Clone)]
pub struct ToxiproxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl ToxiproxyClient {
    pub fn new(base_url: &str) -> Self {
        ToxiproxyClient {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Creates a proxy forwarding `listen` to `upstream`. A proxy that already
    /// exists under the same name is reused.
    pub async fn create_proxy(
        &self,
        name: &str,
        listen: &str,
        upstream: &str,
    ) -> Result<ProxyHandle, FaultInjectionError> {
        let response = self
            .client
            .post(format!("{}/proxies", self.base_url))
            .json(&NewProxy {
                name,
                listen,
                upstream,
                enabled: true,
            })
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            tracing::info!("toxiproxy proxy {name} already exists, reusing it");
        } else {
            check(response).await?;
            tracing::info!("created toxiproxy proxy {name}: {listen} -> {upstream}");
        }

        Ok(self.proxy(name))
    }

    /// Handle to a proxy that is known to exist.
    pub fn proxy(&self, name: &str) -> ProxyHandle {
        ProxyHandle {
            client: self.client.clone(),
            toxics_url: format!("{}/proxies/{name}/toxics", self.base_url),
            name: name.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ProxyHandle {
    client: reqwest::Client,
    toxics_url: String,
    name: String,
}

impl ProxyHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn add_toxic(&self, toxic: &Toxic) -> Result<(), FaultInjectionError> {
        let response = self.client.post(&self.toxics_url).json(toxic).send().await?;
        check(response).await?;
        Ok(())
    }

    pub async fn remove_toxic(&self, toxic_name: &str) -> Result<(), FaultInjectionError> {
        let response = self
            .client
            .delete(format!("{}/{toxic_name}", self.toxics_url))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn list_toxics(&self) -> Result<Vec<Toxic>, FaultInjectionError> {
        let response = self.client.get(&self.toxics_url).send().await?;
        Ok(check(response).await?.json::<Vec<Toxic>>().await?)
    }
}

/// Adds and removes a single latency toxic on one proxy, remembering whether
/// it is currently applied.
pub struct LatencyController {
    proxy: ProxyHandle,
    toxic_name: String,
    default_latency_ms: u64,
    active: AtomicBool,
}

impl LatencyController {
    pub fn new(proxy: ProxyHandle, default_latency_ms: u64) -> Self {
        let toxic_name = format!("{}-latency", proxy.name());
        LatencyController {
            proxy,
            toxic_name,
            default_latency_ms,
            active: AtomicBool::new(false),
        }
    }

    /// Replaces any latency applied by this controller with `latency_ms`.
    pub async fn add_latency(&self, latency_ms: u64) -> Result<(), FaultInjectionError> {
        self.remove_latency().await;

        self.proxy
            .add_toxic(&Toxic::downstream_latency(&self.toxic_name, latency_ms))
            .await?;
        self.active.store(true, Ordering::SeqCst);
        tracing::info!("added {latency_ms}ms latency to proxy {}", self.proxy.name());
        Ok(())
    }

    pub async fn add_configured_latency(&self) -> Result<(), FaultInjectionError> {
        self.add_latency(self.default_latency_ms).await
    }

    /// Never fails: if toxiproxy refuses the removal the toxic is assumed gone.
    pub async fn remove_latency(&self) {
        if !self.active.load(Ordering::SeqCst) {
            return;
        }

        match self.proxy.remove_toxic(&self.toxic_name).await {
            Ok(()) => tracing::info!("removed latency from proxy {}", self.proxy.name()),
            Err(e) => tracing::warn!("could not remove latency (may not exist): {e}"),
        }
        self.active.store(false, Ordering::SeqCst);
    }

    /// Picks up a latency toxic left behind by an earlier controller on the
    /// same proxy, so that it can be replaced or removed.
    pub async fn sync(&self) -> Result<bool, FaultInjectionError> {
        let active = self
            .proxy
            .list_toxics()
            .await?
            .iter()
            .any(|toxic| toxic.name == self.toxic_name);
        self.active.store(active, Ordering::SeqCst);
        Ok(active)
    }

    pub fn is_latency_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub async fn list_active_toxics(&self) -> Result<Vec<Toxic>, FaultInjectionError> {
        let toxics = self.proxy.list_toxics().await?;
        tracing::info!("active toxics count: {}", toxics.len());
        for toxic in &toxics {
            tracing::info!("  - toxic name: {}", toxic.name);
        }
        Ok(toxics)
    }
}

/// Adds the configured latency to the startup proxy, unless it is already
/// there. Returns whether latency is active afterwards. Failures are logged
/// and never stop the service.
pub async fn apply_startup_latency(config: &FaultInjectionConfig) -> bool {
    let Some(startup) = &config.startup_latency else {
        return false;
    };

    let proxy = ToxiproxyClient::new(&startup.toxiproxy_url).proxy(&startup.proxy);
    let controller = LatencyController::new(proxy, config.default_latency_ms);

    let result = async {
        if controller.sync().await? {
            tracing::info!("database latency already active on {}, skipping", startup.proxy);
        } else {
            controller.add_configured_latency().await?;
            tracing::info!(
                "startup complete, {}ms database latency now active",
                config.default_latency_ms
            );
        }
        Ok::<(), FaultInjectionError>(())
    }
    .await;

    if let Err(e) = result {
        tracing::error!("failed to add database latency after startup: {e}");
    }
    controller.is_latency_active()
}
