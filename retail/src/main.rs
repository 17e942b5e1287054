mod config;
mod logging;

use catalog::config::FaultInjectionConfig;
use catalog::fault_injection::{FaultInjectionError, LatencyController, ToxiproxyClient};
use clap::{Parser, Subcommand};
use config::{Config, ConfigError, MetricsConfig};
use metrics_exporter_statsd::{StatsdBuilder, StatsdError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "retail", about = "Retail demo product service")]
enum CliCommand {
    /// Run the product API
    Serve {
        #[arg(long, default_value = "retail.yaml")]
        config: PathBuf,
    },
    /// Inject database latency through a Toxiproxy proxy
    Latency {
        /// Supplies the default delay and logging settings
        #[arg(long, default_value = "retail.yaml")]
        config: PathBuf,
        #[arg(long, default_value = "http://localhost:8474")]
        toxiproxy_url: String,
        #[arg(long, default_value = "postgresql")]
        proxy: String,
        #[command(subcommand)]
        action: LatencyAction,
    },
}

#[derive(Subcommand)]
enum LatencyAction {
    /// Create the proxy, or reuse it if it already exists
    Create {
        #[arg(long, default_value = "0.0.0.0:8666")]
        listen: String,
        #[arg(long)]
        upstream: String,
    },
    /// Replace any existing latency with a new delay
    Add {
        /// Delay in milliseconds, `fault_injection.default_latency_ms` if omitted
        #[arg(long)]
        ms: Option<u64>,
    },
    Remove,
    List,
}

#[derive(thiserror::Error, Debug)]
enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("could not create statsd exporter: {0}")]
    Statsd(#[from] StatsdError),
    #[error("a metrics recorder is already installed")]
    RecorderInstalled,
    #[error("{0}")]
    Catalog(#[from] catalog::CatalogError),
    #[error("{0}")]
    FaultInjection(#[from] FaultInjectionError),
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    let result = match cli {
        CliCommand::Serve { config } => serve(&config),
        CliCommand::Latency {
            config,
            toxiproxy_url,
            proxy,
            action,
        } => latency(&config, &toxiproxy_url, &proxy, action),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("retail: {e}");
            ExitCode::FAILURE
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, AppError> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn serve(path: &Path) -> Result<(), AppError> {
    let config = Config::from_file(path)?;
    let _sentry = logging::init(&config.common.logging);
    tracing::info!("starting retail product service");

    if let Some(metrics) = &config.common.metrics {
        init_metrics(metrics)?;
    }

    runtime()?.block_on(catalog::run(config.catalog))?;
    Ok(())
}

fn init_metrics(config: &MetricsConfig) -> Result<(), AppError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(&config.prefix))?;
    metrics::set_global_recorder(recorder).map_err(|_| AppError::RecorderInstalled)?;
    shared::metrics_defs::describe_all(catalog::metrics_defs::ALL_METRICS);

    tracing::info!(
        "sending metrics to statsd at {}:{}",
        config.statsd_host,
        config.statsd_port
    );
    Ok(())
}

fn latency(
    path: &Path,
    toxiproxy_url: &str,
    proxy: &str,
    action: LatencyAction,
) -> Result<(), AppError> {
    let config = Config::from_file(path)?;
    let _sentry = logging::init(&config.common.logging);

    runtime()?.block_on(run_latency(
        toxiproxy_url,
        proxy,
        &config.catalog.fault_injection,
        action,
    ))
}

async fn run_latency(
    toxiproxy_url: &str,
    proxy: &str,
    fault_injection: &FaultInjectionConfig,
    action: LatencyAction,
) -> Result<(), AppError> {
    let client = ToxiproxyClient::new(toxiproxy_url);
    let controller = LatencyController::new(client.proxy(proxy), fault_injection.default_latency_ms);

    match action {
        LatencyAction::Create { listen, upstream } => {
            client.create_proxy(proxy, &listen, &upstream).await?;
        }
        LatencyAction::Add { ms } => {
            controller.sync().await?;
            match ms {
                Some(ms) => controller.add_latency(ms).await?,
                None => controller.add_configured_latency().await?,
            }
        }
        LatencyAction::Remove => {
            controller.sync().await?;
            controller.remove_latency().await;
        }
        LatencyAction::List => {
            controller.list_active_toxics().await?;
        }
    }
    Ok(())
}
