use anyhow::{Context, anyhow, bail};
use mimalloc::MiMalloc;
use sonobi_adapter::app::config::AdapterConfig;
use sonobi_adapter::app::dispatch::run_callouts;
use sonobi_adapter::core::demand::client::DemandClient;
use sonobi_adapter::core::models::openrtb::BidRequest;
use sonobi_adapter::core::observability;
use sonobi_adapter::SonobiAdapter;
use std::path::PathBuf;
use tracing::info;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const DEFAULT_CONFIG: &str = "sonobi.yaml";

fn parse_args() -> Result<(PathBuf, PathBuf), anyhow::Error> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [request] => Ok((DEFAULT_CONFIG.into(), request.into())),
        [config, request] => Ok((config.into(), request.into())),
        _ => bail!("usage: sonobi-adapter [config.yaml] <request.json>"),
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    let (config_path, request_path) = parse_args()?;

    let config = AdapterConfig::load(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;

    observability::init(&config.logging)?;
    info!("Loaded config for endpoint {}", config.endpoint);

    let raw = std::fs::read(&request_path)
        .with_context(|| format!("failed to read request {}", request_path.display()))?;
    let req: BidRequest = serde_json::from_slice(&raw).context("invalid bid request json")?;

    let adapter = SonobiAdapter::from_config(&config)?;
    let client = DemandClient::new(&config.client)?;

    let outcome = run_callouts(&adapter, &client, &req, config.logging.span_sample_rate).await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
