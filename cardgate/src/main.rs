mod config;

use clap::Parser;
use config::Config;
use gateway::Gateway;
use github_api::{GraphQlFetcher, WakaTimeFetcher};
use metrics_exporter_statsd::StatsdBuilder;
use shared::env::EnvStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cardgate", about = "GitHub readme card service")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, short)]
    config: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Keep the guard alive for the lifetime of the process
    let _sentry_guard = config.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    if let Some(metrics_config) = &config.metrics {
        install_statsd(metrics_config)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config))?;

    Ok(())
}

async fn run(config: Config) -> Result<(), gateway::GatewayError> {
    let store = EnvStore::from_process_env();

    let github = Arc::new(GraphQlFetcher::new());
    let wakatime = Arc::new(WakaTimeFetcher::new());

    let stats = Arc::new(cards::StatsCard::new(github.clone()));
    let gateway = Gateway::new(store)
        .route("/", stats.clone())
        .route("/api", stats.clone())
        // Kept for parity with the published route table; path
        // normalization resolves "/api/" to "/api" before lookup.
        .route("/api/", stats)
        .route("/api/pin", Arc::new(cards::PinCard::new(github.clone())))
        .route(
            "/api/top-langs",
            Arc::new(cards::TopLangsCard::new(github.clone())),
        )
        .route("/api/wakatime", Arc::new(cards::WakaTimeCard::new(wakatime)))
        .route("/api/gist", Arc::new(cards::GistCard::new(github)));

    tracing::info!(
        host = %config.listener.host,
        port = config.listener.port,
        "starting cardgate"
    );
    gateway::run(&config.listener.host, config.listener.port, gateway, config.env).await
}

fn install_statsd(config: &config::MetricsConfig) -> Result<(), Box<dyn std::error::Error>> {
    let recorder = StatsdBuilder::from(&config.statsd_host, config.statsd_port)
        .build(Some(config.prefix.as_str()))
        .map_err(|error| format!("could not build statsd recorder: {error}"))?;
    metrics::set_global_recorder(recorder)
        .map_err(|error| format!("could not install statsd recorder: {error}"))?;
    Ok(())
}
