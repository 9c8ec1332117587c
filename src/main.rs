use clap::{Parser, Subcommand};
use egistic::{Config, Credentials, Egistic, EgisticError, DEFAULT_CONCURRENCY, EGISTIC_DOMAIN};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "egistic",
    about = "Download Egistic map layers and farm metadata, then join them",
    version
)]
struct Cli {
    /// Cabinet account used to sign in
    #[arg(long, env = "EGISTIC_CLIENT_USERNAME")]
    username: Option<String>,

    /// Password of the cabinet account
    #[arg(long, env = "EGISTIC_CLIENT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Base domain of the platform
    #[arg(long, env = "EGISTIC_DOMAIN", default_value = EGISTIC_DOMAIN)]
    domain: String,

    /// Directory under which data/parsing/egistic/ is written
    #[arg(long, env = "EGISTIC_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Farm records fetched simultaneously
    #[arg(long, env = "EGISTIC_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Do not draw progress bars
    #[arg(long)]
    no_progress: bool,

    #[command(subcommand)]
    stage: Option<Stage>,
}

#[derive(Subcommand, Clone, Copy)]
enum Stage {
    /// Download the map layers
    Layers,
    /// Download farm metadata for the farm-info layer
    Farms,
    /// Join farm metadata onto the layers
    Aggregate,
    /// Run every stage in order (default)
    All,
}

#[tokio::main]
async fn main() -> Result<(), EgisticError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.username.is_none() || cli.password.is_none() {
        warn!("EGISTIC_CLIENT_USERNAME or EGISTIC_CLIENT_PASSWORD is not set; farm requests will be unauthenticated");
    }
    let config = Config::builder()
        .credentials(Credentials::new(
            cli.username.unwrap_or_default(),
            cli.password.unwrap_or_default(),
        ))
        .domain(cli.domain)
        .base_dir(cli.data_dir)
        .concurrency(cli.concurrency)
        .accept_invalid_certs(cli.insecure)
        .show_progress(!cli.no_progress)
        .build();
    let egistic = Egistic::new(config)?;

    match cli.stage.unwrap_or(Stage::All) {
        Stage::Layers => {
            let layers = egistic.fetch_layers().await?;
            info!("{} layer files written", layers.len());
        }
        Stage::Farms => {
            let report = egistic.fetch_farms_metadata().await?;
            info!(
                "{} farm files written, {} failed, {} features without id",
                report.written.len(),
                report.failed.len(),
                report.unidentified.len()
            );
        }
        Stage::Aggregate => {
            let report = egistic.aggregate().await?;
            info!("{} aggregated layer files written", report.outputs.len());
        }
        Stage::All => {
            let summary = egistic.run().await?;
            info!(
                "Done: {} layers, {}/{} farms, {} aggregated layers",
                summary.layers.len(),
                summary.farms.written.len(),
                summary.farms.attempted(),
                summary.aggregate.outputs.len()
            );
        }
    }
    Ok(())
}
