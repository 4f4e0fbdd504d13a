use anyhow::Context;
use clap::{Parser, Subcommand};
use pump_harvester::{config::Config, pipeline::Pipeline};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "pump-harvester")]
#[command(about = "Harvests Overpass points of interest into GeoJSON")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query Overpass and write the artifact pair
    Fetch {
        /// Overpass query; blank uses the Berlin street-pump query
        #[arg(long)]
        query: Option<String>,
        /// Destination of the full GeoJSON file
        #[arg(long)]
        out: Option<PathBuf>,
        /// Overpass interpreter endpoint
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Process a saved Overpass response without network access
    Transform {
        /// Saved Overpass JSON response
        #[arg(long)]
        input: PathBuf,
        /// Destination of the full GeoJSON file
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env();

    match cli.command {
        Commands::Fetch {
            query,
            out,
            endpoint,
        } => {
            if let Some(query) = query {
                config.set_query(&query);
            }
            if let Some(out) = out {
                config.output.path = out;
            }
            if let Some(endpoint) = endpoint {
                config.overpass.endpoint = endpoint;
            }
            config.validate()?;

            prepare_parent(&config.output.path)?;
            let pipeline = Pipeline::from_config(&config);
            let summary = pipeline
                .run(&config.overpass.query, &config.output.path)
                .await?;

            info!(
                "Fetched {} features into {:?}",
                summary.features, summary.paths.full
            );
        }

        Commands::Transform { input, out } => {
            if let Some(out) = out {
                config.output.path = out;
            }
            config.validate()?;

            let contents = std::fs::read_to_string(&input)
                .with_context(|| format!("reading {:?}", input))?;
            let payload: serde_json::Value = serde_json::from_str(&contents)
                .with_context(|| format!("{:?} is not JSON", input))?;

            prepare_parent(&config.output.path)?;
            let pipeline = Pipeline::from_config(&config);
            let summary = pipeline.process(&payload, &config.output.path)?;

            info!(
                "Transformed {} features into {:?}",
                summary.features, summary.paths.full
            );
        }
    }

    Ok(())
}

/// Create the destination's parent directory ahead of the writer
fn prepare_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {:?}", parent))?;
    }
    Ok(())
}
