use crate::{
    artifacts::ArtifactWriter, clean::Cleaner, config::Config, models::*,
    overpass::OverpassClient, parse, Result,
};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stats: CleaningStats,
    pub features: usize,
    pub paths: ArtifactPaths,
}

/// Fetch → parse → clean → write, strictly in sequence
#[derive(Clone)]
pub struct Pipeline {
    pub client: OverpassClient,
    pub cleaner: Cleaner,
    pub writer: ArtifactWriter,
}

impl Pipeline {
    pub fn new(client: OverpassClient, cleaner: Cleaner, writer: ArtifactWriter) -> Self {
        Self {
            client,
            cleaner,
            writer,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            OverpassClient::new(config.overpass.endpoint.clone()),
            Cleaner::new(config.cleaning.drinking_water_default.clone()),
            ArtifactWriter::new(config.output.channel_var.clone()),
        )
    }

    /// Run `query` against Overpass and persist the result at `out`
    pub async fn run(&self, query: &str, out: &Path) -> Result<RunSummary> {
        let payload = self.client.fetch(query).await?;
        self.process(&payload, out)
    }

    /// Process an already-fetched payload without touching the network
    pub fn process(&self, payload: &Value, out: &Path) -> Result<RunSummary> {
        let dataset = parse::parse_payload(payload)?;
        let (cleaned, stats) = self.cleaner.clean(&dataset);
        let paths = self.writer.write(&cleaned, out)?;

        info!(
            "Run complete: {} of {} elements written to {:?}",
            cleaned.len(),
            stats.input_rows,
            paths.full
        );

        Ok(RunSummary {
            stats,
            features: cleaned.len(),
            paths,
        })
    }
}
