use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Berlin street pumps, used whenever no query is supplied
pub const DEFAULT_QUERY: &str = r#"[out:json];(area["ISO3166-2"="DE-BE"]["admin_level"="4"];)->.searchArea;(node["man_made"="water_well"]["network"="Berliner Straßenbrunnen"](area.searchArea););out;>;out;"#;

pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub overpass: OverpassConfig,
    pub output: OutputConfig,
    pub cleaning: CleaningConfig,
}

/// Overpass configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpassConfig {
    pub endpoint: String,
    pub query: String,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
    /// Name of the environment variable holding the automation channel file
    pub channel_var: String,
}

/// Cleaning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    pub drinking_water_default: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overpass: OverpassConfig {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                query: DEFAULT_QUERY.to_string(),
            },
            output: OutputConfig {
                path: PathBuf::from("out/pumps.geojson"),
                channel_var: "GITHUB_OUTPUT".to_string(),
            },
            cleaning: CleaningConfig {
                drinking_water_default: "unknown".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(endpoint) = std::env::var("HARVESTER_OVERPASS_URL") {
            config.overpass.endpoint = endpoint;
        }

        if let Ok(query) = std::env::var("HARVESTER_QUERY") {
            config.set_query(&query);
        }

        if let Ok(path) = std::env::var("HARVESTER_OUTPUT") {
            config.output.path = PathBuf::from(path);
        }

        if let Ok(value) = std::env::var("HARVESTER_DRINKING_WATER_DEFAULT") {
            config.cleaning.drinking_water_default = value;
        }

        if let Ok(name) = std::env::var("HARVESTER_CHANNEL_VAR") {
            config.output.channel_var = name;
        }

        config
    }

    /// Replace the query, falling back to the default when `query` is blank
    pub fn set_query(&mut self, query: &str) {
        self.overpass.query = if query.trim().is_empty() {
            DEFAULT_QUERY.to_string()
        } else {
            query.to_string()
        };
    }

    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.overpass.endpoint.trim().is_empty() {
            return Err(crate::HarvesterError::Config(
                "Overpass endpoint must not be empty".to_string(),
            ));
        }

        if self.output.path.as_os_str().is_empty() {
            return Err(crate::HarvesterError::Config(
                "Output path must not be empty".to_string(),
            ));
        }

        if self.output.channel_var.is_empty() {
            return Err(crate::HarvesterError::Config(
                "Channel variable name must not be empty".to_string(),
            ));
        }

        if self.cleaning.drinking_water_default.is_empty() {
            return Err(crate::HarvesterError::Config(
                "drinking_water default must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
