use crate::{HarvesterError, Result};
use serde_json::Value;
use tracing::info;

/// Thin client for the Overpass interpreter endpoint
#[derive(Clone)]
pub struct OverpassClient {
    pub endpoint: String,
    client: reqwest::Client,
}

impl OverpassClient {
    /// Create a new client for `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Run an already-built query and return the raw JSON document.
    ///
    /// No retries: a failed request ends the run.
    pub async fn fetch(&self, query: &str) -> Result<Value> {
        info!("Sending Overpass query to {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("data", query)])
            .send()
            .await
            .map_err(|e| HarvesterError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(HarvesterError::Network(format!(
                "Overpass returned {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| HarvesterError::MalformedInput(format!("response is not JSON: {}", e)))?;

        if let Some(elements) = payload.get("elements").and_then(Value::as_array) {
            info!("Overpass returned {} elements", elements.len());
        }

        Ok(payload)
    }
}
