//! Fire-and-forget invocation of the thumbnail enricher after a collection run.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::error::IngestError;

/// Upper bound on the batch size requested by a single trigger.
const MAX_TRIGGER_LIMIT: u64 = 50;

#[derive(Debug, Serialize)]
struct TriggerBody {
    limit: u64,
}

#[derive(Debug, Deserialize)]
struct TriggerAck {
    #[serde(default)]
    success: bool,
}

/// Which call reached the enricher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPath {
    Rpc,
    RawPost,
}

#[derive(Clone)]
pub struct ThumbnailTrigger {
    client: Client,
    endpoint: String,
    service_key: Option<String>,
}

impl ThumbnailTrigger {
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        endpoint: &str,
        service_key: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            service_key: service_key.map(str::to_string),
        })
    }

    /// Batch size requested after saving `saved` articles: `min(50, max(1, saved))`.
    #[must_use]
    pub fn limit_for(saved: u64) -> u64 {
        saved.clamp(1, MAX_TRIGGER_LIMIT)
    }

    /// Spawns [`ThumbnailTrigger::invoke`] on the runtime and returns at once.
    /// Failures are logged and never reach the caller.
    ///
    /// Dropping the handle leaves the task running for as long as the
    /// runtime lives. A caller about to shut its runtime down must await it.
    pub fn spawn(self, limit: u64) -> JoinHandle<()> {
        tokio::spawn(async move {
            match self.invoke(limit).await {
                Ok(path) => tracing::info!(limit, ?path, "thumbnail enrichment triggered"),
                Err(e) => tracing::warn!(
                    limit,
                    endpoint = %self.endpoint,
                    error = %e,
                    "thumbnail enrichment trigger failed"
                ),
            }
        })
    }

    /// Calls the enricher: an RPC-style JSON call that must acknowledge with
    /// `success: true`, then one raw POST of the same body if that fails.
    ///
    /// # Errors
    ///
    /// Returns the raw-POST error when both calls fail.
    pub async fn invoke(&self, limit: u64) -> Result<TriggerPath, IngestError> {
        let body = TriggerBody { limit };

        match self.call_rpc(&body).await {
            Ok(()) => return Ok(TriggerPath::Rpc),
            Err(e) => {
                tracing::debug!(error = %e, "rpc-style trigger failed, retrying as raw POST");
            }
        }

        self.call_raw(&body).await?;
        Ok(TriggerPath::RawPost)
    }

    async fn call_rpc(&self, body: &TriggerBody) -> Result<(), IngestError> {
        let mut request = self.client.post(&self.endpoint).json(body);
        if let Some(key) = &self.service_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?.error_for_status()?;
        let text = response.text().await?;
        let ack: TriggerAck =
            serde_json::from_str(&text).map_err(|e| IngestError::Deserialize {
                context: format!("trigger ack from {}", self.endpoint),
                source: e,
            })?;
        if ack.success {
            Ok(())
        } else {
            Err(IngestError::Storage(format!(
                "enricher at {} reported failure",
                self.endpoint
            )))
        }
    }

    async fn call_raw(&self, body: &TriggerBody) -> Result<(), IngestError> {
        let payload = serde_json::to_string(body).map_err(|e| IngestError::Deserialize {
            context: "trigger body".to_string(),
            source: e,
        })?;
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some(key) = &self.service_key {
            request = request.bearer_auth(key);
        }
        request.send().await?.error_for_status()?;
        Ok(())
    }
}
