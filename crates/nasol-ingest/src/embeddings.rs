//! Text-embedding client with an ordered fallback chain.
//!
//! Each configured model is tried through two endpoint styles of the
//! inference API. The first attempt that returns a usable vector wins; the
//! vector is then mean-pooled if needed and fitted to the storage width.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// How an inference endpoint is addressed for a given model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointStyle {
    /// `POST {base}/models/{model}`
    ModelInference,
    /// `POST {base}/pipeline/feature-extraction/{model}`
    FeatureExtraction,
}

impl EndpointStyle {
    fn url(self, base_url: &str, model: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            EndpointStyle::ModelInference => format!("{base}/models/{model}"),
            EndpointStyle::FeatureExtraction => {
                format!("{base}/pipeline/feature-extraction/{model}")
            }
        }
    }
}

impl std::fmt::Display for EndpointStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointStyle::ModelInference => write!(f, "model_inference"),
            EndpointStyle::FeatureExtraction => write!(f, "feature_extraction"),
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a str,
    options: EmbedOptions,
}

#[derive(Serialize)]
struct EmbedOptions {
    wait_for_model: bool,
}

/// Accepted response shapes, most specific first.
#[derive(Deserialize)]
#[serde(untagged)]
enum EmbedResponse {
    Sentence(Vec<f32>),
    Tokens(Vec<Vec<f32>>),
    Batch(Vec<Vec<Vec<f32>>>),
}

pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    token: String,
    attempts: Vec<(String, EndpointStyle)>,
    dimension: usize,
}

impl EmbeddingClient {
    /// Builds the client and its attempt list: every model through
    /// [`EndpointStyle::ModelInference`], then [`EndpointStyle::FeatureExtraction`].
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        base_url: &str,
        token: &str,
        models: &[String],
        dimension: usize,
        timeout_secs: u64,
    ) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        let attempts = models
            .iter()
            .flat_map(|model| {
                [EndpointStyle::ModelInference, EndpointStyle::FeatureExtraction]
                    .into_iter()
                    .map(move |style| (model.clone(), style))
            })
            .collect();

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            token: token.to_string(),
            attempts,
            dimension,
        })
    }

    #[must_use]
    pub fn attempts(&self) -> &[(String, EndpointStyle)] {
        &self.attempts
    }

    /// Embeds `text`, returning `None` once every attempt has failed.
    pub async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        for (model, style) in &self.attempts {
            match self.try_attempt(model, *style, text).await {
                Ok(vector) => {
                    tracing::debug!(model, style = %style, "embedding obtained");
                    return Some(vector);
                }
                Err(e) => {
                    tracing::warn!(model, style = %style, error = %e, "embedding attempt failed");
                }
            }
        }
        tracing::warn!(
            attempts = self.attempts.len(),
            "all embedding attempts failed; continuing without embedding"
        );
        None
    }

    async fn try_attempt(
        &self,
        model: &str,
        style: EndpointStyle,
        text: &str,
    ) -> Result<Vec<f32>, IngestError> {
        let url = style.url(&self.base_url, model);
        let request = EmbedRequest {
            inputs: text,
            options: EmbedOptions {
                wait_for_model: true,
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Embedding(format!("{url} returned status {status}")));
        }

        let body = response.text().await?;
        let parsed: EmbedResponse =
            serde_json::from_str(&body).map_err(|e| IngestError::Deserialize {
                context: url.clone(),
                source: e,
            })?;

        let vector = sentence_vector(parsed)
            .ok_or_else(|| IngestError::Embedding(format!("{url} returned an empty embedding")))?;
        Ok(fit_dimension(vector, self.dimension))
    }
}

/// Reduces any accepted response shape to one sentence vector.
fn sentence_vector(response: EmbedResponse) -> Option<Vec<f32>> {
    let vector = match response {
        EmbedResponse::Sentence(v) => v,
        EmbedResponse::Tokens(rows) => mean_pool(&rows)?,
        EmbedResponse::Batch(batch) => mean_pool(batch.first()?)?,
    };
    (!vector.is_empty()).then_some(vector)
}

/// Averages token vectors column-wise. Rows shorter than the first are
/// treated as zero-padded.
#[allow(clippy::cast_precision_loss)] // token counts are far below 2^24
fn mean_pool(rows: &[Vec<f32>]) -> Option<Vec<f32>> {
    let width = rows.first()?.len();
    let mut sums = vec![0.0_f32; width];
    for row in rows {
        for (sum, value) in sums.iter_mut().zip(row) {
            *sum += value;
        }
    }
    let count = rows.len() as f32;
    Some(sums.into_iter().map(|s| s / count).collect())
}

/// Pads with zeros or truncates to exactly `dimension` values.
#[must_use]
pub fn fit_dimension(mut vector: Vec<f32>, dimension: usize) -> Vec<f32> {
    vector.resize(dimension, 0.0);
    vector
}
