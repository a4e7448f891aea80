use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::ModelConfig;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Sentiment {
    pub label: String,
    pub score: f32,
}

/// Per-token feature vectors and a sentiment label for one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Features {
    pub tokens: Vec<Vec<f32>>,
    pub sentiment: Sentiment,
}

/// A pretrained transformer treated as a black box.
#[async_trait]
pub trait FeatureModel: Send + Sync {
    async fn features(&self, text: &str) -> Result<Features>;
}

pub async fn extract_features(model: &dyn FeatureModel, text: &str) -> Result<Features> {
    let features = model.features(text).await?;
    if features.tokens.is_empty() {
        return Err(AppError::Model("feature model returned no token vectors".to_string()));
    }
    Ok(features)
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

/// Calls hosted inference endpoints: one feature-extraction pipeline and one
/// text-classification pipeline.
pub struct HttpFeatureModel {
    client: Client,
    config: ModelConfig,
}

impl HttpFeatureModel {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn infer(&self, url: &str, text: &str) -> Result<Value> {
        let mut request = self.client.post(url).json(&InferenceRequest { inputs: text });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let res = request
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| AppError::Model(format!("inference request to {} failed: {}", url, e)))?;

        res.json()
            .await
            .map_err(|e| AppError::Model(format!("invalid inference response from {}: {}", url, e)))
    }
}

#[async_trait]
impl FeatureModel for HttpFeatureModel {
    async fn features(&self, text: &str) -> Result<Features> {
        let vectors = self.infer(&self.config.feature_url, text).await?;
        let labels = self.infer(&self.config.sentiment_url, text).await?;

        Ok(Features {
            tokens: parse_token_vectors(&vectors)?,
            sentiment: parse_sentiment(&labels)?,
        })
    }
}

/// Accepts `[[f32; dim]; tokens]` or the batched `[[[f32; dim]; tokens]]` form.
fn parse_token_vectors(value: &Value) -> Result<Vec<Vec<f32>>> {
    let invalid = || AppError::Model("Invalid feature-extraction response format".to_string());

    let mut rows = value.as_array().ok_or_else(invalid)?;
    if let Some(Value::Array(inner)) = rows.first() {
        if inner.first().is_some_and(Value::is_array) {
            rows = inner;
        }
    }

    rows.iter()
        .map(|row| -> Result<Vec<f32>> {
            row.as_array()
                .ok_or_else(invalid)?
                .iter()
                .map(|x| x.as_f64().map(|x| x as f32).ok_or_else(invalid))
                .collect()
        })
        .collect()
}

/// Picks the highest scoring label from `[{label, score}]` or `[[{label, score}]]`.
fn parse_sentiment(value: &Value) -> Result<Sentiment> {
    let invalid = || AppError::Model("Invalid text-classification response format".to_string());

    let mut labels = value.as_array().ok_or_else(invalid)?;
    if let Some(Value::Array(inner)) = labels.first() {
        labels = inner;
    }

    labels
        .iter()
        .filter_map(|entry| {
            Some(Sentiment {
                label: entry["label"].as_str()?.to_string(),
                score: entry["score"].as_f64()? as f32,
            })
        })
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(invalid)
}
