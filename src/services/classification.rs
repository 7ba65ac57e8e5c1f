// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Industry classification against a remote inference endpoint.
//!
//! Classification is best effort. [`ClassificationClient::classify`] makes at
//! most [`MAX_ATTEMPTS`] calls and falls back to [`NO_CLASSIFICATION`]; it
//! never returns an error.

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::analysis::LabelScore;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const NO_CLASSIFICATION: &str = "No classification";
pub const MAX_ATTEMPTS: usize = 2;

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Labels for `text`, best first.
    async fn infer(&self, text: &str) -> AnalysisResult<Vec<LabelScore>>;
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<InferenceParameters<'a>>,
}

#[derive(Serialize)]
struct InferenceParameters<'a> {
    candidate_labels: &'a [String],
}

pub struct HttpInferenceBackend {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    candidate_labels: Vec<String>,
}

impl HttpInferenceBackend {
    pub fn new(
        endpoint: &str,
        token: Option<String>,
        candidate_labels: Vec<String>,
        timeout: Duration,
    ) -> AnalysisResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            token,
            candidate_labels,
        })
    }
}

#[async_trait]
impl InferenceBackend for HttpInferenceBackend {
    async fn infer(&self, text: &str) -> AnalysisResult<Vec<LabelScore>> {
        let request = InferenceRequest {
            inputs: text,
            parameters: (!self.candidate_labels.is_empty()).then(|| InferenceParameters {
                candidate_labels: &self.candidate_labels,
            }),
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AnalysisError::Timeout("inference endpoint".to_string())
            } else {
                AnalysisError::ClassificationUnavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::ClassificationUnavailable(format!(
                "inference endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::ClassificationUnavailable(e.to_string()))?;
        parse_labels(&body)
    }
}

fn label_score(value: &Value) -> Option<LabelScore> {
    let label = value.get("label")?.as_str()?.to_string();
    Some(LabelScore {
        label,
        score: value.get("score").and_then(Value::as_f64),
    })
}

/// Accepts `[[{label, score}]]`, `[{label, score}]` or `{labels: [], scores: []}`.
pub fn parse_labels(body: &Value) -> AnalysisResult<Vec<LabelScore>> {
    let labels: Vec<LabelScore> = match body {
        Value::Array(items) => match items.first() {
            Some(Value::Array(inner)) => inner.iter().filter_map(label_score).collect(),
            _ => items.iter().filter_map(label_score).collect(),
        },
        Value::Object(_) => {
            let names = body.get("labels").and_then(Value::as_array);
            let scores = body.get("scores").and_then(Value::as_array);
            match names {
                Some(names) => names
                    .iter()
                    .enumerate()
                    .filter_map(|(i, name)| {
                        Some(LabelScore {
                            label: name.as_str()?.to_string(),
                            score: scores.and_then(|s| s.get(i)).and_then(Value::as_f64),
                        })
                    })
                    .collect(),
                None => Vec::new(),
            }
        }
        _ => Vec::new(),
    };

    if labels.is_empty() {
        return Err(AnalysisError::ClassificationUnavailable(
            "response has no label".to_string(),
        ));
    }
    Ok(labels)
}

pub struct ClassificationClient {
    backend: Option<Arc<dyn InferenceBackend>>,
}

impl ClassificationClient {
    pub fn new(backend: Option<Arc<dyn InferenceBackend>>) -> Self {
        Self { backend }
    }

    pub fn sentinel() -> LabelScore {
        LabelScore {
            label: NO_CLASSIFICATION.to_string(),
            score: None,
        }
    }

    /// Top label for `text`, or the sentinel after two failed attempts.
    pub async fn classify(&self, text: &str) -> LabelScore {
        let Some(backend) = &self.backend else {
            return Self::sentinel();
        };
        if text.trim().is_empty() {
            return Self::sentinel();
        }

        for attempt in 1..=MAX_ATTEMPTS {
            match backend.infer(text).await {
                Ok(labels) => {
                    if let Some(best) = labels.into_iter().next() {
                        return best;
                    }
                    tracing::warn!(attempt, "inference returned no labels");
                }
                Err(e) => {
                    tracing::warn!(attempt, code = e.kind().code(), "inference failed: {}", e);
                }
            }
        }

        Self::sentinel()
    }
}
