// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Screenshot capture through a remote rendering service.

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::analysis::Screenshot;
use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Raw image returned by a renderer.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl CapturedImage {
    pub fn into_payload(self) -> Screenshot {
        Screenshot {
            content_type: self.content_type,
            byte_length: self.bytes.len(),
            data_base64: base64::engine::general_purpose::STANDARD.encode(&self.bytes),
        }
    }
}

#[async_trait]
pub trait Screenshotter: Send + Sync {
    async fn capture(&self, url: &Url) -> AnalysisResult<CapturedImage>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CaptureRequest<'a> {
    url: &'a str,
    full_page: bool,
}

/// Posts `{url, fullPage}` to a rendering endpoint and expects image bytes back.
pub struct RemoteScreenshotter {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteScreenshotter {
    pub fn new(endpoint: &str, user_agent: &str, timeout: Duration) -> AnalysisResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl Screenshotter for RemoteScreenshotter {
    async fn capture(&self, url: &Url) -> AnalysisResult<CapturedImage> {
        let request = CaptureRequest {
            url: url.as_str(),
            full_page: true,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout("screenshot renderer".to_string())
                } else {
                    AnalysisError::UpstreamFetchFailed(format!("screenshot renderer: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::UpstreamFetchFailed(format!(
                "screenshot renderer returned HTTP {}",
                status.as_u16()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AnalysisError::UpstreamFetchFailed(format!("screenshot renderer: {}", e)))?;

        if bytes.is_empty() {
            return Err(AnalysisError::UpstreamFetchFailed(
                "screenshot renderer returned an empty image".to_string(),
            ));
        }

        Ok(CapturedImage {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}
