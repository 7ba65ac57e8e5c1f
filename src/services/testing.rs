// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! In-process fakes for the capability traits, shared by unit tests.

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::analysis::LabelScore;
use crate::services::classification::InferenceBackend;
use crate::services::directive_store::DirectiveSource;
use crate::services::screenshot::{CapturedImage, Screenshotter};
use crate::services::session_pool::{FetchedPage, PageFetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// Serves a fixed robots body, or fails every fetch when `None`.
pub struct FakeDirectives {
    pub body: Option<String>,
    pub fetches: AtomicUsize,
}

impl FakeDirectives {
    pub fn serving(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            body: None,
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DirectiveSource for FakeDirectives {
    async fn fetch(&self, robots_url: &str) -> AnalysisResult<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.body
            .clone()
            .ok_or_else(|| AnalysisError::FetchFailed(format!("{} returned 404", robots_url)))
    }
}

/// Pages keyed by path. Unknown paths answer 404; a `delay` holds every response.
#[derive(Default)]
pub struct FakePages {
    pub pages: HashMap<String, (u16, String)>,
    /// Path to `Location` value, answered with 302
    pub redirects: HashMap<String, String>,
    pub delay: Option<Duration>,
    pub unreachable: bool,
}

impl FakePages {
    pub fn with_page(mut self, path: &str, status: u16, body: &str) -> Self {
        self.pages
            .insert(path.to_string(), (status, body.to_string()));
        self
    }

    pub fn with_redirect(mut self, path: &str, location: &str) -> Self {
        self.redirects
            .insert(path.to_string(), location.to_string());
        self
    }
}

#[async_trait]
impl PageFetcher for FakePages {
    async fn fetch(&self, url: &Url) -> AnalysisResult<FetchedPage> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable {
            return Err(AnalysisError::UpstreamFetchFailed(format!(
                "{}: connection refused",
                url
            )));
        }
        if let Some(location) = self.redirects.get(url.path()) {
            return Ok(FetchedPage {
                final_url: url.clone(),
                status: 302,
                location: Some(location.clone()),
                body: String::new(),
            });
        }
        let (status, body) = self
            .pages
            .get(url.path())
            .cloned()
            .unwrap_or_else(|| (404, "not found".to_string()));
        Ok(FetchedPage {
            final_url: url.clone(),
            status,
            location: None,
            body,
        })
    }
}

/// Always fails; counts calls.
#[derive(Default)]
pub struct FailingInference {
    pub calls: AtomicUsize,
}

#[async_trait]
impl InferenceBackend for FailingInference {
    async fn infer(&self, _text: &str) -> AnalysisResult<Vec<LabelScore>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AnalysisError::ClassificationUnavailable(
            "inference endpoint returned HTTP 503".to_string(),
        ))
    }
}

/// Answers every text with the same label.
pub struct FixedInference(pub &'static str);

#[async_trait]
impl InferenceBackend for FixedInference {
    async fn infer(&self, _text: &str) -> AnalysisResult<Vec<LabelScore>> {
        Ok(vec![LabelScore {
            label: self.0.to_string(),
            score: Some(0.9),
        }])
    }
}

pub struct FakeScreenshotter;

#[async_trait]
impl Screenshotter for FakeScreenshotter {
    async fn capture(&self, _url: &Url) -> AnalysisResult<CapturedImage> {
        Ok(CapturedImage {
            content_type: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        })
    }
}

/// Panics on every capture.
pub struct PanickingScreenshotter;

#[async_trait]
impl Screenshotter for PanickingScreenshotter {
    async fn capture(&self, _url: &Url) -> AnalysisResult<CapturedImage> {
        panic!("renderer crashed");
    }
}

pub const SHOP_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Acme Tools</title>
    <meta name="description" content="Excellent hand tools since 1920">
    <meta name="keywords" content="hammers, saws">
    <meta property="og:image" content="/img/og.png">
    <link rel="icon" href="/favicon.ico">
</head>
<body>
    <h1>Acme Tools</h1>
    <img src="/img/hammer.png" alt="Hammer">
    <a href="/news/new-saw">New saw released</a>
    <a href="https://www.facebook.com/acme">Facebook</a>
    <a href="mailto:hello@acme.test">Email us</a>
    <address>12 Long Street, Cape Town</address>
</body>
</html>"#;
