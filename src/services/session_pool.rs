// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Bounded pool of page-rendering sessions.
//!
//! A [`PageSession`] holds one pool slot for as long as it lives. The slot is
//! released when the session is dropped, which covers early returns, errors,
//! panics and task cancellation alike.

use crate::error::{AnalysisError, AnalysisResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

/// One HTTP exchange as returned by a [`PageFetcher`]. Redirects are not
/// followed here; a 3xx answer carries its `Location` instead.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the body was served from
    pub final_url: Url,
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Absolute http(s) target of a redirect answer.
    pub fn redirect_target(&self) -> Option<Url> {
        if !(300..400).contains(&self.status) {
            return None;
        }
        let target = self.final_url.join(self.location.as_deref()?).ok()?;
        matches!(target.scheme(), "http" | "https").then_some(target)
    }
}

/// Capability that turns a URL into page content.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> AnalysisResult<FetchedPage>;
}

/// Plain HTTP GET renderer. Redirects are handed back to the caller.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> AnalysisResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AnalysisError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> AnalysisResult<FetchedPage> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                AnalysisError::Timeout(format!("fetching {}", url))
            } else {
                AnalysisError::UpstreamFetchFailed(format!("{}: {}", url, e))
            }
        })?;

        let final_url = response.url().clone();
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::UpstreamFetchFailed(format!("{}: {}", url, e)))?;

        Ok(FetchedPage {
            final_url,
            status,
            location,
            body,
        })
    }
}

pub struct SessionPool {
    fetcher: Arc<dyn PageFetcher>,
    permits: Arc<Semaphore>,
    acquire_timeout: Duration,
}

impl SessionPool {
    /// `size` is clamped to at least one session.
    pub fn new(fetcher: Arc<dyn PageFetcher>, size: usize, acquire_timeout: Duration) -> Self {
        Self {
            fetcher,
            permits: Arc::new(Semaphore::new(size.max(1))),
            acquire_timeout,
        }
    }

    /// Wait for a free slot, failing with `Timeout` after the acquire timeout.
    pub async fn acquire(&self) -> AnalysisResult<PageSession> {
        let permit = tokio::time::timeout(self.acquire_timeout, self.permits.clone().acquire_owned())
            .await
            .map_err(|_| AnalysisError::Timeout("waiting for a free page session".to_string()))?
            .map_err(|_| AnalysisError::Internal("session pool is closed".to_string()))?;

        Ok(PageSession {
            fetcher: self.fetcher.clone(),
            _permit: permit,
        })
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// One leased session.
pub struct PageSession {
    fetcher: Arc<dyn PageFetcher>,
    _permit: OwnedSemaphorePermit,
}

impl PageSession {
    /// Render `url` whatever status it answers with.
    pub async fn open(&self, url: &Url) -> AnalysisResult<FetchedPage> {
        self.fetcher.fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticFetcher {
        status: u16,
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &Url) -> AnalysisResult<FetchedPage> {
            Ok(FetchedPage {
                final_url: url.clone(),
                status: self.status,
                location: None,
                body: "<html></html>".to_string(),
            })
        }
    }

    fn pool(size: usize, status: u16) -> SessionPool {
        SessionPool::new(
            Arc::new(StaticFetcher { status }),
            size,
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn test_lease_released_on_drop() {
        let pool = pool(2, 200);
        let first = pool.acquire().await.unwrap();
        let second = pool.acquire().await.unwrap();
        assert_eq!(pool.available(), 0);

        drop(first);
        assert_eq!(pool.available(), 1);
        drop(second);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_acquire_times_out_when_exhausted() {
        let pool = pool(1, 200);
        let _held = pool.acquire().await.unwrap();

        let err = pool.acquire().await.err().unwrap();
        assert!(matches!(err, AnalysisError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_lease_released_when_task_panics() {
        let pool = Arc::new(pool(1, 200));
        let task_pool = pool.clone();
        let handle = tokio::spawn(async move {
            let _session = task_pool.acquire().await.unwrap();
            panic!("stage blew up");
        });
        assert!(handle.await.is_err());
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_zero_size_is_clamped() {
        assert_eq!(pool(0, 200).available(), 1);
    }

    #[tokio::test]
    async fn test_open_returns_error_status_as_page() {
        let pool = pool(1, 404);
        let session = pool.acquire().await.unwrap();
        let url = Url::parse("https://example.com/missing").unwrap();

        let page = session.open(&url).await.unwrap();
        assert_eq!(page.status, 404);
        assert!(!page.is_success());
    }

    #[test]
    fn test_redirect_target_resolves_relative_location() {
        let mut page = FetchedPage {
            final_url: Url::parse("https://example.com/go?x=1").unwrap(),
            status: 302,
            location: Some("/private/secret".to_string()),
            body: String::new(),
        };
        assert_eq!(
            page.redirect_target().unwrap().as_str(),
            "https://example.com/private/secret"
        );

        page.location = Some("ftp://example.com/file".to_string());
        assert!(page.redirect_target().is_none());

        page.status = 200;
        page.location = Some("/elsewhere".to_string());
        assert!(page.redirect_target().is_none());
    }
}
