// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Fetching and caching of directive documents per origin.
//!
//! Each origin moves through `Unfetched -> Fetching -> Cached | Failed`.
//! Concurrent lookups for an origin that is being fetched wait on the same
//! fetch. Failed entries are replaced on the next lookup once the in-flight
//! waiters have observed them; cached entries live for the configured TTL.
//!
//! Settled entries that went stale are swept out whenever a new origin is
//! looked up, at most once per sweep interval, and the map never holds more
//! than its capacity.

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::directive::{DirectiveDocument, DirectiveRuleSet};
use crate::models::stage::ErrorInfo;
use crate::services::directive_policy;
use crate::services::logging::redact_url;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use texting_robots::Robot;
use tokio::sync::OnceCell;
use url::Url;

/// Capability that retrieves the raw text of a directive document.
#[async_trait]
pub trait DirectiveSource: Send + Sync {
    async fn fetch(&self, robots_url: &str) -> AnalysisResult<String>;
}

/// Fetches directive documents over HTTP.
pub struct HttpDirectiveSource {
    client: reqwest::Client,
}

impl HttpDirectiveSource {
    pub fn new(user_agent: &str, timeout: Duration) -> AnalysisResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DirectiveSource for HttpDirectiveSource {
    async fn fetch(&self, robots_url: &str) -> AnalysisResult<String> {
        let response = self.client.get(robots_url).send().await.map_err(|e| {
            if e.is_timeout() {
                AnalysisError::Timeout(format!("fetching {}", robots_url))
            } else {
                AnalysisError::FetchFailed(format!("{}: {}", robots_url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::FetchFailed(format!(
                "{} returned {}",
                robots_url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AnalysisError::FetchFailed(format!("{}: {}", robots_url, e)))
    }
}

/// Parsed directives for one origin.
#[derive(Debug)]
pub struct ResolvedDirectives {
    pub document: DirectiveDocument,
    pub rules: DirectiveRuleSet,
    pub extras: DirectiveExtras,
}

/// Informational fields reported alongside the rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveExtras {
    pub sitemaps: Vec<String>,
    pub crawl_delay: Option<f32>,
}

impl DirectiveExtras {
    fn from_document(document: &DirectiveDocument) -> Self {
        match Robot::new("*", document.content.as_bytes()) {
            Ok(robot) => Self {
                sitemaps: robot.sitemaps,
                crawl_delay: robot.delay,
            },
            Err(e) => {
                tracing::debug!(origin = %document.origin, "no sitemap or delay data: {}", e);
                Self::default()
            }
        }
    }
}

/// Observable lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveCacheState {
    Unfetched,
    Fetching,
    Cached,
    Failed,
}

struct CacheEntry {
    resolved_at: Instant,
    outcome: Result<Arc<ResolvedDirectives>, ErrorInfo>,
}

type CacheSlot = Arc<OnceCell<CacheEntry>>;

/// Upper bound on the time between sweeps, so failed origins do not linger for a full TTL.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

const DEFAULT_CAPACITY: usize = 10_000;

pub struct DirectiveStore {
    source: Arc<dyn DirectiveSource>,
    cache: DashMap<String, CacheSlot>,
    ttl: Duration,
    capacity: usize,
    last_sweep: Mutex<Instant>,
}

impl DirectiveStore {
    pub fn new(source: Arc<dyn DirectiveSource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: DashMap::new(),
            ttl,
            capacity: DEFAULT_CAPACITY,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Limit the number of origins held at once (at least one).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Number of origins currently held, fetching or settled.
    pub fn cached_origins(&self) -> usize {
        self.cache.len()
    }

    /// Directive file location for the origin of `url`.
    pub fn robots_url_for(url: &Url) -> AnalysisResult<String> {
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(AnalysisError::InvalidUrl(format!("{} has no origin", url)));
        }
        let mut robots = url.clone();
        robots.set_path("/robots.txt");
        robots.set_query(None);
        robots.set_fragment(None);
        // Credentials never leave the process.
        let _ = robots.set_username("");
        let _ = robots.set_password(None);
        Ok(robots.to_string())
    }

    /// Fetch (or reuse) and parse the directives governing `url`.
    pub async fn resolve(&self, url: &Url) -> AnalysisResult<Arc<ResolvedDirectives>> {
        let robots_url = Self::robots_url_for(url)?;
        let slot = self.slot(&robots_url);

        let entry = slot
            .get_or_init(|| async {
                tracing::debug!(origin = %redact_url(&robots_url), "fetching directive document");
                let outcome = self.load(&robots_url).await.map_err(|e| e.to_info());
                if let Err(info) = &outcome {
                    tracing::warn!(
                        origin = %redact_url(&robots_url),
                        kind = ?info.kind,
                        "directive document unavailable: {}",
                        info.message
                    );
                }
                CacheEntry {
                    resolved_at: Instant::now(),
                    outcome,
                }
            })
            .await;

        entry.outcome.clone().map_err(AnalysisError::from)
    }

    pub fn state(&self, url: &Url) -> DirectiveCacheState {
        let Ok(robots_url) = Self::robots_url_for(url) else {
            return DirectiveCacheState::Unfetched;
        };
        match self.cache.get(&robots_url) {
            None => DirectiveCacheState::Unfetched,
            Some(slot) => match slot.get() {
                None => DirectiveCacheState::Fetching,
                Some(entry) if entry.outcome.is_ok() => DirectiveCacheState::Cached,
                Some(_) => DirectiveCacheState::Failed,
            },
        }
    }

    async fn load(&self, robots_url: &str) -> AnalysisResult<Arc<ResolvedDirectives>> {
        let content = self.source.fetch(robots_url).await?;
        let document = DirectiveDocument {
            origin: robots_url.to_string(),
            content,
        };
        let rules = directive_policy::parse(&document)?;
        let extras = DirectiveExtras::from_document(&document);
        Ok(Arc::new(ResolvedDirectives {
            document,
            rules,
            extras,
        }))
    }

    /// Current slot for `robots_url`, replacing it if its entry has gone stale.
    fn slot(&self, robots_url: &str) -> CacheSlot {
        if !self.cache.contains_key(robots_url) {
            self.evict();
        }

        let mut slot = self
            .cache
            .entry(robots_url.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()));

        if self.is_stale(slot.value()) {
            *slot.value_mut() = Arc::new(OnceCell::new());
        }
        slot.value().clone()
    }

    /// Drop stale entries, and every settled entry if the map is still full.
    /// In-flight fetches are kept.
    fn evict(&self) {
        let full = self.cache.len() >= self.capacity;
        {
            let mut last_sweep = self
                .last_sweep
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !full && last_sweep.elapsed() < self.ttl.min(MAX_SWEEP_INTERVAL) {
                return;
            }
            *last_sweep = Instant::now();
        }

        self.cache.retain(|_, slot| !self.is_stale(slot));
        if self.cache.len() >= self.capacity {
            tracing::warn!(
                entries = self.cache.len(),
                capacity = self.capacity,
                "directive cache full, dropping settled entries"
            );
            self.cache.retain(|_, slot| slot.get().is_none());
        }
    }

    fn is_stale(&self, slot: &CacheSlot) -> bool {
        match slot.get() {
            None => false,
            Some(entry) => entry.outcome.is_err() || entry.resolved_at.elapsed() >= self.ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        body: AnalysisResult<String>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl CountingSource {
        fn new(body: AnalysisResult<String>) -> Self {
            Self {
                body,
                calls: AtomicUsize::new(0),
                delay: Duration::from_millis(0),
            }
        }
    }

    #[async_trait]
    impl DirectiveSource for CountingSource {
        async fn fetch(&self, _robots_url: &str) -> AnalysisResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.body.clone()
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_robots_url_uses_origin() {
        let robots =
            DirectiveStore::robots_url_for(&url("https://user:pw@example.com:8443/a/b?c=d#x"))
                .unwrap();
        assert_eq!(robots, "https://example.com:8443/robots.txt");
    }

    #[test]
    fn test_robots_url_rejects_opaque_urls() {
        assert!(DirectiveStore::robots_url_for(&url("mailto:someone@example.com")).is_err());
    }

    #[tokio::test]
    async fn test_resolve_collects_sitemaps() {
        let source = Arc::new(CountingSource::new(Ok(
            "User-agent: *\nCrawl-delay: 2\nAllow: /\nSitemap: https://example.com/sitemap.xml\n"
                .to_string(),
        )));
        let store = DirectiveStore::new(source, Duration::from_secs(60));

        let resolved = store.resolve(&url("https://example.com/")).await.unwrap();
        assert_eq!(
            resolved.extras.sitemaps,
            vec!["https://example.com/sitemap.xml".to_string()]
        );
        assert_eq!(resolved.extras.crawl_delay, Some(2.0));
    }

    #[tokio::test]
    async fn test_resolve_caches_per_origin() {
        let source = Arc::new(CountingSource::new(Ok("User-agent: *\nAllow: /".to_string())));
        let store = DirectiveStore::new(source.clone(), Duration::from_secs(60));

        assert_eq!(
            store.state(&url("https://example.com/")),
            DirectiveCacheState::Unfetched
        );

        store.resolve(&url("https://example.com/a")).await.unwrap();
        store.resolve(&url("https://example.com/b")).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.state(&url("https://example.com/")),
            DirectiveCacheState::Cached
        );
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_fetch() {
        let mut source = CountingSource::new(Ok("User-agent: *\nDisallow: /".to_string()));
        source.delay = Duration::from_millis(50);
        let source = Arc::new(source);
        let store = Arc::new(DirectiveStore::new(source.clone(), Duration::from_secs(60)));

        let lookups = (0..8).map(|i| {
            let store = store.clone();
            async move {
                store
                    .resolve(&url(&format!("https://example.com/page/{}", i)))
                    .await
            }
        });
        let results = futures::future::join_all(lookups).await;

        assert!(results.iter().all(|r| r.as_ref().unwrap().rules.root_disallowed));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_surfaced_and_retried_later() {
        let source = Arc::new(CountingSource::new(Err(AnalysisError::FetchFailed(
            "https://down.example/robots.txt returned 404 Not Found".to_string(),
        ))));
        let store = DirectiveStore::new(source.clone(), Duration::from_secs(60));

        let err = store.resolve(&url("https://down.example/")).await.unwrap_err();
        assert_eq!(err.kind(), crate::models::stage::ErrorKind::UpstreamFetchFailed);
        assert_eq!(
            store.state(&url("https://down.example/")),
            DirectiveCacheState::Failed
        );

        let _ = store.resolve(&url("https://down.example/")).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_document_is_a_failure() {
        let source = Arc::new(CountingSource::new(Ok("   ".to_string())));
        let store = DirectiveStore::new(source, Duration::from_secs(60));

        let err = store.resolve(&url("https://empty.example/")).await.unwrap_err();
        assert_eq!(err.kind(), crate::models::stage::ErrorKind::UpstreamFetchFailed);
    }

    #[tokio::test]
    async fn test_stale_and_failed_origins_are_evicted() {
        let ttl = Duration::from_millis(200);
        let down = Arc::new(CountingSource::new(Err(AnalysisError::FetchFailed(
            "connection refused".to_string(),
        ))));
        let failing = DirectiveStore::new(down, ttl);
        let up = Arc::new(CountingSource::new(Ok("User-agent: *\nAllow: /".to_string())));
        let expiring = DirectiveStore::new(up, ttl);

        for store in [&failing, &expiring] {
            let _ = store.resolve(&url("https://a.example/")).await;
            let _ = store.resolve(&url("https://b.example/")).await;
            assert_eq!(store.cached_origins(), 2);
        }

        tokio::time::sleep(Duration::from_millis(300)).await;

        for store in [&failing, &expiring] {
            let _ = store.resolve(&url("https://c.example/")).await;
            assert_eq!(store.cached_origins(), 1);
            assert_eq!(
                store.state(&url("https://a.example/")),
                DirectiveCacheState::Unfetched
            );
        }
    }

    #[tokio::test]
    async fn test_cache_never_exceeds_capacity() {
        let source = Arc::new(CountingSource::new(Ok("User-agent: *\nAllow: /".to_string())));
        let store = DirectiveStore::new(source, Duration::from_secs(60)).with_capacity(2);

        for host in ["a", "b", "c", "d", "e"] {
            store
                .resolve(&url(&format!("https://{}.example/", host)))
                .await
                .unwrap();
            assert!(store.cached_origins() <= 2);
        }
        assert_eq!(
            store.state(&url("https://e.example/")),
            DirectiveCacheState::Cached
        );
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let source = Arc::new(CountingSource::new(Ok("User-agent: *\nAllow: /".to_string())));
        let store = DirectiveStore::new(source.clone(), Duration::from_millis(0));

        store.resolve(&url("https://example.com/")).await.unwrap();
        store.resolve(&url("https://example.com/")).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
