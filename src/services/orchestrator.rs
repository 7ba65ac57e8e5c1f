// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Per-request analysis driver.
//!
//! A run resolves the site's directives first, then launches every stage
//! whose preconditions hold. Stages run as separate tasks, each bounded by
//! the stage timeout and the request deadline, so a slow, failing or
//! panicking stage only ever affects its own entry in the aggregate.
//! Metadata-dependent stages start once the metadata stage has settled.

use crate::config::Config;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::analysis::{ResultAggregate, StagePayload, StatusSummary};
use crate::models::directive::{PermissionVerdict, RobotsReport};
use crate::models::stage::{ErrorInfo, ErrorKind, SkipReason, StageName, StageResult};
use crate::services::classification::{ClassificationClient, HttpInferenceBackend, InferenceBackend};
use crate::services::directive_store::{DirectiveStore, HttpDirectiveSource};
use crate::services::logging::redact_url;
use crate::services::screenshot::{RemoteScreenshotter, Screenshotter};
use crate::services::session_pool::{HttpPageFetcher, SessionPool};
use crate::services::stages::{self, StageContext};
use crate::services::status;
use chrono::Utc;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorLimits {
    pub stage_timeout: Duration,
    pub request_deadline: Duration,
}

/// Aborts the stage task if the run is dropped or times the stage out.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct AnalysisOrchestrator {
    directives: Arc<DirectiveStore>,
    pages: Arc<SessionPool>,
    classifier: Arc<ClassificationClient>,
    screenshots: Option<Arc<dyn Screenshotter>>,
    limits: OrchestratorLimits,
}

impl AnalysisOrchestrator {
    pub fn new(
        directives: Arc<DirectiveStore>,
        pages: Arc<SessionPool>,
        classifier: Arc<ClassificationClient>,
        screenshots: Option<Arc<dyn Screenshotter>>,
        limits: OrchestratorLimits,
    ) -> Self {
        Self {
            directives,
            pages,
            classifier,
            screenshots,
            limits,
        }
    }

    /// Wire the HTTP-backed capabilities described by `config`.
    pub fn from_config(config: &Config) -> AnalysisResult<Self> {
        let source = HttpDirectiveSource::new(&config.user_agent, config.directive_timeout())?;
        let directives = DirectiveStore::new(Arc::new(source), config.directive_cache_ttl());

        let fetcher = HttpPageFetcher::new(&config.user_agent, config.page_timeout())?;
        let pages = SessionPool::new(
            Arc::new(fetcher),
            config.session_pool_size,
            config.session_acquire_timeout(),
        );

        let backend: Option<Arc<dyn InferenceBackend>> = match &config.inference_url {
            Some(endpoint) => Some(Arc::new(HttpInferenceBackend::new(
                endpoint,
                config.inference_token.clone(),
                config.candidate_labels(),
                config.inference_timeout(),
            )?)),
            None => {
                tracing::info!("no inference endpoint configured, classification will use the fallback label");
                None
            }
        };

        let screenshots: Option<Arc<dyn Screenshotter>> = match &config.screenshot_url {
            Some(endpoint) => Some(Arc::new(RemoteScreenshotter::new(
                endpoint,
                &config.user_agent,
                config.page_timeout(),
            )?)),
            None => None,
        };

        Ok(Self::new(
            Arc::new(directives),
            Arc::new(pages),
            Arc::new(ClassificationClient::new(backend)),
            screenshots,
            OrchestratorLimits {
                stage_timeout: config.stage_timeout(),
                request_deadline: config.request_deadline(),
            },
        ))
    }

    /// Accept absolute http(s) URLs with a host; anything else is `InvalidUrl`.
    pub fn parse_target(raw: &str) -> AnalysisResult<Url> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AnalysisError::InvalidUrl("url is required".to_string()));
        }
        let url = Url::parse(raw)
            .map_err(|e| AnalysisError::InvalidUrl(format!("'{}': {}", raw, e)))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().map_or(true, str::is_empty) {
            return Err(AnalysisError::InvalidUrl(format!(
                "'{}' is not an absolute http(s) URL",
                raw
            )));
        }
        Ok(url)
    }

    fn context(&self, url: Url) -> StageContext {
        StageContext {
            url,
            directives: self.directives.clone(),
            pages: self.pages.clone(),
            classifier: self.classifier.clone(),
            screenshots: self.screenshots.clone(),
            metadata: None,
        }
    }

    /// Analyse `raw` with every stage. Never fails: problems are reported in the aggregate.
    pub async fn run(&self, raw: &str) -> ResultAggregate {
        let request_id = Uuid::now_v7();
        let started = Instant::now();
        let deadline = started + self.limits.request_deadline;
        let mut aggregate = ResultAggregate {
            request_id,
            url: raw.to_string(),
            analyzed_at: Utc::now(),
            elapsed_ms: 0,
            error: None,
            stages: BTreeMap::new(),
        };

        let url = match Self::parse_target(raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::info!(%request_id, "rejected analysis request: {}", e);
                aggregate.error = Some(e.to_info());
                aggregate.elapsed_ms = started.elapsed().as_millis() as u64;
                return aggregate;
            }
        };
        aggregate.url = url.to_string();
        tracing::info!(%request_id, url = %redact_url(url.as_str()), "analysis started");

        let ctx = self.context(url.clone());
        let (status, gated) = tokio::join!(
            self.launch(StageName::Status, ctx.clone(), deadline),
            self.run_gated(ctx, deadline),
        );
        aggregate.stages.insert(StageName::Status, status);
        aggregate.stages.extend(gated);

        aggregate.elapsed_ms = started.elapsed().as_millis() as u64;
        let succeeded = aggregate.stages.values().filter(|r| r.is_success()).count();
        tracing::info!(
            %request_id,
            url = %redact_url(url.as_str()),
            elapsed_ms = aggregate.elapsed_ms,
            succeeded,
            total = aggregate.stages.len(),
            "analysis finished"
        );
        aggregate
    }

    /// Permission check, then every stage except `status`.
    async fn run_gated(
        &self,
        ctx: StageContext,
        deadline: Instant,
    ) -> Vec<(StageName, StageResult<StagePayload>)> {
        let robots = self.launch(StageName::Robots, ctx.clone(), deadline).await;
        let verdict = verdict_of(&robots);

        let independent = StageName::ALL
            .into_iter()
            .filter(|stage| {
                !matches!(
                    stage,
                    StageName::Robots | StageName::Status | StageName::Metadata
                ) && !stages::requirement(*stage).needs_metadata
            })
            .map(|stage| self.gated(stage, ctx.clone(), verdict, deadline))
            .collect::<Vec<_>>();

        let (independent, dependent) = tokio::join!(
            join_all(independent),
            self.run_metadata_chain(ctx, verdict, deadline),
        );

        let mut results = vec![(StageName::Robots, robots)];
        results.extend(independent);
        results.extend(dependent);
        results
    }

    /// Metadata, then the stages that consume it.
    async fn run_metadata_chain(
        &self,
        mut ctx: StageContext,
        verdict: Option<PermissionVerdict>,
        deadline: Instant,
    ) -> Vec<(StageName, StageResult<StagePayload>)> {
        let (_, metadata) = self
            .gated(StageName::Metadata, ctx.clone(), verdict, deadline)
            .await;
        ctx.metadata = metadata
            .success()
            .and_then(StagePayload::as_metadata)
            .cloned();

        let dependents = StageName::ALL
            .into_iter()
            .filter(|stage| stages::requirement(*stage).needs_metadata)
            .map(|stage| self.gated(stage, ctx.clone(), verdict, deadline));

        let mut results = vec![(StageName::Metadata, metadata)];
        results.extend(join_all(dependents).await);
        results
    }

    /// Apply the stage's preconditions and run it if they hold.
    async fn gated(
        &self,
        stage: StageName,
        ctx: StageContext,
        verdict: Option<PermissionVerdict>,
        deadline: Instant,
    ) -> (StageName, StageResult<StagePayload>) {
        let requirement = stages::requirement(stage);
        if let Err(reason) = stages::gate(requirement.permission, verdict.as_ref()) {
            return (stage, StageResult::Skipped(reason));
        }
        if requirement.needs_metadata && ctx.metadata.is_none() {
            return (stage, StageResult::Skipped(SkipReason::UpstreamFailed));
        }
        if stage == StageName::Screenshot && ctx.screenshots.is_none() {
            return (stage, StageResult::Skipped(SkipReason::NotConfigured));
        }
        (stage, self.launch(stage, ctx, deadline).await)
    }

    /// Run one stage in its own task under `min(stage timeout, deadline)`.
    async fn launch(
        &self,
        stage: StageName,
        ctx: StageContext,
        deadline: Instant,
    ) -> StageResult<StagePayload> {
        let bound = deadline.min(Instant::now() + self.limits.stage_timeout);
        let task = tokio::spawn(async move { stages::execute(stage, &ctx).await });
        let _guard = AbortOnDrop(task.abort_handle());

        let result = match tokio::time::timeout_at(bound, task).await {
            Ok(Ok(Ok(payload))) => StageResult::Success(payload),
            Ok(Ok(Err(e))) => StageResult::Failure(e.to_info()),
            Ok(Err(join_error)) => {
                let message = if join_error.is_panic() {
                    format!("{} stage panicked", stage)
                } else {
                    format!("{} stage was cancelled", stage)
                };
                StageResult::Failure(ErrorInfo::new(ErrorKind::Internal, message))
            }
            Err(_) => StageResult::Failure(ErrorInfo::new(
                ErrorKind::Timeout,
                format!("{} stage did not finish in time", stage),
            )),
        };

        if let StageResult::Failure(info) = &result {
            tracing::warn!(stage = %stage, code = info.kind.code(), "stage failed: {}", info.message);
        }
        result
    }

    /// Run a single stage on its own, honouring its preconditions.
    ///
    /// Unlike [`run`](Self::run) this reports problems as errors: a denied
    /// permission is `PermissionDenied`, an unreachable directive document is
    /// the directive error, and a failed metadata stage is `UpstreamFailed`
    /// for the stages that consume it.
    pub async fn run_stage(&self, raw: &str, stage: StageName) -> AnalysisResult<StagePayload> {
        let url = Self::parse_target(raw)?;
        let deadline = Instant::now() + self.limits.request_deadline;
        let mut ctx = self.context(url);
        let requirement = stages::requirement(stage);

        let verdict = if requirement.permission != stages::PermissionRequirement::None
            || requirement.needs_metadata
        {
            let robots = self.launch(StageName::Robots, ctx.clone(), deadline).await;
            let verdict = verdict_of(&robots);
            if let StageResult::Failure(info) = robots {
                return Err(info.into());
            }
            verdict
        } else {
            None
        };

        if requirement.needs_metadata {
            permit(StageName::Metadata, verdict, &ctx.url)?;
            match self.launch(StageName::Metadata, ctx.clone(), deadline).await {
                StageResult::Success(payload) => ctx.metadata = payload.as_metadata().cloned(),
                other => {
                    let detail = other
                        .failure()
                        .map(|info| info.message.clone())
                        .unwrap_or_else(|| "metadata stage did not run".to_string());
                    return Err(AnalysisError::UpstreamFailed(format!(
                        "{} needs page metadata: {}",
                        stage, detail
                    )));
                }
            }
        }

        permit(stage, verdict, &ctx.url)?;
        match self.launch(stage, ctx, deadline).await {
            StageResult::Success(payload) => Ok(payload),
            StageResult::Failure(info) => Err(info.into()),
            StageResult::Skipped(reason) => Err(AnalysisError::Internal(format!(
                "{} stage skipped: {:?}",
                stage, reason
            ))),
        }
    }

    pub async fn read_robots(&self, raw: &str) -> AnalysisResult<RobotsReport> {
        match self.run_stage(raw, StageName::Robots).await? {
            StagePayload::Robots(report) => Ok(report),
            _ => Err(AnalysisError::Internal(
                "robots stage returned another payload".to_string(),
            )),
        }
    }

    /// Live/parked breakdown for a comma-separated list of URLs.
    pub async fn status_summary(&self, raw_list: &str) -> AnalysisResult<StatusSummary> {
        let urls = raw_list
            .split(',')
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(Self::parse_target)
            .collect::<AnalysisResult<Vec<_>>>()?;
        if urls.is_empty() {
            return Err(AnalysisError::InvalidUrl("url is required".to_string()));
        }

        let deadline = Instant::now() + self.limits.request_deadline;
        let checks = join_all(urls.into_iter().map(|url| {
            let ctx = self.context(url);
            async move {
                match self.launch(StageName::Status, ctx, deadline).await {
                    StageResult::Success(StagePayload::Status(check)) => check,
                    _ => status::unreachable(),
                }
            }
        }))
        .await;

        Ok(status::summarize(&checks))
    }
}

fn verdict_of(robots: &StageResult<StagePayload>) -> Option<PermissionVerdict> {
    match robots.success() {
        Some(StagePayload::Robots(report)) => Some(PermissionVerdict {
            base_url_allowed: report.is_base_url_allowed,
            path_allowed: report.is_url_scrapable,
        }),
        _ => None,
    }
}

fn permit(stage: StageName, verdict: Option<PermissionVerdict>, url: &Url) -> AnalysisResult<()> {
    stages::gate(stages::requirement(stage).permission, verdict.as_ref()).map_err(|reason| {
        match reason {
            SkipReason::PermissionDenied => AnalysisError::PermissionDenied(format!(
                "robots.txt does not allow {} for {}",
                stage,
                redact_url(url.as_str())
            )),
            other => AnalysisError::Internal(format!("{} stage cannot run: {:?}", stage, other)),
        }
    })
}
