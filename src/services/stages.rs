// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! The fixed set of analysis stages: what each one needs before it may run,
//! and how it produces its payload.

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::analysis::{
    IndustryClassification, LogoCandidate, LogoSource, PageMetadata, StagePayload, StatusCheck,
};
use crate::models::directive::{PermissionVerdict, RobotsReport};
use crate::models::stage::{SkipReason, StageName};
use crate::services::classification::ClassificationClient;
use crate::services::directive_policy;
use crate::services::directive_store::DirectiveStore;
use crate::services::logging::redact_url;
use crate::services::screenshot::Screenshotter;
use crate::services::session_pool::{FetchedPage, PageSession, SessionPool};
use crate::services::{contact, extract, sentiment, status};
use std::sync::Arc;
use url::Url;

/// Redirect hops followed before a page fetch gives up.
pub const MAX_REDIRECTS: usize = 10;

/// Which permission check a stage needs before it may touch the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionRequirement {
    None,
    /// The origin's root must be crawlable
    BaseUrl,
    /// The exact requested path must be crawlable
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageRequirement {
    pub permission: PermissionRequirement,
    pub needs_metadata: bool,
}

pub fn requirement(stage: StageName) -> StageRequirement {
    use PermissionRequirement::{BaseUrl, None, Path};

    let (permission, needs_metadata) = match stage {
        StageName::Robots | StageName::Status => (None, false),
        StageName::Metadata => (BaseUrl, false),
        StageName::Logo => (Path, true),
        StageName::Classification => (None, true),
        StageName::News | StageName::ShareCount => (BaseUrl, false),
        StageName::Images
        | StageName::ContactInfo
        | StageName::Addresses
        | StageName::Seo
        | StageName::Screenshot
        | StageName::Sentiment
        | StageName::Reviews => (Path, false),
    };

    StageRequirement {
        permission,
        needs_metadata,
    }
}

/// Check a permission requirement against the verdict, if one could be reached.
pub fn gate(
    permission: PermissionRequirement,
    verdict: Option<&PermissionVerdict>,
) -> Result<(), SkipReason> {
    match (permission, verdict) {
        (PermissionRequirement::None, _) => Ok(()),
        (_, None) => Err(SkipReason::PermissionUnavailable),
        (PermissionRequirement::BaseUrl, Some(v)) if v.base_url_allowed => Ok(()),
        (PermissionRequirement::Path, Some(v)) if v.path_allowed => Ok(()),
        _ => Err(SkipReason::PermissionDenied),
    }
}

/// Everything a stage may use. Cloned into each stage task.
#[derive(Clone)]
pub struct StageContext {
    pub url: Url,
    pub directives: Arc<DirectiveStore>,
    pub pages: Arc<SessionPool>,
    pub classifier: Arc<ClassificationClient>,
    pub screenshots: Option<Arc<dyn Screenshotter>>,
    /// Present once the metadata stage has succeeded
    pub metadata: Option<PageMetadata>,
}

impl StageContext {
    /// Fetch the target page with a 2xx answer, re-checking `permission` on every redirect hop.
    async fn fetch_page(&self, permission: PermissionRequirement) -> AnalysisResult<FetchedPage> {
        let session = self.pages.acquire().await?;
        let page = self.follow_redirects(&session, permission).await?;
        if !page.is_success() {
            return Err(AnalysisError::UpstreamFetchFailed(format!(
                "{} returned HTTP {}",
                redact_url(page.final_url.as_str()),
                page.status
            )));
        }
        Ok(page)
    }

    async fn follow_redirects(
        &self,
        session: &PageSession,
        permission: PermissionRequirement,
    ) -> AnalysisResult<FetchedPage> {
        let mut url = self.url.clone();
        for _ in 0..=MAX_REDIRECTS {
            let page = session.open(&url).await?;
            let Some(next) = page.redirect_target() else {
                return Ok(page);
            };
            self.check_redirect(permission, &next).await?;
            url = next;
        }
        Err(AnalysisError::UpstreamFetchFailed(format!(
            "{} redirected more than {} times",
            redact_url(self.url.as_str()),
            MAX_REDIRECTS
        )))
    }

    /// A redirect target, possibly on another origin, must pass the same check as the request.
    async fn check_redirect(
        &self,
        permission: PermissionRequirement,
        target: &Url,
    ) -> AnalysisResult<()> {
        if permission == PermissionRequirement::None {
            return Ok(());
        }
        let resolved = self.directives.resolve(target).await?;
        let verdict = directive_policy::verdict(&resolved.rules, target);
        gate(permission, Some(&verdict)).map_err(|_| {
            AnalysisError::PermissionDenied(format!(
                "robots.txt does not allow redirect target {}",
                redact_url(target.as_str())
            ))
        })
    }

    fn require_metadata(&self, stage: StageName) -> AnalysisResult<&PageMetadata> {
        self.metadata.as_ref().ok_or_else(|| {
            AnalysisError::UpstreamFailed(format!("{} needs page metadata", stage))
        })
    }
}

/// Directive report for `url` with sitemap and crawl-delay data filled in.
pub async fn robots_report(directives: &DirectiveStore, url: &Url) -> AnalysisResult<RobotsReport> {
    let resolved = directives.resolve(url).await?;
    let mut report = directive_policy::report(&resolved.rules, url);
    report.sitemaps = resolved.extras.sitemaps.clone();
    report.crawl_delay = resolved.extras.crawl_delay;
    Ok(report)
}

/// Run one stage. Gating is the caller's job.
pub async fn execute(stage: StageName, ctx: &StageContext) -> AnalysisResult<StagePayload> {
    let payload = match stage {
        StageName::Robots => StagePayload::Robots(robots_report(&ctx.directives, &ctx.url).await?),
        StageName::Status => StagePayload::Status(check_status(ctx).await?),
        StageName::Logo => StagePayload::Logo(find_logo(ctx).await?),
        StageName::Classification => StagePayload::Classification(classify(ctx).await?),
        StageName::Screenshot => {
            let Some(screenshots) = &ctx.screenshots else {
                return Err(AnalysisError::NotConfigured(
                    "no screenshot renderer configured".to_string(),
                ));
            };
            let _session = ctx.pages.acquire().await?;
            StagePayload::Screenshot(screenshots.capture(&ctx.url).await?.into_payload())
        }
        StageName::Metadata
        | StageName::Images
        | StageName::ContactInfo
        | StageName::Addresses
        | StageName::Seo
        | StageName::Sentiment
        | StageName::News
        | StageName::ShareCount
        | StageName::Reviews => {
            let page = ctx.fetch_page(requirement(stage).permission).await?;
            extract_from_page(stage, &page)
        }
    };
    Ok(payload)
}

/// Stages that are a pure function of the fetched page.
fn extract_from_page(stage: StageName, page: &FetchedPage) -> StagePayload {
    let html = page.body.as_str();
    let base = &page.final_url;
    match stage {
        StageName::Images => StagePayload::Images(extract::extract_images(html, base)),
        StageName::ContactInfo => {
            StagePayload::ContactInfo(contact::extract_contact_info(html, base))
        }
        StageName::Addresses => StagePayload::Addresses(contact::extract_addresses(html)),
        StageName::Seo => StagePayload::Seo(extract::extract_seo_signals(html)),
        StageName::Sentiment => {
            StagePayload::Sentiment(sentiment::analyze(&extract::visible_text(html)))
        }
        StageName::News => StagePayload::News(extract::extract_news(html, base)),
        StageName::ShareCount => {
            StagePayload::ShareCount(extract::summarize_share_links(html, base))
        }
        StageName::Reviews => StagePayload::Reviews(extract::extract_reviews(html)),
        _ => StagePayload::Metadata(extract::extract_metadata(html, base)),
    }
}

/// Unreachable sites are a valid answer here, not a failure; timeouts are not.
async fn check_status(ctx: &StageContext) -> AnalysisResult<StatusCheck> {
    let session = ctx.pages.acquire().await?;
    match ctx
        .follow_redirects(&session, PermissionRequirement::None)
        .await
    {
        Ok(page) => Ok(status::check_page(&page)),
        Err(e @ AnalysisError::Timeout(_)) => Err(e),
        Err(e) => {
            tracing::debug!(code = e.kind().code(), "site unreachable: {}", e);
            Ok(status::unreachable())
        }
    }
}

async fn find_logo(ctx: &StageContext) -> AnalysisResult<LogoCandidate> {
    let metadata = ctx.require_metadata(StageName::Logo)?;
    if let Some(og_image) = &metadata.og_image {
        return Ok(LogoCandidate {
            url: Some(og_image.clone()),
            source: LogoSource::OgImage,
        });
    }

    let page = ctx.fetch_page(PermissionRequirement::Path).await?;
    Ok(
        extract::find_logo(&page.body, &page.final_url).unwrap_or(LogoCandidate {
            url: None,
            source: LogoSource::NotFound,
        }),
    )
}

async fn classify(ctx: &StageContext) -> AnalysisResult<IndustryClassification> {
    let metadata = ctx.require_metadata(StageName::Classification)?;
    let host = ctx.url.host_str().unwrap_or_default();
    let domain = host.strip_prefix("www.").unwrap_or(host);

    let classification_text = metadata.classification_text();
    let (metadata_class, domain_class) = tokio::join!(
        ctx.classifier.classify(&classification_text),
        ctx.classifier.classify(domain),
    );

    Ok(IndustryClassification {
        metadata_class,
        domain_class,
    })
}
