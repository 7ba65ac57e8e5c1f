// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::directive::RobotsReport;
use crate::models::stage::{ErrorInfo, StageName, StageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

// ============================================================================
// Stage payloads
// ============================================================================

/// Document-level metadata from `<title>` and `<meta>` tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
}

impl PageMetadata {
    /// Title, description and keywords joined with spaces, skipping blanks.
    pub fn classification_text(&self) -> String {
        [&self.title, &self.description, &self.keywords]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageList {
    pub images: Vec<String>,
    pub count: usize,
}

/// Where a logo candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LogoSource {
    OgImage,
    LogoImage,
    IconLink,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoCandidate {
    pub url: Option<String>,
    pub source: LogoSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub social_profiles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressList {
    pub addresses: Vec<String>,
}

/// On-page SEO signals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeoSignals {
    pub title_length: usize,
    pub description_length: usize,
    pub h1_count: usize,
    pub canonical_url: Option<String>,
    pub robots_meta: Option<String>,
    pub lang: Option<String>,
    pub has_viewport: bool,
    pub image_count: usize,
    pub images_missing_alt: usize,
    pub word_count: usize,
}

/// A single inference label. `score` is absent for the fallback label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelScore {
    pub label: String,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IndustryClassification {
    pub metadata_class: LabelScore,
    pub domain_class: LabelScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Screenshot {
    pub content_type: String,
    pub byte_length: usize,
    pub data_base64: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSummary {
    pub label: SentimentLabel,
    /// In `[-1.0, 1.0]`
    pub score: f64,
    pub positive_terms: usize,
    pub negative_terms: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCheck {
    pub live: bool,
    pub http_status: Option<u16>,
    pub parked: bool,
    pub final_url: Option<String>,
}

/// Live-vs-parked breakdown over several URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub total: usize,
    pub live: usize,
    pub parked: usize,
    pub down: usize,
    pub live_percentage: f64,
    pub parked_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsList {
    pub articles: Vec<NewsArticle>,
}

/// Outbound social share/profile link counts per platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareSummary {
    pub platforms: BTreeMap<String, usize>,
    pub total: usize,
}

/// schema.org rating data found in JSON-LD.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub rating_value: Option<f64>,
    pub review_count: Option<u64>,
    pub best_rating: Option<f64>,
    pub reviews_on_page: usize,
}

/// Any stage's success value. Serialised as the bare inner object.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum StagePayload {
    Robots(RobotsReport),
    Status(StatusCheck),
    Metadata(PageMetadata),
    Images(ImageList),
    Logo(LogoCandidate),
    ContactInfo(ContactInfo),
    Addresses(AddressList),
    Seo(SeoSignals),
    Classification(IndustryClassification),
    Screenshot(Screenshot),
    Sentiment(SentimentSummary),
    News(NewsList),
    ShareCount(ShareSummary),
    Reviews(ReviewSummary),
}

impl StagePayload {
    pub fn as_metadata(&self) -> Option<&PageMetadata> {
        match self {
            StagePayload::Metadata(metadata) => Some(metadata),
            _ => None,
        }
    }
}

// ============================================================================
// Aggregate
// ============================================================================

/// Everything learned about one URL, keyed by stage.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultAggregate {
    pub request_id: Uuid,
    pub url: String,
    pub analyzed_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Set only when no stage could run at all (malformed input)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub stages: BTreeMap<StageName, StageResult<StagePayload>>,
}

impl ResultAggregate {
    pub fn stage(&self, name: StageName) -> Option<&StageResult<StagePayload>> {
        self.stages.get(&name)
    }
}
