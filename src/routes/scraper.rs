// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! `/scraper` route handlers.
//!
//! Every handler takes the target in `?url=`. A missing or malformed URL is
//! answered with 400, a path forbidden by robots.txt with 403, and anything
//! else that goes wrong with the uniform error envelope.

use crate::app::AppState;
use crate::error::AnalysisError;
use crate::models::analysis::{
    AddressList, ContactInfo, ImageList, IndustryClassification, LogoCandidate, NewsList,
    PageMetadata, ResultAggregate, ReviewSummary, Screenshot, SentimentSummary, SeoSignals,
    ShareSummary, StagePayload, StatusCheck, StatusSummary,
};
use crate::models::api::{ErrorEnvelope, UrlQuery};
use crate::models::directive::RobotsReport;
use crate::models::stage::StageName;
use crate::models::version::VersionResponse;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "site-analyzer", description = "Website analysis API"),
    components(schemas(
        ResultAggregate,
        RobotsReport,
        PageMetadata,
        ImageList,
        LogoCandidate,
        ContactInfo,
        AddressList,
        SeoSignals,
        IndustryClassification,
        Screenshot,
        SentimentSummary,
        NewsList,
        ShareSummary,
        ReviewSummary,
        StatusCheck,
        StatusSummary,
        ErrorEnvelope,
        VersionResponse
    ))
)]
pub struct ScraperApiDoc;

/// Create the scraper router with every analysis route.
pub fn scraper_router() -> Router<AppState> {
    Router::new()
        .route("/scraper", get(analyze_handler))
        .route("/scraper/read-robots", get(read_robots_handler))
        .route("/scraper/scrape-metadata", get(metadata_handler))
        .route("/scraper/classify-industry", get(classify_industry_handler))
        .route("/scraper/scrape-images", get(images_handler))
        .route("/scraper/scrape-logo", get(logo_handler))
        .route("/scraper/scrape-contact-info", get(contact_info_handler))
        .route("/scraper/scrape-addresses", get(addresses_handler))
        .route("/scraper/scrape-seo", get(seo_handler))
        .route("/scraper/screenshot", get(screenshot_handler))
        .route("/scraper/sentiment", get(sentiment_handler))
        .route("/scraper/scrape-news", get(news_handler))
        .route("/scraper/shareCount", get(share_count_handler))
        .route("/scraper/scrape-reviews", get(reviews_handler))
        .route("/scraper/status", get(status_handler))
        .route("/scraper/status/summary", get(status_summary_handler))
}

fn target(query: &UrlQuery) -> &str {
    query.url.as_deref().unwrap_or_default()
}

async fn run_stage(
    state: &AppState,
    query: &UrlQuery,
    stage: StageName,
) -> Result<Json<StagePayload>, AnalysisError> {
    state
        .orchestrator
        .run_stage(target(query), stage)
        .await
        .map(Json)
}

/// Full analysis. Stage failures stay inside the aggregate; only an
/// unusable URL fails the request.
pub async fn analyze_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<ResultAggregate>, AnalysisError> {
    let aggregate = state.orchestrator.run(target(&query)).await;
    match aggregate.error {
        Some(info) => Err(info.into()),
        None => Ok(Json(aggregate)),
    }
}

pub async fn read_robots_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<RobotsReport>, AnalysisError> {
    state.orchestrator.read_robots(target(&query)).await.map(Json)
}

pub async fn metadata_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<StagePayload>, AnalysisError> {
    run_stage(&state, &query, StageName::Metadata).await
}

pub async fn classify_industry_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<StagePayload>, AnalysisError> {
    run_stage(&state, &query, StageName::Classification).await
}

pub async fn images_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<StagePayload>, AnalysisError> {
    run_stage(&state, &query, StageName::Images).await
}

pub async fn logo_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<StagePayload>, AnalysisError> {
    run_stage(&state, &query, StageName::Logo).await
}

pub async fn contact_info_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<StagePayload>, AnalysisError> {
    run_stage(&state, &query, StageName::ContactInfo).await
}

pub async fn addresses_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<StagePayload>, AnalysisError> {
    run_stage(&state, &query, StageName::Addresses).await
}

pub async fn seo_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<StagePayload>, AnalysisError> {
    run_stage(&state, &query, StageName::Seo).await
}

pub async fn screenshot_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<StagePayload>, AnalysisError> {
    run_stage(&state, &query, StageName::Screenshot).await
}

pub async fn sentiment_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<StagePayload>, AnalysisError> {
    run_stage(&state, &query, StageName::Sentiment).await
}

pub async fn news_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<StagePayload>, AnalysisError> {
    run_stage(&state, &query, StageName::News).await
}

pub async fn share_count_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<StagePayload>, AnalysisError> {
    run_stage(&state, &query, StageName::ShareCount).await
}

pub async fn reviews_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<StagePayload>, AnalysisError> {
    run_stage(&state, &query, StageName::Reviews).await
}

pub async fn status_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<StagePayload>, AnalysisError> {
    run_stage(&state, &query, StageName::Status).await
}

/// `url` may hold several comma-separated URLs.
pub async fn status_summary_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<StatusSummary>, AnalysisError> {
    state
        .orchestrator
        .status_summary(target(&query))
        .await
        .map(Json)
}
