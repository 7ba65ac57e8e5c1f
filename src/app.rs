// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, top-level handlers, and router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::models::version::VersionResponse;
use crate::routes::{scraper_router, ScraperApiDoc};
use crate::services::orchestrator::AnalysisOrchestrator;
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `SITE_ANALYZER_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("SITE_ANALYZER_VERSION");

pub const SERVICE_NAME: &str = "site-analyzer";

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: SERVICE_NAME.to_string(),
        version: VERSION.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum application router: `/version`, the `/scraper` routes and Swagger UI.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(version_handler))
        .merge(scraper_router())
        .with_state(state)
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ScraperApiDoc::openapi()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::api::ErrorEnvelope;
    use crate::services::classification::ClassificationClient;
    use crate::services::directive_store::DirectiveStore;
    use crate::services::orchestrator::OrchestratorLimits;
    use crate::services::session_pool::SessionPool;
    use crate::services::testing::{FakeDirectives, FakePages, SHOP_HTML};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    fn create_test_app(robots: &str) -> Router {
        let orchestrator = AnalysisOrchestrator::new(
            Arc::new(DirectiveStore::new(
                Arc::new(FakeDirectives::serving(robots)),
                Duration::from_secs(60),
            )),
            Arc::new(SessionPool::new(
                Arc::new(FakePages::default().with_page("/", 200, SHOP_HTML)),
                4,
                Duration::from_secs(5),
            )),
            Arc::new(ClassificationClient::new(None)),
            None,
            OrchestratorLimits {
                stage_timeout: Duration::from_secs(5),
                request_deadline: Duration::from_secs(10),
            },
        );
        create_router(AppState {
            orchestrator: Arc::new(orchestrator),
        })
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    const ENDPOINTS: [&str; 16] = [
        "/scraper",
        "/scraper/read-robots",
        "/scraper/scrape-metadata",
        "/scraper/classify-industry",
        "/scraper/scrape-images",
        "/scraper/scrape-logo",
        "/scraper/scrape-contact-info",
        "/scraper/scrape-addresses",
        "/scraper/scrape-seo",
        "/scraper/screenshot",
        "/scraper/sentiment",
        "/scraper/scrape-news",
        "/scraper/shareCount",
        "/scraper/scrape-reviews",
        "/scraper/status",
        "/scraper/status/summary",
    ];

    #[tokio::test]
    async fn test_invalid_url_is_bad_request_everywhere() {
        for endpoint in ENDPOINTS {
            for query in ["?url=invalid-url", ""] {
                let app = create_test_app("User-agent: *\nAllow: /\n");
                let (status, body) = get_json(app, &format!("{endpoint}{query}")).await;
                assert_eq!(status, StatusCode::BAD_REQUEST, "{endpoint}{query}");

                let envelope: ErrorEnvelope = serde_json::from_value(body).unwrap();
                assert_eq!(envelope.error_status, 400);
                assert_eq!(envelope.error_code, "INVALID_URL");
            }
        }
    }

    #[tokio::test]
    async fn test_read_robots() {
        let app = create_test_app("User-agent: *\nDisallow: /account/*\n");
        let (status, body) = get_json(app, "/scraper/read-robots?url=https://www.acme.test/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["baseUrl"], "https://www.acme.test");
        assert_eq!(body["allowedPaths"], serde_json::json!(["/"]));
        assert_eq!(body["disallowedPaths"], serde_json::json!(["/account/*"]));
        assert_eq!(body["isBaseUrlAllowed"], true);
        assert_eq!(body["isUrlScrapable"], true);
    }

    #[tokio::test]
    async fn test_denied_stage_is_forbidden() {
        let app = create_test_app("User-agent: *\nDisallow: /\n");
        let (status, body) =
            get_json(app, "/scraper/scrape-metadata?url=https://www.acme.test/").await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["errorCode"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn test_metadata_payload_is_bare_object() {
        let app = create_test_app("User-agent: *\nAllow: /\n");
        let (status, body) =
            get_json(app, "/scraper/scrape-metadata?url=https://www.acme.test/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Acme Tools");
        assert_eq!(body["ogImage"], "https://www.acme.test/img/og.png");
    }

    #[tokio::test]
    async fn test_screenshot_without_renderer_is_unavailable() {
        let app = create_test_app("User-agent: *\nAllow: /\n");
        let (status, body) = get_json(app, "/scraper/screenshot?url=https://www.acme.test/").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["errorCode"], "NOT_CONFIGURED");
    }

    #[tokio::test]
    async fn test_full_analysis_keeps_partial_failures_inside() {
        let app = create_test_app("User-agent: *\nAllow: /\n");
        let (status, body) = get_json(app, "/scraper?url=https://www.acme.test/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stages"]["metadata"]["status"], "success");
        assert_eq!(body["stages"]["screenshot"]["status"], "skipped");
        assert_eq!(body["stages"]["screenshot"]["value"], "not_configured");
        assert_eq!(
            body["stages"]["classification"]["value"]["metadataClass"]["label"],
            "No classification"
        );
        assert!(body["requestId"].is_string());
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_status_summary_endpoint() {
        let app = create_test_app("User-agent: *\nAllow: /\n");
        let (status, body) = get_json(
            app,
            "/scraper/status/summary?url=https://a.test/,https://b.test/gone",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["live"], 1);
        assert_eq!(body["down"], 1);
        assert_eq!(body["livePercentage"], 50.0);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let app = create_test_app("User-agent: *\nAllow: /\n");
        let (status, body) = get_json(app, "/api-docs/openapi.json").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["components"]["schemas"]["ResultAggregate"].is_object());
    }
}
