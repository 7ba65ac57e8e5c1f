// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Liveness and parked-domain detection.

use crate::models::analysis::{StatusCheck, StatusSummary};
use crate::services::session_pool::FetchedPage;

/// Phrases domain parking pages commonly carry.
const PARKED_PHRASES: &[&str] = &[
    "this domain is for sale",
    "domain is for sale",
    "buy this domain",
    "this domain may be for sale",
    "domain parked",
    "parked free",
    "parked domain",
    "domain has expired",
    "sedoparking",
    "hugedomains",
    "dan.com",
];

pub fn is_parked(body: &str) -> bool {
    let body = body.to_lowercase();
    PARKED_PHRASES.iter().any(|phrase| body.contains(phrase))
}

/// Status for a page that answered; anything below 400 counts as live.
pub fn check_page(page: &FetchedPage) -> StatusCheck {
    let live = page.status < 400;
    StatusCheck {
        live,
        http_status: Some(page.status),
        parked: live && is_parked(&page.body),
        final_url: Some(page.final_url.to_string()),
    }
}

/// Status for a site that could not be reached at all.
pub fn unreachable() -> StatusCheck {
    StatusCheck {
        live: false,
        http_status: None,
        parked: false,
        final_url: None,
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 10000.0 / total as f64).round() / 100.0
}

/// Parked sites are live sites too; `live` counts both.
pub fn summarize(checks: &[StatusCheck]) -> StatusSummary {
    let total = checks.len();
    let live = checks.iter().filter(|c| c.live).count();
    let parked = checks.iter().filter(|c| c.parked).count();

    StatusSummary {
        total,
        live,
        parked,
        down: total - live,
        live_percentage: percentage(live, total),
        parked_percentage: percentage(parked, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn page(status: u16, body: &str) -> FetchedPage {
        FetchedPage {
            final_url: Url::parse("https://example.com/").unwrap(),
            status,
            location: None,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_parked_detection_is_case_insensitive() {
        assert!(is_parked("<h1>This Domain Is For Sale!</h1>"));
        assert!(!is_parked("<h1>Welcome to Acme</h1>"));
    }

    #[test]
    fn test_check_page() {
        let live = check_page(&page(200, "<p>shop</p>"));
        assert!(live.live);
        assert!(!live.parked);
        assert_eq!(live.http_status, Some(200));

        let parked = check_page(&page(200, "buy this domain today"));
        assert!(parked.live && parked.parked);

        let down = check_page(&page(503, "domain parked"));
        assert!(!down.live);
        assert!(!down.parked);
    }

    #[test]
    fn test_summarize_rounds_percentages() {
        let checks = vec![
            check_page(&page(200, "ok")),
            check_page(&page(200, "domain is for sale")),
            unreachable(),
        ];
        let summary = summarize(&checks);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.live, 2);
        assert_eq!(summary.parked, 1);
        assert_eq!(summary.down, 1);
        assert_eq!(summary.live_percentage, 66.67);
        assert_eq!(summary.parked_percentage, 33.33);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.live_percentage, 0.0);
    }
}
