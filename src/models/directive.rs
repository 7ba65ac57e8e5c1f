// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

/// Raw crawl-directive text together with the URL it was fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveDocument {
    /// Location of the directive file, e.g. `https://example.com/robots.txt`
    pub origin: String,
    pub content: String,
}

/// A directive path rule compiled for matching.
///
/// `*` matches any run of characters and a rule matches every path that
/// starts with it. Every other character, `$` included, is taken literally.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    regex: Regex,
}

impl PathPattern {
    pub fn new(raw: &str) -> Result<Self, regex::Error> {
        let escaped = raw
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        let regex = Regex::new(&format!("^{}.*$", escaped))?;

        Ok(Self {
            raw: raw.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Literal equality first, then the compiled pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.raw == path || self.regex.is_match(path)
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for PathPattern {}

impl Serialize for PathPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Rules of the wildcard (`*`) user-agent group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveRuleSet {
    pub allowed_paths: Vec<PathPattern>,
    /// Collected for display only; permission checks never consult it.
    pub disallowed_paths: Vec<PathPattern>,
    pub root_disallowed: bool,
}

impl DirectiveRuleSet {
    pub fn allowed_strings(&self) -> Vec<String> {
        self.allowed_paths
            .iter()
            .map(|p| p.as_str().to_string())
            .collect()
    }

    pub fn disallowed_strings(&self) -> Vec<String> {
        self.disallowed_paths
            .iter()
            .map(|p| p.as_str().to_string())
            .collect()
    }
}

/// Permission answer for one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionVerdict {
    /// Is the origin's root crawlable
    pub base_url_allowed: bool,
    /// Is this exact path crawlable
    pub path_allowed: bool,
}

impl PermissionVerdict {
    pub fn denied() -> Self {
        Self {
            base_url_allowed: false,
            path_allowed: false,
        }
    }
}

/// Response body of `GET /scraper/read-robots`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RobotsReport {
    pub base_url: String,
    pub allowed_paths: Vec<String>,
    pub disallowed_paths: Vec<String>,
    pub is_base_url_allowed: bool,
    pub is_url_scrapable: bool,
    pub sitemaps: Vec<String>,
    pub crawl_delay: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_pattern_matches_query_suffix() {
        let pattern = PathPattern::new("/*filter=Price").unwrap();
        assert!(pattern.matches("/search?filter=Price=10"));
        assert!(!pattern.matches("/search?other=1"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let pattern = PathPattern::new("/a.b+c").unwrap();
        assert!(pattern.matches("/a.b+c"));
        assert!(!pattern.matches("/axbbc"));
    }

    #[test]
    fn test_dollar_is_literal() {
        let pattern = PathPattern::new("/a$").unwrap();
        assert!(pattern.matches("/a$"));
        assert!(pattern.matches("/a$b"));
        assert!(!pattern.matches("/a"));
        assert!(!pattern.matches("/ab"));
    }

    #[test]
    fn test_pattern_is_prefix_anchored_at_start() {
        let pattern = PathPattern::new("/wishlist/universal*").unwrap();
        assert!(pattern.matches("/wishlist/universal/123"));
        assert!(!pattern.matches("/gp/wishlist/universal"));
    }

    #[test]
    fn test_pattern_equality_is_by_literal() {
        assert_eq!(PathPattern::new("/a*").unwrap(), PathPattern::new("/a*").unwrap());
        assert_ne!(PathPattern::new("/a*").unwrap(), PathPattern::new("/a").unwrap());
    }

    #[test]
    fn test_robots_report_serializes_camel_case() {
        let report = RobotsReport {
            base_url: "https://example.com".to_string(),
            allowed_paths: vec!["/".to_string()],
            disallowed_paths: vec![],
            is_base_url_allowed: true,
            is_url_scrapable: true,
            sitemaps: vec![],
            crawl_delay: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["baseUrl"], "https://example.com");
        assert_eq!(json["isBaseUrlAllowed"], true);
    }
}
