// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Interpretation of crawl-directive (robots.txt) documents.
//!
//! Only the wildcard `User-agent: *` group is considered. The policy is
//! permissive: unless the group contains `Disallow: /`, the root path is
//! allowed and so is everything under it. `Disallow` rules other than the
//! blanket one are recorded for reporting but never consulted by
//! [`evaluate`]. Rules are tested in order and the first match wins; there is
//! no "most specific rule" ranking.

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::directive::{
    DirectiveDocument, DirectiveRuleSet, PathPattern, PermissionVerdict, RobotsReport,
};
use url::Url;

/// Build the wildcard-group rule set for a directive document.
pub fn parse(document: &DirectiveDocument) -> AnalysisResult<DirectiveRuleSet> {
    if document.content.trim().is_empty() {
        return Err(AnalysisError::EmptyDocument(document.origin.clone()));
    }

    let mut rules = DirectiveRuleSet::default();
    let mut in_wildcard_group = false;

    for raw_line in document.content.lines() {
        let line = strip_comment(raw_line).trim();
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let field = field.trim();
        let value = value.trim();

        if field.eq_ignore_ascii_case("user-agent") {
            in_wildcard_group = value == "*";
        } else if !in_wildcard_group {
            continue;
        } else if field.eq_ignore_ascii_case("disallow") {
            if value == "/" {
                rules.root_disallowed = true;
            }
            if !value.is_empty() {
                push_unique(&mut rules.disallowed_paths, value);
            }
        } else if field.eq_ignore_ascii_case("allow") && value.starts_with('/') {
            push_unique(&mut rules.allowed_paths, value);
        }
    }

    if !rules.root_disallowed {
        push_unique(&mut rules.allowed_paths, "/");
    }

    Ok(rules)
}

/// Whether `path` matches any allowed pattern.
pub fn evaluate(rules: &DirectiveRuleSet, path: &str) -> bool {
    rules.allowed_paths.iter().any(|pattern| pattern.matches(path))
}

pub fn is_root_path_allowed(rules: &DirectiveRuleSet) -> bool {
    evaluate(rules, "/")
}

/// Path plus query, the form directive rules are written against.
pub fn request_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

pub fn verdict(rules: &DirectiveRuleSet, url: &Url) -> PermissionVerdict {
    PermissionVerdict {
        base_url_allowed: is_root_path_allowed(rules),
        path_allowed: evaluate(rules, &request_path(url)),
    }
}

/// Display form of the rule set for the `read-robots` endpoint.
pub fn report(rules: &DirectiveRuleSet, url: &Url) -> RobotsReport {
    let verdict = verdict(rules, url);
    RobotsReport {
        base_url: url.origin().ascii_serialization(),
        allowed_paths: rules.allowed_strings(),
        disallowed_paths: rules.disallowed_strings(),
        is_base_url_allowed: verdict.base_url_allowed,
        is_url_scrapable: verdict.path_allowed,
        sitemaps: Vec::new(),
        crawl_delay: None,
    }
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or_default()
}

fn push_unique(patterns: &mut Vec<PathPattern>, raw: &str) {
    if patterns.iter().any(|p| p.as_str() == raw) {
        return;
    }
    match PathPattern::new(raw) {
        Ok(pattern) => patterns.push(pattern),
        Err(e) => tracing::warn!(rule = raw, "skipping uncompilable directive rule: {}", e),
    }
}
