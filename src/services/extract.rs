// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! DOM extraction over fetched HTML, using the `scraper` crate.
//!
//! Everything here is synchronous: `scraper::Html` is not `Send`, so callers
//! parse and extract in one go and never hold a document across an await.

use crate::models::analysis::{
    ImageList, LogoCandidate, LogoSource, NewsArticle, NewsList, PageMetadata, ReviewSummary,
    SeoSignals, ShareSummary,
};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use url::Url;

/// Social platforms recognised in outbound links, keyed by host suffix.
pub(crate) const SOCIAL_PLATFORMS: &[(&str, &str)] = &[
    ("facebook.com", "facebook"),
    ("twitter.com", "twitter"),
    ("x.com", "twitter"),
    ("linkedin.com", "linkedin"),
    ("instagram.com", "instagram"),
    ("youtube.com", "youtube"),
    ("pinterest.com", "pinterest"),
    ("tiktok.com", "tiktok"),
    ("wa.me", "whatsapp"),
    ("whatsapp.com", "whatsapp"),
];

const MAX_NEWS_ARTICLES: usize = 25;

pub(crate) fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `content` of the first `<meta>` whose `name` or `property` equals `key`.
fn meta_content(document: &Html, key: &str) -> Option<String> {
    select_all(document, "meta")
        .into_iter()
        .find(|meta| {
            let element = meta.value();
            element
                .attr("name")
                .or_else(|| element.attr("property"))
                .is_some_and(|name| name.trim().eq_ignore_ascii_case(key))
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

/// Resolve `href` against `base`, keeping only http(s) results.
pub(crate) fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Social platform name for a link, if it points at one.
pub(crate) fn social_platform(link: &str) -> Option<&'static str> {
    let parsed = Url::parse(link).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    SOCIAL_PLATFORMS
        .iter()
        .find(|(suffix, _)| host == *suffix || host.ends_with(&format!(".{}", suffix)))
        .map(|(_, name)| *name)
}

/// Text content of the page without markup, scripts or styles.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut text = String::new();
    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| e.name()))
            .is_some_and(|name| matches!(name, "script" | "style" | "noscript" | "template"));
        let fragment = fragment.trim();
        if !hidden && !fragment.is_empty() {
            text.push(' ');
            text.push_str(fragment);
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn extract_metadata(html: &str, base: &Url) -> PageMetadata {
    let document = Html::parse_document(html);

    let title = select_all(&document, "title")
        .first()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .or_else(|| {
            select_all(&document, "h1")
                .first()
                .map(element_text)
                .filter(|t| !t.is_empty())
        });

    PageMetadata {
        title,
        description: meta_content(&document, "description"),
        keywords: meta_content(&document, "keywords"),
        og_title: meta_content(&document, "og:title"),
        og_description: meta_content(&document, "og:description"),
        og_image: meta_content(&document, "og:image").and_then(|src| resolve_url(base, &src)),
    }
}

pub fn extract_images(html: &str, base: &Url) -> ImageList {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for img in select_all(&document, "img") {
        let element = img.value();
        let candidates = [element.attr("src"), element.attr("data-src")];
        for src in candidates.into_iter().flatten() {
            if let Some(resolved) = resolve_url(base, src) {
                if seen.insert(resolved.clone()) {
                    images.push(resolved);
                }
            }
        }
    }

    let count = images.len();
    ImageList { images, count }
}

/// Best logo guess from page markup alone: a logo-looking image, then an icon link.
pub fn find_logo(html: &str, base: &Url) -> Option<LogoCandidate> {
    let document = Html::parse_document(html);

    let logo_image = select_all(&document, "img").into_iter().find_map(|img| {
        let element = img.value();
        let looks_like_logo = ["src", "alt", "class", "id"].iter().any(|attr| {
            element
                .attr(attr)
                .is_some_and(|v| v.to_ascii_lowercase().contains("logo"))
        });
        if !looks_like_logo {
            return None;
        }
        element.attr("src").and_then(|src| resolve_url(base, src))
    });
    if let Some(url) = logo_image {
        return Some(LogoCandidate {
            url: Some(url),
            source: LogoSource::LogoImage,
        });
    }

    let icons = select_all(&document, "link[rel][href]");
    let icon_rank = |rel: &str| -> Option<u8> {
        let rel = rel.to_ascii_lowercase();
        if rel.contains("apple-touch-icon") {
            Some(0)
        } else if rel.split_whitespace().any(|r| r == "icon") {
            Some(1)
        } else {
            None
        }
    };

    icons
        .iter()
        .filter_map(|link| {
            let element = link.value();
            let rank = icon_rank(element.attr("rel")?)?;
            let url = resolve_url(base, element.attr("href")?)?;
            Some((rank, url))
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, url)| LogoCandidate {
            url: Some(url),
            source: LogoSource::IconLink,
        })
}

pub fn extract_seo_signals(html: &str) -> SeoSignals {
    let document = Html::parse_document(html);

    let title_length = select_all(&document, "title")
        .first()
        .map(|t| element_text(t).chars().count())
        .unwrap_or(0);
    let description_length = meta_content(&document, "description")
        .map(|d| d.chars().count())
        .unwrap_or(0);

    let canonical_url = select_all(&document, "link[rel][href]")
        .into_iter()
        .find(|link| {
            link.value()
                .attr("rel")
                .is_some_and(|rel| rel.eq_ignore_ascii_case("canonical"))
        })
        .and_then(|link| link.value().attr("href").map(|h| h.trim().to_string()));

    let lang = select_all(&document, "html")
        .first()
        .and_then(|root| root.value().attr("lang"))
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());

    let images = select_all(&document, "img");
    let images_missing_alt = images
        .iter()
        .filter(|img| {
            img.value()
                .attr("alt")
                .map(|alt| alt.trim().is_empty())
                .unwrap_or(true)
        })
        .count();

    SeoSignals {
        title_length,
        description_length,
        h1_count: select_all(&document, "h1").len(),
        canonical_url,
        robots_meta: meta_content(&document, "robots"),
        lang,
        has_viewport: meta_content(&document, "viewport").is_some(),
        image_count: images.len(),
        images_missing_alt,
        word_count: visible_text(html).split_whitespace().count(),
    }
}

pub fn extract_news(html: &str, base: &Url) -> NewsList {
    const NEWS_SEGMENTS: [&str; 5] = ["/news", "/blog", "/press", "/article", "/stories"];

    let document = Html::parse_document(html);
    let in_article: HashSet<_> = select_all(&document, "article a[href]")
        .into_iter()
        .map(|a| a.id())
        .collect();

    let mut seen = HashSet::new();
    let mut articles = Vec::new();

    for anchor in select_all(&document, "a[href]") {
        let Some(url) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_url(base, href))
        else {
            continue;
        };
        let path = Url::parse(&url)
            .map(|u| u.path().to_ascii_lowercase())
            .unwrap_or_default();
        let newsy = in_article.contains(&anchor.id())
            || NEWS_SEGMENTS.iter().any(|segment| path.contains(segment));
        let title = element_text(&anchor);

        if newsy && !title.is_empty() && seen.insert(url.clone()) {
            articles.push(NewsArticle { title, url });
            if articles.len() == MAX_NEWS_ARTICLES {
                break;
            }
        }
    }

    NewsList { articles }
}

pub fn summarize_share_links(html: &str, base: &Url) -> ShareSummary {
    let document = Html::parse_document(html);
    let mut platforms: BTreeMap<String, usize> = BTreeMap::new();

    for anchor in select_all(&document, "a[href]") {
        let Some(link) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_url(base, href))
        else {
            continue;
        };
        if let Some(platform) = social_platform(&link) {
            *platforms.entry(platform.to_string()).or_default() += 1;
        }
    }

    let total = platforms.values().sum();
    ShareSummary { platforms, total }
}

/// Parsed bodies of every `application/ld+json` script; invalid blocks are skipped.
pub(crate) fn json_ld_blocks(document: &Html) -> Vec<Value> {
    select_all(document, "script[type]")
        .into_iter()
        .filter(|script| {
            script
                .value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
        })
        .filter_map(|script| serde_json::from_str(&script.text().collect::<String>()).ok())
        .collect()
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn has_type(value: &Value, wanted: &str) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == wanted,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}

/// Depth-first walk over every JSON object in `value`.
pub(crate) fn walk_objects<'a>(value: &'a Value, visit: &mut dyn FnMut(&'a Value)) {
    match value {
        Value::Object(map) => {
            visit(value);
            for child in map.values() {
                walk_objects(child, visit);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_objects(item, visit);
            }
        }
        _ => {}
    }
}

pub fn extract_reviews(html: &str) -> ReviewSummary {
    let document = Html::parse_document(html);
    let mut summary = ReviewSummary::default();
    let mut rating: Option<&Value> = None;
    let mut reviews_in_json_ld = 0;

    let blocks = json_ld_blocks(&document);
    for block in &blocks {
        walk_objects(block, &mut |object| {
            if rating.is_none() {
                rating = object.get("aggregateRating");
            }
            if has_type(object, "Review") {
                reviews_in_json_ld += 1;
            }
        });
    }

    if let Some(rating) = rating {
        summary.rating_value = rating.get("ratingValue").and_then(number);
        summary.best_rating = rating.get("bestRating").and_then(number);
        summary.review_count = rating
            .get("reviewCount")
            .or_else(|| rating.get("ratingCount"))
            .and_then(number)
            .map(|n| n as u64);
    }

    let microdata_reviews = select_all(&document, "[itemprop=review]").len();
    summary.reviews_on_page = reviews_in_json_ld.max(microdata_reviews);
    summary
}
