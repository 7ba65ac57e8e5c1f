// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Contact details and postal addresses found on a page.

use crate::models::analysis::{AddressList, ContactInfo};
use crate::services::extract::{
    json_ld_blocks, resolve_url, select_all, social_platform, visible_text, walk_objects,
};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\(?\d[\d\s().-]{6,}\d").unwrap());
static STREET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b\d{1,5}\s+(?:[A-Z][A-Za-z]+\s+){1,4}(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Way|Court|Ct|Place|Pl)\b\.?",
    )
    .unwrap()
});

/// File extensions that make an `x@y.z` match an asset name rather than an email.
const ASSET_SUFFIXES: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".svg"];

fn push_unique(seen: &mut HashSet<String>, out: &mut Vec<String>, value: String) {
    if seen.insert(value.to_ascii_lowercase()) {
        out.push(value);
    }
}

fn digit_count(s: &str) -> usize {
    s.chars().filter(char::is_ascii_digit).count()
}

fn normalize_phone(raw: &str) -> Option<String> {
    let phone = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (7..=15).contains(&digit_count(&phone)).then_some(phone)
}

pub fn extract_contact_info(html: &str, base: &Url) -> ContactInfo {
    let document = Html::parse_document(html);
    let text = visible_text(html);
    let mut info = ContactInfo::default();

    let mut seen = HashSet::new();
    let mailto = select_all(&document, "a[href]")
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| href.trim().strip_prefix("mailto:"))
        .map(|addr| addr.split('?').next().unwrap_or_default().trim().to_string())
        .collect::<Vec<_>>();
    let in_text = EMAIL.find_iter(&text).map(|m| m.as_str().to_string());
    for email in mailto.into_iter().chain(in_text) {
        let lower = email.to_ascii_lowercase();
        if !EMAIL.is_match(&email) || ASSET_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            continue;
        }
        push_unique(&mut seen, &mut info.emails, lower);
    }

    let mut seen = HashSet::new();
    let tel = select_all(&document, "a[href]")
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| href.trim().strip_prefix("tel:"))
        .map(str::to_string)
        .collect::<Vec<_>>();
    let in_text = PHONE.find_iter(&text).map(|m| m.as_str().to_string());
    for phone in tel.into_iter().chain(in_text).filter_map(|p| normalize_phone(&p)) {
        let key: String = phone.chars().filter(char::is_ascii_digit).collect();
        if seen.insert(key) {
            info.phones.push(phone);
        }
    }

    let mut seen = HashSet::new();
    for anchor in select_all(&document, "a[href]") {
        let Some(link) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_url(base, href))
        else {
            continue;
        };
        if social_platform(&link).is_some() {
            push_unique(&mut seen, &mut info.social_profiles, link);
        }
    }

    info
}

fn address_part(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Object(_) => value.get("name").and_then(address_part),
        _ => None,
    }
}

fn postal_address(object: &Value) -> Option<String> {
    let is_postal = match object.get("@type") {
        Some(Value::String(t)) => t == "PostalAddress",
        _ => object.get("streetAddress").is_some(),
    };
    if !is_postal {
        return None;
    }

    let parts: Vec<String> = [
        "streetAddress",
        "addressLocality",
        "addressRegion",
        "postalCode",
        "addressCountry",
    ]
    .iter()
    .filter_map(|key| object.get(*key).and_then(address_part))
    .collect();

    (!parts.is_empty()).then(|| parts.join(", "))
}

pub fn extract_addresses(html: &str) -> AddressList {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut addresses = Vec::new();

    for element in select_all(&document, "address") {
        let text = element
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() {
            push_unique(&mut seen, &mut addresses, text);
        }
    }

    for block in json_ld_blocks(&document) {
        let mut found = Vec::new();
        walk_objects(&block, &mut |object| {
            if let Some(address) = postal_address(object) {
                found.push(address);
            }
        });
        for address in found {
            push_unique(&mut seen, &mut addresses, address);
        }
    }

    let text = visible_text(html);
    for street in STREET.find_iter(&text) {
        let street = street.as_str().to_string();
        let already_covered = addresses.iter().any(|a| a.contains(&street));
        if !already_covered {
            push_unique(&mut seen, &mut addresses, street);
        }
    }

    AddressList { addresses }
}
