// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Lexicon-based sentiment over a page's visible text.

use crate::models::analysis::{SentimentLabel, SentimentSummary};

const POSITIVE: &[&str] = &[
    "amazing", "award", "best", "excellent", "fantastic", "friendly", "great", "happy", "love",
    "perfect", "quality", "recommend", "reliable", "satisfied", "success", "trusted", "wonderful",
];

const NEGATIVE: &[&str] = &[
    "awful", "bad", "broken", "complaint", "disappointed", "fail", "failed", "fraud", "hate",
    "poor", "problem", "refund", "scam", "slow", "terrible", "unreliable", "worst",
];

/// Scores at or inside this band around zero are neutral.
const NEUTRAL_BAND: f64 = 0.1;

pub fn analyze(text: &str) -> SentimentSummary {
    let mut positive_terms = 0;
    let mut negative_terms = 0;

    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        let word = word.to_lowercase();
        if POSITIVE.contains(&word.as_str()) {
            positive_terms += 1;
        } else if NEGATIVE.contains(&word.as_str()) {
            negative_terms += 1;
        }
    }

    let total = positive_terms + negative_terms;
    let score = if total == 0 {
        0.0
    } else {
        (positive_terms as f64 - negative_terms as f64) / total as f64
    };

    let label = if score > NEUTRAL_BAND {
        SentimentLabel::Positive
    } else if score < -NEUTRAL_BAND {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };

    SentimentSummary {
        label,
        score,
        positive_terms,
        negative_terms,
    }
}
