//! How well a trend fits the configured product/audience profiles.

use crate::types::Trend;
use campaign_core::types::ProductProfile;

const CATEGORY_WEIGHT: f64 = 0.4;
const KEYWORD_WEIGHT: f64 = 0.4;
const DEMOGRAPHIC_WEIGHT: f64 = 0.2;

/// Alignment used when no profiles are configured.
pub const NEUTRAL_ALIGNMENT: f64 = 0.5;

/// Best alignment of `trend` across `profiles`, within `[0, 1]`.
pub fn product_alignment(trend: &Trend, profiles: &[ProductProfile]) -> f64 {
    if profiles.is_empty() {
        return NEUTRAL_ALIGNMENT;
    }

    let text = trend.search_text();
    let best = profiles
        .iter()
        .map(|p| profile_alignment(trend, &text, p))
        .fold(0.0, f64::max);
    best.clamp(0.0, 1.0)
}

fn profile_alignment(trend: &Trend, text: &str, profile: &ProductProfile) -> f64 {
    let category = if trend.category.trim().eq_ignore_ascii_case(profile.category.trim()) {
        1.0
    } else {
        0.0
    };

    let keywords = if profile.keywords.is_empty() {
        0.0
    } else {
        let hits = profile
            .keywords
            .iter()
            .filter(|k| contains_term(text, k))
            .count();
        hits as f64 / profile.keywords.len() as f64
    };

    let demographic = if profile
        .target_demographics
        .iter()
        .any(|d| contains_term(text, d))
    {
        1.0
    } else {
        0.0
    };

    CATEGORY_WEIGHT * category + KEYWORD_WEIGHT * keywords + DEMOGRAPHIC_WEIGHT * demographic
}

fn contains_term(text: &str, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    !term.is_empty() && text.contains(&term)
}
