//! `Accept-Language` header parsing.

use std::sync::LazyLock;

use regex::Regex;

static LANGUAGE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([^-,;]+)(?:-([^-,;]+(?:-[^-,;]+)*))?(?:;q=(\d(?:\.\d+)?))?,?")
        .expect("accept-language regex is valid")
});

/// One entry of an `Accept-Language` header, e.g. `en-US;q=0.8`.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageRange {
    /// Primary subtag (`en`).
    pub lang: String,
    /// Everything after the first `-` (`US`, `Hant-TW`).
    pub flavor: Option<String>,
    /// Quality weight; absent means 1.0.
    pub q: Option<f32>,
}

impl LanguageRange {
    #[must_use]
    pub fn weight(&self) -> f32 {
        self.q.unwrap_or(1.0)
    }
}

/// Parses the header in written order.
#[must_use]
pub fn parse_accept_language(header: &str) -> Vec<LanguageRange> {
    LANGUAGE_RANGE
        .captures_iter(header)
        .filter_map(|caps| {
            let lang = caps[1].trim();
            if lang.is_empty() {
                return None;
            }
            Some(LanguageRange {
                lang: lang.to_string(),
                flavor: caps.get(2).map(|m| m.as_str().trim().to_string()),
                q: caps.get(3).and_then(|m| m.as_str().parse().ok()),
            })
        })
        .collect()
}

/// Parses the header and orders entries by descending weight.
///
/// Entries with equal weight keep their written order. Entries with `q=0`
/// are explicitly not acceptable and are dropped.
#[must_use]
pub fn preferred_languages(header: &str) -> Vec<LanguageRange> {
    let mut ranges = parse_accept_language(header);
    ranges.retain(|r| r.weight() > 0.0);
    ranges.sort_by(|a, b| b.weight().total_cmp(&a.weight()));
    ranges
}
