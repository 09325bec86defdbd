//! Text normalization and cross-source deduplication.
//!
//! Provides functions to:
//! - Clean scraped text (control characters, full-width spacing, whitespace runs)
//! - Strip query strings from URLs for identity comparison
//! - Deduplicate grants on the (stripped URL, normalized title) pair

use crate::types::Grant;
use std::collections::HashSet;

/// Normalize text for comparison.
///
/// Strips control characters, converts full-width spaces to ASCII, collapses
/// whitespace runs and lowercases. Idempotent: applying it twice yields the
/// same string.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\u{3000}' || c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cleanup transform applied to titles before display.
///
/// Same cleanup as [`normalize_text`] but case-preserving, so garbled scrapes
/// still read naturally in reports.
pub fn simplify_title(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\u{3000}' || c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The URL with its query string (and fragment) removed.
pub fn strip_query(url: &str) -> &str {
    let url = match url.find('?') {
        Some(pos) => &url[..pos],
        None => url,
    };
    match url.find('#') {
        Some(pos) => &url[..pos],
        None => url,
    }
}

/// Deduplicate grants, preserving first-seen order.
///
/// A grant is retained only if BOTH its URL-key (query-stripped URL) and its
/// title-key (normalized title) are unseen; on retention both keys are
/// recorded. A title collision alone, or a URL collision alone, drops the
/// later grant. This trades recall for the common case that the same
/// announcement is mirrored at different URLs with the same title, or the
/// same URL is crawled twice with cosmetically different titles.
pub fn dedupe_grants(grants: Vec<Grant>) -> Vec<Grant> {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();

    for grant in grants {
        let url_key = strip_query(&grant.url).to_string();
        let title_key = normalize_text(&grant.title);

        if seen_urls.contains(&url_key) || seen_titles.contains(&title_key) {
            continue;
        }
        seen_urls.insert(url_key);
        seen_titles.insert(title_key);
        unique.push(grant);
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(title: &str, url: &str) -> Grant {
        Grant::new(title.to_string(), url.to_string(), "test", "2025年4月1日".to_string())
    }

    #[test]
    fn test_normalize_text_collapses_whitespace() {
        assert_eq!(normalize_text("  Hello   World  "), "hello world");
    }

    #[test]
    fn test_normalize_text_fullwidth_space() {
        assert_eq!(normalize_text("助成金　募集　案内"), "助成金 募集 案内");
    }

    #[test]
    fn test_normalize_text_strips_control_chars() {
        assert_eq!(normalize_text("IT導入補助金\r\n2025"), "it導入補助金 2025");
        assert_eq!(normalize_text("title\twith\ttabs"), "title with tabs");
    }

    #[test]
    fn test_normalize_text_idempotent() {
        let samples = [
            "  IT導入補助金　2025  ",
            "Hello\t\tWorld",
            "もの\u{3000}づくり\n補助金",
            "",
        ];
        for s in &samples {
            let once = normalize_text(s);
            assert_eq!(normalize_text(&once), once);
        }
    }

    #[test]
    fn test_simplify_title_preserves_case() {
        assert_eq!(simplify_title("  IT導入補助金　2025  "), "IT導入補助金 2025");
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("https://example.com/a?x=1"), "https://example.com/a");
        assert_eq!(strip_query("https://example.com/a"), "https://example.com/a");
        assert_eq!(strip_query("https://example.com/a#sec"), "https://example.com/a");
    }

    #[test]
    fn test_dedupe_same_url_ignoring_query() {
        let input = vec![
            grant("IT導入補助金2025", "https://example.com/a?x=1"),
            grant("IT導入補助金2025", "https://example.com/a?x=2"),
        ];
        let out = dedupe_grants(input);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "https://example.com/a?x=1");
    }

    #[test]
    fn test_dedupe_title_collision_alone_drops() {
        let input = vec![
            grant("ものづくり補助金", "https://a.example.com/1"),
            grant("ものづくり補助金", "https://b.example.com/2"),
        ];
        assert_eq!(dedupe_grants(input).len(), 1);
    }

    #[test]
    fn test_dedupe_url_collision_alone_drops() {
        let input = vec![
            grant("タイトルA", "https://example.com/p"),
            grant("タイトルB", "https://example.com/p?page=2"),
        ];
        assert_eq!(dedupe_grants(input).len(), 1);
    }

    #[test]
    fn test_dedupe_preserves_first_seen_order() {
        let input = vec![
            grant("A", "https://example.com/a"),
            grant("B", "https://example.com/b"),
            grant("A", "https://example.com/c"),
            grant("C", "https://example.com/ccc"),
        ];
        let out = dedupe_grants(input);
        let titles: Vec<&str> = out.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_dedupe_no_shared_keys_in_output() {
        let input = vec![
            grant("A", "https://example.com/a?q=1"),
            grant("a ", "https://example.com/x"),
            grant("B", "https://example.com/a"),
            grant("C", "https://example.com/c"),
        ];
        let out = dedupe_grants(input);
        let mut urls = HashSet::new();
        let mut titles = HashSet::new();
        for g in &out {
            assert!(urls.insert(strip_query(&g.url).to_string()));
            assert!(titles.insert(normalize_text(&g.title)));
        }
    }
}
