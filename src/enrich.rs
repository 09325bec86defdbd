//! Detail-page enrichment.
//!
//! Fetches a grant's detail page once and pulls deadline / award amount /
//! subsidy ratio out of the full page text with ordered regex fallbacks, plus
//! a bounded description from the first known content container. Advisory
//! only: every failure leaves the field at its sentinel default and never
//! aborts the owning source fetch.

use crate::types::{DEADLINE_UNCONFIRMED, UNCONFIRMED};
use regex::Regex;
use scraper::{Html, Selector};

const DESCRIPTION_MAX_CHARS: usize = 200;

/// Content containers tried in order for the description.
const CONTENT_SELECTORS: &[&str] = &[
    ".main-contents",
    "#contents",
    ".entry-content",
    "article",
    "main",
];

/// Enrichment fields for one detail page, all defaulted on failure.
#[derive(Debug, Clone)]
pub struct DetailFields {
    pub description: String,
    pub deadline: String,
    pub amount: String,
    pub ratio: String,
}

impl Default for DetailFields {
    fn default() -> Self {
        DetailFields {
            description: UNCONFIRMED.to_string(),
            deadline: DEADLINE_UNCONFIRMED.to_string(),
            amount: UNCONFIRMED.to_string(),
            ratio: UNCONFIRMED.to_string(),
        }
    }
}

/// Fetch `url` and extract detail fields. Never fails; unmatched fields keep
/// their sentinel.
pub fn enrich(client: &reqwest::blocking::Client, url: &str) -> DetailFields {
    let html = match fetch_page(client, url) {
        Some(html) => html,
        None => return DetailFields::default(),
    };
    extract_fields(&html)
}

fn fetch_page(client: &reqwest::blocking::Client, url: &str) -> Option<String> {
    match client.get(url).send() {
        Ok(resp) if resp.status().is_success() => resp.text().ok(),
        Ok(resp) => {
            log::debug!("detail page {} returned HTTP {}", url, resp.status());
            None
        }
        Err(e) => {
            log::debug!("detail page {} fetch failed: {}", url, e);
            None
        }
    }
}

/// Extract all fields from raw detail-page HTML.
pub fn extract_fields(html: &str) -> DetailFields {
    let mut fields = DetailFields::default();
    let document = Html::parse_document(html);

    if let Some(description) = extract_description(&document) {
        fields.description = description;
    }

    // Deadline, amount and ratio may live in a sidebar or summary table, so
    // the patterns run against the full page text rather than the content
    // container.
    let page_text = document.root_element().text().collect::<Vec<_>>().join(" ");

    if let Some(deadline) = extract_deadline(&page_text) {
        fields.deadline = deadline;
    }
    if let Some(amount) = extract_amount(&page_text) {
        fields.amount = amount;
    }
    if let Some(ratio) = extract_ratio(&page_text) {
        fields.ratio = ratio;
    }

    fields
}

fn extract_description(document: &Html) -> Option<String> {
    for selector_str in CONTENT_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = element.text().collect::<Vec<_>>().join(" ");
                let text = crate::normalize::simplify_title(&text);
                if text.is_empty() {
                    continue;
                }
                let truncated: String = text.chars().take(DESCRIPTION_MAX_CHARS).collect();
                return if truncated.chars().count() < text.chars().count() {
                    Some(format!("{}...", truncated))
                } else {
                    Some(truncated)
                };
            }
        }
    }
    None
}

/// Deadline pattern scan over arbitrary text, for listing items that carry
/// the deadline inline next to the link.
pub fn deadline_in_text(text: &str) -> Option<String> {
    extract_deadline(text)
}

fn extract_deadline(text: &str) -> Option<String> {
    let patterns = [
        // Labeled: 締切：2025年6月30日
        r"(?:締切|締め切り|〆切|申請期限|応募期限|公募期限)[：:\s]*([0-9]{4}年[0-9]{1,2}月[0-9]{1,2}日)",
        // Reversed: 2025年6月30日まで / 2025年6月30日 締切
        r"([0-9]{4}年[0-9]{1,2}月[0-9]{1,2}日)[^。\n]{0,20}(?:締切|締め切り|〆切|まで)",
        // Period: 公募期間 … 2025年6月30日
        r"(?:公募期間|募集期間|受付期間)[^。\n]{0,40}?([0-9]{4}年[0-9]{1,2}月[0-9]{1,2}日)",
        // ISO-style with label
        r"(?:締切|申請期限|応募期限)[：:\s]*([0-9]{4}[/-][0-9]{1,2}[/-][0-9]{1,2})",
    ];

    first_capture(&patterns, text)
}

fn extract_amount(text: &str) -> Option<String> {
    let patterns = [
        // Labeled: 補助上限額：450万円
        r"(?:助成金額|補助金額|補助上限額?|助成上限額?|交付額|上限額)[：:\s]*([0-9][0-9,，]*(?:億|万)?円)",
        // Bounded: 450万円以内 / 1,000万円を上限
        r"([0-9][0-9,，]*(?:億|万)円)(?:以内|を上限|まで)",
        // Range: 50万円～450万円
        r"([0-9][0-9,，]*(?:億|万)?円[～〜~][0-9][0-9,，]*(?:億|万)?円)",
    ];

    first_capture(&patterns, text)
}

fn extract_ratio(text: &str) -> Option<String> {
    let patterns = [
        // Labeled: 補助率：2分の1 / 補助率 1/2
        r"(?:補助率|助成率)[：:\s]*([0-9]+分の[0-9]+|[0-9]+／[0-9]+|[0-9]+/[0-9]+)(?:以内)?",
        // Labeled percentage: 補助率：50％
        r"(?:補助率|助成率)[：:\s]*([0-9]+(?:\.[0-9]+)?[％%])(?:以内)?",
        // Free-standing fraction near 補助/助成
        r"(?:補助|助成)[^。\n]{0,15}?([0-9]+分の[0-9]+)",
    ];

    first_capture(&patterns, text)
}

/// First capture group of the first pattern that matches, in order.
fn first_capture(patterns: &[&str], text: &str) -> Option<String> {
    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(caps) = re.captures(text) {
                if let Some(m) = caps.get(1) {
                    return Some(m.as_str().to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_deadline_labeled() {
        let fields = extract_fields(
            "<html><body><p>申請期限：2025年6月30日</p></body></html>",
        );
        assert_eq!(fields.deadline, "2025年6月30日");
    }

    #[test]
    fn test_extract_deadline_reversed_form() {
        let fields = extract_fields(
            "<html><body><div>2025年9月12日（金）17時まで受付</div></body></html>",
        );
        assert_eq!(fields.deadline, "2025年9月12日");
    }

    #[test]
    fn test_extract_amount_from_sidebar_table() {
        let html = "<html><body><main>概要テキスト</main>\
                    <table><tr><td>補助上限額</td><td>450万円</td></tr></table></body></html>";
        let fields = extract_fields(html);
        assert_eq!(fields.amount, "450万円");
    }

    #[test]
    fn test_extract_ratio_fraction() {
        let fields = extract_fields(
            "<html><body><p>補助率：2分の1以内</p></body></html>",
        );
        assert_eq!(fields.ratio, "2分の1");
    }

    #[test]
    fn test_extract_ratio_percent() {
        let fields = extract_fields(
            "<html><body><p>助成率 50％以内</p></body></html>",
        );
        assert_eq!(fields.ratio, "50％");
    }

    #[test]
    fn test_unmatched_fields_keep_sentinel() {
        let fields = extract_fields("<html><body><p>お知らせ一覧</p></body></html>");
        assert_eq!(fields.deadline, DEADLINE_UNCONFIRMED);
        assert_eq!(fields.amount, UNCONFIRMED);
        assert_eq!(fields.ratio, UNCONFIRMED);
    }

    #[test]
    fn test_description_bounded() {
        let long = "あ".repeat(400);
        let html = format!("<html><body><article>{}</article></body></html>", long);
        let fields = extract_fields(&html);
        assert!(fields.description.ends_with("..."));
        assert!(fields.description.chars().count() <= DESCRIPTION_MAX_CHARS + 3);
    }

    #[test]
    fn test_description_from_first_matching_container() {
        let html = "<html><body><article>本補助金は中小企業のDX推進を支援します。</article></body></html>";
        let fields = extract_fields(html);
        assert!(fields.description.contains("DX推進"));
    }
}
