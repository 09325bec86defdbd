//! Source fetching.
//!
//! Every source is a declarative [`SourceSpec`]: an ordered list of endpoint
//! URLs and an ordered list of selector strategies, evaluated by one generic
//! first-success-wins driver. Site markup drifts over time, so each strategy
//! is a guess about the current structure; the first one yielding any items
//! wins and the rest are skipped.

pub mod backup;
pub mod sources;

use crate::enrich;
use crate::normalize::{normalize_text, simplify_title};
use crate::types::{Grant, UNCONFIRMED};
use chrono::Utc;
use log::{debug, info, warn};
use scraper::{ElementRef, Html, Selector};

/// One structural guess about a listing page.
#[derive(Debug, Clone, Copy)]
pub struct SelectorStrategy {
    /// Selector for one announcement item.
    pub item: &'static str,
    /// Ordered fallbacks for the title element within an item. Empty means
    /// the item's own text is the title (direct-link strategies).
    pub title: &'static [&'static str],
    /// Selector for the link element within an item; `None` falls back to the
    /// title element itself or the first `a[href]`.
    pub link: Option<&'static str>,
    /// Optional selector for a listing-level description.
    pub description: Option<&'static str>,
    /// Optional selector for a listing-level deadline.
    pub deadline: Option<&'static str>,
    /// Optional selector for the listing date.
    pub date: Option<&'static str>,
    /// Titles shorter than this are dropped as navigation noise.
    pub min_title_len: usize,
}

impl SelectorStrategy {
    pub const fn items(item: &'static str, title: &'static [&'static str]) -> Self {
        SelectorStrategy {
            item,
            title,
            link: None,
            description: None,
            deadline: None,
            date: None,
            min_title_len: 5,
        }
    }
}

/// One external source: ordered endpoints × ordered strategies.
#[derive(Debug, Clone, Copy)]
pub struct SourceSpec {
    pub name: &'static str,
    pub endpoints: &'static [&'static str],
    pub strategies: &'static [SelectorStrategy],
    /// When non-empty, an item's text must contain one of these to be kept
    /// (news-list sources mix grants with unrelated announcements).
    pub keyword_gate: &'static [&'static str],
    /// Description used when the listing page exposes none.
    pub default_description: &'static str,
    /// Fetch each item's detail page for deadline/amount/ratio.
    pub enrich_details: bool,
}

/// Fetch one source. Never fails: fetch and parse errors are logged and the
/// source reports zero items. A source is not retried within a run.
pub fn fetch_source(client: &reqwest::blocking::Client, spec: &SourceSpec) -> Vec<Grant> {
    info!("Scraping source: {}", spec.name);

    for endpoint in spec.endpoints {
        let html = match client.get(*endpoint).send() {
            Ok(resp) if resp.status().is_success() => match resp.text() {
                Ok(text) => text,
                Err(e) => {
                    warn!("  failed to read body from {}: {}", endpoint, e);
                    continue;
                }
            },
            Ok(resp) => {
                warn!("  HTTP {} from {}", resp.status().as_u16(), endpoint);
                continue;
            }
            Err(e) => {
                warn!("  request failed for {}: {}", endpoint, e);
                continue;
            }
        };

        // Some sources serve a delimited export instead of an HTML listing.
        if !looks_like_html(&html) {
            let grants = parse_delimited(&html, endpoint, spec);
            if !grants.is_empty() {
                info!("  {} items from {} (delimited)", grants.len(), endpoint);
                return maybe_enrich(client, spec, grants);
            }
            debug!("  delimited decode yielded nothing on {}", endpoint);
            continue;
        }

        for strategy in spec.strategies {
            let grants = parse_listing(&html, endpoint, spec, strategy);
            if grants.is_empty() {
                continue;
            }
            info!("  {} items from {} via '{}'", grants.len(), endpoint, strategy.item);
            return maybe_enrich(client, spec, grants);
        }
        debug!("  no selector strategy matched on {}", endpoint);
    }

    info!("  no items from {}", spec.name);
    vec![]
}

fn maybe_enrich(
    client: &reqwest::blocking::Client,
    spec: &SourceSpec,
    mut grants: Vec<Grant>,
) -> Vec<Grant> {
    if spec.enrich_details {
        for grant in &mut grants {
            apply_detail_fields(grant, enrich::enrich(client, &grant.url));
        }
    }
    grants
}

fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start();
    head.starts_with('<') || {
        let lower: String = head.chars().take(256).collect::<String>().to_lowercase();
        lower.contains("<html") || lower.contains("<!doctype")
    }
}

/// Column header names accepted for each field of a delimited export.
const TITLE_COLUMNS: &[&str] = &["タイトル", "件名", "名称", "施策名", "title"];
const URL_COLUMNS: &[&str] = &["url", "リンク", "詳細url", "link"];
const DATE_COLUMNS: &[&str] = &["日付", "掲載日", "公開日", "date"];
const DESCRIPTION_COLUMNS: &[&str] = &["概要", "説明", "内容", "description"];
const DEADLINE_COLUMNS: &[&str] = &["締切", "締め切り", "期限", "deadline"];

/// Decode a delimited (CSV/TSV) export by header names. A missing title or
/// URL column is a structure mismatch and yields zero items.
pub fn parse_delimited(body: &str, endpoint: &str, spec: &SourceSpec) -> Vec<Grant> {
    let delimiter = if body.lines().next().is_some_and(|l| l.contains('\t')) {
        b'\t'
    } else {
        b','
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(headers) => headers.iter().map(|h| normalize_text(h)).collect(),
        Err(_) => return vec![],
    };
    let title_col = match find_column(&headers, TITLE_COLUMNS) {
        Some(col) => col,
        None => return vec![],
    };
    let url_col = match find_column(&headers, URL_COLUMNS) {
        Some(col) => col,
        None => return vec![],
    };
    let date_col = find_column(&headers, DATE_COLUMNS);
    let description_col = find_column(&headers, DESCRIPTION_COLUMNS);
    let deadline_col = find_column(&headers, DEADLINE_COLUMNS);

    let today = Utc::now().format("%Y年%m月%d日").to_string();
    let mut grants = Vec::new();

    for record in reader.records().flatten() {
        let title = simplify_title(record.get(title_col).unwrap_or(""));
        if title.chars().count() < 5 {
            continue;
        }
        let url = match record.get(url_col).and_then(|href| resolve_url(endpoint, href)) {
            Some(url) => url,
            None => continue,
        };

        let mut grant = Grant::new(title, url, spec.name, today.clone());
        if let Some(date) = cell(&record, date_col) {
            grant.source_date = date;
        }
        if let Some(description) = cell(&record, description_col) {
            grant.description = description;
        } else if !spec.default_description.is_empty() {
            grant.description = spec.default_description.to_string();
        }
        if let Some(deadline) = cell(&record, deadline_col) {
            grant.deadline = deadline;
        }

        if !spec.keyword_gate.is_empty() {
            let text = format!("{} {}", grant.title, grant.description);
            if !spec.keyword_gate.iter().any(|kw| text.contains(kw)) {
                continue;
            }
        }
        grants.push(grant);
    }

    grants
}

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h == &normalize_text(n)))
}

fn cell(record: &csv::StringRecord, col: Option<usize>) -> Option<String> {
    let text = simplify_title(record.get(col?)?);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Parse one listing page with one strategy. Pure; used directly by tests.
pub fn parse_listing(
    html: &str,
    endpoint: &str,
    spec: &SourceSpec,
    strategy: &SelectorStrategy,
) -> Vec<Grant> {
    let item_selector = match Selector::parse(strategy.item) {
        Ok(sel) => sel,
        Err(_) => return vec![],
    };

    let document = Html::parse_document(html);
    let today = Utc::now().format("%Y年%m月%d日").to_string();
    let mut grants = Vec::new();

    for item in document.select(&item_selector) {
        let item_text = item.text().collect::<Vec<_>>().join(" ");

        if !spec.keyword_gate.is_empty()
            && !spec.keyword_gate.iter().any(|kw| item_text.contains(kw))
        {
            continue;
        }

        let (title, title_el) = match extract_title(&item, strategy) {
            Some(found) => found,
            None => continue,
        };

        let href = match extract_href(&item, title_el, strategy) {
            Some(href) => href,
            None => continue,
        };
        let url = match resolve_url(endpoint, &href) {
            Some(url) => url,
            None => continue,
        };

        let mut grant = Grant::new(title, url, spec.name, today.clone());

        if let Some(date) = select_text(&item, strategy.date) {
            grant.source_date = date;
        }
        if let Some(description) = select_text(&item, strategy.description) {
            grant.description = description;
        } else if !spec.default_description.is_empty() {
            grant.description = spec.default_description.to_string();
        }
        if let Some(deadline) = select_text(&item, strategy.deadline) {
            grant.deadline = deadline;
        } else if let Some(deadline) = enrich::deadline_in_text(&item_text) {
            grant.deadline = deadline;
        }

        grants.push(grant);
    }

    grants
}

/// Title via the strategy's ordered fallbacks, or the item's own text for
/// direct-link strategies. Returns the element the title came from so the
/// link lookup can start there.
fn extract_title<'a>(
    item: &ElementRef<'a>,
    strategy: &SelectorStrategy,
) -> Option<(String, Option<ElementRef<'a>>)> {
    if strategy.title.is_empty() {
        let title = simplify_title(&item.text().collect::<Vec<_>>().join(" "));
        if title.chars().count() >= strategy.min_title_len {
            return Some((title, None));
        }
        return None;
    }

    for selector_str in strategy.title {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = item.select(&selector).next() {
                let title = simplify_title(&element.text().collect::<Vec<_>>().join(" "));
                if title.chars().count() >= strategy.min_title_len {
                    return Some((title, Some(element)));
                }
            }
        }
    }
    None
}

/// Link lookup order: the item itself when it is an anchor, the title element
/// or an anchor inside it, then the strategy's link selector within the item.
fn extract_href(
    item: &ElementRef,
    title_el: Option<ElementRef>,
    strategy: &SelectorStrategy,
) -> Option<String> {
    if item.value().name() == "a" {
        if let Some(href) = item.value().attr("href") {
            return Some(href.to_string());
        }
    }

    if let Some(el) = title_el {
        if el.value().name() == "a" {
            if let Some(href) = el.value().attr("href") {
                return Some(href.to_string());
            }
        }
        if let Ok(selector) = Selector::parse("a[href]") {
            if let Some(a) = el.select(&selector).next() {
                if let Some(href) = a.value().attr("href") {
                    return Some(href.to_string());
                }
            }
        }
    }

    let link_selector = strategy.link.unwrap_or("a[href]");
    if let Ok(selector) = Selector::parse(link_selector) {
        if let Some(a) = item.select(&selector).next() {
            if let Some(href) = a.value().attr("href") {
                return Some(href.to_string());
            }
        }
    }
    None
}

fn select_text(item: &ElementRef, selector_str: Option<&str>) -> Option<String> {
    let selector_str = selector_str?;
    let selector = Selector::parse(selector_str).ok()?;
    let element = item.select(&selector).next()?;
    let text = simplify_title(&element.text().collect::<Vec<_>>().join(" "));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Resolve an href against its endpoint. Absolute links pass through,
/// root-relative links resolve against the endpoint origin, path-relative
/// links against the endpoint directory. Non-navigable schemes are dropped.
fn resolve_url(endpoint: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
    {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    if href.starts_with("//") {
        let scheme = endpoint.split("://").next().unwrap_or("https");
        return Some(format!("{}:{}", scheme, href));
    }

    let origin = origin_of(endpoint)?;
    if href.starts_with('/') {
        return Some(format!("{}{}", origin, href));
    }

    // Path-relative: resolve against the endpoint's directory.
    let base = match endpoint.rfind('/') {
        Some(pos) if pos > origin.len() => &endpoint[..pos + 1],
        _ => return Some(format!("{}/{}", origin, href)),
    };
    Some(format!("{}{}", base, href))
}

/// `scheme://host[:port]` of an endpoint URL.
fn origin_of(endpoint: &str) -> Option<String> {
    let scheme_end = endpoint.find("://")?;
    let rest = &endpoint[scheme_end + 3..];
    let host_end = rest.find('/').unwrap_or(rest.len());
    Some(format!("{}{}", &endpoint[..scheme_end + 3], &rest[..host_end]))
}

fn apply_detail_fields(grant: &mut Grant, fields: enrich::DetailFields) {
    if fields.description != UNCONFIRMED {
        grant.description = fields.description;
    }
    if fields.deadline != crate::types::DEADLINE_UNCONFIRMED {
        grant.deadline = fields.deadline;
    }
    if fields.amount != UNCONFIRMED {
        grant.amount = fields.amount;
    }
    if fields.ratio != UNCONFIRMED {
        grant.ratio = fields.ratio;
    }
}
