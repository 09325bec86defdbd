//! Built-in source definitions.
//!
//! The order of [`builtin_sources`] is the fetch order, and because
//! deduplication keeps the first occurrence per key, it is also the priority
//! order between sources that list the same announcement. Sources with
//! richer listings come first.

use super::{SelectorStrategy, SourceSpec};

/// Keywords that mark a mixed news item as grant-related.
const GRANT_KEYWORDS: &[&str] = &["補助", "助成", "支援金", "給付金"];

/// J-Net21 (中小企業基盤整備機構の支援情報サイト). Detail pages carry
/// deadline/amount/ratio, so items are enriched.
const JNET21: SourceSpec = SourceSpec {
    name: "J-Net21",
    endpoints: &[
        "https://j-net21.smrj.go.jp/snavi/support/",
        "https://j-net21.smrj.go.jp/snavi/articles/",
    ],
    strategies: &[
        SelectorStrategy {
            item: ".article-list li",
            title: &[".article-list-title", "h3", "a"],
            link: None,
            description: Some(".article-list-description"),
            deadline: None,
            date: Some(".article-list-date"),
            min_title_len: 5,
        },
        SelectorStrategy {
            item: "article",
            title: &["h2", "h3", "a"],
            link: None,
            description: None,
            deadline: None,
            date: Some("time"),
            min_title_len: 5,
        },
    ],
    keyword_gate: GRANT_KEYWORDS,
    default_description: "",
    enrich_details: true,
};

/// ミラサポplus (中小企業庁の総合支援サイト).
const MIRASAPO: SourceSpec = SourceSpec {
    name: "ミラサポplus",
    endpoints: &["https://mirasapo-plus.go.jp/subsidy/"],
    strategies: &[SelectorStrategy {
        item: ".subsidy-item",
        title: &[".subsidy-item-title"],
        link: None,
        description: Some(".subsidy-item-description"),
        deadline: Some(".subsidy-item-deadline"),
        date: None,
        min_title_len: 5,
    }],
    keyword_gate: &[],
    default_description: "",
    enrich_details: false,
};

/// 経済産業省の補助金総合ページ. Listing is a bare link index, so titles are
/// the link texts themselves.
const METI: SourceSpec = SourceSpec {
    name: "経済産業省",
    endpoints: &["https://www.meti.go.jp/policy/hojyokin/index.html"],
    strategies: &[
        SelectorStrategy::items("a[href*='hojyo']", &[]),
        SelectorStrategy::items("a[href*='subsidy']", &[]),
        SelectorStrategy::items(".subsidy", &[]),
    ],
    keyword_gate: &[],
    default_description: "経済産業省の助成金・補助金制度",
    enrich_details: false,
};

/// GビズIDポータルの補助金一覧.
const GBIZ: SourceSpec = SourceSpec {
    name: "GビズIDポータル",
    endpoints: &["https://gbiz-id.go.jp/subsidies/"],
    strategies: &[
        SelectorStrategy {
            item: ".subsidy-item",
            title: &[".subsidy-title", "h3", "strong"],
            link: Some("a[href]"),
            description: Some(".subsidy-description"),
            deadline: None,
            date: None,
            min_title_len: 5,
        },
        SelectorStrategy {
            item: ".subsidy-list li",
            title: &["h3", "strong", "a"],
            link: Some("a[href]"),
            description: Some("p"),
            deadline: None,
            date: None,
            min_title_len: 5,
        },
    ],
    keyword_gate: &[],
    default_description: "",
    enrich_details: false,
};

/// 長野県中小企業振興センターのトピックス. Mixed news list, so the keyword
/// gate applies; deadlines sometimes appear inline next to the link.
const NAGANO_CENTER: SourceSpec = SourceSpec {
    name: "長野県中小企業振興センター",
    endpoints: &[
        "https://www.nice-nagano.or.jp/topics/",
        "https://www.nice-nagano.or.jp/subsidy/",
    ],
    strategies: &[
        SelectorStrategy {
            item: ".topics-list li",
            title: &["h3", "h4", "a", "strong"],
            link: None,
            description: None,
            deadline: None,
            date: Some(".date"),
            min_title_len: 5,
        },
        SelectorStrategy {
            item: ".news-list li",
            title: &["h3", "h4", "a", "strong"],
            link: None,
            description: None,
            deadline: None,
            date: Some("time"),
            min_title_len: 5,
        },
    ],
    keyword_gate: GRANT_KEYWORDS,
    default_description: "",
    enrich_details: false,
};

/// 日本商工会議所のニュース一覧.
const JCCI: SourceSpec = SourceSpec {
    name: "日本商工会議所",
    endpoints: &["https://www.jcci.or.jp/news/"],
    strategies: &[
        SelectorStrategy {
            item: ".news-list li",
            title: &["h3", "h4", "a"],
            link: None,
            description: None,
            deadline: None,
            date: Some(".date"),
            min_title_len: 5,
        },
        SelectorStrategy {
            item: ".news-item",
            title: &["h3", "h4", "a"],
            link: None,
            description: None,
            deadline: None,
            date: Some("time"),
            min_title_len: 5,
        },
    ],
    keyword_gate: GRANT_KEYWORDS,
    default_description: "日本商工会議所からの情報提供",
    enrich_details: false,
};

static BUILTIN: [SourceSpec; 6] = [JNET21, MIRASAPO, METI, GBIZ, NAGANO_CENTER, JCCI];

/// All built-in sources, in fetch (and dedup priority) order.
pub fn builtin_sources() -> &'static [SourceSpec] {
    &BUILTIN
}
