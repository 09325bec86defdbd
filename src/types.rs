use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel for fields the source pages did not expose.
pub const UNCONFIRMED: &str = "詳細はWebサイトで確認";
/// Shorter sentinel used when a listing page has a deadline slot but it is empty.
pub const DEADLINE_UNCONFIRMED: &str = "要確認";

/// One discovered grant/subsidy announcement.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Grant {
    pub title: String,
    pub url: String,
    /// Listing/publication date as shown by the source, today's date otherwise.
    #[serde(rename = "source_date")]
    pub source_date: String,
    /// Name of the source that produced this grant.
    pub source: String,
    pub description: String,
    pub deadline: String,
    pub amount: String,
    pub ratio: String,
}

impl Grant {
    /// A grant with every descriptive field at its sentinel default.
    pub fn new(title: String, url: String, source: &str, source_date: String) -> Self {
        Grant {
            title,
            url,
            source_date,
            source: source.to_string(),
            description: UNCONFIRMED.to_string(),
            deadline: UNCONFIRMED.to_string(),
            amount: UNCONFIRMED.to_string(),
            ratio: UNCONFIRMED.to_string(),
        }
    }
}

/// Application priority as judged by the advisory call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Priority {
    High,
    Medium,
    Low,
    Unknown,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::High => "高",
            Priority::Medium => "中",
            Priority::Low => "低",
            Priority::Unknown => "不明",
        };
        write!(f, "{}", label)
    }
}

/// Outcome of one advisory classification call.
///
/// `eligible` stays free text because the upstream response is unconstrained
/// natural language; only `priority` is narrowed to an enum.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluationResult {
    pub eligible: String,
    pub reason: String,
    pub priority: Priority,
}

impl EvaluationResult {
    pub fn unknown() -> Self {
        EvaluationResult {
            eligible: "不明".to_string(),
            reason: "不明".to_string(),
            priority: Priority::Unknown,
        }
    }

    /// Result emitted when the advisory call itself fails.
    pub fn failed(cause: &str) -> Self {
        let marker = format!("評価エラー: {}", cause);
        EvaluationResult {
            eligible: marker.clone(),
            reason: marker,
            priority: Priority::Unknown,
        }
    }
}

/// A grant together with its evaluation, ready for reporting.
#[derive(Debug, Clone)]
pub struct EvaluatedGrant {
    pub grant: Grant,
    pub evaluation: EvaluationResult,
}

/// Fixed target-business descriptor. Constructed once per run, read-only.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Full region description used in the advisory prompt (e.g. 長野県塩尻市).
    pub region: String,
    /// Prefecture token that marks a title as local (e.g. 長野).
    pub region_token: String,
    pub industry: String,
    pub employees: u32,
    /// Keywords that mark an announcement as unmistakably on-topic.
    #[serde(default)]
    pub industry_keywords: Vec<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            region: "長野県塩尻市".to_string(),
            region_token: "長野".to_string(),
            industry: "情報通信業".to_string(),
            employees: 56,
            industry_keywords: [
                "IT", "システム", "デジタル", "情報通信", "DX", "セキュリティ",
                "アプリ", "ソフトウェア", "ICT", "クラウド", "AI", "IoT",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Per-run tunables. Constructed once in `main`, read-only thereafter.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub profile: Profile,
    /// Below this many grants after filtering, the static backup set is used.
    pub min_results: usize,
    /// Character budget for the notification payload.
    pub notification_budget: usize,
    pub http_timeout_secs: u64,
    pub advisor_model: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            profile: Profile::default(),
            min_results: 3,
            notification_budget: 3500,
            http_timeout_secs: 30,
            advisor_model: "gpt-4o-mini".to_string(),
        }
    }
}
