//! Advisory classification of filtered grants.
//!
//! The external model is an untyped string-in/string-out boundary behind the
//! [`Advisor`] trait. The prompt requests three labeled fields and the reply
//! is parsed with tolerant line matching; everything the parser cannot place
//! stays at its "unknown" sentinel, and a failed call yields an explicit
//! failure-marked result so the batch always continues.

use crate::types::{EvaluationResult, Grant, Priority, Profile};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

/// The advisory text-generation boundary.
pub trait Advisor {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Chat-completions client for the advisory call.
pub struct OpenAiAdvisor {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

impl OpenAiAdvisor {
    pub fn new(client: reqwest::blocking::Client, api_key: String, model: String) -> Self {
        OpenAiAdvisor { client, api_key, model }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl Advisor for OpenAiAdvisor {
    fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .context("advisory request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("advisory call returned HTTP {}", response.status().as_u16()));
        }

        let parsed: ChatResponse = response.json().context("advisory response was not valid JSON")?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| anyhow!("advisory response contained no choices"))?;
        Ok(content)
    }
}

/// Fixed advisory prompt, embedding the richer field set: missing fields are
/// passed as their sentinel rather than omitted.
pub fn build_prompt(grant: &Grant, profile: &Profile) -> String {
    format!(
        "あなたは企業向け助成金アドバイザーです。\n\
         以下の助成金が、{region}の{industry}・従業員{employees}名の中小企業にとって申請対象になるか、また申請優先度（高・中・低）を判定してください。\n\
         \n\
         【助成金名】{title}\n\
         【詳細URL】{url}\n\
         【概要】{description}\n\
         【申請期限】{deadline}\n\
         【助成金額】{amount}\n\
         【補助割合】{ratio}\n\
         \n\
         回答形式は以下でお願いします：\n\
         ---\n\
         対象かどうか: （はい／いいえ）\n\
         理由: （簡単に）\n\
         申請優先度: （高／中／低）\n\
         ---\n",
        region = profile.region,
        industry = profile.industry,
        employees = profile.employees,
        title = grant.title,
        url = grant.url,
        description = grant.description,
        deadline = grant.deadline,
        amount = grant.amount,
        ratio = grant.ratio,
    )
}

/// Labels accepted for each field. Matching is prefix-based per line, with or
/// without a trailing colon, so the model's exact phrasing does not matter.
const ELIGIBLE_LABELS: &[&str] = &["対象かどうか", "対象可否", "対象", "eligibility", "eligible"];
const REASON_LABELS: &[&str] = &["理由", "判定理由", "reason"];
const PRIORITY_LABELS: &[&str] = &["申請優先度", "優先度", "priority"];

/// Parse a free-text advisory reply into a structured result.
///
/// Lines are scanned independently: order is free, labels may or may not be
/// followed by `：`/`:`, bullets and rules are ignored. Unmatched fields
/// default to 不明/Unknown.
pub fn parse_reply(text: &str) -> EvaluationResult {
    let mut result = EvaluationResult::unknown();
    let mut priority_raw: Option<String> = None;

    for line in text.lines() {
        let line = line
            .trim()
            .trim_start_matches(['-', '・', '*', '●', '◆'])
            .trim();
        if line.is_empty() {
            continue;
        }

        if let Some(value) = match_label(line, ELIGIBLE_LABELS) {
            if result.eligible == "不明" && !value.is_empty() {
                result.eligible = value;
            }
        } else if let Some(value) = match_label(line, PRIORITY_LABELS) {
            if priority_raw.is_none() && !value.is_empty() {
                priority_raw = Some(value);
            }
        } else if let Some(value) = match_label(line, REASON_LABELS) {
            if result.reason == "不明" && !value.is_empty() {
                result.reason = value;
            }
        }
    }

    if let Some(raw) = priority_raw {
        result.priority = parse_priority(&raw);
    }
    result
}

/// Rest of the line after a label and optional colon, cleaned of decoration.
fn match_label(line: &str, labels: &[&str]) -> Option<String> {
    for label in labels {
        let rest = if let Some(rest) = line.strip_prefix(label) {
            rest
        } else {
            // English labels may arrive in any case.
            let lower = line.to_lowercase();
            if lower.starts_with(&label.to_lowercase()) {
                &line[label.len()..]
            } else {
                continue;
            }
        };
        let value = rest
            .trim_start_matches(['：', ':', ' ', '　'])
            .trim()
            .trim_matches(['（', '）', '(', ')'])
            .trim()
            .to_string();
        return Some(value);
    }
    None
}

fn parse_priority(raw: &str) -> Priority {
    let lower = raw.to_lowercase();
    if raw.contains('高') || lower.contains("high") {
        Priority::High
    } else if raw.contains('中') || lower.contains("medium") {
        Priority::Medium
    } else if raw.contains('低') || lower.contains("low") {
        Priority::Low
    } else {
        Priority::Unknown
    }
}

/// Evaluate one grant. A call failure becomes an explicit failure-marked
/// result; the caller's batch continues either way.
pub fn evaluate(advisor: &dyn Advisor, grant: &Grant, profile: &Profile) -> EvaluationResult {
    let prompt = build_prompt(grant, profile);
    match advisor.complete(&prompt) {
        Ok(reply) => parse_reply(&reply),
        Err(e) => {
            log::warn!("advisory call failed for {}: {}", grant.title, e);
            EvaluationResult::failed(&e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply_canonical_form() {
        let reply = "---\n対象かどうか: はい\n理由: IT導入を支援する制度のため\n申請優先度: 高\n---";
        let result = parse_reply(reply);
        assert_eq!(result.eligible, "はい");
        assert_eq!(result.reason, "IT導入を支援する制度のため");
        assert_eq!(result.priority, Priority::High);
    }

    #[test]
    fn test_parse_reply_without_colons() {
        let reply = "対象かどうか （はい）\n理由 全国の中小企業が対象\n申請優先度 中";
        let result = parse_reply(reply);
        assert_eq!(result.eligible, "はい");
        assert_eq!(result.reason, "全国の中小企業が対象");
        assert_eq!(result.priority, Priority::Medium);
    }

    #[test]
    fn test_parse_reply_order_free_and_bulleted() {
        let reply = "・申請優先度：低\n・理由：地域要件を満たさない可能性\n・対象かどうか：いいえ";
        let result = parse_reply(reply);
        assert_eq!(result.eligible, "いいえ");
        assert_eq!(result.priority, Priority::Low);
        assert!(result.reason.contains("地域要件"));
    }

    #[test]
    fn test_parse_reply_alternate_label_spelling() {
        let reply = "対象: はい\n優先度: 高";
        let result = parse_reply(reply);
        assert_eq!(result.eligible, "はい");
        assert_eq!(result.priority, Priority::High);
        assert_eq!(result.reason, "不明");
    }

    #[test]
    fn test_parse_reply_unparseable_text_defaults() {
        let result = parse_reply("申し訳ありませんが、判断できませんでした。");
        assert_eq!(result.eligible, "不明");
        assert_eq!(result.reason, "不明");
        assert_eq!(result.priority, Priority::Unknown);
    }

    #[test]
    fn test_parse_reply_english_labels() {
        let reply = "Eligible: yes\nReason: nationwide SME programme\nPriority: high";
        let result = parse_reply(reply);
        assert_eq!(result.eligible, "yes");
        assert_eq!(result.priority, Priority::High);
    }

    struct FailingAdvisor;
    impl Advisor for FailingAdvisor {
        fn complete(&self, _prompt: &str) -> Result<String> {
            Err(anyhow!("connection timed out"))
        }
    }

    #[test]
    fn test_evaluate_call_failure_is_marked_not_absent() {
        let grant = Grant::new(
            "IT導入補助金".to_string(),
            "https://example.jp/it".to_string(),
            "test",
            "2025年4月1日".to_string(),
        );
        let result = evaluate(&FailingAdvisor, &grant, &Profile::default());
        assert!(result.eligible.starts_with("評価エラー:"));
        assert!(result.reason.contains("connection timed out"));
        assert_eq!(result.priority, Priority::Unknown);
    }

    #[test]
    fn test_build_prompt_embeds_all_fields() {
        let mut grant = Grant::new(
            "ものづくり補助金".to_string(),
            "https://example.jp/mono".to_string(),
            "test",
            "2025年4月1日".to_string(),
        );
        grant.amount = "1,000万円".to_string();
        let prompt = build_prompt(&grant, &Profile::default());
        assert!(prompt.contains("ものづくり補助金"));
        assert!(prompt.contains("https://example.jp/mono"));
        assert!(prompt.contains("1,000万円"));
        // Missing fields are present as sentinels, not omitted.
        assert!(prompt.contains("詳細はWebサイトで確認"));
        assert!(prompt.contains("長野県塩尻市"));
        assert!(prompt.contains("56"));
    }
}
