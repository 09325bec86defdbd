//! Report assembly: sink rows and the notification payload.

use crate::normalize::simplify_title;
use crate::types::EvaluatedGrant;

/// Suffix appended when the notification exceeds its character budget.
const TRUNCATION_SUFFIX: &str = "（続きはスプレッドシートをご確認ください）";
/// Reasons longer than this are shortened in the notification.
const REASON_MAX_CHARS: usize = 60;

/// Column order of the tabular report. `grant_row` must stay in sync.
pub fn header_row() -> Vec<String> {
    [
        "No.", "助成金名", "URL", "掲載日", "情報源", "概要", "申請期限",
        "助成金額", "補助割合", "対象可否", "理由", "優先度",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// One sink row per evaluated grant, in declared column order.
pub fn grant_row(index: usize, record: &EvaluatedGrant) -> Vec<String> {
    let grant = &record.grant;
    let eval = &record.evaluation;
    vec![
        (index + 1).to_string(),
        simplify_title(&grant.title),
        grant.url.clone(),
        grant.source_date.clone(),
        grant.source.clone(),
        grant.description.clone(),
        grant.deadline.clone(),
        grant.amount.clone(),
        grant.ratio.clone(),
        eval.eligible.clone(),
        eval.reason.clone(),
        eval.priority.to_string(),
    ]
}

/// Assemble the whole report: header plus one row per evaluated grant, and
/// the bounded notification text.
pub fn assemble(records: &[EvaluatedGrant], char_budget: usize) -> (Vec<Vec<String>>, String) {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(header_row());
    for (index, record) in records.iter().enumerate() {
        rows.push(grant_row(index, record));
    }
    (rows, build_notification(records, char_budget))
}

/// Human-readable notification text, bounded by `char_budget`.
///
/// One block per grant, blank-line separated. When the budget is exceeded the
/// text is cut at a block boundary with an explicit pointer to the sink
/// instead of silently dropping the tail. Never returns an empty string.
pub fn build_notification(records: &[EvaluatedGrant], char_budget: usize) -> String {
    if records.is_empty() {
        return "📋 本日の助成金情報: 該当する助成金は見つかりませんでした。".to_string();
    }

    let header = format!("📋 助成金レポート（{}件）", records.len());
    let mut text = header;
    let mut included = 0usize;

    for record in records {
        let block = notification_block(record);
        let candidate_len = text.chars().count() + 2 + block.chars().count();
        // Keep room for the truncation suffix if this is not the last block.
        if candidate_len + TRUNCATION_SUFFIX.chars().count() + 2 > char_budget {
            break;
        }
        text.push_str("\n\n");
        text.push_str(&block);
        included += 1;
    }

    if included < records.len() {
        text.push_str("\n\n");
        text.push_str(TRUNCATION_SUFFIX);
    }
    text
}

fn notification_block(record: &EvaluatedGrant) -> String {
    let grant = &record.grant;
    let eval = &record.evaluation;
    format!(
        "■ {}\n対象: {} ／ 優先度: {}\n理由: {}\n{}",
        simplify_title(&grant.title),
        eval.eligible,
        eval.priority,
        shorten(&eval.reason, REASON_MAX_CHARS),
        grant.url,
    )
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EvaluationResult, Grant, Priority};

    fn record(title: &str, reason: &str) -> EvaluatedGrant {
        EvaluatedGrant {
            grant: Grant::new(
                title.to_string(),
                format!("https://example.jp/{}", title.len()),
                "test",
                "2025年4月1日".to_string(),
            ),
            evaluation: EvaluationResult {
                eligible: "はい".to_string(),
                reason: reason.to_string(),
                priority: Priority::High,
            },
        }
    }

    #[test]
    fn test_header_and_row_have_same_arity() {
        let row = grant_row(0, &record("IT導入補助金", "対象です"));
        assert_eq!(header_row().len(), row.len());
        assert_eq!(row[0], "1");
        assert_eq!(row[1], "IT導入補助金");
        assert_eq!(row[11], "高");
    }

    #[test]
    fn test_row_simplifies_garbled_title() {
        let rec = record("IT導入\u{3000}補助金\r\n2025", "対象です");
        let row = grant_row(0, &rec);
        assert_eq!(row[1], "IT導入 補助金 2025");
    }

    #[test]
    fn test_assemble_pairs_rows_with_notification() {
        let records = vec![record("IT導入補助金", "対象です"), record("ものづくり補助金", "対象です")];
        let (rows, notification) = assemble(&records, 3500);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], header_row());
        assert_eq!(rows[1][0], "1");
        assert_eq!(rows[2][0], "2");
        assert!(notification.contains("IT導入補助金"));
    }

    #[test]
    fn test_notification_contains_each_block() {
        let records = vec![record("IT導入補助金", "対象です"), record("ものづくり補助金", "対象です")];
        let text = build_notification(&records, 3500);
        assert!(text.contains("2件"));
        assert!(text.contains("■ IT導入補助金"));
        assert!(text.contains("■ ものづくり補助金"));
        assert!(text.contains("優先度: 高"));
    }

    #[test]
    fn test_notification_truncates_with_suffix() {
        let records: Vec<EvaluatedGrant> = (0..50)
            .map(|i| record(&format!("助成金プログラム第{}号", i), &"理由".repeat(30)))
            .collect();
        let text = build_notification(&records, 500);
        assert!(text.chars().count() <= 500);
        assert!(text.ends_with(TRUNCATION_SUFFIX));
    }

    #[test]
    fn test_notification_never_empty() {
        let text = build_notification(&[], 3500);
        assert!(!text.is_empty());
        assert!(text.contains("見つかりませんでした"));
    }

    #[test]
    fn test_long_reason_shortened() {
        let rec = record("IT導入補助金", &"あ".repeat(200));
        let text = build_notification(&[rec], 3500);
        assert!(text.contains(&format!("{}…", "あ".repeat(60))));
    }
}
