//! Rule-based relevance filtering against the target business profile.
//!
//! No scoring, no ML: a small fixed rule chain over title + description
//! text. The industry-keyword override runs before the region/industry
//! exclusions so that unmistakably on-topic announcements are never dropped
//! by the blunter heuristics.

use crate::types::{Grant, Profile};

/// All prefecture tokens. A title naming one of these (other than the
/// profile's own) marks a region-limited programme.
const PREFECTURES: &[&str] = &[
    "北海道", "青森", "岩手", "宮城", "秋田", "山形", "福島", "茨城", "栃木",
    "群馬", "埼玉", "千葉", "東京", "神奈川", "新潟", "富山", "石川", "福井",
    "山梨", "長野", "岐阜", "静岡", "愛知", "三重", "滋賀", "京都", "大阪",
    "兵庫", "奈良", "和歌山", "鳥取", "島根", "岡山", "広島", "山口", "徳島",
    "香川", "愛媛", "高知", "福岡", "佐賀", "長崎", "熊本", "大分", "宮崎",
    "鹿児島", "沖縄",
];

/// Tokens that mark a programme as open regardless of region.
const NATIONWIDE_TOKENS: &[&str] = &["全国"];

/// Titles signalling a programme scoped to primary industries.
const INCOMPATIBLE_INDUSTRY_TOKENS: &[&str] = &["農業", "農林", "漁業"];

/// Explicit application-closed markers.
const CLOSED_MARKERS: &[&str] = &["募集終了", "受付終了", "申請受付を終了", "公募終了"];

/// Filter grants for the target profile. Pure and order-preserving.
pub fn filter_for_profile(grants: Vec<Grant>, profile: &Profile) -> Vec<Grant> {
    let before = grants.len();
    let kept: Vec<Grant> = grants
        .into_iter()
        .filter(|g| is_relevant(g, profile))
        .collect();
    log::info!("Filtered grants: {} of {} kept", kept.len(), before);
    kept
}

/// Decide one grant. See module docs for rule order.
pub fn is_relevant(grant: &Grant, profile: &Profile) -> bool {
    let title = grant.title.as_str();
    let text = format!("{} {}", grant.title, grant.description);

    // Closed announcements are out, no matter how on-topic.
    if CLOSED_MARKERS.iter().any(|m| text.contains(m)) {
        return false;
    }

    // Unmistakably on-topic items are always in.
    if contains_industry_keyword(&text, profile) {
        return true;
    }

    // Region-limited programmes for some other prefecture.
    if mentions_other_prefecture(title, profile)
        && !title.contains(profile.region_token.as_str())
        && !NATIONWIDE_TOKENS.iter().any(|t| title.contains(t))
    {
        return false;
    }

    // Programmes scoped to an incompatible industry.
    if INCOMPATIBLE_INDUSTRY_TOKENS.iter().any(|t| title.contains(t)) {
        return false;
    }

    true
}

fn contains_industry_keyword(text: &str, profile: &Profile) -> bool {
    let text_lower = text.to_lowercase();
    profile
        .industry_keywords
        .iter()
        .any(|kw| text_lower.contains(&kw.to_lowercase()))
}

fn mentions_other_prefecture(title: &str, profile: &Profile) -> bool {
    PREFECTURES
        .iter()
        .filter(|p| **p != profile.region_token)
        .any(|p| title.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(title: &str, description: &str) -> Grant {
        let mut g = Grant::new(
            title.to_string(),
            format!("https://example.jp/{}", title.len()),
            "test",
            "2025年4月1日".to_string(),
        );
        g.description = description.to_string();
        g
    }

    fn profile() -> Profile {
        Profile::default()
    }

    #[test]
    fn test_nationwide_grant_included() {
        assert!(is_relevant(&grant("小規模事業者持続化補助金", "販路開拓を支援"), &profile()));
    }

    #[test]
    fn test_other_prefecture_excluded() {
        assert!(!is_relevant(&grant("東京都中小企業振興助成金", "都内企業向け"), &profile()));
    }

    #[test]
    fn test_own_region_included() {
        assert!(is_relevant(&grant("長野県産業振興助成金", "県内企業向け"), &profile()));
    }

    #[test]
    fn test_nationwide_token_overrides_prefecture_mention() {
        assert!(is_relevant(
            &grant("全国・北海道ほか対象 設備投資補助金", "全国の中小企業向け"),
            &profile()
        ));
    }

    #[test]
    fn test_keyword_override_beats_region_exclusion() {
        // Mentions another prefecture but carries an industry keyword.
        assert!(is_relevant(&grant("北海道中小企業DX補助金", ""), &profile()));
    }

    #[test]
    fn test_keyword_override_beats_industry_exclusion() {
        assert!(is_relevant(
            &grant("農業分野向け補助金", "農作業のIoT化・スマートシステム導入を支援"),
            &profile()
        ));
    }

    #[test]
    fn test_agriculture_only_excluded() {
        assert!(!is_relevant(&grant("農業経営基盤強化資金", "農地取得を支援"), &profile()));
    }

    #[test]
    fn test_closed_marker_excluded_even_with_keyword() {
        assert!(!is_relevant(
            &grant("IT導入補助金2024", "本年度の募集終了しました"),
            &profile()
        ));
    }

    #[test]
    fn test_keyword_in_description_forces_include() {
        assert!(is_relevant(
            &grant("沖縄県産業支援事業", "クラウド活用による業務効率化を支援"),
            &profile()
        ));
    }

    #[test]
    fn test_filter_preserves_order() {
        let grants = vec![
            grant("IT導入補助金", ""),
            grant("東京都限定助成金", ""),
            grant("ものづくり補助金", "試作品開発支援"),
        ];
        let kept = filter_for_profile(grants, &profile());
        let titles: Vec<&str> = kept.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["IT導入補助金", "ものづくり補助金"]);
    }

    #[test]
    fn test_every_keyword_forces_include() {
        let p = profile();
        for kw in &p.industry_keywords {
            let g = grant(&format!("北海道限定{}支援事業", kw), "");
            assert!(is_relevant(&g, &p), "keyword {} failed to override", kw);
        }
    }
}
