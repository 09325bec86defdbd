//! Static backup dataset.
//!
//! Well-known nationwide subsidy programmes, used when the live sources
//! yield too few candidates to be worth reporting. These programmes recur
//! yearly, so the entries point at their stable portal pages and leave the
//! round-specific fields at "confirm on site".

use crate::types::{Grant, DEADLINE_UNCONFIRMED, UNCONFIRMED};
use chrono::Utc;

const SOURCE_NAME: &str = "バックアップデータ";

/// Nationwide programmes every SME is potentially eligible for.
pub fn national_grants() -> Vec<Grant> {
    let today = Utc::now().format("%Y年%m月%d日").to_string();

    let entries: &[(&str, &str, &str, &str, &str)] = &[
        (
            "IT導入補助金",
            "https://it-shien.smrj.go.jp/",
            "中小企業・小規模事業者のITツール（ソフトウェア、クラウドサービス等）導入を支援する補助金",
            "5万円～450万円",
            "2分の1以内",
        ),
        (
            "ものづくり補助金",
            "https://portal.monodukuri-hojo.jp/",
            "革新的サービス開発・試作品開発・生産プロセスの改善を行う中小企業の設備投資等を支援",
            "750万円～1,250万円",
            "2分の1以内",
        ),
        (
            "小規模事業者持続化補助金",
            "https://r3.jizokukahojokin.info/",
            "小規模事業者の販路開拓や生産性向上の取組を支援する補助金",
            "50万円～200万円",
            "3分の2以内",
        ),
        (
            "事業再構築補助金",
            "https://jigyou-saikouchiku.go.jp/",
            "新分野展開、業態転換、事業・業種転換等の思い切った事業再構築に意欲を有する中小企業等を支援",
            "100万円～1億円",
            "3分の2以内",
        ),
        (
            "キャリアアップ助成金",
            "https://www.mhlw.go.jp/stf/seisakunitsuite/bunya/koyou_roudou/part_haken/jigyounushi/career.html",
            "非正規雇用労働者の正社員化や処遇改善を行った事業主への助成金",
            "57万円～72万円／人",
            UNCONFIRMED,
        ),
        (
            "人材開発支援助成金",
            "https://www.mhlw.go.jp/stf/seisakunitsuite/bunya/koyou_roudou/koyou/kyufukin/d01-1.html",
            "労働者への職業訓練等を実施した事業主に訓練経費や訓練期間中の賃金の一部を助成",
            "経費の最大75%",
            "45%～75%",
        ),
    ];

    entries
        .iter()
        .map(|(title, url, description, amount, ratio)| Grant {
            title: title.to_string(),
            url: url.to_string(),
            source_date: today.clone(),
            source: SOURCE_NAME.to_string(),
            description: description.to_string(),
            deadline: DEADLINE_UNCONFIRMED.to_string(),
            amount: amount.to_string(),
            ratio: ratio.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_set_is_non_empty_and_complete() {
        let grants = national_grants();
        assert!(grants.len() >= 3);
        for grant in &grants {
            assert!(!grant.title.is_empty());
            assert!(grant.url.starts_with("https://"));
            assert!(!grant.description.is_empty());
        }
    }
}
