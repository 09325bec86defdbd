//! Pipeline orchestration.
//!
//! One batch pass: fetch every source in fixed order, merge, dedupe, filter,
//! fall back to the static backup set when too little survives, evaluate,
//! then publish to the sink and the notification channel. Single-threaded
//! and fully synchronous; every stage either recovers locally or the run
//! aborts with a best-effort failure notification. The notification channel
//! receives a message on every run.

use crate::evaluate::{self, Advisor};
use crate::filter;
use crate::normalize;
use crate::notify::Notifier;
use crate::report;
use crate::scrapers::{self, SourceSpec};
use crate::sink::ReportSink;
use crate::types::{EvaluatedGrant, Grant, RunConfig};
use anyhow::{Context, Result};
use log::{info, warn};

/// Summary of one completed run.
#[derive(Debug)]
pub struct RunSummary {
    pub fetched: usize,
    pub after_dedupe: usize,
    pub after_filter: usize,
    pub reported: usize,
    pub used_backup: bool,
}

/// Execute the full batch pass.
///
/// The only errors returned are fatal sink failures; a failure notification
/// has already been attempted by the time the error propagates.
pub fn run(
    cfg: &RunConfig,
    http: &reqwest::blocking::Client,
    sources: &[SourceSpec],
    advisor: &dyn Advisor,
    sink: &mut dyn ReportSink,
    notifier: &dyn Notifier,
) -> Result<RunSummary> {
    info!("Grant discovery run started");

    let mut all_grants: Vec<Grant> = Vec::new();
    for spec in sources {
        let grants = scrapers::fetch_source(http, spec);
        info!("{}: {} grants", spec.name, grants.len());
        all_grants.extend(grants);
    }
    info!("Fetched {} grants across {} sources", all_grants.len(), sources.len());

    process(cfg, all_grants, advisor, sink, notifier)
}

/// The post-fetch stages, separated so tests can drive them with fixed
/// candidate lists. Input order is the fetch order and determines dedup
/// priority and report order.
pub fn process(
    cfg: &RunConfig,
    grants: Vec<Grant>,
    advisor: &dyn Advisor,
    sink: &mut dyn ReportSink,
    notifier: &dyn Notifier,
) -> Result<RunSummary> {
    let fetched = grants.len();

    let deduped = normalize::dedupe_grants(grants);
    let after_dedupe = deduped.len();
    info!("After dedupe: {} grants", after_dedupe);

    let mut filtered = filter::filter_for_profile(deduped, &cfg.profile);
    let after_filter = filtered.len();

    let mut used_backup = false;
    if filtered.len() < cfg.min_results {
        warn!(
            "Only {} grants survived filtering (minimum {}), using backup dataset",
            filtered.len(),
            cfg.min_results
        );
        filtered = scrapers::backup::national_grants();
        used_backup = true;
    }

    let records: Vec<EvaluatedGrant> = filtered
        .iter()
        .map(|grant| EvaluatedGrant {
            grant: grant.clone(),
            evaluation: evaluate::evaluate(advisor, grant, &cfg.profile),
        })
        .collect();

    let result = publish(cfg, &records, sink, notifier);
    match result {
        Ok(reported) => {
            info!("Run finished: {} grants reported", reported);
            Ok(RunSummary {
                fetched,
                after_dedupe,
                after_filter,
                reported,
                used_backup,
            })
        }
        Err(e) => {
            // Best effort: the channel must hear about failed runs too.
            let message = format!("❌ 助成金情報の取得処理でエラーが発生しました: {}", e);
            if let Err(notify_err) = notifier.post(&message) {
                warn!("failure notification could not be delivered: {}", notify_err);
            }
            Err(e)
        }
    }
}

/// Write the report and post the notification.
///
/// Clearing the sink or writing the header is fatal; individual row failures
/// are logged and the remaining rows continue.
fn publish(
    cfg: &RunConfig,
    records: &[EvaluatedGrant],
    sink: &mut dyn ReportSink,
    notifier: &dyn Notifier,
) -> Result<usize> {
    let (rows, notification) = report::assemble(records, cfg.notification_budget);

    sink.clear().context("failed to clear the report sink")?;
    let mut rows = rows.iter();
    if let Some(header) = rows.next() {
        sink.append_row(header)
            .context("failed to write the report header")?;
    }

    let mut written = 0usize;
    for (index, row) in rows.enumerate() {
        match sink.append_row(row) {
            Ok(()) => written += 1,
            Err(e) => warn!("failed to write row {} ({}): {}", index + 1, row[1], e),
        }
    }

    match notifier.post(&notification) {
        Ok(()) => info!("Notification delivered ({} chars)", notification.chars().count()),
        Err(e) => warn!("notification delivery failed: {}", e),
    }

    Ok(written)
}
