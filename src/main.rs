use anyhow::Result;
use log::{error, info, warn};
use search_grants::config::{self, Credentials};
use search_grants::evaluate::OpenAiAdvisor;
use search_grants::notify::{LogNotifier, Notifier, WebhookNotifier};
use search_grants::pipeline;
use search_grants::scrapers::sources;
use search_grants::sink::HttpSheetSink;
use search_grants::types::RunConfig;

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let root = std::env::var("ROOT").unwrap_or_else(|_| ".".to_string());
    let http = config::build_http_client(RunConfig::default().http_timeout_secs)?;

    // The notifier is built before anything that can fail, so even a
    // credential failure still reaches the channel.
    let notifier: Box<dyn Notifier> = match config::webhook_from_env() {
        Some(url) => Box::new(WebhookNotifier::new(http.clone(), url)),
        None => Box::new(LogNotifier),
    };

    let (cfg, advisor, mut sink) = match setup(&root, &http) {
        Ok(parts) => parts,
        Err(e) => {
            let message = format!("❌ 助成金情報の取得処理を開始できませんでした: {}", e);
            if let Err(notify_err) = notifier.post(&message) {
                warn!("failure notification could not be delivered: {}", notify_err);
            }
            error!("startup failed: {:#}", e);
            return Err(e);
        }
    };

    match pipeline::run(
        &cfg,
        &http,
        sources::builtin_sources(),
        &advisor,
        &mut sink,
        notifier.as_ref(),
    ) {
        Ok(summary) => {
            info!(
                "Done: fetched {}, deduped {}, filtered {}, reported {}{}",
                summary.fetched,
                summary.after_dedupe,
                summary.after_filter,
                summary.reported,
                if summary.used_backup { " (backup dataset)" } else { "" },
            );
            Ok(())
        }
        Err(e) => {
            error!("run aborted: {:#}", e);
            Err(e)
        }
    }
}

fn setup(
    root: &str,
    http: &reqwest::blocking::Client,
) -> Result<(RunConfig, OpenAiAdvisor, HttpSheetSink)> {
    let cfg = config::load_run_config(root)?;
    let creds = Credentials::from_env()?;
    let advisor = OpenAiAdvisor::new(http.clone(), creds.advisor_api_key, cfg.advisor_model.clone());
    let sink = HttpSheetSink::new(http.clone(), creds.sheet_endpoint, creds.sheet_token)?;
    Ok((cfg, advisor, sink))
}
