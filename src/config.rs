//! Run configuration and credentials.
//!
//! Everything is loaded once at process start and passed into the pipeline
//! as read-only values; there are no module-level singletons.

use crate::types::{Profile, RunConfig};
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::PathBuf;

/// Credentials for the external collaborators, read from the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub advisor_api_key: String,
    pub sheet_endpoint: String,
    pub sheet_token: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        let advisor_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY is not set"))?;
        let sheet_endpoint = std::env::var("SHEET_ENDPOINT")
            .map_err(|_| anyhow!("SHEET_ENDPOINT is not set"))?;
        let sheet_token = std::env::var("SHEET_TOKEN")
            .map_err(|_| anyhow!("SHEET_TOKEN is not set"))?;

        Ok(Credentials {
            advisor_api_key,
            sheet_endpoint,
            sheet_token,
        })
    }
}

/// Optional chat webhook; absent means notifications go to the log. Read
/// separately from [`Credentials`] so the notifier exists even when the
/// required credentials are missing and the failure itself must be reported.
pub fn webhook_from_env() -> Option<String> {
    std::env::var("NOTIFY_WEBHOOK_URL").ok().filter(|v| !v.is_empty())
}

/// Load the target-business profile from `config/profile.yml` under `root`,
/// falling back to the built-in default profile when the file is absent.
pub fn load_profile(root: &str) -> Result<Profile> {
    let path = PathBuf::from(root).join("config/profile.yml");
    if !path.exists() {
        return Ok(Profile::default());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read profile from {:?}", path))?;
    let profile: Profile =
        serde_yaml::from_str(&content).with_context(|| "Failed to parse profile YAML")?;
    Ok(profile)
}

/// Assemble the run configuration from the profile file and environment
/// overrides.
pub fn load_run_config(root: &str) -> Result<RunConfig> {
    let mut cfg = RunConfig {
        profile: load_profile(root)?,
        ..RunConfig::default()
    };

    if let Ok(model) = std::env::var("ADVISOR_MODEL") {
        if !model.is_empty() {
            cfg.advisor_model = model;
        }
    }
    if let Some(min) = env_usize("MIN_RESULTS") {
        cfg.min_results = min;
    }
    if let Some(budget) = env_usize("NOTIFICATION_BUDGET") {
        cfg.notification_budget = budget;
    }
    Ok(cfg)
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// The shared blocking HTTP client: browser-like identification and a fixed
/// timeout on every call.
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
        )
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .context("failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults_when_file_absent() {
        let profile = load_profile("/nonexistent-root").unwrap();
        assert_eq!(profile.region_token, "長野");
        assert!(profile.industry_keywords.iter().any(|k| k == "DX"));
    }
}
