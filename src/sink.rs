//! Tabular report sink.
//!
//! The core only ever clears the sink and appends rows; it never reads back.
//! Each run fully replaces the previous report.

use anyhow::{anyhow, Context, Result};

/// Append-only tabular sink boundary.
pub trait ReportSink {
    fn clear(&mut self) -> Result<()>;
    fn append_row(&mut self, values: &[String]) -> Result<()>;
}

/// Sink client posting JSON actions to a sheet endpoint (e.g. an Apps Script
/// web app fronting a spreadsheet).
pub struct HttpSheetSink {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: String,
}

impl HttpSheetSink {
    /// Fails on missing endpoint or token: a run without a usable sink is
    /// aborted up front rather than discovered row by row.
    pub fn new(client: reqwest::blocking::Client, endpoint: String, token: String) -> Result<Self> {
        if endpoint.trim().is_empty() {
            return Err(anyhow!("sheet endpoint is not configured"));
        }
        if token.trim().is_empty() {
            return Err(anyhow!("sheet token is not configured"));
        }
        Ok(HttpSheetSink { client, endpoint, token })
    }

    fn post(&self, body: serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .context("sheet request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!("sheet endpoint returned HTTP {}", response.status().as_u16()));
        }
        Ok(())
    }
}

impl ReportSink for HttpSheetSink {
    fn clear(&mut self) -> Result<()> {
        self.post(serde_json::json!({"action": "clear"}))
    }

    fn append_row(&mut self, values: &[String]) -> Result<()> {
        self.post(serde_json::json!({"action": "append", "values": values}))
    }
}
