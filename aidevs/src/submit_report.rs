use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{require, Config};
use crate::error::{Error, Result};
use crate::http::{HttpRequest, Method, Transport};

/// The `{task, apikey, answer}` body every grading endpoint expects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportEnvelope<T> {
    pub task: String,
    pub apikey: String,
    pub answer: T,
}

#[derive(Clone, Debug)]
pub struct ReportResponse {
    pub status: u16,
    pub body: String,
}

impl ReportResponse {
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Text following `FLG:` up to the closing brace, if the grader sent one.
    pub fn flag(&self) -> Option<String> {
        find_flag(&self.body)
    }
}

static FLAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"FLG:([^}]*)").expect("flag pattern"));

pub fn find_flag(text: &str) -> Option<String> {
    FLAG_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

pub struct ReportClient {
    transport: Arc<dyn Transport>,
    report_url: Option<String>,
    api_key: Option<String>,
}

impl ReportClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        report_url: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            transport,
            report_url,
            api_key,
        }
    }

    pub fn from_config(cfg: &Config, transport: Arc<dyn Transport>) -> Self {
        Self::new(transport, cfg.report_url.clone(), cfg.api_key.clone())
    }

    pub fn envelope<T: Serialize>(&self, task: &str, answer: T) -> Result<ReportEnvelope<T>> {
        let apikey = require(&self.api_key, "AIDEVS3_API_KEY")?;
        if task.trim().is_empty() {
            return Err(Error::InvalidInput("task identifier is empty".to_string()));
        }
        Ok(ReportEnvelope {
            task: task.to_string(),
            apikey: apikey.to_string(),
            answer,
        })
    }

    /// POSTs the envelope. Configuration is checked before any network call.
    pub fn submit<T: Serialize>(&self, task: &str, answer: &T) -> Result<ReportResponse> {
        let url = require(&self.report_url, "URL_REPORT")?;
        let envelope = self.envelope(task, answer)?;
        info!(task, url, "sending report");

        let request = HttpRequest::new(Method::Post, url).json(&envelope)?;
        let resp = self.transport.execute(&request)?;
        info!(task, status = resp.status, body = %resp.body, "report accepted");
        Ok(ReportResponse {
            status: resp.status,
            body: resp.body,
        })
    }
}

/// Log-and-continue wrapper: failures are logged and yield `None`.
pub fn submit_report<T: Serialize>(
    client: &ReportClient,
    task: &str,
    answer: &T,
) -> Option<ReportResponse> {
    match client.submit(task, answer) {
        Ok(resp) => {
            if let Some(flag) = resp.flag() {
                info!(task, flag = %flag, "flag received");
            }
            Some(resp)
        }
        Err(err) => {
            warn!(task, error = %err, "report failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_flag_between_marker_and_brace() {
        assert_eq!(find_flag("{{FLG:NAJLEPSZY}}"), Some("NAJLEPSZY".to_string()));
        assert_eq!(find_flag("{\"code\":0,\"message\":\"ok\"}"), None);
    }
}
