use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Clone, Debug)]
pub struct Config {
    pub report_url: Option<String>,
    pub api_key: Option<String>,
    pub apidb_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub chat_model: String,
    pub metadata_model: String,
    pub embed_model: String,
    pub transcribe_model: String,
    pub embed_dimensions: usize,
    pub answer_temperature: f32,
    pub metadata_temperature: f32,
    pub qdrant_url: Option<String>,
    pub qdrant_api_key: Option<String>,
    pub collection: String,
    pub xyz_url: Option<String>,
    pub xyz_username: Option<String>,
    pub xyz_password: Option<String>,
    pub retry_delay: Duration,
    pub retry_limit: Option<u32>,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        // Load .env if present so keys work without manual `source .env`.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            report_url: text("URL_REPORT"),
            api_key: text("AIDEVS3_API_KEY"),
            apidb_url: text("APIDB_URL"),
            openai_api_key: text("OPENAI_API_KEY"),
            openai_base_url: text("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            chat_model: text("OPENAI_CHAT_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            metadata_model: text("OPENAI_METADATA_MODEL").unwrap_or_else(|| "gpt-4".to_string()),
            embed_model: text("OPENAI_EMBED_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            transcribe_model: text("OPENAI_TRANSCRIBE_MODEL")
                .unwrap_or_else(|| "whisper-1".to_string()),
            embed_dimensions: text("EMBED_DIMENSIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1536),
            answer_temperature: text("ANSWER_TEMPERATURE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.1),
            metadata_temperature: text("METADATA_TEMPERATURE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.3),
            qdrant_url: text("QDRANT_URL"),
            qdrant_api_key: text("QDRANT_API_KEY"),
            collection: text("QDRANT_COLLECTION").unwrap_or_else(|| "reports".to_string()),
            xyz_url: text("XYZ_URL"),
            xyz_username: text("XYZ_USERNAME"),
            xyz_password: text("XYZ_PASSWORD"),
            retry_delay: Duration::from_secs(
                text("RETRY_DELAY_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(25),
            ),
            retry_limit: text("RETRY_LIMIT").and_then(|v| v.parse().ok()),
            http_timeout: Duration::from_secs(
                text("HTTP_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }
}

/// Returns the value or a `Config` error naming the variable.
pub fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("{} is not set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_favour_low_temperature_and_fixed_delay() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.answer_temperature, 0.1);
        assert_eq!(cfg.embed_dimensions, 1536);
        assert_eq!(cfg.retry_delay, Duration::from_secs(25));
        assert_eq!(cfg.retry_limit, None);
        assert!(cfg.report_url.is_none());
    }

    #[test]
    fn blank_values_count_as_missing() {
        let cfg = config_from(&[("URL_REPORT", "  "), ("AIDEVS3_API_KEY", "key")]);
        let err = require(&cfg.report_url, "URL_REPORT").expect_err("blank url must be missing");
        assert!(err.to_string().contains("URL_REPORT"));
        assert_eq!(require(&cfg.api_key, "AIDEVS3_API_KEY").expect("key is set"), "key");
    }

    #[test]
    fn unparseable_numbers_fall_back_to_defaults() {
        let cfg = config_from(&[("RETRY_DELAY_SECS", "soon"), ("RETRY_LIMIT", "3")]);
        assert_eq!(cfg.retry_delay, Duration::from_secs(25));
        assert_eq!(cfg.retry_limit, Some(3));
    }
}
