use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::build_prompt::build_metadata_prompt;
use crate::error::{Error, Result};
use crate::generate::{ChatProvider, ChatRequest};

/// A text file picked up from the corpus folder.
#[derive(Clone, Debug, PartialEq)]
pub struct CorpusDocument {
    pub filename: String,
    pub content: String,
    pub derived_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub keywords: Vec<String>,
}

impl CorpusDocument {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        let filename = filename.into();
        let derived_date = date_from_filename(&filename);
        if derived_date.is_none() {
            warn!(filename = %filename, "could not parse date from filename");
        }
        Self {
            filename,
            content: content.into(),
            derived_date,
            title: None,
            keywords: Vec::new(),
        }
    }

    pub fn apply(&mut self, analysis: DocumentAnalysis) {
        self.title = Some(analysis.title);
        self.keywords = analysis.keywords;
    }

    pub fn payload(&self) -> DocumentPayload {
        DocumentPayload {
            filename: self.filename.clone(),
            date: self.derived_date,
            title: self.title.clone(),
            keywords: self.keywords.clone(),
        }
    }
}

/// Metadata stored alongside each vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentPayload {
    pub filename: String,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DocumentAnalysis {
    pub title: String,
    pub keywords: Vec<String>,
}

static DATE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})_(\d{2})_(\d{2})").expect("date prefix pattern"));

/// Date from a `YYYY_MM_DD...` file name; `None` for anything else.
pub fn date_from_filename(filename: &str) -> Option<NaiveDate> {
    let caps = DATE_PREFIX_RE.captures(filename)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Stable point id: SHA-256 of the file name folded into 63 bits.
pub fn point_id(filename: &str) -> u64 {
    let digest = Sha256::digest(filename.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes) & (u64::MAX >> 1)
}

pub struct MetadataExtractor<'a> {
    provider: &'a dyn ChatProvider,
    model: String,
    temperature: f32,
}

impl<'a> MetadataExtractor<'a> {
    pub fn new(provider: &'a dyn ChatProvider, model: &str, temperature: f32) -> Self {
        Self {
            provider,
            model: model.to_string(),
            temperature,
        }
    }

    pub fn analyze(&self, content: &str) -> Result<DocumentAnalysis> {
        let request = ChatRequest::new(&self.model, build_metadata_prompt(content))
            .temperature(self.temperature);
        let raw = self.provider.complete(&request)?;
        parse_analysis(&raw)
    }
}

/// Strict JSON with `title` and `keywords`; a surrounding markdown fence is
/// the only decoration tolerated.
pub fn parse_analysis(raw: &str) -> Result<DocumentAnalysis> {
    let body = strip_code_fence(raw.trim());
    serde_json::from_str::<DocumentAnalysis>(body)
        .map_err(|e| Error::Parse(format!("metadata response is not the expected JSON: {} | {}", e, raw)))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_date_prefix() {
        assert_eq!(
            date_from_filename("2024_11_12_report-00-sektor_C4.txt"),
            NaiveDate::from_ymd_opt(2024, 11, 12)
        );
        assert_eq!(date_from_filename("2024_02_30.txt"), None);
        assert_eq!(date_from_filename("report.txt"), None);
        assert_eq!(date_from_filename("x2024_11_12.txt"), None);
    }

    #[test]
    fn point_ids_are_stable_and_fit_63_bits() {
        let a = point_id("2024_01_08.txt");
        assert_eq!(a, point_id("2024_01_08.txt"));
        assert_ne!(a, point_id("2024_01_09.txt"));
        assert!(a < (1u64 << 63));
    }

    #[test]
    fn analysis_accepts_fenced_json_and_rejects_prose() {
        let fenced = "```json\n{\"title\": \"Raport\", \"keywords\": [\"a\", \"b\"]}\n```";
        let parsed = parse_analysis(fenced).expect("fenced json parses");
        assert_eq!(parsed.title, "Raport");
        assert_eq!(parsed.keywords, vec!["a", "b"]);

        let err = parse_analysis("Title: Raport").expect_err("prose must fail");
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn payload_serializes_date_as_iso_or_null() {
        let doc = CorpusDocument::new("2024_01_08.txt", "body");
        let value = serde_json::to_value(doc.payload()).expect("serialize");
        assert_eq!(value["date"], "2024-01-08");

        let undated = CorpusDocument::new("notes.txt", "body");
        let value = serde_json::to_value(undated.payload()).expect("serialize");
        assert!(value["date"].is_null());
    }
}
