use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{require, Config};
use crate::error::{Error, Result};
use crate::http::{post_multipart, HttpRequest, Method, Part, Transport};
use crate::scan_files::scan_files;

pub const AUDIO_EXTENSIONS: [&str; 6] = ["m4a", "mp3", "wav", "ogg", "flac", "aac"];

/// Upload ceiling of the hosted speech models.
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// Speech to text backend.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, audio: &[u8], filename: &str) -> Result<String>;
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

pub struct OpenAiTranscriber {
    transport: Arc<dyn Transport>,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiTranscriber {
    pub fn new(transport: Arc<dyn Transport>, base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn from_config(cfg: &Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let api_key = require(&cfg.openai_api_key, "OPENAI_API_KEY")?;
        Ok(Self::new(
            transport,
            &cfg.openai_base_url,
            api_key,
            &cfg.transcribe_model,
        ))
    }
}

impl Transcriber for OpenAiTranscriber {
    fn transcribe(&self, audio: &[u8], filename: &str) -> Result<String> {
        check_audio(audio, filename)?;
        let url = format!("{}/audio/transcriptions", self.base_url);
        let http = HttpRequest::new(Method::Post, url)
            .header("Authorization", format!("Bearer {}", self.api_key));
        let parts = vec![
            Part::Text {
                name: "model".to_string(),
                value: self.model.clone(),
            },
            Part::File {
                name: "file".to_string(),
                filename: filename.to_string(),
                mime: audio_mime(filename).to_string(),
                bytes: audio.to_vec(),
            },
        ];
        let res: TranscriptionResponse = post_multipart(self.transport.as_ref(), http, parts)
            .map_err(|e| Error::provider_call(&format!("transcription with {} failed", self.model), e))?;
        let text = res.text.trim();
        if text.is_empty() {
            return Err(Error::provider("transcription returned no text"));
        }
        info!(file = filename, chars = text.len(), "transcribed");
        Ok(text.to_string())
    }
}

fn check_audio(audio: &[u8], filename: &str) -> Result<()> {
    if audio.is_empty() {
        return Err(Error::InvalidInput(format!("{} is empty", filename)));
    }
    if audio.len() > MAX_AUDIO_BYTES {
        return Err(Error::InvalidInput(format!(
            "{} is {} bytes, limit is {}",
            filename,
            audio.len(),
            MAX_AUDIO_BYTES
        )));
    }
    Ok(())
}

pub fn audio_mime(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("aac") => "audio/aac",
        _ => "application/octet-stream",
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TranscriptionSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Transcript file for `audio`: same stem, `.md` extension.
pub fn transcript_path(audio: &Path) -> PathBuf {
    audio.with_extension("md")
}

/// Transcribes every audio file directly inside `dir` into a sibling `.md`
/// with a `filename:` front matter block. Existing transcripts are kept
/// unless `overwrite` is set. One failing file does not stop the rest.
pub fn transcribe_folder(
    transcriber: &dyn Transcriber,
    dir: &Path,
    overwrite: bool,
) -> Result<TranscriptionSummary> {
    let mut files = Vec::new();
    for ext in AUDIO_EXTENSIONS {
        files.extend(scan_files(dir, ext)?);
    }
    files.sort();

    let mut summary = TranscriptionSummary::default();
    for audio in &files {
        let output = transcript_path(audio);
        if output.exists() && !overwrite {
            info!(file = %audio.display(), "transcript exists, skipping");
            summary.skipped += 1;
            continue;
        }
        match transcribe_file(transcriber, audio, &output) {
            Ok(()) => summary.processed += 1,
            Err(err) => {
                warn!(file = %audio.display(), error = %err, "transcription failed");
                summary.failed += 1;
            }
        }
    }
    info!(
        dir = %dir.display(),
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed,
        "transcription finished"
    );
    Ok(summary)
}

fn transcribe_file(transcriber: &dyn Transcriber, audio: &Path, output: &Path) -> Result<()> {
    let name = audio
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let bytes = fs::read(audio)?;
    let text = transcriber.transcribe(&bytes, &name)?;
    fs::write(output, format!("---\nfilename: {}\n---\n\n{}", name, text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_follows_extension() {
        assert_eq!(audio_mime("rafal.m4a"), "audio/mp4");
        assert_eq!(audio_mime("ADAM.MP3"), "audio/mpeg");
        assert_eq!(audio_mime("notes.txt"), "application/octet-stream");
    }

    #[test]
    fn rejects_empty_and_oversized_audio() {
        assert!(matches!(check_audio(b"", "a.mp3"), Err(Error::InvalidInput(_))));
        let big = vec![0u8; MAX_AUDIO_BYTES + 1];
        assert!(matches!(check_audio(&big, "a.mp3"), Err(Error::InvalidInput(_))));
        assert!(check_audio(b"ID3", "a.mp3").is_ok());
    }
}
