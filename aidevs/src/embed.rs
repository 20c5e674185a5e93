use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{require, Config};
use crate::error::{Error, Result};
use crate::http::{post_json, HttpRequest, Method, Transport};

/// Turns text into a fixed-length vector. Indexing and querying must use the
/// same embedder; nothing checks that they do.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimensions(&self) -> usize;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    transport: Arc<dyn Transport>,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: &str,
        api_key: &str,
        model: &str,
        dimensions: usize,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            dimensions,
        }
    }

    pub fn from_config(cfg: &Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let api_key = require(&cfg.openai_api_key, "OPENAI_API_KEY")?;
        Ok(Self::new(
            transport,
            &cfg.openai_base_url,
            api_key,
            &cfg.embed_model,
            cfg.embed_dimensions,
        ))
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);
        let req = EmbedRequest {
            model: &self.model,
            input: text,
        };
        let http = HttpRequest::new(Method::Post, url)
            .header("Authorization", format!("Bearer {}", self.api_key));
        let res = post_json::<EmbedResponse, _>(self.transport.as_ref(), http, &req)
            .map_err(|e| Error::provider_call(&format!("embedding with {} failed", self.model), e))?;
        let vector = res
            .data
            .into_iter()
            .next()
            .map(|row| row.embedding)
            .ok_or_else(|| Error::provider("No embeddings in response"))?;
        check_dimensions(&vector, self.dimensions)?;
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

pub fn check_dimensions(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(Error::provider(format!(
            "embedding has {} dimensions, expected {}",
            vector.len(),
            expected
        )));
    }
    Ok(())
}
