use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::build_prompt::Message;
use crate::config::{require, Config};
use crate::error::{Error, Result};
use crate::http::{post_json, HttpRequest, Method, Transport};

#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Text generation backend. Every failure surfaces as `Error::Provider`,
/// carrying the HTTP status when the endpoint rejected the call.
pub trait ChatProvider: Send + Sync {
    fn complete(&self, request: &ChatRequest) -> Result<String>;
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiChat {
    transport: Arc<dyn Transport>,
    base_url: String,
    api_key: String,
}

impl OpenAiChat {
    pub fn new(transport: Arc<dyn Transport>, base_url: &str, api_key: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(cfg: &Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let api_key = require(&cfg.openai_api_key, "OPENAI_API_KEY")?;
        Ok(Self::new(transport, &cfg.openai_base_url, api_key))
    }
}

impl ChatProvider for OpenAiChat {
    fn complete(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionBody {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        let http = HttpRequest::new(Method::Post, url)
            .header("Authorization", format!("Bearer {}", self.api_key));
        let res = post_json::<CompletionResponse, _>(self.transport.as_ref(), http, &body)
            .map_err(|e| {
                Error::provider_call(&format!("chat completion with {} failed", request.model), e)
            })?;
        res.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| Error::provider("chat completion returned no content"))
    }
}
