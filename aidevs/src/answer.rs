use tracing::debug;

use crate::build_prompt::{build_answer_prompt, Message};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::generate::{ChatProvider, ChatRequest};

pub struct AnswerSynthesizer<'a> {
    provider: &'a dyn ChatProvider,
    model: String,
    temperature: f32,
}

impl<'a> AnswerSynthesizer<'a> {
    pub fn new(provider: &'a dyn ChatProvider, model: &str, temperature: f32) -> Self {
        Self {
            provider,
            model: model.to_string(),
            temperature,
        }
    }

    pub fn from_config(cfg: &Config, provider: &'a dyn ChatProvider) -> Self {
        Self::new(provider, &cfg.chat_model, cfg.answer_temperature)
    }

    /// Answers `question` using only facts from `content`.
    pub fn answer(&self, content: &str, question: &str) -> Result<String> {
        let request = ChatRequest::new(&self.model, build_answer_prompt(content, question))
            .temperature(self.temperature);
        self.run(&request)
    }

    /// Plain system prompt + question, no context block.
    pub fn ask(&self, system_prompt: &str, question: &str) -> Result<String> {
        let messages = vec![Message::system(system_prompt), Message::user(question)];
        let request = ChatRequest::new(&self.model, messages).temperature(self.temperature);
        self.run(&request)
    }

    fn run(&self, request: &ChatRequest) -> Result<String> {
        let raw = self.provider.complete(request)?;
        let answer = raw.trim();
        if answer.is_empty() {
            return Err(Error::provider("model returned an empty answer"));
        }
        debug!(model = %self.model, answer, "answer synthesized");
        Ok(answer.to_string())
    }
}
