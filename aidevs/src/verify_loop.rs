//! Question → answer → form submission polling driver.
//!
//! Every failure (fetch, answer, submission) logs, sleeps a fixed delay and
//! starts the iteration over at `FetchingQuestion`. There is no backoff; with
//! `max_retries: None` an unreachable endpoint is retried forever.

use std::time::Duration;

use tracing::{info, warn};

use crate::answer::AnswerSynthesizer;
use crate::config::{require, Config};
use crate::error::{Error, Result};
use crate::http::{get_text, post_form, Transport};
use crate::markers::{extract_href, extract_question, has_login_form, join_link};
use crate::submit_report::find_flag;

pub const NUMERIC_ANSWER_PROMPT: &str = "You are a helpful assistant. Provide only the direct answer without any additional text or explanations. The answer is ALWAYS a number.";

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Clone, Debug)]
pub struct LoopConfig {
    pub start_url: String,
    pub username: String,
    pub password: String,
    pub system_prompt: String,
    pub retry_delay: Duration,
    /// Consecutive failures tolerated before giving up; `None` never gives up.
    pub max_retries: Option<u32>,
}

impl LoopConfig {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self {
            start_url: require(&cfg.xyz_url, "XYZ_URL")?.to_string(),
            username: require(&cfg.xyz_username, "XYZ_USERNAME")?.to_string(),
            password: require(&cfg.xyz_password, "XYZ_PASSWORD")?.to_string(),
            system_prompt: NUMERIC_ANSWER_PROMPT.to_string(),
            retry_delay: cfg.retry_delay,
            max_retries: cfg.retry_limit,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoopState {
    FetchingQuestion,
    Answering { question: String },
    Submitting { question: String, answer: String },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoopOutcome {
    pub final_url: String,
    pub last_response: String,
    pub flags: Vec<String>,
    pub answered: u32,
    pub sleeps: u32,
}

enum Step {
    Next(LoopState),
    Done,
}

pub struct VerificationLoop<'a> {
    transport: &'a dyn Transport,
    answerer: &'a AnswerSynthesizer<'a>,
    sleeper: &'a dyn Sleeper,
    config: LoopConfig,
}

impl<'a> VerificationLoop<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        answerer: &'a AnswerSynthesizer<'a>,
        sleeper: &'a dyn Sleeper,
        config: LoopConfig,
    ) -> Self {
        Self {
            transport,
            answerer,
            sleeper,
            config,
        }
    }

    pub fn run(&self) -> Result<LoopOutcome> {
        let mut outcome = LoopOutcome {
            final_url: self.config.start_url.clone(),
            ..LoopOutcome::default()
        };
        let mut state = LoopState::FetchingQuestion;
        let mut failures: u32 = 0;

        loop {
            match self.step(state, &mut outcome) {
                Ok(Step::Next(next)) => {
                    if next == LoopState::FetchingQuestion {
                        failures = 0;
                    }
                    state = next;
                }
                Ok(Step::Done) => {
                    info!(url = %outcome.final_url, "submission accepted");
                    return Ok(outcome);
                }
                Err(err) if err.is_permanent() => {
                    warn!(error = %err, "permanent failure, stopping");
                    return Err(err);
                }
                Err(err) => {
                    failures += 1;
                    if let Some(limit) = self.config.max_retries {
                        if failures > limit {
                            return Err(Error::RetriesExhausted {
                                attempts: failures,
                                last: Box::new(err),
                            });
                        }
                    }
                    warn!(
                        error = %err,
                        attempt = failures,
                        "retrying in {}s",
                        self.config.retry_delay.as_secs_f32()
                    );
                    self.sleeper.sleep(self.config.retry_delay);
                    outcome.sleeps += 1;
                    state = LoopState::FetchingQuestion;
                }
            }
        }
    }

    fn step(&self, state: LoopState, outcome: &mut LoopOutcome) -> Result<Step> {
        match state {
            LoopState::FetchingQuestion => {
                let question = self.fetch_question(&outcome.final_url)?;
                info!(question = %question, "question fetched");
                Ok(Step::Next(LoopState::Answering { question }))
            }
            LoopState::Answering { question } => {
                let answer = self.answerer.ask(&self.config.system_prompt, &question)?;
                info!(answer = %answer, "answer ready");
                Ok(Step::Next(LoopState::Submitting { question, answer }))
            }
            LoopState::Submitting { question, answer } => {
                let body = self.submit(&outcome.final_url, &answer)?;
                outcome.answered += 1;
                info!(question = %question, answer = %answer, "form submitted");

                if let Some(flag) = find_flag(&body) {
                    info!(flag = %flag, "flag found");
                    outcome.flags.push(flag);
                }
                let link = extract_href(&body);
                outcome.last_response = body;
                match link {
                    Some(link) => {
                        outcome.final_url = join_link(&outcome.final_url, &link);
                        info!(url = %outcome.final_url, "following link");
                        Ok(Step::Next(LoopState::FetchingQuestion))
                    }
                    None => Ok(Step::Done),
                }
            }
        }
    }

    fn fetch_question(&self, url: &str) -> Result<String> {
        let html = get_text(self.transport, url)?;
        extract_question(&html)
            .ok_or_else(|| Error::Parse(format!("no question marker at {}", url)))
    }

    fn submit(&self, url: &str, answer: &str) -> Result<String> {
        let body = post_form(
            self.transport,
            url,
            &[
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
                ("answer", answer),
            ],
        )?;
        if has_login_form(&body) {
            return Err(Error::Parse("login failed - form still present".to_string()));
        }
        Ok(body)
    }
}
