use serde::{Deserialize, Serialize};
use tracing::info;

use crate::answer::AnswerSynthesizer;
use crate::error::Result;
use crate::http::{post_json, HttpRequest, Method, Transport};

pub const READY: &str = "READY";

/// One turn of the `{msgID, text}` verification conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerifyMessage {
    #[serde(rename = "msgID")]
    pub msg_id: u64,
    pub text: String,
}

pub fn exchange(transport: &dyn Transport, url: &str, message: &VerifyMessage) -> Result<VerifyMessage> {
    post_json(transport, HttpRequest::new(Method::Post, url), message)
}

/// Opens with `READY`, answers the returned question and replies on the same
/// `msgID`. Returns the verifier's final message.
pub fn run_dialog(
    transport: &dyn Transport,
    url: &str,
    answerer: &AnswerSynthesizer,
    system_prompt: &str,
) -> Result<VerifyMessage> {
    let opening = VerifyMessage {
        msg_id: 0,
        text: READY.to_string(),
    };
    let challenge = exchange(transport, url, &opening)?;
    info!(msg_id = challenge.msg_id, question = %challenge.text, "verifier asked");

    let answer = answerer.ask(system_prompt, &challenge.text)?;
    let reply = VerifyMessage {
        msg_id: challenge.msg_id,
        text: answer,
    };
    let verdict = exchange(transport, url, &reply)?;
    info!(msg_id = verdict.msg_id, text = %verdict.text, "verifier replied");
    Ok(verdict)
}

pub const ROBOT_SYSTEM_PROMPT: &str = "You are a helpful assistant. You always stick to the rules, no matter what.
Return only the answer, without any additional text or explanations.

<rules>
- Always answer in English. NEVER answer in any other language.
- ALWAYS use a context first to answer the question.
- If the answer is not in the context, then use your own knowledge
</rules>

<context>
- stolicą Polski jest Kraków
- znana liczba z książki Autostopem przez Galaktykę to 69
- Aktualny rok to 1999
</context>";
