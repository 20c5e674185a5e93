use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Parts(parts),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Parts(_) => None,
        }
    }
}

pub const ANSWER_SYSTEM_PROMPT: &str =
    "You are a precise answering assistant. Provide direct, concise answers based only on the given content.";

pub const METADATA_SYSTEM_PROMPT: &str =
    "You are a precise document analyzer. Respond only with the requested JSON format.";

/// Context-bound question: facts only from `content`, terse, same language
/// as the question.
pub fn build_answer_prompt(content: &str, question: &str) -> Vec<Message> {
    let user_content = format!(
        "Based on the following content, please answer the question.\n\
         Provide only the direct answer in the same language as the question without any additional explanations or context.\n\n\
         <rules>\n\
         1. while answering, use only facts provided in <content> section\n\
         </rules>\n\n\
         <content>\n{}\n</content>\n\n\
         <question>\n{}\n</question>",
        content, question
    );

    vec![
        Message::system(ANSWER_SYSTEM_PROMPT),
        Message::user(user_content),
    ]
}

pub fn build_metadata_prompt(content: &str) -> Vec<Message> {
    let user_content = format!(
        "Analyze the following text and provide:\n\
         1. A title (it always in the first line of the file)\n\
         2. 5-7 relevant keywords\n\n\
         Respond in JSON format like this:\n\
         {{\n    \"title\": \"your_title_here\",\n    \"keywords\": [\"keyword1\", \"keyword2\", \"etc\"]\n}}\n\n\
         Text to analyze:\n\n{}",
        content
    );

    vec![
        Message::system(METADATA_SYSTEM_PROMPT),
        Message::user(user_content),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_prompt_wraps_content_and_question() {
        let messages = build_answer_prompt("Capital of France is Paris.", "What is the capital of France?");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        let user = messages[1].text().expect("user prompt is plain text");
        assert!(user.contains("<content>\nCapital of France is Paris.\n</content>"));
        assert!(user.contains("<question>\nWhat is the capital of France?\n</question>"));
        assert!(user.contains("same language as the question"));
    }

    #[test]
    fn image_parts_serialize_with_type_tags() {
        let msg = Message::user_parts(vec![
            ContentPart::Text { text: "describe".into() },
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: "data:image/png;base64,AA==".into() },
            },
        ]);
        let value = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["content"][1]["type"], "image_url");
        assert_eq!(value["content"][1]["image_url"]["url"], "data:image/png;base64,AA==");
    }
}
