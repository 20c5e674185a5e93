use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::build_prompt::{ContentPart, ImageUrl, Message};
use crate::error::{Error, Result};
use crate::generate::{ChatProvider, ChatRequest};

pub const DESCRIBE_PROMPT: &str =
    "Describe this image briefly with attention to details and context. Do it all in Polish.";

/// `data:` URL for inline image upload. The MIME type is guessed from the
/// leading magic bytes, defaulting to JPEG.
pub fn data_url(bytes: &[u8]) -> String {
    let mime = if bytes.starts_with(b"\x89PNG") {
        "image/png"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() > 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Asks a vision-capable model to describe `image`, with an optional
/// caption as context.
pub fn describe_image(
    provider: &dyn ChatProvider,
    model: &str,
    image: &[u8],
    caption: &str,
) -> Result<String> {
    if image.is_empty() {
        return Err(Error::InvalidInput("image is empty".to_string()));
    }
    let instruction = if caption.trim().is_empty() {
        DESCRIBE_PROMPT.to_string()
    } else {
        format!("{} Context: {}", DESCRIBE_PROMPT, caption.trim())
    };
    let message = Message::user_parts(vec![
        ContentPart::Text { text: instruction },
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: data_url(image),
            },
        },
    ]);
    let request = ChatRequest::new(model, vec![message]).max_tokens(300);
    Ok(provider.complete(&request)?.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_detects_png() {
        let url = data_url(b"\x89PNG\r\n\x1a\n");
        assert!(url.starts_with("data:image/png;base64,"));
        assert!(data_url(b"\xff\xd8\xff").starts_with("data:image/jpeg;base64,"));
    }
}
