//! Vision OCR client
//!
//! Sends the captured image to a vision-language model through the
//! OpenRouter chat-completions API and extracts the recognized text.
//! The model is instructed to answer with the text alone, or a sentinel
//! when the image contains nothing readable.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MODEL: &str = "openai/gpt-4.1-mini";

/// Model output marking an image with no recognizable text
const NO_TEXT_SENTINEL: &str = "NO_TEXT";

const RECOGNIZE_PROMPT: &str = "Recognize text in image and output the text. \
     Do not output anything other than the recognized text. \
     If there is no recognizable text, output \"NO_TEXT\".";

/// OCR client over a vision-language model
pub struct OcrClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    reasoning: Reasoning,
    messages: Vec<Message<'a>>,
}

/// Reasoning toggle; kept off so answers come back fast
#[derive(Debug, Serialize)]
struct Reasoning {
    enabled: bool,
}

/// A message in the request
#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentBlock<'a>>,
}

/// Content block (text or image)
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

/// Image reference as a data URL
#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

/// One completion choice
#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

/// Assistant message within a choice
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OcrClient {
    /// Create a new OCR client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenRouter API key required for OCR".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Create with a specific model
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Recognize text in an image
    ///
    /// # Arguments
    ///
    /// * `image_data_url` - the image as a `data:image/jpeg;base64,` URL
    ///
    /// # Returns
    ///
    /// The recognized text, or `None` when the model reports no
    /// readable text in the image.
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails
    pub async fn recognize(&self, image_data_url: &str) -> Result<Option<String>> {
        let start = Instant::now();

        let request = ChatRequest {
            model: &self.model,
            reasoning: Reasoning { enabled: false },
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Text {
                        text: RECOGNIZE_PROMPT,
                    },
                    ContentBlock::ImageUrl {
                        image_url: ImageUrl {
                            url: image_data_url,
                        },
                    },
                ],
            }],
        };

        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Ocr(format!("API error {status}: {body}")));
        }

        let result: ChatResponse = response.json().await?;
        tracing::debug!(elapsed_ms = start.elapsed().as_millis(), "image processed");

        let text = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);

        Ok(text.and_then(|t| {
            let trimmed = t.trim();
            if trimmed.is_empty() || trimmed.to_uppercase() == NO_TEXT_SENTINEL {
                None
            } else {
                Some(trimmed.to_string())
            }
        }))
    }
}
