// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OpenAI-compatible remote intelligence over `/chat/completions`.
//
// Every page image is flattened to RGB, shrunk so its longest edge is at most
// 2048 px, JPEG-encoded at quality 85 and sent inline as a base64 data URL.

use base64::Engine as _;
use image::DynamicImage;
use inerscan_core::error::{InerScanError, Result};
use inerscan_document::ImageProcessor;
use inerscan_document::image::processor::fit_within;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::offline::{CLIENT_NOT_INITIALIZED, OfflineIntelligence};
use crate::traits::{ChatMessage, ConnectionCheck, RemoteIntelligence};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const MAX_UPLOAD_EDGE: u32 = 2048;
pub const UPLOAD_JPEG_QUALITY: u8 = 85;

pub const FILENAME_FAILED: &str = "Scan_AutoRename_Error";

const OCR_PROMPT: &str =
    "Extract all text from this image exactly as it appears. Do not add any commentary.";
const FILENAME_PROMPT: &str = "Suggest a concise, descriptive filename for this document \
    (e.g., 'Invoice_12345', 'Meeting_Notes_Oct2023'). Output ONLY the filename, no extension, \
    no spaces (use underscores).";
const ANALYSIS_PROMPT: &str = "Analyze this document. Provide a Summary and key extracted fields \
    (like dates, names, amounts) in a structured format.";

const OCR_MAX_TOKENS: u32 = 4000;
const FILENAME_MAX_TOKENS: u32 = 20;
const ANALYSIS_MAX_TOKENS: u32 = 1000;
const CHAT_MAX_TOKENS: u32 = 2000;

/// Credentials and endpoint, as held in the settings store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Blocking client for an OpenAI-compatible endpoint.
pub struct OpenAiClient {
    settings: RemoteSettings,
    base_url: String,
    client: Option<reqwest::blocking::Client>,
    timeout_secs: u64,
}

impl OpenAiClient {
    /// Build a client. With an empty key, or if the HTTP client cannot be
    /// constructed, every call degrades to the "not configured" strings.
    pub fn new(settings: RemoteSettings, timeout_secs: u64) -> Self {
        let base_url = match settings.base_url.trim() {
            "" => DEFAULT_BASE_URL.to_string(),
            url => url.trim_end_matches('/').to_string(),
        };
        let client = if settings.api_key.trim().is_empty() {
            None
        } else {
            reqwest::blocking::Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .build()
                .map_err(|e| warn!(error = %e, "failed to create HTTP client"))
                .ok()
        };
        Self { settings, base_url, client, timeout_secs }
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a chat completion and return the first choice's text.
    #[instrument(skip(self, messages), fields(model = %self.settings.model, messages = messages.len()))]
    fn complete(&self, messages: Vec<RequestMessage<'_>>, max_tokens: u32) -> Result<String> {
        let client = self.client.as_ref().ok_or(InerScanError::MissingCredential)?;
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.settings.model,
            messages,
            max_tokens,
        };

        let response = client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(InerScanError::Remote(format!("HTTP {}: {}", status.as_u16(), body.trim())));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| InerScanError::Remote(format!("malformed response: {e}")))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| InerScanError::Remote("response contained no choices".into()))?;
        debug!(chars = text.len(), "completion received");
        Ok(text)
    }

    /// Single-image prompt: one user turn holding the text and the picture.
    fn ask_about_image(&self, prompt: &str, image: &DynamicImage, max_tokens: u32) -> Result<String> {
        let data_url = encode_image(image)?;
        let message = RequestMessage {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: prompt },
                ContentPart::ImageUrl { image_url: ImageUrl { url: data_url } },
            ]),
        };
        self.complete(vec![message], max_tokens)
    }

    fn transport_error(&self, e: reqwest::Error) -> InerScanError {
        if e.is_timeout() {
            InerScanError::Remote(format!("request timed out after {}s", self.timeout_secs))
        } else if e.is_connect() {
            InerScanError::Remote(format!("cannot connect to {}", self.base_url))
        } else {
            InerScanError::Remote(e.to_string())
        }
    }
}

impl RemoteIntelligence for OpenAiClient {
    fn ocr(&self, image: &DynamicImage) -> String {
        if self.client.is_none() {
            return OfflineIntelligence.ocr(image);
        }
        self.ask_about_image(OCR_PROMPT, image, OCR_MAX_TOKENS)
            .unwrap_or_else(|e| format!("Error during OCR: {}", detail(e)))
    }

    fn suggest_filename(&self, image: &DynamicImage) -> String {
        if self.client.is_none() {
            return OfflineIntelligence.suggest_filename(image);
        }
        match self.ask_about_image(FILENAME_PROMPT, image, FILENAME_MAX_TOKENS) {
            Ok(raw) => sanitize_filename(&raw),
            Err(e) => {
                warn!(error = %e, "filename suggestion failed");
                FILENAME_FAILED.into()
            }
        }
    }

    fn analyze(&self, image: &DynamicImage) -> String {
        if self.client.is_none() {
            return OfflineIntelligence.analyze(image);
        }
        self.ask_about_image(ANALYSIS_PROMPT, image, ANALYSIS_MAX_TOKENS)
            .unwrap_or_else(|e| format!("Error during analysis: {}", detail(e)))
    }

    fn chat(&self, message: &str, history: &[ChatMessage], image: Option<&DynamicImage>) -> String {
        if self.client.is_none() {
            return OfflineIntelligence.chat(message, history, image);
        }
        let result = build_chat_messages(message, history, image)
            .and_then(|messages| self.complete(messages, CHAT_MAX_TOKENS));
        result.unwrap_or_else(|e| format!("Error during chat: {}", detail(e)))
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    fn test_connection(&self) -> ConnectionCheck {
        let Some(client) = &self.client else {
            return ConnectionCheck { ok: false, message: CLIENT_NOT_INITIALIZED.into() };
        };
        let url = format!("{}/models", self.base_url);
        let outcome = client
            .get(&url)
            .bearer_auth(&self.settings.api_key)
            .send()
            .map_err(|e| self.transport_error(e))
            .and_then(|response| {
                let status = response.status();
                if status.is_success() {
                    Ok(())
                } else {
                    let body = response.text().unwrap_or_default();
                    Err(InerScanError::Remote(format!("HTTP {}: {}", status.as_u16(), body.trim())))
                }
            });
        match outcome {
            Ok(()) => {
                info!("remote connection verified");
                ConnectionCheck { ok: true, message: "Connection Successful".into() }
            }
            Err(e) => ConnectionCheck { ok: false, message: detail(e) },
        }
    }
}

/// Prior turns as plain text, then the new user turn with an optional image.
fn build_chat_messages<'a>(
    message: &'a str,
    history: &'a [ChatMessage],
    image: Option<&DynamicImage>,
) -> Result<Vec<RequestMessage<'a>>> {
    let mut messages: Vec<RequestMessage<'a>> = history
        .iter()
        .map(|turn| RequestMessage {
            role: &turn.role,
            content: MessageContent::Text(&turn.content),
        })
        .collect();

    let mut parts = vec![ContentPart::Text { text: message }];
    if let Some(image) = image {
        parts.push(ContentPart::ImageUrl { image_url: ImageUrl { url: encode_image(image)? } });
    }
    messages.push(RequestMessage { role: "user", content: MessageContent::Parts(parts) });
    Ok(messages)
}

/// RGB, longest edge at most [`MAX_UPLOAD_EDGE`], JPEG, base64 data URL.
pub fn encode_image(image: &DynamicImage) -> Result<String> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let scaled = fit_within(&rgb, MAX_UPLOAD_EDGE, MAX_UPLOAD_EDGE);
    let jpeg = ImageProcessor::from_dynamic(scaled).to_jpeg_bytes(UPLOAD_JPEG_QUALITY)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(jpeg);
    Ok(format!("data:image/jpeg;base64,{encoded}"))
}

/// Turn a model reply into a filename token: spaces become underscores and a
/// trailing extension is dropped.
pub fn sanitize_filename(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches(|c| matches!(c, '`' | '"' | '\''));
    let mut name = trimmed.replace([' ', '/', '\\'], "_");
    if let Some((stem, _ext)) = name.rsplit_once('.') {
        name = stem.to_string();
    }
    if name.is_empty() { FILENAME_FAILED.into() } else { name }
}

fn detail(err: InerScanError) -> String {
    match err {
        InerScanError::Remote(message) => message,
        other => other.to_string(),
    }
}

// -- Wire types -----------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
