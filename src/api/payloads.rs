//! Request builders and response payloads.

use serde::{Deserialize, Serialize};

use super::files::ImageFile;
use super::{Endpoint, FileMode, DEFAULT_BATCH_PROMPT, DEFAULT_IMAGE_PROMPT, NO_IMAGE_MESSAGE};
use crate::error::{ClientError, ClientResult};
use crate::traits::{MultipartForm, RequestBody};

/// JSON body for the prompt-only endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
    pub stream: bool,
}

/// Build the JSON body `{prompt, stream: true}`.
pub fn prompt_body(prompt: &str) -> RequestBody {
    let request = PromptRequest {
        prompt: prompt.to_string(),
        stream: true,
    };
    RequestBody::Json(serde_json::json!(request))
}

fn or_default<'a>(prompt: &'a str, default: &'a str) -> &'a str {
    if prompt.trim().is_empty() {
        default
    } else {
        prompt
    }
}

/// Multipart form for the single-image endpoints.
pub fn single_image_form(file: &ImageFile, prompt: &str, max_new_tokens: u32) -> MultipartForm {
    MultipartForm::new()
        .file("file", &file.name, &file.content_type, file.data.clone())
        .text("prompt", or_default(prompt, DEFAULT_IMAGE_PROMPT))
        .text("max_new_tokens", max_new_tokens.to_string())
}

/// Multipart form for the batch endpoints, one `files` part per image.
pub fn batch_image_form(files: &[ImageFile], prompt: &str, max_new_tokens: u32) -> MultipartForm {
    let form = files.iter().fold(MultipartForm::new(), |form, file| {
        form.file("files", &file.name, &file.content_type, file.data.clone())
    });
    form.text("prompt", or_default(prompt, DEFAULT_BATCH_PROMPT))
        .text("max_new_tokens", max_new_tokens.to_string())
}

/// Build the request body an endpoint expects from the current inputs.
///
/// Image endpoints require at least one file.
pub fn request_body(
    endpoint: Endpoint,
    prompt: &str,
    files: &[ImageFile],
    max_new_tokens: u32,
) -> ClientResult<RequestBody> {
    match endpoint.file_mode() {
        FileMode::None => Ok(prompt_body(prompt)),
        FileMode::Single => files
            .first()
            .map(|file| RequestBody::Multipart(single_image_form(file, prompt, max_new_tokens)))
            .ok_or_else(|| ClientError::Input(NO_IMAGE_MESSAGE.to_string())),
        FileMode::Multiple if files.is_empty() => {
            Err(ClientError::Input(NO_IMAGE_MESSAGE.to_string()))
        }
        FileMode::Multiple => Ok(RequestBody::Multipart(batch_image_form(
            files,
            prompt,
            max_new_tokens,
        ))),
    }
}

/// Response of `/describeimage`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DescribeResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl DescribeResponse {
    /// Answer text: optional model line, optional caption line, then the
    /// description.
    pub fn to_markdown(&self) -> String {
        let mut text = String::new();
        if let Some(model) = self.model.as_deref().filter(|m| !m.is_empty()) {
            text.push_str(&format!("**Model:** {}\n\n", model));
        }
        if let Some(caption) = self.caption.as_deref().filter(|c| !c.is_empty()) {
            text.push_str(&format!("**Caption:** {}\n\n", caption));
        }
        text.push_str(self.response.as_deref().unwrap_or(""));
        text
    }
}

/// One entry of a `/describeimagebatch` response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BatchItem {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `/describeimagebatch`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub results: Vec<BatchItem>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Response of `/health`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub model_loaded: Option<bool>,
}

/// Response of `/buildinfo`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BuildInfo {
    #[serde(default)]
    pub build_time: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
}
