//! Backend API surface: endpoints, request payloads and response shapes.
//!
//! | Endpoint | Request | Response |
//! |---|---|---|
//! | `/predict`, `/predictstream` | JSON `{prompt, stream}` | NDJSON `{response?}` / `{error}` |
//! | `/describeimage` | multipart `file` | JSON `{model?, caption?, response?}` |
//! | `/describeimagestream` | multipart `file` | NDJSON `{response?}` / `{error}` |
//! | `/describeimagebatch` | multipart repeated `files` | JSON `{results}` |
//! | `/describeimagebatchstream` | multipart repeated `files` | NDJSON `{type, index?, ...}` |

mod files;
mod payloads;

pub use files::{content_type_for, ImageFile};
pub use payloads::{
    batch_image_form, prompt_body, request_body, single_image_form, BatchItem, BatchResponse,
    BuildInfo, DescribeResponse, HealthResponse, PromptRequest,
};

use std::fmt;
use std::str::FromStr;

/// Response header naming the backend replica that served a request.
pub const INSTANCE_HEADER: &str = "x-instance-id";

/// Instance label used when the header is absent.
pub const UNKNOWN_INSTANCE: &str = "unknown";

/// Prompt sent with a single image when the user typed nothing.
pub const DEFAULT_IMAGE_PROMPT: &str = "Describe this image.";

/// Prompt sent with several images when the user typed nothing.
pub const DEFAULT_BATCH_PROMPT: &str = "Describe these images.";

/// Alert shown when an image action runs without a selected file.
pub const NO_IMAGE_MESSAGE: &str = "Please choose an image first.";

/// How an endpoint consumes the selected image files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Prompt only, JSON body
    None,
    /// First file as multipart `file`
    Single,
    /// Every file as repeated multipart `files`
    Multiple,
}

/// Backend endpoints the client knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Predict,
    PredictStream,
    DescribeImage,
    DescribeImageStream,
    DescribeImageBatch,
    DescribeImageBatchStream,
    Health,
    BuildInfo,
}

impl Endpoint {
    /// Every generation endpoint, in the order they are offered to users.
    pub const GENERATION: [Endpoint; 6] = [
        Endpoint::Predict,
        Endpoint::PredictStream,
        Endpoint::DescribeImage,
        Endpoint::DescribeImageStream,
        Endpoint::DescribeImageBatch,
        Endpoint::DescribeImageBatchStream,
    ];

    /// URL path of the endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Predict => "/predict",
            Endpoint::PredictStream => "/predictstream",
            Endpoint::DescribeImage => "/describeimage",
            Endpoint::DescribeImageStream => "/describeimagestream",
            Endpoint::DescribeImageBatch => "/describeimagebatch",
            Endpoint::DescribeImageBatchStream => "/describeimagebatchstream",
            Endpoint::Health => "/health",
            Endpoint::BuildInfo => "/buildinfo",
        }
    }

    /// Whether the response body is an NDJSON stream.
    pub fn is_streaming(&self) -> bool {
        matches!(
            self,
            Endpoint::Predict
                | Endpoint::PredictStream
                | Endpoint::DescribeImageStream
                | Endpoint::DescribeImageBatchStream
        )
    }

    /// How the endpoint consumes selected files.
    pub fn file_mode(&self) -> FileMode {
        match self {
            Endpoint::DescribeImage | Endpoint::DescribeImageStream => FileMode::Single,
            Endpoint::DescribeImageBatch | Endpoint::DescribeImageBatchStream => {
                FileMode::Multiple
            }
            _ => FileMode::None,
        }
    }

    /// Join the endpoint path onto a base URL.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Endpoint {
    type Err = String;

    /// Accepts the path with or without the leading slash.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('/').to_ascii_lowercase();
        [
            Endpoint::Predict,
            Endpoint::PredictStream,
            Endpoint::DescribeImage,
            Endpoint::DescribeImageStream,
            Endpoint::DescribeImageBatch,
            Endpoint::DescribeImageBatchStream,
            Endpoint::Health,
            Endpoint::BuildInfo,
        ]
        .into_iter()
        .find(|endpoint| endpoint.path().trim_start_matches('/') == wanted)
        .ok_or_else(|| format!("unknown endpoint: {}", s))
    }
}
