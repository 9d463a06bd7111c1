//! Request and response types.
//!
//! A [`Request`] is the JSON event a client sends. Field names are camelCase;
//! the legacy payload field `base64Image` is accepted as an alias of
//! `payload`. Anything the handler does not recognise is kept as a resize
//! passthrough option.
//!
//! A request completes exactly once, with a [`Completion`]: either a
//! [`Response`] (text or base64 bytes) or a [`HandlerError`]. The
//! [`Envelope`] is the JSON form of that outcome for transports that need one.

use crate::handler::HandlerError;
use crate::toolchain::ResizeOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inbound request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub operation: Option<String>,
    /// Base64-encoded image bytes.
    #[serde(alias = "base64Image")]
    pub payload: Option<String>,
    pub input_extension: Option<String>,
    pub output_extension: Option<String>,
    pub custom_args: Option<Vec<String>>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(flatten)]
    pub options: ResizeOptions,
}

impl Request {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: Some(operation.to_string()),
            ..Self::default()
        }
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Take the payload, treating an empty string as absent.
    pub(crate) fn take_payload(&mut self) -> Option<String> {
        self.payload.take().filter(|p| !p.is_empty())
    }

    /// Take the output extension, treating an empty string as absent.
    pub(crate) fn take_output_extension(&mut self) -> Option<String> {
        self.output_extension.take().filter(|e| !e.is_empty())
    }
}

/// Named operations. `thumbnail` parses to [`Operation::Resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Ping,
    GetDimensions,
    Identify,
    Resize,
    GetSample,
    Convert,
}

impl FromStr for Operation {
    type Err = HandlerError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "ping" => Ok(Self::Ping),
            "getDimensions" => Ok(Self::GetDimensions),
            "identify" => Ok(Self::Identify),
            "thumbnail" | "resize" => Ok(Self::Resize),
            "getSample" => Ok(Self::GetSample),
            "convert" => Ok(Self::Convert),
            other => Err(HandlerError::UnrecognizedOperation(other.to_string())),
        }
    }
}

/// Successful result of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Tool output or sentinel text.
    Text(String),
    /// Base64 of the bytes the tool produced.
    Encoded(String),
}

impl Response {
    pub fn as_str(&self) -> &str {
        match self {
            Response::Text(s) | Response::Encoded(s) => s,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Response::Text(s) | Response::Encoded(s) => s,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single outcome of a request.
pub type Completion = Result<Response, HandlerError>;

/// JSON form of a [`Completion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    #[serde(rename_all = "camelCase")]
    Success { result: String },
    #[serde(rename_all = "camelCase")]
    Failure {
        error_type: &'static str,
        error_message: String,
    },
}

impl From<&Completion> for Envelope {
    fn from(completion: &Completion) -> Self {
        match completion {
            Ok(response) => Envelope::Success {
                result: response.as_str().to_string(),
            },
            Err(err) => Envelope::Failure {
                error_type: err.kind(),
                error_message: err.to_string(),
            },
        }
    }
}
