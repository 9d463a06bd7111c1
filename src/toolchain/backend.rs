//! Toolchain trait and shared error type.
//!
//! [`ImageToolchain`] is the only way the handler reaches the external image
//! tools. It has exactly three invocation shapes:
//!
//! | Method | ImageMagick | Result |
//! |---|---|---|
//! | `inspect` | `identify <args>` | stdout text |
//! | `resize` | `convert - ... <dst>` with source bytes on stdin | file at `dst` |
//! | `convert_raw` | `convert <args>` | stdout text |
//!
//! The production implementation is
//! [`MagickToolchain`](super::magick::MagickToolchain). Tests use the
//! recording stub in [`tests`].

use super::params::ResizeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

/// The external image toolchain.
pub trait ImageToolchain: Sync {
    /// Describe an image; `args` ends with the input path.
    fn inspect(&self, args: &[String]) -> Result<String, ToolError>;

    /// Resize `params.source` into `params.destination`.
    fn resize(&self, params: &ResizeParams) -> Result<(), ToolError>;

    /// Run a free-form conversion; paths are already part of `args`.
    fn convert_raw(&self, args: &[String]) -> Result<String, ToolError>;
}

impl<T: ImageToolchain + ?Sized> ImageToolchain for &T {
    fn inspect(&self, args: &[String]) -> Result<String, ToolError> {
        (**self).inspect(args)
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), ToolError> {
        (**self).resize(params)
    }

    fn convert_raw(&self, args: &[String]) -> Result<String, ToolError> {
        (**self).convert_raw(args)
    }
}
