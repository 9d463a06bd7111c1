//! Operation router and the three invocation shapes.
//!
//! [`Handler::handle`] turns a [`Request`] into exactly one [`Completion`].
//!
//! | operation | setup | shape |
//! |---|---|---|
//! | `ping` | | answers `pong`, no tool |
//! | `getDimensions` | `customArgs = ["-format", "%wx%h"]` | inspect |
//! | `identify` | | inspect |
//! | `resize`, `thumbnail` | | resize |
//! | `getSample` | `customArgs = ["rose:"]`, `outputExtension` defaults to `png` | convert |
//! | `convert` | | convert |
//!
//! Shortcut operations are a setup function followed by an explicit call into
//! the shared shape. Every ephemeral file a shape creates is released before
//! the shape returns, on success and on failure alike.

use crate::codec::{self, CodecError};
use crate::config::HandlerConfig;
use crate::ephemeral::EphemeralDir;
use crate::request::{Completion, Operation, Request, Response};
use crate::toolchain::{ImageToolchain, ResizeParams, ToolError};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Text returned by `ping`.
pub const PING_SENTINEL: &str = "pong";

/// Arguments `getDimensions` passes to identify.
pub const DIMENSIONS_FORMAT_ARGS: [&str; 2] = ["-format", "%wx%h"];

/// Built-in ImageMagick pattern `getSample` renders.
pub const SAMPLE_GENERATOR: &str = "rose:";

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Unrecognized operation \"{0}\"")]
    UnrecognizedOperation(String),
    #[error("Invalid {operation} request: no payload supplied")]
    MissingPayload { operation: &'static str },
    #[error("Invalid payload: {0}")]
    Payload(#[from] CodecError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HandlerError {
    /// Stable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerError::UnrecognizedOperation(_) => "UnrecognizedOperation",
            HandlerError::MissingPayload { .. } => "MissingPayload",
            HandlerError::Payload(_) => "InvalidPayload",
            HandlerError::Tool(_) => "ToolFailed",
            HandlerError::Io(_) => "IoError",
        }
    }
}

/// Routes requests to the toolchain. Holds no per-request state, so one
/// handler can serve concurrent requests.
pub struct Handler<T> {
    toolchain: T,
    ephemeral: EphemeralDir,
    thumbnail_width: u32,
}

impl<T: ImageToolchain> Handler<T> {
    pub fn new(toolchain: T, config: &HandlerConfig) -> Self {
        Self {
            toolchain,
            ephemeral: EphemeralDir::new(&config.ephemeral),
            thumbnail_width: config.resize.thumbnail_width,
        }
    }

    /// Handle one request.
    pub fn handle(&self, mut request: Request) -> Completion {
        let name = request.operation.take().unwrap_or_default();
        let operation = match name.parse::<Operation>() {
            Ok(operation) => operation,
            Err(err) => {
                tracing::warn!(operation = %name, "unrecognized operation");
                return Err(err);
            }
        };
        tracing::info!(operation = %name, "operation requested");

        match operation {
            Operation::Ping => Ok(Response::Text(PING_SENTINEL.to_string())),
            Operation::GetDimensions => {
                prepare_dimensions(&mut request);
                self.identify(request)
            }
            Operation::Identify => self.identify(request),
            Operation::Resize => self.resize(request),
            Operation::GetSample => {
                prepare_sample(&mut request);
                self.convert(request)
            }
            Operation::Convert => self.convert(request),
        }
    }

    /// Inspect shape: payload → input file → `identify [customArgs..] input`.
    fn identify(&self, mut request: Request) -> Completion {
        let payload = request.take_payload().ok_or(HandlerError::MissingPayload {
            operation: "identify",
        })?;
        let bytes = codec::decode_payload(&payload)?;

        let input = self.ephemeral.acquire(request.input_extension.as_deref())?;
        let mut args = request.custom_args.unwrap_or_default();
        args.push(input.arg());

        let result = input.release(|path| -> Result<String, HandlerError> {
            fs::write(path, &bytes)?;
            Ok(self.toolchain.inspect(&args)?)
        });
        log_outcome("Identify", result).map(Response::Text)
    }

    /// Resize shape: payload bytes → `convert` → output file → base64.
    fn resize(&self, mut request: Request) -> Completion {
        let payload = request.take_payload().ok_or(HandlerError::MissingPayload {
            operation: "resize",
        })?;
        let (width, height) = match (positive(request.width), positive(request.height)) {
            (None, None) => (Some(self.thumbnail_width), None),
            dimensions => dimensions,
        };
        let source = codec::decode_payload(&payload)?;

        let output = self.ephemeral.acquire(request.take_output_extension().as_deref())?;
        let params = ResizeParams {
            source,
            destination: output.path().to_path_buf(),
            width,
            height,
            custom_args: request.custom_args.unwrap_or_default(),
            options: request.options,
        };

        let result = output.release(|path| -> Result<String, HandlerError> {
            params.validate()?;
            self.toolchain.resize(&params)?;
            Ok(codec::encode_output(&read_output(path)?))
        });
        log_outcome("Resize", result).map(Response::Encoded)
    }

    /// Convert shape: `convert [input] customArgs.. [output]`.
    ///
    /// The payload is optional; without one the arguments alone drive the
    /// tool (e.g. built-in generators). Without an output extension the
    /// tool's stdout comes back as text.
    fn convert(&self, mut request: Request) -> Completion {
        let mut args = request.custom_args.take().unwrap_or_default();

        let input = match request.take_payload() {
            Some(payload) => {
                let bytes = codec::decode_payload(&payload)?;
                let input = self.ephemeral.acquire(request.input_extension.as_deref())?;
                input.write(&bytes)?;
                args.insert(0, input.arg());
                Some(input)
            }
            None => None,
        };
        let output = match request.take_output_extension() {
            Some(extension) => {
                let output = self.ephemeral.acquire(Some(extension.as_str()))?;
                args.push(output.arg());
                Some(output)
            }
            None => None,
        };

        let invoked = self.toolchain.convert_raw(&args);
        if let Some(input) = input {
            input.discard();
        }

        let result = match (invoked, output) {
            (Ok(_), Some(output)) => output.release(|path| -> Result<Response, HandlerError> {
                Ok(Response::Encoded(codec::encode_output(&read_output(path)?)))
            }),
            (Ok(text), None) => Ok(Response::Text(text)),
            (Err(err), output) => {
                if let Some(output) = output {
                    output.discard();
                }
                Err(err.into())
            }
        };
        log_outcome("Convert", result)
    }
}

/// `getDimensions` = identify with a fixed format query.
fn prepare_dimensions(request: &mut Request) {
    request.custom_args = Some(DIMENSIONS_FORMAT_ARGS.map(String::from).to_vec());
}

/// `getSample` = convert of the built-in sample image.
fn prepare_sample(request: &mut Request) {
    request.custom_args = Some(vec![SAMPLE_GENERATOR.to_string()]);
    if request.output_extension.as_deref().is_none_or(str::is_empty) {
        request.output_extension = Some("png".to_string());
    }
}

/// Read a produced output file. The file exists (empty) from the moment it is
/// acquired, so a tool that exits cleanly without writing it leaves zero bytes.
fn read_output(path: &Path) -> Result<Vec<u8>, HandlerError> {
    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("no output written to {}", path.display()),
        )
        .into());
    }
    Ok(bytes)
}

/// Zero counts as unset.
fn positive(dimension: Option<u32>) -> Option<u32> {
    dimension.filter(|d| *d > 0)
}

fn log_outcome<V>(shape: &str, result: Result<V, HandlerError>) -> Result<V, HandlerError> {
    match &result {
        Ok(_) => tracing::info!("{shape} operation completed successfully"),
        Err(err) => tracing::warn!(error = %err, "{shape} operation failed"),
    }
    result
}
