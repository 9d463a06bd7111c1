//! # imgop
//!
//! A single-request image operation handler. A request names an operation
//! and carries a base64 image; the handler materialises it as a temporary
//! file, hands the pixel work to ImageMagick, and answers with either text or
//! base64-encoded bytes.
//!
//! ```text
//! Request ─► codec::decode ─► handler (route + build args) ─► toolchain
//!                                  │                               │
//!                             ephemeral files ◄── write / read ────┘
//!                                  │
//! Completion ◄── codec::encode ◄───┘
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`handler`] | Operation router and the inspect / resize / convert shapes |
//! | [`request`] | `Request`, `Operation`, `Response`, `Completion` and its JSON envelope |
//! | [`toolchain`] | `ImageToolchain` trait, resize parameters, the ImageMagick implementation |
//! | [`ephemeral`] | Uniquely named per-request files, removed on every exit path |
//! | [`codec`] | Lenient base64 decoding of payloads, standard encoding of results |
//! | [`config`] | `config.toml` loading and validation |
//!
//! # Design Decisions
//!
//! ## Three Invocation Shapes
//!
//! Every operation reduces to one of three calls on [`toolchain::ImageToolchain`]:
//! `inspect` (text out), `resize` (bytes in, file out) and `convert_raw`
//! (free-form arguments). Shortcut operations such as `getDimensions` and
//! `getSample` are a small setup step followed by an explicit call into one of
//! those shapes. Keeping the trait this narrow means tests run against a
//! recording stub and never need ImageMagick installed.
//!
//! ## Cleanup on Every Exit Path
//!
//! Temporary files are [`ephemeral::EphemeralFile`] values. Releasing one runs
//! an extractor and then deletes the file whatever the extractor returned;
//! dropping one deletes it too, so an early `?` cannot leak a file. Deletion
//! failures are logged and swallowed so they never mask the real error.
//!
//! ## One Completion per Request
//!
//! [`Handler::handle`](handler::Handler::handle) returns a
//! [`request::Completion`], a plain `Result`. There is no callback to fire
//! twice or forget, and by the time it returns every file the request created
//! is already gone.

pub mod codec;
pub mod config;
pub mod ephemeral;
pub mod handler;
pub mod request;
pub mod toolchain;

pub use handler::{Handler, HandlerError};
pub use request::{Completion, Envelope, Operation, Request, Response};
