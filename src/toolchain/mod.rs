//! External image toolchain.
//!
//! - **Backend**: [`ImageToolchain`] trait + [`ToolError`]
//! - **Parameters**: [`ResizeParams`] / [`ResizeOptions`] and the `convert`
//!   argument vector they produce
//! - **Magick**: [`MagickToolchain`], the process-spawning implementation

pub mod backend;
pub mod magick;
mod params;

pub use backend::{ImageToolchain, ToolError};
pub use magick::MagickToolchain;
pub use params::{
    DEFAULT_FILTER, DEFAULT_QUALITY, DEFAULT_SHARPENING, ResizeOptions, ResizeParams,
};
