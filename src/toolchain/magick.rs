//! ImageMagick toolchain: spawns `identify` and `convert`.
//!
//! Resize source bytes go to `convert` on stdin (`-` or `<fmt>:-`), so the
//! handler never needs an input file for that shape. A non-zero exit is a
//! [`ToolError::Failed`] carrying the tool's stderr verbatim.

use super::backend::{ImageToolchain, ToolError};
use super::params::ResizeParams;
use crate::config::ToolchainConfig;
use std::io::Write;
use std::process::{Command, Output, Stdio};

pub struct MagickToolchain {
    identify: String,
    convert: String,
}

impl MagickToolchain {
    pub fn new(config: &ToolchainConfig) -> Self {
        Self {
            identify: config.identify.clone(),
            convert: config.convert.clone(),
        }
    }

    fn run(&self, program: &str, args: &[String], stdin: Option<&[u8]>) -> Result<String, ToolError> {
        tracing::debug!(program, ?args, "invoking toolchain");
        let spawn_error = |source| ToolError::Spawn {
            program: program.to_string(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        // Feed stdin from a scoped thread so a chatty child can't deadlock
        // against a full stdout pipe.
        let output: Output = std::thread::scope(|scope| {
            if let (Some(data), Some(mut pipe)) = (stdin, child.stdin.take()) {
                scope.spawn(move || {
                    // A tool that exits early closes the pipe; its exit status reports why.
                    let _ = pipe.write_all(data);
                });
            }
            child.wait_with_output()
        })
        .map_err(spawn_error)?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ImageToolchain for MagickToolchain {
    fn inspect(&self, args: &[String]) -> Result<String, ToolError> {
        self.run(&self.identify, args, None)
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), ToolError> {
        let args = params.to_convert_args()?;
        if !params.options.passthrough.is_empty() {
            let keys: Vec<&str> = params.options.passthrough.keys().map(String::as_str).collect();
            tracing::debug!(?keys, "resize options not understood by convert");
        }
        self.run(&self.convert, &args, Some(&params.source))?;
        Ok(())
    }

    fn convert_raw(&self, args: &[String]) -> Result<String, ToolError> {
        self.run(&self.convert, args, None)
    }
}
