//! Resize parameters and their translation into `convert` arguments.
//!
//! [`ResizeOptions`] is what a request may say about a resize beyond its
//! dimensions. [`ResizeParams`] is the complete description handed to the
//! toolchain: source bytes, destination path, dimensions and options.

use super::backend::ToolError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_QUALITY: f64 = 0.8;
pub const DEFAULT_FILTER: &str = "Lagrange";
pub const DEFAULT_SHARPENING: f64 = 0.2;

/// Optional resize settings carried on a request.
///
/// Fields the handler does not recognise land in `passthrough` so they still
/// reach the toolchain untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeOptions {
    /// Output quality as a fraction in `(0, 1]`.
    pub quality: Option<f64>,
    /// ImageMagick resampling filter name.
    pub filter: Option<String>,
    /// Unsharp-mask sigma; `0` disables sharpening.
    pub sharpening: Option<f64>,
    /// Strip profiles and comments from the output.
    pub strip: Option<bool>,
    /// Write an interlaced (progressive) output.
    pub progressive: Option<bool>,
    /// Format hint for the source bytes, e.g. `jpg`.
    pub src_format: Option<String>,
    #[serde(flatten)]
    pub passthrough: BTreeMap<String, serde_json::Value>,
}

/// Everything the toolchain needs to perform one resize.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: Vec<u8>,
    pub destination: PathBuf,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Extra `convert` arguments placed just before the destination.
    pub custom_args: Vec<String>,
    pub options: ResizeOptions,
}

impl ResizeParams {
    /// Reject parameters that cannot form a valid invocation.
    pub fn validate(&self) -> Result<(), ToolError> {
        if self.width.is_none() && self.height.is_none() {
            return Err(ToolError::InvalidArguments(
                "resize needs a width or a height".into(),
            ));
        }
        if let Some(quality) = self.options.quality {
            if !(quality > 0.0 && quality <= 1.0) {
                return Err(ToolError::InvalidArguments(format!(
                    "quality must be in (0, 1], got {quality}"
                )));
            }
        }
        if let Some(sharpening) = self.options.sharpening {
            if !sharpening.is_finite() || sharpening < 0.0 {
                return Err(ToolError::InvalidArguments(format!(
                    "sharpening must be a non-negative number, got {sharpening}"
                )));
            }
        }
        if let Some(format) = &self.options.src_format {
            if format.is_empty() || !format.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ToolError::InvalidArguments(format!(
                    "srcFormat must be alphanumeric, got {format:?}"
                )));
            }
        }
        Ok(())
    }

    /// `WxH`, `W` or `xH`.
    pub fn geometry(&self) -> String {
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{w}x{h}"),
            (Some(w), None) => w.to_string(),
            (None, Some(h)) => format!("x{h}"),
            (None, None) => String::new(),
        }
    }

    /// Full `convert` argument list; the source is read from stdin.
    pub fn to_convert_args(&self) -> Result<Vec<String>, ToolError> {
        self.validate()?;
        let options = &self.options;

        let source = match &options.src_format {
            Some(format) => format!("{format}:-"),
            None => "-".to_string(),
        };
        let mut args = vec![source];

        let filter = options.filter.as_deref().unwrap_or(DEFAULT_FILTER);
        if !filter.is_empty() {
            args.extend(["-filter".to_string(), filter.to_string()]);
        }
        args.extend(["-resize".to_string(), self.geometry()]);

        let quality = options.quality.unwrap_or(DEFAULT_QUALITY);
        args.extend([
            "-quality".to_string(),
            ((quality * 100.0).round() as u32).to_string(),
        ]);
        if options.strip.unwrap_or(true) {
            args.push("-strip".to_string());
        }
        if options.progressive.unwrap_or(false) {
            args.extend(["-interlace".to_string(), "plane".to_string()]);
        }
        let sharpening = options.sharpening.unwrap_or(DEFAULT_SHARPENING);
        if sharpening > 0.0 {
            args.extend(["-unsharp".to_string(), format!("0x{sharpening}")]);
        }

        args.extend(self.custom_args.iter().cloned());
        args.push(self.destination.to_string_lossy().into_owned());
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(width: Option<u32>, height: Option<u32>) -> ResizeParams {
        ResizeParams {
            source: vec![1, 2, 3],
            destination: "/tmp/out.png".into(),
            width,
            height,
            custom_args: Vec::new(),
            options: ResizeOptions::default(),
        }
    }

    #[test]
    fn geometry_forms() {
        assert_eq!(params(Some(100), Some(50)).geometry(), "100x50");
        assert_eq!(params(Some(100), None).geometry(), "100");
        assert_eq!(params(None, Some(50)).geometry(), "x50");
    }

    #[test]
    fn default_args() {
        let args = params(Some(100), None).to_convert_args().unwrap();
        assert_eq!(
            args,
            [
                "-", "-filter", "Lagrange", "-resize", "100", "-quality", "80", "-strip",
                "-unsharp", "0x0.2", "/tmp/out.png",
            ]
        );
    }

    #[test]
    fn options_shape_args() {
        let mut p = params(Some(640), Some(480));
        p.options = ResizeOptions {
            quality: Some(0.95),
            filter: Some("Lanczos".into()),
            sharpening: Some(0.0),
            strip: Some(false),
            progressive: Some(true),
            src_format: Some("jpg".into()),
            passthrough: BTreeMap::new(),
        };
        p.custom_args = vec!["-colorspace".into(), "Gray".into()];

        let args = p.to_convert_args().unwrap();
        assert_eq!(
            args,
            [
                "jpg:-", "-filter", "Lanczos", "-resize", "640x480", "-quality", "95",
                "-interlace", "plane", "-colorspace", "Gray", "/tmp/out.png",
            ]
        );
    }

    #[test]
    fn destination_is_last() {
        let mut p = params(None, Some(10));
        p.custom_args = vec!["-flip".into()];
        let args = p.to_convert_args().unwrap();
        assert_eq!(args.last().unwrap(), "/tmp/out.png");
        assert_eq!(args[args.len() - 2], "-flip");
    }

    #[test]
    fn missing_dimensions_rejected() {
        assert!(matches!(
            params(None, None).validate(),
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn quality_out_of_range_rejected() {
        let mut p = params(Some(10), None);
        p.options.quality = Some(80.0);
        assert!(p.to_convert_args().is_err());
        p.options.quality = Some(0.0);
        assert!(p.validate().is_err());
        p.options.quality = Some(f64::NAN);
        assert!(p.validate().is_err());
    }

    #[test]
    fn negative_sharpening_rejected() {
        let mut p = params(Some(10), None);
        p.options.sharpening = Some(-1.0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn src_format_must_be_plain() {
        let mut p = params(Some(10), None);
        p.options.src_format = Some("png:/etc/passwd".into());
        assert!(p.validate().is_err());
    }

    #[test]
    fn options_deserialize_with_passthrough() {
        let options: ResizeOptions = serde_json::from_value(serde_json::json!({
            "quality": 0.5,
            "srcFormat": "gif",
            "colorspace": "sRGB",
        }))
        .unwrap();

        assert_eq!(options.quality, Some(0.5));
        assert_eq!(options.src_format.as_deref(), Some("gif"));
        assert_eq!(
            options.passthrough.get("colorspace"),
            Some(&serde_json::json!("sRGB"))
        );
    }
}
