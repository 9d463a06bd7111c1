//! Per-request ephemeral files.
//!
//! Every input or output file a request touches is an [`EphemeralFile`]
//! acquired from an [`EphemeralDir`]. Names are unique (prefix + random
//! suffix + extension), so concurrent requests never share a path.
//!
//! A file is removed exactly once: either through [`EphemeralFile::release`]
//! (run an extractor, then delete) or [`EphemeralFile::discard`], or, if the
//! request bails out early, when the value is dropped. Release and discard
//! also remove the `<stem>-0.<ext>`, `<stem>-1.<ext>`, ... frames ImageMagick
//! writes instead of the named file for multi-image results. Deletion errors
//! are logged and swallowed; a file that is already gone is not a failure here.

use crate::config::EphemeralConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Factory for uniquely named files in one directory.
#[derive(Debug, Clone)]
pub struct EphemeralDir {
    dir: PathBuf,
    prefix: String,
    default_extension: String,
}

impl EphemeralDir {
    pub fn new(config: &EphemeralConfig) -> Self {
        Self {
            dir: config.resolved_dir(),
            prefix: config.prefix.clone(),
            default_extension: config.default_extension.clone(),
        }
    }

    /// Create a new, empty, uniquely named file with the given extension.
    pub fn acquire(&self, extension: Option<&str>) -> io::Result<EphemeralFile> {
        let extension = sanitize_extension(extension, &self.default_extension);
        let path = tempfile::Builder::new()
            .prefix(&self.prefix)
            .suffix(&format!(".{extension}"))
            .tempfile_in(&self.dir)?
            .into_temp_path();
        tracing::debug!(path = %path.display(), "acquired ephemeral file");
        Ok(EphemeralFile { path })
    }
}

/// Keep only ASCII alphanumerics so an extension can't smuggle separators or
/// ImageMagick format prefixes into a path.
fn sanitize_extension(extension: Option<&str>, default: &str) -> String {
    let cleaned: String = extension
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    if cleaned.is_empty() {
        default.to_string()
    } else {
        cleaned
    }
}

/// A file owned by a single request. Deleted on release, discard or drop.
#[derive(Debug)]
pub struct EphemeralFile {
    path: TempPath,
}

impl EphemeralFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path as a command-line argument.
    pub fn arg(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    pub fn write(&self, bytes: &[u8]) -> io::Result<()> {
        fs::write(&self.path, bytes)
    }

    /// Run `extract` against the file, then delete it whatever the outcome.
    pub fn release<T, E>(self, extract: impl FnOnce(&Path) -> Result<T, E>) -> Result<T, E> {
        let result = extract(&self.path);
        self.discard();
        result
    }

    /// Delete the file without extracting anything. Frames ImageMagick split
    /// a multi-image result into go with it.
    pub fn discard(self) {
        for frame in self.frames() {
            if let Err(err) = fs::remove_file(&frame) {
                tracing::debug!(path = %frame.display(), error = %err, "ignoring ephemeral cleanup failure");
            }
        }
        let shown = self.path.display().to_string();
        if let Err(err) = self.path.close() {
            tracing::debug!(path = %shown, error = %err, "ignoring ephemeral cleanup failure");
        }
    }

    /// Siblings named `<stem>-<n>.<ext>`.
    fn frames(&self) -> Vec<PathBuf> {
        let (Some(dir), Some(stem), Some(ext)) = (
            self.path.parent(),
            self.path.file_stem().and_then(|s| s.to_str()),
            self.path.extension().and_then(|e| e.to_str()),
        ) else {
            return Vec::new();
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        let lead = format!("{stem}-");
        let tail = format!(".{ext}");
        entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .and_then(|name| name.strip_prefix(lead.as_str()))
                    .and_then(|name| name.strip_suffix(tail.as_str()))
                    .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ephemeral_in(tmp: &TempDir) -> EphemeralDir {
        EphemeralDir::new(&EphemeralConfig {
            dir: Some(tmp.path().to_path_buf()),
            ..EphemeralConfig::default()
        })
    }

    #[test]
    fn acquire_creates_file_with_prefix_and_extension() {
        let tmp = TempDir::new().unwrap();
        let file = ephemeral_in(&tmp).acquire(Some("jpg")).unwrap();

        assert!(file.path().exists());
        assert_eq!(file.path().parent().unwrap(), tmp.path());
        let name = file.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("imgop-"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn acquire_defaults_extension() {
        let tmp = TempDir::new().unwrap();
        let file = ephemeral_in(&tmp).acquire(None).unwrap();
        assert_eq!(file.path().extension().unwrap(), "png");
    }

    #[test]
    fn acquire_names_are_unique() {
        let tmp = TempDir::new().unwrap();
        let dir = ephemeral_in(&tmp);
        let a = dir.acquire(Some("png")).unwrap();
        let b = dir.acquire(Some("png")).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn sanitize_strips_separators_and_format_prefixes() {
        assert_eq!(sanitize_extension(Some("../../etc"), "png"), "etc");
        assert_eq!(sanitize_extension(Some("jpg:"), "png"), "jpg");
        assert_eq!(sanitize_extension(Some("."), "png"), "png");
        assert_eq!(sanitize_extension(Some(""), "png"), "png");
        assert_eq!(sanitize_extension(None, "webp"), "webp");
    }

    #[test]
    fn release_returns_extracted_value_and_deletes() {
        let tmp = TempDir::new().unwrap();
        let file = ephemeral_in(&tmp).acquire(Some("bin")).unwrap();
        file.write(b"abc").unwrap();
        let path = file.path().to_path_buf();

        let bytes: Result<Vec<u8>, io::Error> = file.release(|p| fs::read(p));

        assert_eq!(bytes.unwrap(), b"abc");
        assert!(!path.exists());
    }

    #[test]
    fn release_deletes_when_extractor_fails() {
        let tmp = TempDir::new().unwrap();
        let file = ephemeral_in(&tmp).acquire(None).unwrap();
        let path = file.path().to_path_buf();

        let result: Result<(), &str> = file.release(|_| Err("extractor failed"));

        assert_eq!(result, Err("extractor failed"));
        assert!(!path.exists());
    }

    #[test]
    fn release_tolerates_file_already_removed() {
        let tmp = TempDir::new().unwrap();
        let file = ephemeral_in(&tmp).acquire(None).unwrap();
        let path = file.path().to_path_buf();

        let result: Result<u8, io::Error> = file.release(|p| {
            fs::remove_file(p)?;
            Ok(7)
        });

        assert_eq!(result.unwrap(), 7);
        assert!(!path.exists());
    }

    #[test]
    fn discard_deletes() {
        let tmp = TempDir::new().unwrap();
        let file = ephemeral_in(&tmp).acquire(None).unwrap();
        let path = file.path().to_path_buf();
        file.discard();
        assert!(!path.exists());
    }

    #[test]
    fn discard_sweeps_split_frames() {
        let tmp = TempDir::new().unwrap();
        let file = ephemeral_in(&tmp).acquire(Some("png")).unwrap();
        let stem = file.path().file_stem().unwrap().to_str().unwrap().to_string();
        for n in 0..3 {
            fs::write(tmp.path().join(format!("{stem}-{n}.png")), b"frame").unwrap();
        }

        file.discard();

        assert!(fs::read_dir(tmp.path()).unwrap().next().is_none());
    }

    #[test]
    fn release_leaves_unrelated_neighbours() {
        let tmp = TempDir::new().unwrap();
        let file = ephemeral_in(&tmp).acquire(Some("png")).unwrap();
        let stem = file.path().file_stem().unwrap().to_str().unwrap().to_string();
        let keep = [
            format!("{stem}-0.jpg"),
            format!("{stem}-x.png"),
            format!("{stem}-.png"),
            "other-0.png".to_string(),
        ];
        for name in &keep {
            fs::write(tmp.path().join(name), b"keep").unwrap();
        }

        let _: Result<(), io::Error> = file.release(|_| Ok(()));

        for name in &keep {
            assert!(tmp.path().join(name).exists(), "{name} was removed");
        }
    }

    #[test]
    fn drop_deletes_unreleased_file() {
        let tmp = TempDir::new().unwrap();
        let path = {
            let file = ephemeral_in(&tmp).acquire(None).unwrap();
            file.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn acquire_in_missing_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        let dir = EphemeralDir::new(&EphemeralConfig {
            dir: Some(tmp.path().join("missing")),
            ..EphemeralConfig::default()
        });
        assert!(dir.acquire(None).is_err());
    }
}
