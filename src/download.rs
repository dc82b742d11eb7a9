//! Saving converted bytes for the user.
//!
//! [`DownloadTarget::trigger_download`] stages the bytes in an unnamed
//! temporary file inside the destination directory, renames it to the
//! requested file name, and lets the temporary handle go. Staging on the same
//! filesystem keeps the rename atomic: the destination either holds the
//! complete output or nothing new.

use crate::media_type::MediaType;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid download filename: {0:?}")]
    InvalidFilename(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory that receives downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    directory: PathBuf,
}

impl DownloadTarget {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Save `bytes` as `filename` inside the target directory.
    ///
    /// `filename` must be a bare file name. An existing file of that name is
    /// replaced. Returns the saved path.
    pub fn trigger_download(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, DownloadError> {
        validate_filename(filename)?;
        std::fs::create_dir_all(&self.directory)?;

        let mut staged = NamedTempFile::new_in(&self.directory)?;
        staged.write_all(bytes)?;
        staged.flush()?;

        let destination = self.directory.join(filename);
        staged
            .persist(&destination)
            .map_err(|e| DownloadError::Io(e.error))?;

        tracing::debug!(path = %destination.display(), bytes = bytes.len(), "download saved");
        Ok(destination)
    }
}

fn validate_filename(filename: &str) -> Result<(), DownloadError> {
    let plain = !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\', '\0']);
    if plain {
        Ok(())
    } else {
        Err(DownloadError::InvalidFilename(filename.to_string()))
    }
}

/// Name for a converted file: the source stem with the output type's
/// canonical extension.
///
/// Types outside the table get `bin`. A source without a stem becomes
/// `image`.
pub fn download_filename(source_name: &str, output_type: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string());
    let extension = MediaType::from_mime(output_type)
        .map(MediaType::canonical_extension)
        .unwrap_or("bin");
    format!("{stem}.{extension}")
}
