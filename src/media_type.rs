//! Canonical type table and MIME type resolution.
//!
//! The crate supports a fixed set of image types. Each entry pairs a canonical
//! MIME type with the file extensions it is known by; the first extension is
//! the canonical one and is used when naming converted files.
//!
//! | MIME type | Extensions |
//! |---|---|
//! | `image/webp` | `webp` |
//! | `image/jpeg` | `jpeg`, `jpg` |
//! | `image/png` | `png` |
//! | `image/x-icon` | `ico` |
//!
//! [`resolve_type`] decides which MIME type a picked file has: the declared
//! type wins when present, otherwise the filename extension is looked up in
//! the table, otherwise the result is [`OCTET_STREAM`].

use image::ImageFormat;
use std::path::Path;

/// Sentinel returned when no specific type can be determined.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Filter handed to file pickers.
pub const ACCEPT_LIST: &str = "image/*";

/// A supported image type from the canonical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    WebP,
    Jpeg,
    Png,
    Icon,
}

static TYPE_TABLE: &[(MediaType, &str, &[&str])] = &[
    (MediaType::WebP, "image/webp", &["webp"]),
    (MediaType::Jpeg, "image/jpeg", &["jpeg", "jpg"]),
    (MediaType::Png, "image/png", &["png"]),
    (MediaType::Icon, "image/x-icon", &["ico"]),
];

impl MediaType {
    /// Every table entry, in table order.
    pub fn all() -> impl Iterator<Item = MediaType> {
        TYPE_TABLE.iter().map(|(media_type, _, _)| *media_type)
    }

    fn entry(self) -> &'static (MediaType, &'static str, &'static [&'static str]) {
        // The table covers every variant.
        match self {
            MediaType::WebP => &TYPE_TABLE[0],
            MediaType::Jpeg => &TYPE_TABLE[1],
            MediaType::Png => &TYPE_TABLE[2],
            MediaType::Icon => &TYPE_TABLE[3],
        }
    }

    pub fn mime(self) -> &'static str {
        self.entry().1
    }

    pub fn extensions(self) -> &'static [&'static str] {
        self.entry().2
    }

    pub fn canonical_extension(self) -> &'static str {
        self.extensions()[0]
    }

    /// Exact match on the canonical MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        TYPE_TABLE
            .iter()
            .find(|(_, m, _)| *m == mime)
            .map(|(media_type, _, _)| *media_type)
    }

    /// Case-insensitive match against every known extension.
    pub fn from_extension(extension: &str) -> Option<Self> {
        TYPE_TABLE
            .iter()
            .find(|(_, _, exts)| exts.iter().any(|e| e.eq_ignore_ascii_case(extension)))
            .map(|(media_type, _, _)| *media_type)
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            MediaType::WebP => ImageFormat::WebP,
            MediaType::Jpeg => ImageFormat::Jpeg,
            MediaType::Png => ImageFormat::Png,
            MediaType::Icon => ImageFormat::Ico,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime())
    }
}

/// A picked file as the resolver sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Type reported by whoever handed us the file. Empty when unknown.
    pub declared_type: String,
    pub name: String,
}

impl FileDescriptor {
    pub fn new(declared_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            declared_type: declared_type.into(),
            name: name.into(),
        }
    }

    /// Files on disk carry no declared type; only the name is known.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(String::new(), name)
    }

    /// Substring after the last `.` of the name, if non-empty.
    pub fn extension(&self) -> Option<&str> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// Resolve the input MIME type of a file.
///
/// A non-empty declared type is returned verbatim, even when it is not in the
/// table. Otherwise the extension decides, and an unknown or missing
/// extension yields [`OCTET_STREAM`].
pub fn resolve_type(file: &FileDescriptor) -> &str {
    if !file.declared_type.is_empty() {
        return &file.declared_type;
    }
    file.extension()
        .and_then(MediaType::from_extension)
        .map(MediaType::mime)
        .unwrap_or(OCTET_STREAM)
}

/// Whether a MIME type passes the [`ACCEPT_LIST`] picker filter.
pub fn accepts(mime: &str) -> bool {
    let prefix = ACCEPT_LIST.trim_end_matches('*');
    mime.len() > prefix.len()
        && mime
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
