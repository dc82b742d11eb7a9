//! Conversion backend trait and shared types.
//!
//! The [`ConversionBackend`] trait is the conversion capability: one-time
//! setup plus a single `convert` call from bytes of one MIME type to bytes of
//! another. Everything above it (the [`Converter`](crate::convert::Converter)
//! façade, the CLI) treats the backend as a black box.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::CompressionFactor;
use crate::progress::ProgressObserver;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported conversion target: {0}")]
    UnsupportedType(String),
    #[error("Failed to load image: {0}")]
    Decode(String),
    #[error("Error writing image: {0}")]
    Encode(String),
}

/// An image conversion capability.
pub trait ConversionBackend: Send + Sync {
    /// Prepare the backend. Must succeed once before the first `convert`.
    fn init(&self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Convert `input` from `from_type` to `to_type`.
    ///
    /// `observer`, when given, receives zero or more progress notifications
    /// before this returns.
    fn convert(
        &self,
        input: &[u8],
        from_type: &str,
        to_type: &str,
        compression: CompressionFactor,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<Vec<u8>, BackendError>;
}
