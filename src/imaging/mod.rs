//! The conversion capability, in pure Rust with no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory_with_format` / `load_from_memory` |
//! | **Compress** | tile-wise Lanczos3 shrink + Nearest expand, parallel with `rayon` |
//! | **Encode** | `image` encoders for WebP, JPEG, PNG and ICO |
//!
//! The module is split into:
//! - **Parameters**: [`CompressionFactor`]
//! - **Backend**: [`ConversionBackend`] trait + [`RustBackend`]

pub mod backend;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ConversionBackend};
pub use params::CompressionFactor;
pub use rust_backend::RustBackend;
