//! # Image Compressor
//!
//! Convert images between WebP, JPEG, PNG and ICO, compressing them on the
//! way, and save the result for the user.
//!
//! # Flow
//!
//! ```text
//! 1. Pick     file / URL   →  FileDescriptor   (name + declared type)
//! 2. Resolve  descriptor   →  input MIME type  (declared type or extension)
//! 3. Convert  request      →  ConversionResult (Success bytes | Failure message)
//! 4. Save     bytes        →  download dir     (staged temp file, renamed)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`media_type`] | Canonical type table, `resolve_type`, accept list |
//! | [`object`] | Key filtering over mappings (strict or regex) |
//! | [`convert`] | Conversion façade: validated requests, one-time backend init, failure capture |
//! | [`imaging`] | The conversion capability: `ConversionBackend` trait + `RustBackend` |
//! | [`progress`] | Progress observer contract and stock observers |
//! | [`download`] | Saving converted bytes under a file name |
//! | [`server`] | `GET /api/image?url=` passthrough endpoint |
//! | [`config`] | `image-compressor.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Backend Is a Black Box
//!
//! The façade only knows the [`imaging::ConversionBackend`] trait: `init`
//! once, then `convert(bytes, from, to, compression, observer)`. Anything a
//! backend does wrong, error or panic, turns into
//! [`convert::ConversionResult::Failure`], so callers drive their UI from one
//! value and never from a fault.
//!
//! ## Pure-Rust Imaging
//!
//! [`imaging::RustBackend`] uses the `image` crate for every codec. The
//! binary needs no system image libraries.
//!
//! ## Explicit Initialization State
//!
//! Backend setup is tracked by [`convert::InitState`], created by the caller
//! and injected into the [`convert::Converter`]. It flips to initialized once
//! and stays there for the life of the process.

pub mod config;
pub mod convert;
pub mod download;
pub mod imaging;
pub mod media_type;
pub mod object;
pub mod output;
pub mod progress;
pub mod server;
