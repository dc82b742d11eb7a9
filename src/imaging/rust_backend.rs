//! Pure Rust conversion backend.
//!
//! ## Pipeline
//!
//! | Step | Crate / function | Progress |
//! |---|---|---|
//! | Decode | `image::load_from_memory_with_format`, or content sniffing when the source type is unknown | 0% |
//! | Tile simplification | `imageops::resize` Lanczos3 down, Nearest up, tiles in parallel with `rayon` | 25% |
//! | Target normalization | RGB for JPEG, ≤256px RGBA for ICO, RGB/RGBA for WebP | 50% |
//! | Encode | `write_to` with the encoder's default settings | 75% |
//! | Size guard | original bytes kept when same-format output is larger | 100% |
//!
//! The size guard only applies when source and target formats match. A
//! conversion to another format always returns bytes of the target format,
//! even when they are larger than the input.
//!
//! WebP output is lossless (the only WebP encoder in the `image` crate), so
//! the tile pass is what makes WebP output smaller.

use super::backend::{BackendError, ConversionBackend};
use super::params::CompressionFactor;
use crate::media_type::MediaType;
use crate::progress::{ProgressObserver, notify};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use rayon::prelude::*;
use std::io::Cursor;

/// Side length of the square tiles simplified independently.
pub const TILE_SIZE: u32 = 64;

/// Largest edge the ICO container holds.
const ICO_MAX_EDGE: u32 = 256;

/// Conversion backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the pipeline.
pub struct RustBackend {
    tile_size: u32,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            tile_size: TILE_SIZE,
        }
    }

    pub fn with_tile_size(tile_size: u32) -> Self {
        Self {
            tile_size: tile_size.max(1),
        }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionBackend for RustBackend {
    fn convert(
        &self,
        input: &[u8],
        from_type: &str,
        to_type: &str,
        compression: CompressionFactor,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<Vec<u8>, BackendError> {
        let target = MediaType::from_mime(to_type)
            .ok_or_else(|| BackendError::UnsupportedType(to_type.to_string()))?;
        let source_format = source_format(from_type);

        notify(observer, 0.0, "Loading image");
        let img = load_image(input, source_format)?;
        tracing::debug!(
            width = img.width(),
            height = img.height(),
            from = from_type,
            to = to_type,
            "decoded source image"
        );

        notify(observer, 25.0, "Compressing image");
        let img = match compression {
            CompressionFactor::Value(keep) => simplify_tiles(&img, self.tile_size, keep),
            CompressionFactor::Skip => img,
        };

        notify(observer, 50.0, "Preparing target format");
        let img = prepare_for_target(img, target);

        notify(observer, 75.0, "Encoding image");
        let encoded = encode(&img, target)?;

        let output = if source_format == Some(target.image_format()) && encoded.len() > input.len()
        {
            tracing::debug!(
                encoded = encoded.len(),
                original = input.len(),
                "re-encoded image is larger, keeping original bytes"
            );
            input.to_vec()
        } else {
            encoded
        };

        notify(observer, 100.0, "Done");
        Ok(output)
    }
}

/// Decoder format for a source MIME type; `None` means sniff the content.
fn source_format(from_type: &str) -> Option<ImageFormat> {
    MediaType::from_mime(from_type)
        .map(MediaType::image_format)
        .or_else(|| ImageFormat::from_mime_type(from_type))
}

fn load_image(input: &[u8], format: Option<ImageFormat>) -> Result<DynamicImage, BackendError> {
    match format {
        Some(format) => image::load_from_memory_with_format(input, format),
        None => image::load_from_memory(input),
    }
    .map_err(|e| BackendError::Decode(e.to_string()))
}

/// Downscale each tile to `keep` of its size and blow it back up.
///
/// Detail inside a tile collapses into blocks while the image keeps its
/// dimensions. Tiles on the right and bottom edges may be smaller.
fn simplify_tiles(img: &DynamicImage, tile_size: u32, keep: f32) -> DynamicImage {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let tiles: Vec<(u32, u32, u32, u32)> = (0..height)
        .step_by(tile_size as usize)
        .flat_map(|y| {
            (0..width)
                .step_by(tile_size as usize)
                .map(move |x| (x, y, tile_size.min(width - x), tile_size.min(height - y)))
        })
        .collect();

    let simplified: Vec<(u32, u32, RgbaImage)> = tiles
        .par_iter()
        .map(|&(x, y, w, h)| {
            let tile = imageops::crop_imm(&rgba, x, y, w, h).to_image();
            (x, y, simplify_tile(tile, keep))
        })
        .collect();

    let mut out = rgba.clone();
    for (x, y, tile) in &simplified {
        imageops::replace(&mut out, tile, i64::from(*x), i64::from(*y));
    }
    DynamicImage::ImageRgba8(out)
}

fn simplify_tile(tile: RgbaImage, keep: f32) -> RgbaImage {
    let (w, h) = tile.dimensions();
    let keep = keep.clamp(0.0, 1.0);
    let small_w = ((w as f32 * keep).round() as u32).clamp(1, w);
    let small_h = ((h as f32 * keep).round() as u32).clamp(1, h);
    if small_w == w && small_h == h {
        return tile;
    }
    let small = imageops::resize(&tile, small_w, small_h, FilterType::Lanczos3);
    imageops::resize(&small, w, h, FilterType::Nearest)
}

fn prepare_for_target(img: DynamicImage, target: MediaType) -> DynamicImage {
    match target {
        MediaType::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        MediaType::Icon => {
            let img = if img.width() > ICO_MAX_EDGE || img.height() > ICO_MAX_EDGE {
                img.resize(ICO_MAX_EDGE, ICO_MAX_EDGE, FilterType::Lanczos3)
            } else {
                img
            };
            DynamicImage::ImageRgba8(img.to_rgba8())
        }
        MediaType::WebP if img.color().has_alpha() => DynamicImage::ImageRgba8(img.to_rgba8()),
        MediaType::WebP => DynamicImage::ImageRgb8(img.to_rgb8()),
        MediaType::Png => img,
    }
}

fn encode(img: &DynamicImage, target: MediaType) -> Result<Vec<u8>, BackendError> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), target.image_format())
        .map_err(|e| BackendError::Encode(e.to_string()))?;
    Ok(buffer)
}
