//! Parameter types for conversions.
//!
//! [`CompressionFactor`] says how much detail the lossy tile pass keeps.
//! `1.0` disables the pass entirely. Encoders run at their own default
//! settings; the tile pass is the only lossy step the factor controls.

/// Compression applied before encoding.
///
/// `Value(v)` keeps a fraction `v` of each tile's resolution: `0.0` reduces
/// every tile to a single pixel, values close to `1.0` are nearly lossless.
/// A level of exactly `1.0` is [`CompressionFactor::Skip`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompressionFactor {
    Value(f32),
    Skip,
}

impl CompressionFactor {
    /// Used when a caller supplies no level at all.
    pub const DEFAULT_LEVEL: f32 = 0.8;

    /// Map an optional caller-supplied level to a factor.
    pub fn from_level(level: Option<f32>) -> Self {
        match level {
            Some(v) if v >= 1.0 => CompressionFactor::Skip,
            Some(v) => CompressionFactor::Value(v.max(0.0)),
            None => CompressionFactor::Value(Self::DEFAULT_LEVEL),
        }
    }
}

impl Default for CompressionFactor {
    fn default() -> Self {
        Self::from_level(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_skips_compression() {
        assert_eq!(CompressionFactor::from_level(Some(1.0)), CompressionFactor::Skip);
    }

    #[test]
    fn missing_level_uses_default() {
        assert_eq!(
            CompressionFactor::from_level(None),
            CompressionFactor::Value(0.8)
        );
        assert_eq!(CompressionFactor::default(), CompressionFactor::Value(0.8));
    }

    #[test]
    fn negative_level_is_floored() {
        assert_eq!(
            CompressionFactor::from_level(Some(-0.5)),
            CompressionFactor::Value(0.0)
        );
    }
}
