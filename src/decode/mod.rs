//! Image pair decoding
//!
//! The payload writer sees decoding only through the [`Decoder`] trait: a
//! pair of source names in, one fresh [`DecodedPair`] out. Every call returns
//! newly owned bytes, so decoders can be shared across threads.

mod errors;
mod pair;

pub use errors::{DecodeError, DecodeResult};
pub use pair::{parse_encode_type, ImagePairDecoder};

use image::ImageFormat;

/// Pixel layout of decoded images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// 3 channels per image
    #[default]
    Color,
    /// 1 channel per image
    Gray,
}

impl ColorMode {
    pub fn from_gray_flag(gray: bool) -> Self {
        if gray {
            ColorMode::Gray
        } else {
            ColorMode::Color
        }
    }

    /// Channels of a single image
    pub fn channels(&self) -> u32 {
        match self {
            ColorMode::Color => 3,
            ColorMode::Gray => 1,
        }
    }
}

/// Fixed output shape; both images of every pair are resized to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    pub height: u32,
    pub width: u32,
}

impl Resize {
    /// Resizing applies only when both dimensions are positive.
    pub fn target(height: u32, width: u32) -> Option<Self> {
        (height > 0 && width > 0).then_some(Self { height, width })
    }
}

/// How decoded pixels are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Raw CHW pixels
    #[default]
    Raw,
    /// Encoded file bytes, re-encoded to the given format when set
    Encoded(Option<ImageFormat>),
}

impl Encoding {
    pub fn is_encoded(&self) -> bool {
        matches!(self, Encoding::Encoded(_))
    }
}

/// Per-run decode settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    pub color: ColorMode,
    pub resize: Option<Resize>,
    pub encoding: Encoding,
}

/// Decoder output for one record
///
/// Raw pairs hold image A's CHW planes followed by image B's, so `channels`
/// is twice the per-image channel count. Encoded pairs hold
/// `u32 LE len(A) | A bytes | B bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPair {
    pub channels: u32,
    pub height: u32,
    pub width: u32,
    pub encoded: bool,
    pub data: Vec<u8>,
}

/// Source of image pair payloads
pub trait Decoder: Send + Sync {
    fn decode(
        &self,
        source_a: &str,
        source_b: &str,
        options: &DecodeOptions,
    ) -> DecodeResult<DecodedPair>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_needs_both_dimensions() {
        assert_eq!(Resize::target(0, 0), None);
        assert_eq!(Resize::target(32, 0), None);
        assert_eq!(
            Resize::target(32, 48),
            Some(Resize {
                height: 32,
                width: 48
            })
        );
    }

    #[test]
    fn test_color_channels() {
        assert_eq!(ColorMode::from_gray_flag(true).channels(), 1);
        assert_eq!(ColorMode::from_gray_flag(false).channels(), 3);
    }
}
