//! Image pair decoder backed by the `image` crate

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use super::errors::{DecodeError, DecodeResult};
use super::{ColorMode, DecodeOptions, DecodedPair, Decoder, Encoding};

/// Formats accepted for `encode_type`
const ENCODE_FORMATS: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Bmp];

/// Maps an `encode_type` extension such as `png` or `.jpg` to a format.
pub fn parse_encode_type(ext: &str) -> Option<ImageFormat> {
    let ext = ext.trim_start_matches('.');
    ImageFormat::from_extension(ext).filter(|format| ENCODE_FORMATS.contains(format))
}

/// Decodes pairs of image files found under a root folder
#[derive(Debug, Clone)]
pub struct ImagePairDecoder {
    root: PathBuf,
}

impl ImagePairDecoder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn decode_raw(
        &self,
        path_a: &Path,
        path_b: &Path,
        options: &DecodeOptions,
    ) -> DecodeResult<DecodedPair> {
        let a = load(path_a, options)?;
        let b = load(path_b, options)?;
        check_shapes((a.width(), a.height()), (b.width(), b.height()))?;

        let channels = options.color.channels();
        let mut data = Vec::with_capacity(a.as_bytes().len() + b.as_bytes().len());
        push_planes(&mut data, a.as_bytes(), channels as usize);
        push_planes(&mut data, b.as_bytes(), channels as usize);

        Ok(DecodedPair {
            channels: channels * 2,
            height: a.height(),
            width: a.width(),
            encoded: false,
            data,
        })
    }

    fn decode_encoded(
        &self,
        path_a: &Path,
        path_b: &Path,
        options: &DecodeOptions,
        format: Option<ImageFormat>,
    ) -> DecodeResult<DecodedPair> {
        let (bytes_a, (width, height)) = encoded_image(path_a, options, format)?;
        let (bytes_b, dims_b) = encoded_image(path_b, options, format)?;
        check_shapes((width, height), dims_b)?;

        let len_a = u32::try_from(bytes_a.len()).map_err(|_| DecodeError::TooLarge {
            path: path_a.to_path_buf(),
            len: bytes_a.len(),
        })?;
        let mut data = Vec::with_capacity(4 + bytes_a.len() + bytes_b.len());
        data.extend_from_slice(&len_a.to_le_bytes());
        data.extend_from_slice(&bytes_a);
        data.extend_from_slice(&bytes_b);

        Ok(DecodedPair {
            channels: options.color.channels() * 2,
            height,
            width,
            encoded: true,
            data,
        })
    }
}

impl Decoder for ImagePairDecoder {
    fn decode(
        &self,
        source_a: &str,
        source_b: &str,
        options: &DecodeOptions,
    ) -> DecodeResult<DecodedPair> {
        let path_a = self.root.join(source_a);
        let path_b = self.root.join(source_b);
        match options.encoding {
            Encoding::Raw => self.decode_raw(&path_a, &path_b, options),
            Encoding::Encoded(format) => self.decode_encoded(&path_a, &path_b, options, format),
        }
    }
}

/// Opens an image, converts it to the requested color mode and resizes it.
fn load(path: &Path, options: &DecodeOptions) -> DecodeResult<DynamicImage> {
    let img = image::open(path).map_err(|source| DecodeError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(prepare(img, options))
}

fn prepare(img: DynamicImage, options: &DecodeOptions) -> DynamicImage {
    let img = match options.color {
        ColorMode::Gray => DynamicImage::ImageLuma8(img.to_luma8()),
        ColorMode::Color => DynamicImage::ImageRgb8(img.to_rgb8()),
    };
    match options.resize {
        Some(target) => img.resize_exact(target.width, target.height, FilterType::Triangle),
        None => img,
    }
}

/// File bytes for the encoded layout, plus (width, height).
///
/// The file is always decoded in full, so a damaged file fails here. Its
/// bytes are passed through untouched unless it has to be resized, its
/// channel count differs from the color mode, or its format differs from
/// the requested one.
fn encoded_image(
    path: &Path,
    options: &DecodeOptions,
    format: Option<ImageFormat>,
) -> DecodeResult<(Vec<u8>, (u32, u32))> {
    let bytes = fs::read(path).map_err(|source| DecodeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = image::load_from_memory(&bytes).map_err(|source| DecodeError::Image {
        path: path.to_path_buf(),
        source,
    })?;

    let source_format = image::guess_format(&bytes).ok();
    let channels_differ =
        u32::from(decoded.color().channel_count()) != options.color.channels();
    let reencode = options.resize.is_some()
        || channels_differ
        || (format.is_some() && format != source_format);

    if !reencode {
        let dims = (decoded.width(), decoded.height());
        return Ok((bytes, dims));
    }

    let img = prepare(decoded, options);
    let target = format.or(source_format).unwrap_or(ImageFormat::Png);
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, target)
        .map_err(|source| DecodeError::Encode {
            path: path.to_path_buf(),
            format: target.extensions_str().first().copied().unwrap_or("?").to_string(),
            source,
        })?;
    Ok((out.into_inner(), (img.width(), img.height())))
}

fn check_shapes(first: (u32, u32), second: (u32, u32)) -> DecodeResult<()> {
    if first != second {
        return Err(DecodeError::ShapeMismatch { first, second });
    }
    Ok(())
}

/// Appends interleaved HWC pixels as CHW planes.
fn push_planes(out: &mut Vec<u8>, interleaved: &[u8], channels: usize) {
    for c in 0..channels {
        out.extend(interleaved.iter().skip(c).step_by(channels).copied());
    }
}
