//! Pixel layout conversion shared by all backends.
//!
//! Decoded frames go through [`conform_frame`], which applies the fixed
//! read pipeline: depth reduction, alpha stripping, and the color request.
//! Palette expansion and low-bit gray expansion are performed by the `image`
//! decoders before a frame reaches this module.

use image::{
    DynamicImage, ExtendedColorType, GrayImage, ImageBuffer, Luma, Rgb, RgbImage, Rgba, RgbaImage,
};

use crate::{config::ReadOptions, error::SequenceError};

/// Decode an in-memory payload with format sniffing and conform it.
pub(crate) fn decode_frame(bytes: &[u8], options: &ReadOptions) -> Result<DynamicImage, SequenceError> {
    let image = image::load_from_memory(bytes)
        .map_err(|error| SequenceError::Decode(error.to_string()))?;
    Ok(conform_frame(image, options))
}

/// Apply the read pipeline to a freshly decoded frame.
pub(crate) fn conform_frame(image: DynamicImage, options: &ReadOptions) -> DynamicImage {
    let stored_color = image.color().has_color();
    let image = normalize_depth(image);
    let image = if options.native_depth {
        image
    } else {
        truncate_to_8bit(image)
    };
    let wide = is_16bit(&image);
    let color = options.color.wants_color(stored_color);

    match (color, wide) {
        (true, false) if !matches!(image, DynamicImage::ImageRgb8(_)) => {
            DynamicImage::ImageRgb8(image.to_rgb8())
        }
        (true, true) if !matches!(image, DynamicImage::ImageRgb16(_)) => {
            DynamicImage::ImageRgb16(image.to_rgb16())
        }
        (false, false) if !matches!(image, DynamicImage::ImageLuma8(_)) => {
            DynamicImage::ImageLuma8(image.to_luma8())
        }
        (false, true) if !matches!(image, DynamicImage::ImageLuma16(_)) => {
            DynamicImage::ImageLuma16(image.to_luma16())
        }
        _ => image,
    }
}

fn is_16bit(image: &DynamicImage) -> bool {
    matches!(
        image,
        DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_)
    )
}

/// Bring floating-point frames (HDR, EXR) down to 8-bit integer samples.
fn normalize_depth(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb32F(_) => DynamicImage::ImageRgb8(image.to_rgb8()),
        DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgba8(image.to_rgba8()),
        other => other,
    }
}

/// Keep the high byte of every 16-bit sample.
fn truncate_to_8bit(image: DynamicImage) -> DynamicImage {
    fn high_bytes(samples: &[u16]) -> Vec<u8> {
        samples.iter().map(|sample| (sample >> 8) as u8).collect()
    }

    let (width, height) = (image.width(), image.height());
    let truncated = match &image {
        DynamicImage::ImageLuma16(buffer) => {
            GrayImage::from_raw(width, height, high_bytes(buffer.as_raw()))
                .map(DynamicImage::ImageLuma8)
        }
        DynamicImage::ImageLumaA16(buffer) => {
            ImageBuffer::from_raw(width, height, high_bytes(buffer.as_raw()))
                .map(DynamicImage::ImageLumaA8)
        }
        DynamicImage::ImageRgb16(buffer) => {
            RgbImage::from_raw(width, height, high_bytes(buffer.as_raw()))
                .map(DynamicImage::ImageRgb8)
        }
        DynamicImage::ImageRgba16(buffer) => {
            RgbaImage::from_raw(width, height, high_bytes(buffer.as_raw()))
                .map(DynamicImage::ImageRgba8)
        }
        _ => None,
    };
    truncated.unwrap_or(image)
}

/// A frame flattened into tightly packed, native-endian sample bytes.
#[derive(Debug)]
pub(crate) struct RawFrame {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub depth: u8,
    pub channels: u8,
}

/// Flatten a frame into one of the storable layouts (1, 3, or 4 channels of
/// 8 or 16 bits). Gray-alpha frames lose their alpha channel.
pub(crate) fn raw_frame(image: &DynamicImage) -> RawFrame {
    fn wide_bytes<P: image::Pixel<Subpixel = u16>>(buffer: &ImageBuffer<P, Vec<u16>>) -> Vec<u8> {
        buffer
            .as_raw()
            .iter()
            .flat_map(|sample| sample.to_ne_bytes())
            .collect()
    }

    let (width, height) = (image.width(), image.height());
    let (bytes, depth, channels) = match image {
        DynamicImage::ImageLuma8(buffer) => (buffer.as_raw().clone(), 8, 1),
        DynamicImage::ImageRgb8(buffer) => (buffer.as_raw().clone(), 8, 3),
        DynamicImage::ImageRgba8(buffer) => (buffer.as_raw().clone(), 8, 4),
        DynamicImage::ImageLuma16(buffer) => (wide_bytes::<Luma<u16>>(buffer), 16, 1),
        DynamicImage::ImageRgb16(buffer) => (wide_bytes::<Rgb<u16>>(buffer), 16, 3),
        DynamicImage::ImageRgba16(buffer) => (wide_bytes::<Rgba<u16>>(buffer), 16, 4),
        DynamicImage::ImageLumaA16(_) => (wide_bytes::<Luma<u16>>(&image.to_luma16()), 16, 1),
        DynamicImage::ImageLumaA8(_) => (image.to_luma8().into_raw(), 8, 1),
        DynamicImage::ImageRgba32F(_) => (image.to_rgba8().into_raw(), 8, 4),
        _ => (image.to_rgb8().into_raw(), 8, 3),
    };
    RawFrame {
        bytes,
        width,
        height,
        depth,
        channels,
    }
}

/// Map a storable layout to the `image` crate's color type.
pub(crate) fn color_type(depth: u8, channels: u8) -> Result<ExtendedColorType, SequenceError> {
    match (depth, channels) {
        (8, 1) => Ok(ExtendedColorType::L8),
        (8, 3) => Ok(ExtendedColorType::Rgb8),
        (8, 4) => Ok(ExtendedColorType::Rgba8),
        (16, 1) => Ok(ExtendedColorType::L16),
        (16, 3) => Ok(ExtendedColorType::Rgb16),
        (16, 4) => Ok(ExtendedColorType::Rgba16),
        (8 | 16, other) => Err(SequenceError::UnsupportedChannelCount(other)),
        (other, _) => Err(SequenceError::UnsupportedBitDepth(other)),
    }
}

/// Copy `height` rows of `row_bytes` each out of a strided buffer.
pub(crate) fn pack_rows(
    data: &[u8],
    row_stride: usize,
    row_bytes: usize,
    height: usize,
) -> Result<Vec<u8>, SequenceError> {
    if row_stride < row_bytes {
        return Err(SequenceError::Encode(format!(
            "row stride {row_stride} is smaller than a row ({row_bytes} bytes)"
        )));
    }
    let required = match height {
        0 => 0,
        rows => row_stride * (rows - 1) + row_bytes,
    };
    if data.len() < required {
        return Err(SequenceError::Encode(format!(
            "pixel buffer holds {} bytes, {required} required",
            data.len()
        )));
    }

    if row_stride == row_bytes {
        return Ok(data[..required].to_vec());
    }
    let mut packed = Vec::with_capacity(row_bytes * height);
    for row in 0..height {
        let row_start = row * row_stride;
        packed.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    Ok(packed)
}
