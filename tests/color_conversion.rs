//! Decoded frame layout tests.
//!
//! Frames go through the same pipeline for every backend; these tests use
//! numbered files because they are the simplest to prepare.

use framestore::{ColorRequest, FileSequenceReader, ReadOptions};
use image::{
    DynamicImage, GrayAlphaImage, ImageBuffer, LumaA, Rgb, Rgba, RgbaImage,
};

fn read_back(image: DynamicImage, options: &ReadOptions) -> DynamicImage {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    image.save(directory.path().join("p0.png")).expect("save");
    let pattern = directory.path().join("p%d.png").to_string_lossy().into_owned();
    let mut reader = FileSequenceReader::open(&pattern, None, None, options).expect("open");
    reader.read(0).expect("read")
}

fn deep_color() -> DynamicImage {
    let image: ImageBuffer<Rgb<u16>, Vec<u16>> =
        ImageBuffer::from_pixel(2, 2, Rgb([0x1280, 0xff01, 0x00ff]));
    DynamicImage::ImageRgb16(image)
}

#[test]
fn sixteen_bit_is_truncated_to_the_high_byte() {
    let frame = read_back(deep_color(), &ReadOptions::default());
    let rgb = frame.as_rgb8().expect("8-bit rgb");
    assert_eq!(rgb.get_pixel(1, 1), &Rgb([0x12, 0xff, 0x00]));
}

#[test]
fn native_depth_keeps_sixteen_bit_samples() {
    let options = ReadOptions::new().with_native_depth(true);
    let frame = read_back(deep_color(), &options);
    let rgb = frame.as_rgb16().expect("16-bit rgb");
    assert_eq!(rgb.get_pixel(0, 0), &Rgb([0x1280, 0xff01, 0x00ff]));

    let gray = read_back(deep_color(), &options.with_color(ColorRequest::Gray));
    assert!(gray.as_luma16().is_some());
}

#[test]
fn alpha_is_always_stripped() {
    let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 1, Rgba([9, 8, 7, 0])));
    let frame = read_back(rgba, &ReadOptions::default());
    assert_eq!(frame.as_rgb8().expect("rgb").get_pixel(1, 0), &Rgb([9, 8, 7]));

    let gray_alpha = DynamicImage::ImageLumaA8(GrayAlphaImage::from_pixel(2, 1, LumaA([50, 3])));
    let frame = read_back(gray_alpha, &ReadOptions::default());
    assert_eq!(frame.as_luma8().expect("gray").as_raw(), &vec![50, 50]);
}

#[test]
fn color_request_overrides_stored_color() {
    let rgb = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(1, 1, Rgb([255, 255, 255])));
    let gray = read_back(rgb, &ReadOptions::new().with_color(ColorRequest::Gray));
    assert_eq!(gray.as_luma8().expect("gray").as_raw(), &vec![255]);

    let luma = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(1, 1, image::Luma([40])));
    let color = read_back(luma, &ReadOptions::new().with_color(ColorRequest::Color));
    assert_eq!(color.as_rgb8().expect("rgb").get_pixel(0, 0), &Rgb([40, 40, 40]));
}
