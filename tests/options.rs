//! Read and write option tests.

use std::str::FromStr;

use framestore::{ColorRequest, ReadOptions, WriteOptions};

#[test]
fn read_options_defaults() {
    let options = ReadOptions::default();
    assert_eq!(options.color(), ColorRequest::Auto);
    assert!(!options.native_depth());
}

#[test]
fn read_options_builder() {
    let options = ReadOptions::new()
        .with_color(ColorRequest::Gray)
        .with_native_depth(true)
        .with_ffmpeg_binary("/opt/ffmpeg/bin/ffmpeg");
    assert_eq!(options.color(), ColorRequest::Gray);
    assert!(options.native_depth());
}

#[test]
fn write_options_builder() {
    let defaults = WriteOptions::default();
    assert_eq!(defaults.frame_size(), None);
    assert!(defaults.color());

    let options = WriteOptions::new().with_frame_size(640, 480).with_color(false);
    assert_eq!(options.frame_size(), Some((640, 480)));
    assert!(!options.color());
}

#[test]
fn color_request_parses_names_and_numbers() {
    let cases = [
        ("auto", ColorRequest::Auto),
        ("-1", ColorRequest::Auto),
        ("color", ColorRequest::Color),
        ("RGB", ColorRequest::Color),
        ("1", ColorRequest::Color),
        ("gray", ColorRequest::Gray),
        ("Grey", ColorRequest::Gray),
        ("0", ColorRequest::Gray),
    ];
    for (text, expected) in cases {
        assert_eq!(ColorRequest::from_str(text), Ok(expected), "{text}");
    }
    assert!("sepia".parse::<ColorRequest>().is_err());
    assert_eq!(ColorRequest::Gray.to_string(), "gray");
}

#[test]
fn color_request_resolves_against_stored_color() {
    assert!(ColorRequest::Auto.wants_color(true));
    assert!(!ColorRequest::Auto.wants_color(false));
    assert!(ColorRequest::Color.wants_color(false));
    assert!(!ColorRequest::Gray.wants_color(true));
}
