//! Frame offset wrapper tests.

use framestore::{OffsetReader, ReadOptions, SequenceError, SequenceReader, SequenceWriter, WriteOptions};
use image::{DynamicImage, Luma, GrayImage};

fn frame(value: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([value])))
}

fn write_archive(directory: &std::path::Path) -> String {
    let path = format!("{}::img_%03d.png", directory.join("seq.tar").display());
    let mut writer = SequenceWriter::open(&path, &WriteOptions::default()).expect("open writer");
    for value in [10, 20, 30] {
        writer.write(&frame(value), None).expect("write");
    }
    writer.close().expect("close");
    path
}

#[test]
fn shifts_frame_numbers_both_ways() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = format!("{}::100", write_archive(directory.path()));

    let mut reader = SequenceReader::open(&path, None, None, &ReadOptions::default()).expect("open");
    assert_eq!(reader.kind(), "offset");
    assert_eq!((reader.first(), reader.last()), (100, 102));
    assert_eq!(reader.next(), Some(101));
    assert_eq!(reader.size(), (3, 2));

    assert_eq!(reader.read(102).expect("read"), frame(30));
    assert_eq!(reader.next(), Some(103));
    assert!(matches!(
        reader.read(0),
        Err(SequenceError::FrameNotFound { frame: 0 })
    ));
}

#[test]
fn requested_bounds_are_shifted_before_opening() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = format!("{}::10", write_archive(directory.path()));

    let mut reader = OffsetReader::open(&path, Some(11), None, &ReadOptions::default()).expect("open");
    assert_eq!(reader.offset(), 10);
    assert_eq!(reader.inner().kind(), "archive");
    assert_eq!((reader.first(), reader.last()), (11, 12));
    assert_eq!(reader.read(11).expect("read"), frame(20));
}

#[test]
fn negative_offsets_are_allowed() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = format!("{}::-1", write_archive(directory.path()));

    let mut reader = SequenceReader::open(&path, None, None, &ReadOptions::default()).expect("open");
    assert_eq!((reader.first(), reader.last()), (-1, 1));
    assert_eq!(reader.read(-1).expect("read"), frame(10));
}

#[test]
fn declines_missing_or_zero_offsets() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let archive = write_archive(directory.path());
    let options = ReadOptions::default();

    assert!(OffsetReader::open(&archive, None, None, &options).is_err());
    let zero = format!("{archive}::0");
    assert!(OffsetReader::open(&zero, None, None, &options).is_err());
    assert!(matches!(
        SequenceReader::open(&zero, None, None, &options),
        Err(SequenceError::NoBackend { .. })
    ));
}

#[test]
fn offsets_near_the_integer_limits_do_not_overflow() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let base = write_archive(directory.path());
    let options = ReadOptions::default();

    let lowest = format!("{base}::{}", i64::MIN);
    assert!(matches!(
        OffsetReader::open(&lowest, Some(0), None, &options),
        Err(SequenceError::Open { .. })
    ));

    let highest = format!("{base}::{}", i64::MAX);
    let mut reader = OffsetReader::open(&highest, None, None, &options).expect("open");
    assert_eq!(reader.first(), i64::MAX);
    assert_eq!(reader.last(), i64::MAX);
    assert!(matches!(
        reader.read(-5),
        Err(SequenceError::FrameNotFound { frame: -5 })
    ));
    assert_eq!(reader.read(i64::MAX).expect("read first frame"), frame(10));
}
