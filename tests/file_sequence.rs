//! Numbered image file tests.

use std::path::Path;

use framestore::{
    FileSequenceReader, FileSequenceWriter, ReadOptions, SequenceError, SequenceReader,
    SequenceWriter, WriteOptions,
};
use image::{DynamicImage, Rgb, RgbImage};

fn frame(seed: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 4, Rgb([seed, 0, 255 - seed])))
}

fn pattern(directory: &Path, name: &str) -> String {
    directory.join(name).to_string_lossy().into_owned()
}

#[test]
fn writes_one_file_per_frame_and_reads_them_back() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = pattern(directory.path(), "frame_%02d.png");

    let mut writer = SequenceWriter::open(&path, &WriteOptions::default()).expect("open writer");
    assert_eq!(writer.kind(), "files");
    for seed in [0, 100, 200] {
        writer.write(&frame(seed), None).expect("write");
    }
    assert_eq!(writer.next(), 3);
    writer.close().expect("close");
    assert!(directory.path().join("frame_02.png").is_file());

    let mut reader = SequenceReader::open(&path, None, None, &ReadOptions::default()).expect("open reader");
    assert_eq!(reader.kind(), "files");
    assert_eq!((reader.first(), reader.last()), (0, 2));
    assert_eq!(reader.next(), None);
    assert_eq!(reader.size(), (5, 4));
    assert_eq!(reader.read(1).expect("read"), frame(100));
}

#[test]
fn last_stops_at_first_missing_file() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = pattern(directory.path(), "f%d.png");
    for number in [3, 4, 5, 7] {
        frame(number as u8)
            .save(directory.path().join(format!("f{number}.png")))
            .expect("save");
    }
    let options = ReadOptions::default();

    let mut reader = FileSequenceReader::open(&path, Some(3), None, &options).expect("open");
    assert_eq!((reader.first(), reader.last()), (3, 5));
    assert!(matches!(
        reader.read(6),
        Err(SequenceError::FrameNotFound { frame: 6 })
    ));
    assert_eq!(reader.read(7).expect("read"), frame(7));

    let reader = FileSequenceReader::open(&path, Some(3), Some(9), &options).expect("open");
    assert_eq!(reader.last(), 9);

    assert!(FileSequenceReader::open(&path, None, None, &options).is_err());
    assert!(FileSequenceReader::open(&path, Some(-1), None, &options).is_err());
}

#[test]
fn corrupt_files_fail_one_frame_only() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = pattern(directory.path(), "c%d.png");
    frame(1).save(directory.path().join("c0.png")).expect("save");
    std::fs::write(directory.path().join("c1.png"), b"not a png").expect("write");
    frame(3).save(directory.path().join("c2.png")).expect("save");

    let mut reader = FileSequenceReader::open(&path, None, None, &ReadOptions::default()).expect("open");
    assert_eq!(reader.last(), 2);
    assert!(matches!(reader.read(1), Err(SequenceError::Decode(_))));
    assert_eq!(reader.read(2).expect("read"), frame(3));
}

#[test]
fn writer_probe_leaves_no_file_behind() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = pattern(directory.path(), "g_%03d.png");
    let options = WriteOptions::new().with_frame_size(8, 6).with_color(false);

    let writer = FileSequenceWriter::open(&path, &options).expect("open");
    assert_eq!(writer.size(), Some((8, 6)));
    assert!(!directory.path().join("g_000.png").exists());
}

#[test]
fn writer_keeps_existing_files_during_probe() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let existing = directory.path().join("k_0.png");
    frame(9).save(&existing).expect("save");
    let path = pattern(directory.path(), "k_%d.png");

    FileSequenceWriter::open(&path, &WriteOptions::default()).expect("open");
    assert_eq!(image::open(&existing).expect("still there"), frame(9));
}

#[test]
fn writer_rejects_unusable_patterns() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let options = WriteOptions::default();

    let unknown = pattern(directory.path(), "x_%02d.unknown");
    assert!(FileSequenceWriter::open(&unknown, &options).is_err());
    assert!(matches!(
        SequenceWriter::open(&unknown, &options),
        Err(SequenceError::NoBackend { .. })
    ));

    let no_number = pattern(directory.path(), "still.png");
    assert!(FileSequenceWriter::open(&no_number, &options).is_err());

    let missing_directory = pattern(&directory.path().join("absent"), "x_%02d.png");
    assert!(FileSequenceWriter::open(&missing_directory, &options).is_err());
}
