//! Position index parsing and persistence tests.

use std::path::{Path, PathBuf};

use framestore::{ByteRange, PositionIndex, SequenceError, position_index::index_path};

fn parse(text: &str) -> Result<PositionIndex, SequenceError> {
    PositionIndex::parse(text, Path::new("clip.pngv.idx"))
}

#[test]
fn parses_frame_range_triples() {
    let index = parse("0 0 120\n1 120 245\n").expect("valid index");
    assert_eq!(index.first(), Some(0));
    assert_eq!(index.last(), Some(1));
    assert_eq!(index.len(), 2);
    assert_eq!(index.range(1), Some(ByteRange { start: 120, end: 245 }));
    assert_eq!(index.range(1).map(|range| range.len()), Some(125));
    assert_eq!(index.range(2), None);
}

#[test]
fn orders_frames_regardless_of_line_order() {
    let index = parse("7 300 400\n3 0 100\n\n5 100 300\n").expect("valid index");
    let frames: Vec<i64> = index.iter().map(|(frame, _)| frame).collect();
    assert_eq!(frames, vec![3, 5, 7]);
    assert_eq!(index.next_after(3), Some(5));
    assert_eq!(index.next_after(4), Some(5));
    assert_eq!(index.next_after(7), None);
    assert!(index.contains(5));
    assert!(!index.contains(4));
}

#[test]
fn empty_text_is_an_empty_index() {
    let index = parse("").expect("empty index");
    assert!(index.is_empty());
    assert_eq!(index.first(), None);
    assert_eq!(index.last(), None);
}

#[test]
fn rejects_malformed_lines() {
    let cases = [
        ("0 0 120\nx 120 245\n", 2),
        ("0 0\n", 1),
        ("0 0 120 7\n", 1),
        ("0 120 100\n", 1),
        ("0 -1 100\n", 1),
    ];
    for (text, expected_line) in cases {
        match parse(text) {
            Err(SequenceError::MalformedIndex { line, path, .. }) => {
                assert_eq!(line, expected_line, "{text:?}");
                assert_eq!(path, PathBuf::from("clip.pngv.idx"));
            }
            other => panic!("expected a malformed index error for {text:?}, got {other:?}"),
        }
    }
}

#[test]
fn index_file_sits_next_to_the_data_file() {
    assert_eq!(
        index_path(Path::new("shots/clip.pngv")),
        PathBuf::from("shots/clip.pngv.idx")
    );
}

#[test]
fn load_reads_from_disk() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = directory.path().join("clip.pngv.idx");
    std::fs::write(&path, "0 0 120\n1 120 245\n").expect("write index");

    let index = PositionIndex::load(&path).expect("load index");
    assert_eq!(index.len(), 2);

    let missing = PositionIndex::load(&directory.path().join("missing.idx"));
    assert!(matches!(missing, Err(SequenceError::IoError(_))));
}
