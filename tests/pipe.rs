//! External `ffmpeg` video reader tests.
//!
//! Skipped when no `ffmpeg` executable is available.

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use framestore::{PipeReader, ReadOptions, SequenceError, SequenceReader};

/// Render a 5 frame test clip with ffmpeg, or `None` if that is not possible.
fn make_clip(directory: &Path) -> Option<PathBuf> {
    let clip = directory.join("clip.avi");
    let status = Command::new("ffmpeg")
        .args([
            "-nostdin", "-v", "quiet", "-y", "-f", "lavfi", "-i",
            "testsrc=size=32x24:rate=10", "-frames:v", "5", "-c:v", "rawvideo",
            "-pix_fmt", "bgr24",
        ])
        .arg(&clip)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .ok()?;
    (status.success() && clip.is_file()).then_some(clip)
}

#[test]
fn reads_frames_from_a_video() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let Some(clip) = make_clip(directory.path()) else {
        eprintln!("Skipping: ffmpeg not available");
        return;
    };
    let path = clip.to_string_lossy().into_owned();
    let options = ReadOptions::default();

    let mut reader = SequenceReader::open(&path, None, None, &options).expect("open");
    assert_eq!(reader.kind(), "pipe");
    assert_eq!((reader.first(), reader.last()), (0, 4));
    assert_eq!(reader.size(), (32, 24));

    let later = reader.read(3).expect("read 3");
    assert_eq!(reader.next(), Some(4));
    let earlier = reader.read(1).expect("read 1 after restart");
    assert_eq!(reader.next(), Some(2));
    assert_eq!((later.width(), later.height()), (32, 24));

    let mut fresh = PipeReader::open(&path, None, None, &options).expect("open");
    assert_eq!(fresh.read(1).expect("read 1"), earlier);
    assert!(matches!(fresh.read(-2), Err(SequenceError::FrameNotFound { frame: -2 })));
    assert!(matches!(fresh.read(9), Err(SequenceError::Seek { .. })));
    assert_eq!(fresh.read(0).expect("read after failure").width(), 32);
}

#[test]
fn positive_last_lowers_the_range() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let Some(clip) = make_clip(directory.path()) else {
        eprintln!("Skipping: ffmpeg not available");
        return;
    };
    let path = clip.to_string_lossy().into_owned();

    let reader = PipeReader::open(&path, Some(-3), Some(2), &ReadOptions::default()).expect("open");
    assert_eq!((reader.first(), reader.last()), (0, 2));
    let reader = PipeReader::open(&path, None, Some(50), &ReadOptions::default()).expect("open");
    assert_eq!(reader.last(), 4);
}

#[test]
fn missing_binary_fails_to_open() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = directory.path().join("clip.avi");
    std::fs::write(&input, b"RIFF").expect("write");
    let options = ReadOptions::new().with_ffmpeg_binary(directory.path().join("no-such-ffmpeg"));

    assert!(matches!(
        PipeReader::open(&input.to_string_lossy(), None, None, &options),
        Err(SequenceError::Open { .. })
    ));
}

#[cfg(feature = "native-video")]
#[test]
fn native_reader_agrees_with_pipe() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let Some(clip) = make_clip(directory.path()) else {
        eprintln!("Skipping: ffmpeg not available");
        return;
    };
    let path = clip.to_string_lossy().into_owned();
    let options = ReadOptions::default();

    let mut native = framestore::NativeReader::open(&path, None, None, &options).expect("open");
    assert_eq!((native.first(), native.last()), (0, 4));
    assert_eq!(native.size(), (32, 24));
    let third = native.read(2).expect("read");
    let first = native.read(0).expect("read after restart");
    assert_eq!((third.width(), first.height()), (32, 24));
}
