//! Error type tests.

use std::{io, path::PathBuf};

use framestore::SequenceError;

#[test]
fn messages_carry_context() {
    let error = SequenceError::Open {
        path: PathBuf::from("clip.pngv"),
        reason: "container index is empty".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("clip.pngv"));
    assert!(message.contains("container index is empty"));

    let error = SequenceError::Seek { target: 7, reached: 3 };
    let message = error.to_string();
    assert!(message.contains('7') && message.contains('3'));

    let error = SequenceError::MissingPattern {
        path: PathBuf::from("out.tar"),
    };
    assert!(error.to_string().contains("out.tar::frame_%04d.png"));

    let error = SequenceError::MalformedIndex {
        path: PathBuf::from("clip.pngv.idx"),
        line: 4,
        reason: "missing end offset".to_string(),
    };
    assert!(error.to_string().contains("line 4"));

    assert!(SequenceError::FrameNotFound { frame: -2 }.to_string().contains("-2"));
    assert!(SequenceError::UnsupportedBitDepth(12).to_string().contains("12"));
    assert!(SequenceError::UnsupportedChannelCount(2).to_string().contains('2'));
}

#[test]
fn io_errors_convert() {
    let error: SequenceError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(error, SequenceError::IoError(_)));
    assert!(error.to_string().contains("gone"));
}

#[test]
fn errors_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync + std::error::Error>() {}
    assert_send_sync::<SequenceError>();
}
