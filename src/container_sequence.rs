//! Sequence backends over indexed PNG containers (`*.pngv`).

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::{
    config::{ReadOptions, WriteOptions},
    container::{ContainerFile, ContainerWriter},
    error::SequenceError,
};

/// File extension of container data files.
pub const CONTAINER_EXTENSION: &str = "pngv";

fn is_container_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension == CONTAINER_EXTENSION)
}

/// Reads frames from an indexed container.
#[derive(Debug)]
pub struct ContainerReader {
    path: PathBuf,
    container: ContainerFile,
    first: i64,
    last: i64,
    position: i64,
    size: (u32, u32),
}

impl ContainerReader {
    /// Open a `*.pngv` container.
    ///
    /// `first` defaults to the smallest indexed frame; `last` is the largest
    /// indexed frame, lowered to a positive requested `last`. The first frame
    /// is decoded to prove the container is readable.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Open`] if the path is not a container, the
    /// index is empty, or the first frame cannot be decoded.
    pub fn open(
        path: &str,
        first: Option<i64>,
        last: Option<i64>,
        options: &ReadOptions,
    ) -> Result<Self, SequenceError> {
        let path = PathBuf::from(path);
        if !is_container_path(&path) {
            return Err(SequenceError::open(&path, "not a .pngv container"));
        }

        let mut container = ContainerFile::open(&path, options)?;
        let (Some(stored_first), Some(stored_last)) = (container.first(), container.last()) else {
            return Err(SequenceError::open(&path, "container index is empty"));
        };

        let first = match first {
            Some(requested) if requested > 0 => requested,
            _ => stored_first,
        };
        let last = match last {
            Some(requested) if requested > 0 => {
                if requested > stored_last {
                    log::warn!(
                        "Requested last frame {requested} is past the end of {} (last is {stored_last})",
                        path.display()
                    );
                }
                requested.min(stored_last)
            }
            _ => stored_last,
        };

        container.set_next(first);
        let frame = container.read_next().map_err(|error| {
            SequenceError::open(&path, format!("could not read first frame {first}: {error}"))
        })?;
        container.set_next(first);
        log::info!(
            "Opened container {} (frames {first}..={last}, {} indexed)",
            path.display(),
            container.len()
        );

        Ok(Self {
            path,
            container,
            first,
            last,
            position: first,
            size: (frame.width(), frame.height()),
        })
    }

    /// Read `frame`, moving the container cursor only when it is elsewhere.
    pub fn read(&mut self, frame: i64) -> Result<DynamicImage, SequenceError> {
        if self.container.next() != Some(frame) {
            self.container.set_next(frame);
        }
        self.position = frame;
        self.container.read_next().map_err(|error| match error {
            SequenceError::FrameNotFound { .. } => SequenceError::FrameNotFound { frame },
            other => other,
        })
    }

    /// First frame of the sequence.
    pub fn first(&self) -> i64 {
        self.first
    }

    /// Last frame of the sequence.
    pub fn last(&self) -> i64 {
        self.last
    }

    /// Frame the container cursor points at.
    pub fn next(&self) -> Option<i64> {
        self.container.next()
    }

    /// Last frame passed to [`read`](ContainerReader::read).
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Size of the first frame.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Path of the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying container.
    pub fn container(&self) -> &ContainerFile {
        &self.container
    }
}

/// Writes frames to a new indexed container.
#[derive(Debug)]
pub struct ContainerSequenceWriter {
    writer: ContainerWriter,
    size: Option<(u32, u32)>,
}

impl ContainerSequenceWriter {
    /// Create a `*.pngv` container, truncating any existing one.
    pub fn open(path: &str, options: &WriteOptions) -> Result<Self, SequenceError> {
        let path = Path::new(path);
        if !is_container_path(path) {
            return Err(SequenceError::open(path, "not a .pngv container"));
        }
        let writer = ContainerWriter::create(path)?;
        Ok(Self {
            writer,
            size: options.frame_size,
        })
    }

    /// Append `frame` under `position`, or under the next counter value.
    pub fn write(&mut self, frame: &DynamicImage, position: Option<i64>) -> Result<(), SequenceError> {
        if let Some(position) = position {
            self.writer.set_position(position);
        }
        let frame_number = self.writer.position();
        self.size = Some((frame.width(), frame.height()));
        match self.writer.write(frame) {
            Ok(_) => Ok(()),
            Err(error) => {
                // A failed frame still consumes its number.
                self.writer.set_position(frame_number + 1);
                Err(error)
            }
        }
    }

    /// Frame number of the next write.
    pub fn next(&self) -> i64 {
        self.writer.position()
    }

    /// Size of the most recently written frame, or the configured size.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }
}
