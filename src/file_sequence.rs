//! Sequences stored as one image file per frame.
//!
//! The path is a printf-style pattern (`shots/frame_%04d.png`); frame `n`
//! lives in the file the pattern formats for `n`.

use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{DynamicImage, ImageError, ImageFormat};

use crate::{
    config::{ReadOptions, WriteOptions},
    conversion,
    error::SequenceError,
    pattern::NamePattern,
};

/// Reads frames from numbered image files.
#[derive(Debug)]
pub struct FileSequenceReader {
    pattern: NamePattern,
    first: i64,
    last: i64,
    options: ReadOptions,
    size: (u32, u32),
}

impl FileSequenceReader {
    /// Open a file pattern.
    ///
    /// `first` defaults to 0 and must not be negative. When `last` is not
    /// given it is the end of the run of existing files starting at `first`.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Open`] if the path is not a pattern, `first`
    /// is negative, or the first file cannot be decoded.
    pub fn open(
        path: &str,
        first: Option<i64>,
        last: Option<i64>,
        options: &ReadOptions,
    ) -> Result<Self, SequenceError> {
        let pattern = NamePattern::parse(path)
            .map_err(|error| SequenceError::open(path, error.to_string()))?;
        let first = first.unwrap_or(0);
        if first < 0 {
            return Err(SequenceError::open(path, format!("negative first frame {first}")));
        }

        let first_path = pattern.format(first);
        let frame = image::open(&first_path)
            .map_err(|error| SequenceError::open(&first_path, error.to_string()))?;

        let last = match last {
            Some(last) => last,
            None => {
                let mut last = first;
                while Path::new(&pattern.format(last + 1)).is_file() {
                    last += 1;
                }
                last
            }
        };
        log::info!("Opened file sequence {pattern} (frames {first}..={last})");

        Ok(Self {
            pattern,
            first,
            last,
            options: options.clone(),
            size: (frame.width(), frame.height()),
        })
    }

    /// Decode the file for `frame`.
    pub fn read(&mut self, frame: i64) -> Result<DynamicImage, SequenceError> {
        let path = self.pattern.format(frame);
        let image = image::open(&path).map_err(|error| match error {
            ImageError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
                SequenceError::FrameNotFound { frame }
            }
            other => SequenceError::Decode(format!("{path}: {other}")),
        })?;
        Ok(conversion::conform_frame(image, &self.options))
    }

    pub fn first(&self) -> i64 {
        self.first
    }

    pub fn last(&self) -> i64 {
        self.last
    }

    /// Files carry no cursor; always `None`.
    pub fn next(&self) -> Option<i64> {
        None
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn pattern(&self) -> &NamePattern {
        &self.pattern
    }
}

/// Writes one image file per frame.
#[derive(Debug)]
pub struct FileSequenceWriter {
    pattern: NamePattern,
    position: i64,
    size: Option<(u32, u32)>,
}

impl FileSequenceWriter {
    /// Open a file pattern for writing.
    ///
    /// The pattern is validated by encoding a blank frame of the configured
    /// size in the format of the first name, and by creating and removing
    /// that file when it does not exist yet.
    pub fn open(path: &str, options: &WriteOptions) -> Result<Self, SequenceError> {
        let pattern = NamePattern::parse(path)
            .map_err(|error| SequenceError::open(path, error.to_string()))?;

        let probe = PathBuf::from(pattern.format(0));
        let format = ImageFormat::from_path(&probe)
            .map_err(|error| SequenceError::open(&probe, error.to_string()))?;
        let (width, height) = options.frame_size().unwrap_or((1, 1));
        let blank = if options.color() {
            DynamicImage::new_rgb8(width, height)
        } else {
            DynamicImage::new_luma8(width, height)
        };
        let mut encoded = Vec::new();
        blank
            .write_to(&mut Cursor::new(&mut encoded), format)
            .map_err(|error| SequenceError::open(&probe, error.to_string()))?;
        if !probe.exists() {
            fs::write(&probe, &encoded).map_err(|error| SequenceError::open(&probe, error.to_string()))?;
            fs::remove_file(&probe)?;
        }
        log::debug!("Writing file sequence {pattern}");

        Ok(Self {
            pattern,
            position: 0,
            size: options.frame_size(),
        })
    }

    /// Save `frame` under `position`, or under the next counter value.
    pub fn write(&mut self, frame: &DynamicImage, position: Option<i64>) -> Result<(), SequenceError> {
        if let Some(position) = position {
            self.position = position;
        }
        let path = self.pattern.format(self.position);
        self.position += 1;
        self.size = Some((frame.width(), frame.height()));
        frame.save(&path)?;
        Ok(())
    }

    pub fn next(&self) -> i64 {
        self.position
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }
}
