//! Frame number remapping by a fixed offset.
//!
//! `video.mp4::100` opens `video.mp4` and shifts every frame number by 100,
//! so inner frame 0 is reported and addressed as frame 100.

use image::DynamicImage;

use crate::{config::ReadOptions, error::SequenceError, pattern, reader::SequenceReader};

/// Parse the trailing `::<integer>` of `path`.
///
/// Returns the stripped path and the offset, or `None` when the suffix is
/// absent, not an integer, or zero.
pub fn parse_offset(path: &str) -> Option<(&str, i64)> {
    let (base, suffix) = pattern::split_trailing_suffix(path);
    let offset: i64 = suffix?.trim().parse().ok()?;
    (offset != 0).then_some((base, offset))
}

/// A reader whose frame numbers are shifted by a fixed offset.
#[derive(Debug)]
pub struct OffsetReader {
    inner: Box<SequenceReader>,
    offset: i64,
}

impl OffsetReader {
    /// Open the inner reader through [`SequenceReader::open`].
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Open`] when `path` has no non-zero integer
    /// suffix, or the inner open error.
    pub fn open(
        path: &str,
        first: Option<i64>,
        last: Option<i64>,
        options: &ReadOptions,
    ) -> Result<Self, SequenceError> {
        let Some((inner_path, offset)) = parse_offset(path) else {
            return Err(SequenceError::open(path, "no frame offset suffix"));
        };
        let shift = |bound: Option<i64>| -> Result<Option<i64>, SequenceError> {
            bound
                .map(|frame| {
                    frame.checked_sub(offset).ok_or_else(|| {
                        SequenceError::open(path, format!("frame {frame} shifted by {offset} overflows"))
                    })
                })
                .transpose()
        };
        let inner = SequenceReader::open(inner_path, shift(first)?, shift(last)?, options)?;
        log::debug!("Shifting frames of {inner_path} by {offset}");
        Ok(Self {
            inner: Box::new(inner),
            offset,
        })
    }

    /// Read frame `frame` of the shifted sequence.
    pub fn read(&mut self, frame: i64) -> Result<DynamicImage, SequenceError> {
        let inner_frame = frame
            .checked_sub(self.offset)
            .ok_or(SequenceError::FrameNotFound { frame })?;
        self.inner
            .read(inner_frame)
            .map_err(|error| match error {
                SequenceError::FrameNotFound { .. } => SequenceError::FrameNotFound { frame },
                other => other,
            })
    }

    pub fn first(&self) -> i64 {
        self.inner.first().saturating_add(self.offset)
    }

    pub fn last(&self) -> i64 {
        self.inner.last().saturating_add(self.offset)
    }

    pub fn next(&self) -> Option<i64> {
        self.inner.next().map(|frame| frame.saturating_add(self.offset))
    }

    pub fn size(&self) -> (u32, u32) {
        self.inner.size()
    }

    /// The offset added to inner frame numbers.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// The wrapped reader.
    pub fn inner(&self) -> &SequenceReader {
        &self.inner
    }
}
