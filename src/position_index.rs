//! Frame number to byte range index for indexed containers.
//!
//! An indexed container stores frames back to back in one data file. The
//! companion index file (`<data>.idx`) records one line per written frame:
//!
//! ```text
//! <frame> <start> <end>
//! ```
//!
//! where `start..end` is the half-open byte range of the frame's encoded unit.
//! [`PositionIndex`] is the in-memory form of that file, ordered by frame
//! number.

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    ops::Bound,
    path::{Path, PathBuf},
};

use crate::error::SequenceError;

/// Half-open byte range of one encoded frame inside the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Offset of the first byte of the unit.
    pub start: u64,
    /// Offset one past the last byte of the unit.
    pub end: u64,
}

impl ByteRange {
    /// Length of the unit in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Whether the unit is empty.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Ordered mapping from frame number to [`ByteRange`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionIndex {
    ranges: BTreeMap<i64, ByteRange>,
}

/// Path of the index file that accompanies a container data file.
pub fn index_path(data_path: &Path) -> PathBuf {
    let mut name = data_path.as_os_str().to_owned();
    name.push(".idx");
    PathBuf::from(name)
}

impl PositionIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an index file.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::IoError`] if the file cannot be read and
    /// [`SequenceError::MalformedIndex`] if any line is not a
    /// `frame start end` triple with `start <= end`.
    pub fn load(path: &Path) -> Result<Self, SequenceError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Parse index text. `path` is only used for error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, SequenceError> {
        let malformed = |line: usize, reason: String| SequenceError::MalformedIndex {
            path: path.to_path_buf(),
            line,
            reason,
        };

        let mut ranges = BTreeMap::new();
        for (number, line) in text.lines().enumerate() {
            let mut fields = line.split_whitespace();
            let Some(first_field) = fields.next() else {
                continue;
            };
            let frame: i64 = first_field
                .parse()
                .map_err(|_| malformed(number + 1, format!("bad frame number {first_field:?}")))?;
            let mut offset = |name: &str| -> Result<u64, SequenceError> {
                let field = fields
                    .next()
                    .ok_or_else(|| malformed(number + 1, format!("missing {name} offset")))?;
                field
                    .parse()
                    .map_err(|_| malformed(number + 1, format!("bad {name} offset {field:?}")))
            };
            let start = offset("start")?;
            let end = offset("end")?;
            if fields.next().is_some() {
                return Err(malformed(number + 1, "trailing fields".to_string()));
            }
            if end < start {
                return Err(malformed(number + 1, format!("range {start}..{end} is reversed")));
            }
            ranges.insert(frame, ByteRange { start, end });
        }
        Ok(Self { ranges })
    }

    /// Smallest frame number, or `None` when empty.
    pub fn first(&self) -> Option<i64> {
        self.ranges.keys().next().copied()
    }

    /// Largest frame number, or `None` when empty.
    pub fn last(&self) -> Option<i64> {
        self.ranges.keys().next_back().copied()
    }

    /// Number of indexed frames.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether no frame is indexed.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Byte range of `frame`, if indexed.
    pub fn range(&self, frame: i64) -> Option<ByteRange> {
        self.ranges.get(&frame).copied()
    }

    /// Whether `frame` is indexed.
    pub fn contains(&self, frame: i64) -> bool {
        self.ranges.contains_key(&frame)
    }

    /// The next indexed frame strictly after `frame`.
    pub fn next_after(&self, frame: i64) -> Option<i64> {
        self.ranges
            .range((Bound::Excluded(frame), Bound::Unbounded))
            .next()
            .map(|(frame, _)| *frame)
    }

    /// Iterate `(frame, range)` pairs in frame order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, ByteRange)> + '_ {
        self.ranges.iter().map(|(frame, range)| (*frame, *range))
    }

    /// Record a frame in memory.
    pub(crate) fn insert(&mut self, frame: i64, range: ByteRange) {
        self.ranges.insert(frame, range);
    }
}

/// Append one `frame start end` line to an index file and flush it to disk.
pub(crate) fn append_line(path: &Path, frame: i64, range: ByteRange) -> Result<(), SequenceError> {
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{frame} {} {}", range.start, range.end)?;
    file.sync_data()?;
    Ok(())
}
