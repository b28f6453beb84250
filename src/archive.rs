//! Random access to image sequences stored in tar archives.
//!
//! A tar stream has no table of contents, so [`ArchiveReader`] scans the
//! whole archive once at open time and records where every entry header
//! starts (the [`ArchiveIndex`]). Reads then resolve a logical frame number
//! to an archive ordinal and position the stream with
//! [`plan_seek`](crate::seek::plan_seek):
//!
//! - uncompressed `.tar` files jump straight to the recorded offset;
//! - compressed archives scan forward from the current entry, restarting
//!   from the beginning when the target is behind.
//!
//! Entry names can be tied to frame numbers with a printf-style pattern
//! appended to the path: `frames.tar.gz::frame_%04d.png`.

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use image::DynamicImage;

use crate::{
    archive_stream::{ArchiveStream, Compression},
    config::ReadOptions,
    conversion,
    error::SequenceError,
    pattern::{self, NamePattern},
    seek::{self, SeekAction},
};

/// Entry offsets and names collected by one forward scan of an archive.
#[derive(Debug, Clone, Default)]
pub struct ArchiveIndex {
    offsets: Vec<u64>,
    names: HashMap<String, usize>,
}

impl ArchiveIndex {
    /// Scan `stream` from its current position to the end of the archive.
    ///
    /// A corrupt entry ends the scan; the entries before it stay indexed.
    pub fn scan(stream: &mut ArchiveStream) -> Result<Self, SequenceError> {
        let mut index = Self::default();
        loop {
            match stream.skip_entry() {
                Ok(Some(header)) => index.push(header.name, header.offset),
                Ok(None) => break,
                Err(error) if index.is_empty() => return Err(error),
                Err(error) => {
                    log::warn!(
                        "Archive is truncated or corrupt after {} entries: {error}",
                        index.len()
                    );
                    break;
                }
            }
        }
        Ok(index)
    }

    fn push(&mut self, name: String, offset: u64) {
        let ordinal = self.offsets.len();
        self.offsets.push(offset);
        self.names.insert(name, ordinal);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Byte offset of the header of entry `ordinal`.
    pub fn offset(&self, ordinal: usize) -> Option<u64> {
        self.offsets.get(ordinal).copied()
    }

    /// Ordinal of the entry named `name`.
    pub fn ordinal_of(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// Map frame numbers `first..=last` to ordinals through `pattern`.
    ///
    /// Stops at the first frame whose name is missing; the returned last
    /// frame is the end of the contiguous run (`first - 1` when even `first`
    /// is missing).
    pub fn map_frames(&self, pattern: &NamePattern, first: i64, last: i64) -> FrameMap {
        let mut ordinals = BTreeMap::new();
        let mut mapped_last = last;
        for frame in first..=last {
            match self.ordinal_of(&pattern.format(frame)) {
                Some(ordinal) => {
                    ordinals.insert(frame, ordinal);
                }
                None => {
                    mapped_last = frame - 1;
                    break;
                }
            }
        }
        FrameMap {
            ordinals,
            last: mapped_last,
        }
    }
}

/// Frame numbers resolved to archive ordinals through a name pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameMap {
    ordinals: BTreeMap<i64, usize>,
    last: i64,
}

impl FrameMap {
    /// Ordinal of `frame`, if mapped.
    pub fn ordinal(&self, frame: i64) -> Option<usize> {
        self.ordinals.get(&frame).copied()
    }

    /// Last frame of the contiguous mapped run.
    pub fn last(&self) -> i64 {
        self.last
    }

    /// Number of mapped frames.
    pub fn len(&self) -> usize {
        self.ordinals.len()
    }

    /// Whether no frame is mapped.
    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }
}

/// Reads frames from a tar or tar.gz archive.
#[derive(Debug)]
pub struct ArchiveReader {
    path: PathBuf,
    stream: ArchiveStream,
    index: ArchiveIndex,
    pattern: Option<NamePattern>,
    frames: Option<FrameMap>,
    seekable: bool,
    first: i64,
    last: i64,
    /// Next logical frame.
    position: i64,
    /// Ordinal of the entry the stream will yield next.
    ordinal: usize,
    options: ReadOptions,
    size: (u32, u32),
}

impl ArchiveReader {
    /// Open an archive, optionally followed by `::pattern`.
    ///
    /// Scans the archive once to build the [`ArchiveIndex`], derives the frame
    /// range, and reads the first frame to prove the archive is usable.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Open`] if the file is not a readable archive,
    /// the pattern is invalid, or the first frame cannot be read.
    pub fn open(
        path: &str,
        first: Option<i64>,
        last: Option<i64>,
        options: &ReadOptions,
    ) -> Result<Self, SequenceError> {
        let (archive_path, pattern_text) = pattern::split_suffix(path);
        let archive_path = PathBuf::from(archive_path);
        let pattern = pattern_text.map(NamePattern::parse).transpose()?;

        let mut stream = ArchiveStream::open(&archive_path)?;
        let seekable = stream.compression() == Compression::None && has_tar_extension(&archive_path);

        let index = ArchiveIndex::scan(&mut stream)
            .map_err(|error| SequenceError::open(&archive_path, error.to_string()))?;
        stream.rewind()?;
        log::debug!(
            "Indexed {} entries in {} (seekable: {seekable})",
            index.len(),
            archive_path.display()
        );

        let first = first.unwrap_or(0).max(0);
        let mut last = last.unwrap_or(first + index.len() as i64 - 1);
        let frames = pattern.as_ref().map(|pattern| {
            let frames = index.map_frames(pattern, first, last);
            last = frames.last();
            frames
        });

        let mut reader = Self {
            path: archive_path,
            stream,
            index,
            pattern,
            frames,
            seekable,
            first,
            last,
            position: 0,
            ordinal: 0,
            options: options.clone(),
            size: (0, 0),
        };

        let frame = reader.read(first).map_err(|error| {
            SequenceError::open(&reader.path, format!("could not read first frame {first}: {error}"))
        })?;
        reader.size = (frame.width(), frame.height());
        log::info!(
            "Opened archive {} (frames {}..={})",
            reader.path.display(),
            reader.first,
            reader.last
        );
        Ok(reader)
    }

    /// Resolve a logical frame to an archive ordinal.
    fn resolve(&self, frame: i64) -> Option<usize> {
        match &self.frames {
            Some(frames) => frames.ordinal(frame),
            None => usize::try_from(frame)
                .ok()
                .filter(|ordinal| *ordinal < self.index.len()),
        }
    }

    /// Position the stream so that the next entry it yields is `ordinal`.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Seek`] if the archive ends before `ordinal`.
    pub fn seek(&mut self, ordinal: usize) -> Result<(), SequenceError> {
        match seek::plan_seek(self.seekable, ordinal, self.ordinal) {
            SeekAction::Stay => return Ok(()),
            SeekAction::Jump => {
                let offset = self.index.offset(ordinal).ok_or(SequenceError::Seek {
                    target: ordinal,
                    reached: self.index.len(),
                })?;
                self.stream.reopen_at(offset)?;
                self.ordinal = ordinal;
            }
            SeekAction::Rewind { .. } => {
                self.stream.rewind()?;
                self.ordinal = 0;
            }
            SeekAction::Forward { .. } => {}
        }

        while self.ordinal < ordinal {
            match self.stream.skip_entry()? {
                Some(_) => self.ordinal += 1,
                None => break,
            }
        }

        if self.ordinal != ordinal {
            log::warn!("Cannot seek to entry {ordinal} of {}", self.path.display());
            return Err(SequenceError::Seek {
                target: ordinal,
                reached: self.ordinal,
            });
        }
        Ok(())
    }

    /// Read logical frame `frame`.
    ///
    /// # Errors
    ///
    /// - [`SequenceError::FrameNotFound`] if the frame is not in the archive.
    /// - [`SequenceError::Seek`] if the entry cannot be reached.
    /// - [`SequenceError::Decode`] if the entry cannot be decoded.
    pub fn read(&mut self, frame: i64) -> Result<DynamicImage, SequenceError> {
        let Some(ordinal) = self.resolve(frame) else {
            log::debug!("Bad frame position {frame} for {}", self.path.display());
            return Err(SequenceError::FrameNotFound { frame });
        };
        self.seek(ordinal)?;

        let entry = match self.stream.read_entry() {
            Ok(entry) => entry,
            Err(error) => {
                // The stream stopped mid-entry; start over on the next read.
                self.stream.rewind()?;
                self.ordinal = 0;
                return Err(error);
            }
        };
        let Some((header, body)) = entry else {
            return Err(SequenceError::Decode(format!(
                "archive ended before entry {ordinal}"
            )));
        };
        self.position = frame + 1;
        self.ordinal = ordinal + 1;

        conversion::decode_frame(&body, &self.options).map_err(|error| {
            log::debug!("Could not decode entry {:?}: {error}", header.name);
            error
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

    /// Frame after the most recently read one.
    pub fn next(&self) -> Option<i64> {
        Some(self.position)
    }

    /// Size of the first frame.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Whether the stream supports direct jumps to indexed offsets.
    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    /// Ordinal of the entry the stream yields next.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Current byte offset in the (decompressed) tar stream.
    pub fn stream_position(&self) -> u64 {
        self.stream.position()
    }

    /// The index built at open time.
    pub fn index(&self) -> &ArchiveIndex {
        &self.index
    }

    /// The entry name pattern, if one was given.
    pub fn pattern(&self) -> Option<&NamePattern> {
        self.pattern.as_ref()
    }

    /// Path of the archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub(crate) fn has_tar_extension(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == "tar")
}

pub(crate) fn is_archive_path(path: &Path) -> bool {
    let name = path.to_string_lossy();
    name.ends_with(".tar") || name.ends_with(".tar.gz") || name.ends_with(".tgz")
}
