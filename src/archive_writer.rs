//! Writing image sequences into tar archives.

use std::{
    fs::File,
    io::{BufWriter, Cursor, Write},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use flate2::{Compression as GzLevel, write::GzEncoder};
use image::{DynamicImage, ImageFormat};
use tar::{Builder, EntryType, Header};

use crate::{
    archive,
    config::WriteOptions,
    error::SequenceError,
    pattern::{self, NamePattern},
};

/// Permission bits of every written entry.
const ENTRY_MODE: u32 = 0o644;

/// Output stream under the tar builder.
enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Sink::Plain(writer) => writer.write(buf),
            Sink::Gzip(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Sink::Plain(writer) => writer.flush(),
            Sink::Gzip(writer) => writer.flush(),
        }
    }
}

impl Sink {
    fn finish(self) -> std::io::Result<()> {
        let mut file = match self {
            Sink::Plain(writer) => writer,
            Sink::Gzip(encoder) => encoder.finish()?,
        };
        file.flush()
    }
}

/// Appends frames as entries of a new `.tar`, `.tar.gz` or `.tgz` archive.
///
/// Entry names come from the pattern after `::`; each frame is encoded in
/// the format implied by the entry name's extension.
pub struct ArchiveWriter {
    path: PathBuf,
    pattern: NamePattern,
    builder: Option<Builder<Sink>>,
    position: i64,
    size: Option<(u32, u32)>,
}

impl std::fmt::Debug for ArchiveWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveWriter")
            .field("path", &self.path)
            .field("pattern", &self.pattern)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl ArchiveWriter {
    /// Create `archive::pattern`, truncating an existing archive.
    ///
    /// # Errors
    ///
    /// - [`SequenceError::Open`] if the path is not a tar archive name.
    /// - [`SequenceError::MissingPattern`] if no `::pattern` is given.
    /// - [`SequenceError::InvalidPattern`] if the pattern cannot be parsed.
    pub fn open(path: &str, options: &WriteOptions) -> Result<Self, SequenceError> {
        let (archive_path, pattern_text) = pattern::split_suffix(path);
        let archive_path = PathBuf::from(archive_path);
        if !archive::is_archive_path(&archive_path) {
            return Err(SequenceError::open(&archive_path, "not a .tar, .tar.gz or .tgz archive"));
        }
        let Some(pattern_text) = pattern_text else {
            log::warn!(
                "Archive {} opened for writing without an entry name pattern",
                archive_path.display()
            );
            return Err(SequenceError::MissingPattern { path: archive_path });
        };
        let pattern = NamePattern::parse(pattern_text)?;

        let file = BufWriter::new(File::create(&archive_path)?);
        let name = archive_path.to_string_lossy();
        let sink = if name.ends_with(".tar") {
            Sink::Plain(file)
        } else {
            Sink::Gzip(GzEncoder::new(file, GzLevel::default()))
        };
        log::debug!("Writing archive {} with entries {pattern}", archive_path.display());

        Ok(Self {
            path: archive_path,
            pattern,
            builder: Some(Builder::new(sink)),
            position: 0,
            size: options.frame_size(),
        })
    }

    /// Append `frame` under `position`, or under the next counter value.
    ///
    /// The counter advances even when encoding fails.
    pub fn write(&mut self, frame: &DynamicImage, position: Option<i64>) -> Result<(), SequenceError> {
        if let Some(position) = position {
            self.position = position;
        }
        let name = self.pattern.format(self.position);
        self.position += 1;
        self.size = Some((frame.width(), frame.height()));

        let format = ImageFormat::from_path(&name)?;
        let mut data = Vec::new();
        frame.write_to(&mut Cursor::new(&mut data), format)?;

        let builder = self.builder.as_mut().ok_or_else(|| {
            SequenceError::open(&self.path, "archive writer is already closed")
        })?;
        let mut header = entry_header(data.len() as u64);
        builder.append_data(&mut header, &name, data.as_slice())?;
        log::debug!("Appended entry {name} ({} bytes)", data.len());
        Ok(())
    }

    /// Frame number of the next write.
    pub fn next(&self) -> i64 {
        self.position
    }

    /// Size of the most recently written frame, or the configured size.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    /// Path of the archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the end-of-archive marker and flush all filters.
    pub fn close(mut self) -> Result<(), SequenceError> {
        self.finish()
    }

    fn finish(&mut self) -> Result<(), SequenceError> {
        if let Some(builder) = self.builder.take() {
            builder.into_inner()?.finish()?;
            log::debug!("Closed archive {}", self.path.display());
        }
        Ok(())
    }
}

impl Drop for ArchiveWriter {
    fn drop(&mut self) {
        if let Err(error) = self.finish() {
            log::warn!("Failed to finalize archive {}: {error}", self.path.display());
        }
    }
}

fn entry_header(size: u64) -> Header {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);

    let mut header = Header::new_gnu();
    header.set_size(size);
    header.set_mode(ENTRY_MODE);
    header.set_entry_type(EntryType::Regular);
    header.set_mtime(now);
    if let Some(gnu) = header.as_gnu_mut() {
        gnu.set_atime(now);
        gnu.set_ctime(now);
    }
    header
}
