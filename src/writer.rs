//! Backend selection for writing.
//!
//! [`SequenceWriter::open`] tries the indexed container (feature
//! `container`), then tar archives, then numbered image files.

use image::DynamicImage;

#[cfg(feature = "container")]
use crate::container_sequence::ContainerSequenceWriter;
use crate::{
    archive_writer::ArchiveWriter, config::WriteOptions, error::SequenceError,
    file_sequence::FileSequenceWriter,
};

type Opener = fn(&str, &WriteOptions) -> Result<SequenceWriter, SequenceError>;

/// A writable image sequence.
#[derive(Debug)]
#[non_exhaustive]
pub enum SequenceWriter {
    /// Indexed PNG container.
    #[cfg(feature = "container")]
    Container(ContainerSequenceWriter),
    /// Entries of a tar archive.
    Archive(ArchiveWriter),
    /// One image file per frame.
    Files(FileSequenceWriter),
}

impl SequenceWriter {
    /// Open `path` with the first backend that accepts it.
    ///
    /// A missing `::pattern` on an archive path is reported as
    /// [`SequenceError::MissingPattern`] instead of falling through to the
    /// remaining backends.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::NoBackend`] when every backend declines.
    pub fn open(path: &str, options: &WriteOptions) -> Result<Self, SequenceError> {
        let mut candidates: Vec<(&str, Opener)> = Vec::new();
        #[cfg(feature = "container")]
        candidates.push(("container", |p, o| {
            ContainerSequenceWriter::open(p, o).map(Self::Container)
        }));
        candidates.push(("archive", |p, o| ArchiveWriter::open(p, o).map(Self::Archive)));
        candidates.push(("files", |p, o| FileSequenceWriter::open(p, o).map(Self::Files)));

        for (name, open) in candidates {
            match open(path, options) {
                Ok(writer) => {
                    log::debug!("Writing {path} with the {name} writer");
                    return Ok(writer);
                }
                Err(error @ SequenceError::MissingPattern { .. }) => return Err(error),
                Err(error) => log::debug!("The {name} writer declined {path}: {error}"),
            }
        }
        Err(SequenceError::NoBackend {
            path: path.to_string(),
        })
    }

    /// Write `frame` under `position`, or under the next counter value.
    pub fn write(&mut self, frame: &DynamicImage, position: Option<i64>) -> Result<(), SequenceError> {
        match self {
            #[cfg(feature = "container")]
            Self::Container(writer) => writer.write(frame, position),
            Self::Archive(writer) => writer.write(frame, position),
            Self::Files(writer) => writer.write(frame, position),
        }
    }

    /// Frame number of the next write.
    pub fn next(&self) -> i64 {
        match self {
            #[cfg(feature = "container")]
            Self::Container(writer) => writer.next(),
            Self::Archive(writer) => writer.next(),
            Self::Files(writer) => writer.next(),
        }
    }

    /// Size of the last frame written, or the configured size.
    pub fn size(&self) -> Option<(u32, u32)> {
        match self {
            #[cfg(feature = "container")]
            Self::Container(writer) => writer.size(),
            Self::Archive(writer) => writer.size(),
            Self::Files(writer) => writer.size(),
        }
    }

    /// Short name of the backend in use.
    pub fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "container")]
            Self::Container(_) => "container",
            Self::Archive(_) => "archive",
            Self::Files(_) => "files",
        }
    }

    /// Flush and release the backend.
    ///
    /// Archives are finalized here; dropping the writer finalizes them too
    /// but can only log a failure.
    pub fn close(self) -> Result<(), SequenceError> {
        match self {
            Self::Archive(writer) => writer.close(),
            _ => Ok(()),
        }
    }
}
