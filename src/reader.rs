//! Backend selection for reading.
//!
//! [`SequenceReader::open`] tries each backend in a fixed order and keeps the
//! first one that opens:
//!
//! 1. frame offset wrapper (`path::<integer>`)
//! 2. indexed container (`*.pngv`, feature `container`)
//! 3. numbered image files (`frame_%04d.png`)
//! 4. tar archive (`frames.tar[.gz]::pattern`)
//! 5. `ffmpeg` pipe
//! 6. in-process FFmpeg (feature `native-video`)

use image::DynamicImage;

#[cfg(feature = "container")]
use crate::container_sequence::ContainerReader;
#[cfg(feature = "native-video")]
use crate::native::NativeReader;
use crate::{
    archive::ArchiveReader, config::ReadOptions, error::SequenceError,
    file_sequence::FileSequenceReader, offset::OffsetReader, pipe::PipeReader,
};

type Opener = fn(&str, Option<i64>, Option<i64>, &ReadOptions) -> Result<SequenceReader, SequenceError>;

/// A readable image sequence, backed by whichever storage opened the path.
#[derive(Debug)]
#[non_exhaustive]
pub enum SequenceReader {
    /// Frame numbers shifted by a path suffix.
    Offset(OffsetReader),
    /// Indexed PNG container.
    #[cfg(feature = "container")]
    Container(ContainerReader),
    /// One image file per frame.
    Files(FileSequenceReader),
    /// Entries of a tar archive.
    Archive(ArchiveReader),
    /// Video decoded by an external `ffmpeg` process.
    Pipe(PipeReader),
    /// Video decoded in-process.
    #[cfg(feature = "native-video")]
    Native(NativeReader),
}

impl SequenceReader {
    /// Open `path` with the first backend that accepts it.
    ///
    /// `first` and `last` bound the frames to read; `None` lets the backend
    /// derive them from the stored data.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::NoBackend`] when every backend declines.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use framestore::{ReadOptions, SequenceReader};
    ///
    /// let mut reader = SequenceReader::open("frames.tar::img_%03d.png", None, None, &ReadOptions::default())?;
    /// for frame in reader.first()..=reader.last() {
    ///     let image = reader.read(frame)?;
    ///     println!("{frame}: {}x{}", image.width(), image.height());
    /// }
    /// # Ok::<(), framestore::SequenceError>(())
    /// ```
    pub fn open(
        path: &str,
        first: Option<i64>,
        last: Option<i64>,
        options: &ReadOptions,
    ) -> Result<Self, SequenceError> {
        let mut candidates: Vec<(&str, Opener)> = Vec::new();
        candidates.push(("offset", |p, f, l, o| OffsetReader::open(p, f, l, o).map(Self::Offset)));
        #[cfg(feature = "container")]
        candidates.push(("container", |p, f, l, o| {
            ContainerReader::open(p, f, l, o).map(Self::Container)
        }));
        candidates.push(("files", |p, f, l, o| FileSequenceReader::open(p, f, l, o).map(Self::Files)));
        candidates.push(("archive", |p, f, l, o| ArchiveReader::open(p, f, l, o).map(Self::Archive)));
        candidates.push(("pipe", |p, f, l, o| PipeReader::open(p, f, l, o).map(Self::Pipe)));
        #[cfg(feature = "native-video")]
        candidates.push(("native", |p, f, l, o| NativeReader::open(p, f, l, o).map(Self::Native)));

        for (name, open) in candidates {
            match open(path, first, last, options) {
                Ok(reader) => {
                    log::debug!("Opened {path} with the {name} reader");
                    return Ok(reader);
                }
                Err(error) => log::debug!("The {name} reader declined {path}: {error}"),
            }
        }
        Err(SequenceError::NoBackend {
            path: path.to_string(),
        })
    }

    /// Read logical frame `frame`.
    pub fn read(&mut self, frame: i64) -> Result<DynamicImage, SequenceError> {
        match self {
            Self::Offset(reader) => reader.read(frame),
            #[cfg(feature = "container")]
            Self::Container(reader) => reader.read(frame),
            Self::Files(reader) => reader.read(frame),
            Self::Archive(reader) => reader.read(frame),
            Self::Pipe(reader) => reader.read(frame),
            #[cfg(feature = "native-video")]
            Self::Native(reader) => reader.read(frame),
        }
    }

    /// First frame of the sequence.
    pub fn first(&self) -> i64 {
        match self {
            Self::Offset(reader) => reader.first(),
            #[cfg(feature = "container")]
            Self::Container(reader) => reader.first(),
            Self::Files(reader) => reader.first(),
            Self::Archive(reader) => reader.first(),
            Self::Pipe(reader) => reader.first(),
            #[cfg(feature = "native-video")]
            Self::Native(reader) => reader.first(),
        }
    }

    /// Last frame of the sequence.
    pub fn last(&self) -> i64 {
        match self {
            Self::Offset(reader) => reader.last(),
            #[cfg(feature = "container")]
            Self::Container(reader) => reader.last(),
            Self::Files(reader) => reader.last(),
            Self::Archive(reader) => reader.last(),
            Self::Pipe(reader) => reader.last(),
            #[cfg(feature = "native-video")]
            Self::Native(reader) => reader.last(),
        }
    }

    /// Next frame the backend would produce, or `None` when unknown.
    pub fn next(&self) -> Option<i64> {
        match self {
            Self::Offset(reader) => reader.next(),
            #[cfg(feature = "container")]
            Self::Container(reader) => reader.next(),
            Self::Files(reader) => reader.next(),
            Self::Archive(reader) => reader.next(),
            Self::Pipe(reader) => reader.next(),
            #[cfg(feature = "native-video")]
            Self::Native(reader) => reader.next(),
        }
    }

    /// Width and height of the first frame.
    pub fn size(&self) -> (u32, u32) {
        match self {
            Self::Offset(reader) => reader.size(),
            #[cfg(feature = "container")]
            Self::Container(reader) => reader.size(),
            Self::Files(reader) => reader.size(),
            Self::Archive(reader) => reader.size(),
            Self::Pipe(reader) => reader.size(),
            #[cfg(feature = "native-video")]
            Self::Native(reader) => reader.size(),
        }
    }

    /// Short name of the backend in use.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Offset(_) => "offset",
            #[cfg(feature = "container")]
            Self::Container(_) => "container",
            Self::Files(_) => "files",
            Self::Archive(_) => "archive",
            Self::Pipe(_) => "pipe",
            #[cfg(feature = "native-video")]
            Self::Native(_) => "native",
        }
    }

    /// Release the backend's files and processes.
    pub fn close(self) {
        drop(self);
    }
}
