//! # framestore
//!
//! Random access to image sequences, whatever they are stored in.
//!
//! `framestore` reads and writes ordered sequences of frames as
//! [`image::DynamicImage`] values through one "read frame N" / "write frame N"
//! interface. The storage is picked from the path:
//!
//! | Path | Backend |
//! |------|---------|
//! | `clip.pngv` | indexed PNG container with a `clip.pngv.idx` position index |
//! | `frames.tar::img_%03d.png` | entries of a tar archive (`.tar`, `.tar.gz`, `.tgz`) |
//! | `shots/frame_%04d.png` | one image file per frame |
//! | `movie.mp4` | video decoded by `ffmpeg` |
//! | `<any of the above>::100` | the same sequence with frame numbers shifted by 100 |
//!
//! ## Quick Start
//!
//! ### Read Frames
//!
//! ```no_run
//! use framestore::{ReadOptions, SequenceReader};
//!
//! let mut reader = SequenceReader::open("frames.tar.gz::img_%03d.png", None, None, &ReadOptions::default())?;
//! let frame = reader.read(reader.last())?;
//! frame.save("last.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Write Frames
//!
//! ```no_run
//! use framestore::{SequenceWriter, WriteOptions};
//! use image::DynamicImage;
//!
//! let mut writer = SequenceWriter::open("out.tar::img_%03d.png", &WriteOptions::default())?;
//! for _ in 0..3 {
//!     writer.write(&DynamicImage::new_rgb8(2, 2), None)?;
//! }
//! writer.close()?;
//! # Ok::<(), framestore::SequenceError>(())
//! ```
//!
//! ## Seeking
//!
//! Tar archives and video pipes can only be read front to back. Readers keep
//! a cursor and position it with [`seek::plan_seek`]: uncompressed `.tar`
//! files jump to offsets recorded by a scan at open time, everything else
//! scans forward and restarts from the beginning to move backwards.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `container` | Indexed PNG container reader and writer (default) |
//! | `native-video` | In-process FFmpeg decoding through `ffmpeg-next` |
//! | `full` | Enables all of the above |

pub mod archive;
pub mod archive_stream;
mod archive_writer;
pub mod config;
#[cfg(feature = "container")]
pub mod container;
#[cfg(feature = "container")]
mod container_sequence;
mod conversion;
pub mod error;
mod file_sequence;
#[cfg(feature = "native-video")]
mod native;
pub mod offset;
pub mod pattern;
mod pipe;
pub mod position_index;
pub mod reader;
pub mod seek;
pub mod writer;

pub use archive::{ArchiveIndex, ArchiveReader, FrameMap};
pub use archive_stream::{ArchiveStream, Compression, EntryHeader};
pub use archive_writer::ArchiveWriter;
pub use config::{ColorRequest, ReadOptions, WriteOptions};
#[cfg(feature = "container")]
pub use container::{ContainerFile, ContainerWriter};
#[cfg(feature = "container")]
pub use container_sequence::{CONTAINER_EXTENSION, ContainerReader, ContainerSequenceWriter};
pub use error::SequenceError;
pub use file_sequence::{FileSequenceReader, FileSequenceWriter};
#[cfg(feature = "native-video")]
pub use native::NativeReader;
pub use offset::OffsetReader;
pub use pattern::NamePattern;
pub use pipe::PipeReader;
pub use position_index::{ByteRange, PositionIndex};
pub use reader::SequenceReader;
pub use seek::{SeekAction, plan_seek};
pub use writer::SequenceWriter;
