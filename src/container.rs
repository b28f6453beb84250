//! Indexed PNG containers.
//!
//! A container is a data file of PNG images concatenated back to back plus a
//! [`PositionIndex`] file that records where each image starts and ends. The
//! data file has no framing of its own, so unit boundaries are only known
//! through the index.
//!
//! [`ContainerWriter`] appends frames; [`ContainerFile`] loads the index and
//! decodes frames through a cursor that walks the index in frame order.

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Cursor, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use image::{
    DynamicImage, ImageEncoder,
    codecs::png::{PngDecoder, PngEncoder},
};

use crate::{
    config::ReadOptions,
    conversion::{self, RawFrame},
    error::SequenceError,
    position_index::{self, ByteRange, PositionIndex},
};

/// Appends PNG units to a container data file and records them in its index.
///
/// The data file is reopened in append mode for every frame and closed
/// afterwards, and the index line is written only once the unit is on disk.
#[derive(Debug)]
pub struct ContainerWriter {
    data_path: PathBuf,
    index_path: PathBuf,
    index: PositionIndex,
    next: i64,
}

impl ContainerWriter {
    /// Create (or truncate) a container and its index file.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::IoError`] if either file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, SequenceError> {
        let data_path = path.as_ref().to_path_buf();
        let index_path = position_index::index_path(&data_path);
        File::create(&data_path)?;
        File::create(&index_path)?;
        log::debug!("Created container {}", data_path.display());

        Ok(Self {
            data_path,
            index_path,
            index: PositionIndex::new(),
            next: 0,
        })
    }

    /// Frame number the next write will be recorded under.
    pub fn position(&self) -> i64 {
        self.next
    }

    /// Set the frame number the next write will be recorded under.
    pub fn set_position(&mut self, frame: i64) {
        self.next = frame;
    }

    /// Ranges written through this writer so far.
    pub fn index(&self) -> &PositionIndex {
        &self.index
    }

    /// Encode a frame and append it.
    ///
    /// Gray-alpha frames are stored without their alpha channel; other layouts
    /// are stored as-is.
    pub fn write(&mut self, frame: &DynamicImage) -> Result<ByteRange, SequenceError> {
        let RawFrame {
            bytes,
            width,
            height,
            depth,
            channels,
        } = conversion::raw_frame(frame);
        let row_bytes = width as usize * channels as usize * (depth as usize / 8);
        self.write_raw(&bytes, row_bytes, width, height, depth, channels)
    }

    /// Encode raw pixel rows and append them.
    ///
    /// `data` holds `height` rows, each starting `row_stride` bytes after the
    /// previous one. 16-bit samples are native-endian.
    ///
    /// # Errors
    ///
    /// - [`SequenceError::UnsupportedBitDepth`] unless `depth` is 8 or 16.
    /// - [`SequenceError::UnsupportedChannelCount`] unless `channels` is 1, 3
    ///   or 4.
    /// - [`SequenceError::Encode`] if the buffer is too small or the encoder
    ///   rejects the header.
    pub fn write_raw(
        &mut self,
        data: &[u8],
        row_stride: usize,
        width: u32,
        height: u32,
        depth: u8,
        channels: u8,
    ) -> Result<ByteRange, SequenceError> {
        let color_type = conversion::color_type(depth, channels)?;
        let row_bytes = width as usize * channels as usize * (depth as usize / 8);
        let packed = conversion::pack_rows(data, row_stride, row_bytes, height as usize)?;

        let mut file = OpenOptions::new().append(true).open(&self.data_path)?;
        let start = file.seek(SeekFrom::End(0))?;
        {
            let mut writer = BufWriter::new(&mut file);
            PngEncoder::new(&mut writer)
                .write_image(&packed, width, height, color_type)
                .map_err(|error| SequenceError::Encode(error.to_string()))?;
            writer.flush()?;
        }
        let end = file.stream_position()?;
        file.sync_data()?;
        drop(file);

        let range = ByteRange { start, end };
        position_index::append_line(&self.index_path, self.next, range)?;
        self.index.insert(self.next, range);
        log::debug!(
            "Appended frame {} ({}x{}, {} bit, {} channel) at {}..{}",
            self.next,
            width,
            height,
            depth,
            channels,
            start,
            end
        );
        self.next += 1;
        Ok(range)
    }
}

/// A container opened for reading, with a cursor over its index.
///
/// The cursor names the frame [`read_next`](ContainerFile::read_next) will
/// decode. After a read it moves to the next indexed frame, or to `None`
/// past the last one.
#[derive(Debug)]
pub struct ContainerFile {
    path: PathBuf,
    file: File,
    index: PositionIndex,
    cursor: Option<i64>,
    options: ReadOptions,
}

impl ContainerFile {
    /// Open a container data file and load its index.
    ///
    /// A missing or malformed index is logged and treated as empty; the
    /// cursor then starts at `None` and nothing can be read.
    pub fn open<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self, SequenceError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let index_path = position_index::index_path(&path);
        let index = PositionIndex::load(&index_path).unwrap_or_else(|error| {
            log::warn!("Could not load index {}: {error}", index_path.display());
            PositionIndex::new()
        });
        let cursor = index.first();

        Ok(Self {
            path,
            file,
            index,
            cursor,
            options: options.clone(),
        })
    }

    /// The loaded index.
    pub fn index(&self) -> &PositionIndex {
        &self.index
    }

    /// Smallest indexed frame.
    pub fn first(&self) -> Option<i64> {
        self.index.first()
    }

    /// Largest indexed frame.
    pub fn last(&self) -> Option<i64> {
        self.index.last()
    }

    /// Number of indexed frames.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Frame the next [`read_next`](ContainerFile::read_next) decodes.
    pub fn next(&self) -> Option<i64> {
        self.cursor
    }

    /// Point the cursor at `frame`, or at `None` if it is not indexed.
    pub fn set_next(&mut self, frame: i64) {
        self.cursor = self.index.contains(frame).then_some(frame);
    }

    /// Decode the frame under the cursor and advance the cursor.
    ///
    /// The cursor advances even when decoding fails, so a corrupt unit does
    /// not block the frames after it.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::FrameNotFound`] when the cursor is `None` and
    /// [`SequenceError::Decode`] when the unit cannot be decoded.
    pub fn read_next(&mut self) -> Result<DynamicImage, SequenceError> {
        let frame = self
            .cursor
            .ok_or(SequenceError::FrameNotFound { frame: -1 })?;
        let range = self
            .index
            .range(frame)
            .ok_or(SequenceError::FrameNotFound { frame })?;
        self.cursor = self.index.next_after(frame);
        self.decode(range)
    }

    /// Decode the unit at `range` without moving the cursor.
    pub fn decode(&mut self, range: ByteRange) -> Result<DynamicImage, SequenceError> {
        decode_unit(&mut self.file, range, &self.options).map_err(|error| {
            log::debug!(
                "Failed to decode {}..{} in {}: {error}",
                range.start,
                range.end,
                self.path.display()
            );
            error
        })
    }
}

/// Seek to `range.start` and decode exactly one PNG unit.
pub(crate) fn decode_unit(
    file: &mut File,
    range: ByteRange,
    options: &ReadOptions,
) -> Result<DynamicImage, SequenceError> {
    let file_len = file.metadata()?.len();
    if range.end > file_len {
        return Err(SequenceError::Decode(format!(
            "unit {}..{} runs past the end of the data file ({file_len} bytes)",
            range.start, range.end
        )));
    }
    file.seek(SeekFrom::Start(range.start))?;
    let mut unit = Vec::new();
    (&mut *file).take(range.len()).read_to_end(&mut unit)?;
    if unit.len() as u64 != range.len() {
        return Err(SequenceError::Decode(format!(
            "unit {}..{} is truncated to {} bytes",
            range.start,
            range.end,
            unit.len()
        )));
    }
    let decoder = PngDecoder::new(Cursor::new(unit))
        .map_err(|error| SequenceError::Decode(error.to_string()))?;
    let image = DynamicImage::from_decoder(decoder)
        .map_err(|error| SequenceError::Decode(error.to_string()))?;
    Ok(conversion::conform_frame(image, options))
}
