//! Positioned entry access over a tar stream.
//!
//! [`ArchiveStream`] walks a tar archive one entry at a time while tracking
//! the byte offset of the underlying (decompressed) stream, so that the offset
//! of every entry header can be recorded and, for uncompressed archives,
//! jumped to later. Header parsing and entry bodies are delegated to the `tar`
//! crate; a fresh [`tar::Archive`] is started at every entry boundary.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    fs::File,
    io::{self, BufReader, ErrorKind, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use flate2::read::MultiGzDecoder;

use crate::error::SequenceError;

/// Size of a tar block. Entry bodies are padded to a multiple of this.
const BLOCK_SIZE: u64 = 512;

/// Compression filter detected in front of the tar data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Plain tar.
    None,
    /// gzip-compressed tar.
    Gzip,
}

impl Compression {
    /// Detect the filter from the leading bytes of a file.
    fn sniff(magic: &[u8]) -> Result<Self, String> {
        match magic {
            [0x1f, 0x8b, ..] => Ok(Compression::Gzip),
            [b'B', b'Z', b'h', ..] => Err("bzip2 compressed archives are not supported".to_string()),
            [0xfd, b'7', b'z', b'X', b'Z', ..] => {
                Err("xz compressed archives are not supported".to_string())
            }
            [0x28, 0xb5, 0x2f, 0xfd, ..] => {
                Err("zstd compressed archives are not supported".to_string())
            }
            _ => Ok(Compression::None),
        }
    }
}

/// Header information for one archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    /// Entry path inside the archive.
    pub name: String,
    /// Size of the entry body in bytes.
    pub size: u64,
    /// Offset of the first header block of the entry in the tar stream.
    pub offset: u64,
}

/// A reader that counts the bytes it has produced.
struct CountingReader {
    inner: Box<dyn Read>,
    position: u64,
}

impl Read for CountingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.position += read as u64;
        Ok(read)
    }
}

/// A tar stream positioned at an entry boundary.
pub struct ArchiveStream {
    path: PathBuf,
    compression: Compression,
    reader: CountingReader,
}

impl Debug for ArchiveStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ArchiveStream")
            .field("path", &self.path)
            .field("compression", &self.compression)
            .field("position", &self.reader.position)
            .finish_non_exhaustive()
    }
}

impl ArchiveStream {
    /// Open `path`, detect its compression filter, and position the stream at
    /// the first entry.
    pub fn open(path: &Path) -> Result<Self, SequenceError> {
        let mut file = File::open(path)?;
        let mut magic = [0u8; 6];
        let sniffed = read_prefix(&mut file, &mut magic)?;
        let compression =
            Compression::sniff(&magic[..sniffed]).map_err(|reason| SequenceError::open(path, reason))?;
        file.seek(SeekFrom::Start(0))?;

        Ok(Self {
            path: path.to_path_buf(),
            compression,
            reader: Self::wrap(file, compression),
        })
    }

    fn wrap(file: File, compression: Compression) -> CountingReader {
        let buffered = BufReader::new(file);
        let inner: Box<dyn Read> = match compression {
            Compression::None => Box::new(buffered),
            Compression::Gzip => Box::new(MultiGzDecoder::new(buffered)),
        };
        CountingReader { inner, position: 0 }
    }

    /// The detected compression filter.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Current offset in the (decompressed) tar stream.
    pub fn position(&self) -> u64 {
        self.reader.position
    }

    /// Restart the stream from byte 0.
    pub fn rewind(&mut self) -> Result<(), SequenceError> {
        self.reopen_at(0)
    }

    /// Restart the stream at `offset`, which must be an entry boundary.
    ///
    /// Only uncompressed archives can be reopened anywhere but byte 0.
    pub fn reopen_at(&mut self, offset: u64) -> Result<(), SequenceError> {
        if offset != 0 && self.compression != Compression::None {
            return Err(SequenceError::Decode(format!(
                "cannot jump to byte {offset} of a compressed archive"
            )));
        }
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        self.reader = Self::wrap(file, self.compression);
        self.reader.position = offset;
        Ok(())
    }

    /// Read the next entry header and skip its body.
    ///
    /// Returns `None` at the end of the archive.
    pub fn skip_entry(&mut self) -> Result<Option<EntryHeader>, SequenceError> {
        Ok(self.advance(false)?.map(|(header, _)| header))
    }

    /// Read the next entry header and its body.
    ///
    /// Returns `None` at the end of the archive.
    pub fn read_entry(&mut self) -> Result<Option<(EntryHeader, Vec<u8>)>, SequenceError> {
        Ok(self.advance(true)?.map(|(header, body)| (header, body.unwrap_or_default())))
    }

    fn advance(&mut self, keep_body: bool) -> Result<Option<(EntryHeader, Option<Vec<u8>>)>, SequenceError> {
        let offset = self.reader.position;
        let (header, body) = {
            let mut archive = tar::Archive::new(&mut self.reader);
            let mut entries = archive.entries()?;
            let mut entry = match entries.next() {
                Some(entry) => entry?,
                None => return Ok(None),
            };
            let name = entry.path()?.to_string_lossy().into_owned();
            let size = entry.header().entry_size()?;
            let (consumed, body) = if keep_body {
                let mut body = Vec::new();
                let read = entry.read_to_end(&mut body)? as u64;
                (read, Some(body))
            } else {
                (io::copy(&mut entry, &mut io::sink())?, None)
            };
            if consumed != size {
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("archive is truncated: entry {name:?} holds {consumed} of {size} bytes"),
                )
                .into());
            }
            (EntryHeader { name, size, offset }, body)
        };

        let padding = (BLOCK_SIZE - header.size % BLOCK_SIZE) % BLOCK_SIZE;
        io::copy(&mut (&mut self.reader).take(padding), &mut io::sink())?;
        Ok(Some((header, body)))
    }
}

fn read_prefix(file: &mut File, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match file.read(&mut buffer[filled..])? {
            0 => break,
            read => filled += read,
        }
    }
    Ok(filled)
}
