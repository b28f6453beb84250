//! In-process video decoding with FFmpeg.
//!
//! Same contract as the piped reader, but decoding runs inside the process
//! through `ffmpeg-next`. Frames are decoded front to back; a backward read
//! reopens the input.

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{
    config::ReadOptions,
    conversion,
    error::SequenceError,
    seek::{self, SeekAction},
};

/// An opened input with a decoder and an RGB scaler for its video stream.
struct DecodeState {
    input: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    eof_sent: bool,
}

impl DecodeState {
    fn open(path: &Path) -> Result<Self, SequenceError> {
        ffmpeg_next::init().map_err(|error| {
            SequenceError::open(path, format!("FFmpeg initialisation failed: {error}"))
        })?;
        let input = ffmpeg_next::format::input(&path)
            .map_err(|error| SequenceError::open(path, error.to_string()))?;
        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| SequenceError::open(path, "no video stream"))?;
        let stream_index = stream.index();
        let decoder = CodecContext::from_parameters(stream.parameters())?
            .decoder()
            .video()?;
        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ScalingFlags::BILINEAR,
        )?;

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            eof_sent: false,
        })
    }

    fn size(&self) -> (u32, u32) {
        (self.decoder.width(), self.decoder.height())
    }

    /// Decode the next frame into `decoded_frame`. Returns `false` once the
    /// decoder is drained.
    fn advance(&mut self) -> Result<bool, SequenceError> {
        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                return Ok(true);
            }
            if self.eof_sent {
                return Ok(false);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(_) => {
                    // Corrupt packets are skipped.
                }
            }
        }
    }

    fn convert(&mut self) -> Result<RgbImage, SequenceError> {
        self.scaler.run(&self.decoded_frame, &mut self.scaled_frame)?;
        let (width, height) = self.size();
        let row_bytes = width as usize * 3;
        let pixels = conversion::pack_rows(
            self.scaled_frame.data(0),
            self.scaled_frame.stride(0),
            row_bytes,
            height as usize,
        )?;
        RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
            SequenceError::Decode("Failed to construct RGB image from decoded frame data".to_string())
        })
    }
}

/// Reads video frames through the FFmpeg libraries.
pub struct NativeReader {
    path: PathBuf,
    state: DecodeState,
    /// Ordinal of the frame the decoder yields next.
    position: usize,
    first: i64,
    last: i64,
    size: (u32, u32),
    options: ReadOptions,
}

impl std::fmt::Debug for NativeReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeReader")
            .field("path", &self.path)
            .field("position", &self.position)
            .field("first", &self.first)
            .field("last", &self.last)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl NativeReader {
    /// Open a video file and count its frames by decoding it once.
    pub fn open(
        path: &str,
        first: Option<i64>,
        last: Option<i64>,
        options: &ReadOptions,
    ) -> Result<Self, SequenceError> {
        let path = PathBuf::from(path);
        let mut state = DecodeState::open(&path)?;
        let size = state.size();

        let mut count: i64 = 0;
        while state.advance()? {
            count += 1;
        }
        if count == 0 {
            return Err(SequenceError::open(&path, "video has no frames"));
        }

        let first = first.unwrap_or(0).max(0);
        let last = match last {
            Some(requested) if requested > 0 => requested.min(count - 1),
            _ => count - 1,
        };
        log::info!(
            "Opened {} ({}x{}, frames {first}..={last})",
            path.display(),
            size.0,
            size.1
        );

        Ok(Self {
            state: DecodeState::open(&path)?,
            path,
            position: 0,
            first,
            last,
            size,
            options: options.clone(),
        })
    }

    fn seek(&mut self, ordinal: usize) -> Result<(), SequenceError> {
        match seek::plan_seek(false, ordinal, self.position) {
            SeekAction::Stay | SeekAction::Forward { .. } => {}
            SeekAction::Rewind { .. } | SeekAction::Jump => {
                self.state = DecodeState::open(&self.path)?;
                self.position = 0;
            }
        }
        while self.position < ordinal && self.state.advance()? {
            self.position += 1;
        }
        if self.position != ordinal {
            log::warn!("Cannot seek to frame {ordinal} of {}", self.path.display());
            return Err(SequenceError::Seek {
                target: ordinal,
                reached: self.position,
            });
        }
        Ok(())
    }

    pub fn read(&mut self, frame: i64) -> Result<DynamicImage, SequenceError> {
        let ordinal = usize::try_from(frame).map_err(|_| SequenceError::FrameNotFound { frame })?;
        self.seek(ordinal)?;
        if !self.state.advance()? {
            return Err(SequenceError::FrameNotFound { frame });
        }
        self.position += 1;
        let image = self.state.convert()?;
        Ok(conversion::conform_frame(
            DynamicImage::ImageRgb8(image),
            &self.options,
        ))
    }

    pub fn first(&self) -> i64 {
        self.first
    }

    pub fn last(&self) -> i64 {
        self.last
    }

    pub fn next(&self) -> Option<i64> {
        i64::try_from(self.position).ok()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}
