//! Video decoding through an external `ffmpeg` process.
//!
//! The process writes raw `rgb24` frames to a pipe. Pipes only move forward,
//! so reads are positioned with [`plan_seek`](crate::seek::plan_seek) as a
//! non-seekable stream: a backward read restarts the process.

use std::{
    io::{BufReader, ErrorKind, Read},
    path::{Path, PathBuf},
    process::{Child, ChildStdout, Command, Stdio},
};

use image::{DynamicImage, ImageFormat, RgbImage};

use crate::{
    config::ReadOptions,
    conversion,
    error::SequenceError,
    seek::{self, SeekAction},
};

/// A running `ffmpeg` process and its stdout.
#[derive(Debug)]
struct RawPipe {
    child: Child,
    stdout: BufReader<ChildStdout>,
}

impl RawPipe {
    fn spawn(binary: &Path, input: &Path) -> Result<Self, SequenceError> {
        let mut child = ffmpeg_command(binary, input)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .spawn()
            .map_err(|error| {
                SequenceError::Process(format!("could not start {}: {error}", binary.display()))
            })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SequenceError::Process("ffmpeg stdout is not piped".to_string()))?;
        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
        })
    }

    /// Fill `frame` with the next frame. Returns `false` at end of stream.
    fn next_frame(&mut self, frame: &mut [u8]) -> Result<bool, SequenceError> {
        match self.stdout.read_exact(frame) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == ErrorKind::UnexpectedEof => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    fn stop(&mut self) {
        // The process may already have exited.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for RawPipe {
    fn drop(&mut self) {
        self.stop();
    }
}

fn ffmpeg_command(binary: &Path, input: &Path) -> Command {
    let mut command = Command::new(binary);
    command
        .args(["-nostdin", "-v", "quiet", "-i"])
        .arg(input)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    command
}

/// Decode one `ppm` frame to learn the frame size.
fn probe_size(binary: &Path, input: &Path) -> Result<(u32, u32), SequenceError> {
    let output = ffmpeg_command(binary, input)
        .args(["-f", "image2pipe", "-vcodec", "ppm", "-vframes", "1", "-"])
        .output()
        .map_err(|error| {
            SequenceError::Process(format!("could not start {}: {error}", binary.display()))
        })?;
    if output.stdout.is_empty() {
        return Err(SequenceError::Process(format!(
            "ffmpeg produced no frame for {} ({})",
            input.display(),
            output.status
        )));
    }
    let frame = image::load_from_memory_with_format(&output.stdout, ImageFormat::Pnm)
        .map_err(|error| SequenceError::Decode(error.to_string()))?;
    Ok((frame.width(), frame.height()))
}

/// Reads video frames from an `ffmpeg` pipe.
#[derive(Debug)]
pub struct PipeReader {
    path: PathBuf,
    binary: PathBuf,
    pipe: RawPipe,
    buffer: Vec<u8>,
    /// Ordinal of the frame the pipe yields next.
    position: usize,
    first: i64,
    last: i64,
    size: (u32, u32),
    options: ReadOptions,
}

impl PipeReader {
    /// Open a video file.
    ///
    /// Probes the frame size, then decodes the whole video once to count its
    /// frames. `first` is clamped to 0; a positive `last` lowers the counted
    /// last frame.
    pub fn open(
        path: &str,
        first: Option<i64>,
        last: Option<i64>,
        options: &ReadOptions,
    ) -> Result<Self, SequenceError> {
        let input = PathBuf::from(path);
        if !input.is_file() {
            return Err(SequenceError::open(&input, "not a file"));
        }
        let binary = options.ffmpeg_binary.clone();
        let size = probe_size(&binary, &input)
            .map_err(|error| SequenceError::open(&input, error.to_string()))?;
        let frame_len = size.0 as usize * size.1 as usize * 3;

        let mut pipe = RawPipe::spawn(&binary, &input)?;
        let mut buffer = vec![0u8; frame_len];
        let mut count: i64 = 0;
        while pipe.next_frame(&mut buffer)? {
            count += 1;
        }
        if count == 0 {
            return Err(SequenceError::open(&input, "video has no frames"));
        }

        let first = first.unwrap_or(0).max(0);
        let last = match last {
            Some(requested) if requested > 0 => requested.min(count - 1),
            _ => count - 1,
        };
        log::info!(
            "Opened {} through {} ({}x{}, frames {first}..={last})",
            input.display(),
            binary.display(),
            size.0,
            size.1
        );

        Ok(Self {
            pipe: RawPipe::spawn(&binary, &input)?,
            path: input,
            binary,
            buffer,
            position: 0,
            first,
            last,
            size,
            options: options.clone(),
        })
    }

    /// Position the pipe so that the next frame it yields is `ordinal`.
    fn seek(&mut self, ordinal: usize) -> Result<(), SequenceError> {
        match seek::plan_seek(false, ordinal, self.position) {
            SeekAction::Stay | SeekAction::Forward { .. } => {}
            SeekAction::Rewind { .. } | SeekAction::Jump => {
                log::debug!("Restarting ffmpeg for {} to reach frame {ordinal}", self.path.display());
                self.pipe = RawPipe::spawn(&self.binary, &self.path)?;
                self.position = 0;
            }
        }
        while self.position < ordinal && self.pipe.next_frame(&mut self.buffer)? {
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

    /// Decode frame `frame`.
    pub fn read(&mut self, frame: i64) -> Result<DynamicImage, SequenceError> {
        let ordinal = usize::try_from(frame).map_err(|_| SequenceError::FrameNotFound { frame })?;
        self.seek(ordinal)?;
        if !self.pipe.next_frame(&mut self.buffer)? {
            return Err(SequenceError::FrameNotFound { frame });
        }
        self.position += 1;

        let (width, height) = self.size;
        let image = RgbImage::from_raw(width, height, self.buffer.clone())
            .ok_or_else(|| SequenceError::Decode("short rgb24 frame".to_string()))?;
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

    /// Frame the pipe yields next.
    pub fn next(&self) -> Option<i64> {
        i64::try_from(self.position).ok()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}
