//! Read and write configuration.
//!
//! [`ReadOptions`] and [`WriteOptions`] are builders that thread decoding and
//! encoding preferences through every backend without widening each
//! `open` signature.
//!
//! # Example
//!
//! ```no_run
//! use framestore::{ColorRequest, ReadOptions, SequenceReader};
//!
//! let options = ReadOptions::new()
//!     .with_color(ColorRequest::Gray)
//!     .with_native_depth(true);
//! let mut reader = SequenceReader::open("frames.tar::frame_%04d.png", None, None, &options)?;
//! let frame = reader.read(0)?;
//! # Ok::<(), framestore::SequenceError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// How decoded frames should be converted before they are returned.
///
/// Applied after depth reduction and alpha stripping. `Auto` keeps color
/// frames in color and gray frames in gray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorRequest {
    /// Keep the stored color model. This is the default.
    #[default]
    Auto,
    /// Always return three-channel RGB frames.
    Color,
    /// Always return single-channel gray frames.
    Gray,
}

impl ColorRequest {
    /// Resolve the request against whether the stored frame has color.
    pub fn wants_color(self, stored_color: bool) -> bool {
        match self {
            ColorRequest::Auto => stored_color,
            ColorRequest::Color => true,
            ColorRequest::Gray => false,
        }
    }
}

impl Display for ColorRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            ColorRequest::Auto => "auto",
            ColorRequest::Color => "color",
            ColorRequest::Gray => "gray",
        };
        f.write_str(name)
    }
}

impl FromStr for ColorRequest {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "auto" | "-1" => Ok(ColorRequest::Auto),
            "color" | "colour" | "rgb" | "1" => Ok(ColorRequest::Color),
            "gray" | "grey" | "grayscale" | "0" => Ok(ColorRequest::Gray),
            other => Err(format!("unknown color request: {other}")),
        }
    }
}

/// Options controlling how readers decode frames.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub(crate) color: ColorRequest,
    /// When `false`, 16-bit samples are truncated to 8 bits.
    pub(crate) native_depth: bool,
    /// Executable used by the external-process video reader.
    pub(crate) ffmpeg_binary: PathBuf,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadOptions {
    /// Create options with default settings.
    ///
    /// Defaults: automatic color, 8-bit output, `ffmpeg` looked up on `PATH`.
    pub fn new() -> Self {
        Self {
            color: ColorRequest::Auto,
            native_depth: false,
            ffmpeg_binary: PathBuf::from("ffmpeg"),
        }
    }

    /// Set the color request applied to every decoded frame.
    #[must_use]
    pub fn with_color(mut self, color: ColorRequest) -> Self {
        self.color = color;
        self
    }

    /// Keep 16-bit samples instead of truncating them to 8 bits.
    #[must_use]
    pub fn with_native_depth(mut self, native_depth: bool) -> Self {
        self.native_depth = native_depth;
        self
    }

    /// Use a specific `ffmpeg` executable for piped video decoding.
    #[must_use]
    pub fn with_ffmpeg_binary<P: AsRef<Path>>(mut self, binary: P) -> Self {
        self.ffmpeg_binary = binary.as_ref().to_path_buf();
        self
    }

    /// The configured color request.
    pub fn color(&self) -> ColorRequest {
        self.color
    }

    /// Whether 16-bit samples are preserved.
    pub fn native_depth(&self) -> bool {
        self.native_depth
    }
}

/// Options controlling how writers are opened.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Expected frame size, used to validate flat-file patterns.
    pub(crate) frame_size: Option<(u32, u32)>,
    /// Whether frames are expected to carry color.
    pub(crate) color: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteOptions {
    /// Create options with default settings (no frame size, color frames).
    pub fn new() -> Self {
        Self {
            frame_size: None,
            color: true,
        }
    }

    /// Declare the size of the frames that will be written.
    #[must_use]
    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = Some((width, height));
        self
    }

    /// Declare whether the frames carry color.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// The declared frame size, if any.
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.frame_size
    }

    /// Whether color frames are expected.
    pub fn color(&self) -> bool {
        self.color
    }
}
