//! Frame name patterns and `::` path suffixes.
//!
//! Sequences stored as many named images (flat files, archive entries) map a
//! frame number to a name through a printf-style pattern such as
//! `frame_%04d.png`. Archive and offset paths carry extra parameters after a
//! `::` separator, e.g. `frames.tar::frame_%04d.png` or `video.mp4::1`.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::SequenceError;

/// Separator between a path and its backend-specific suffix.
pub const SUFFIX_SEPARATOR: &str = "::";

/// Split `path` at its first `::` into the path and the suffix.
///
/// Archive backends use this form: everything after the first separator is the
/// entry name pattern.
pub fn split_suffix(path: &str) -> (&str, Option<&str>) {
    match path.split_once(SUFFIX_SEPARATOR) {
        Some((base, suffix)) => (base, Some(suffix)),
        None => (path, None),
    }
}

/// Split `path` at its last `::` into the path and the suffix.
///
/// The offset wrapper uses this form so that an offset can be appended to a
/// path that already carries an archive pattern.
pub fn split_trailing_suffix(path: &str) -> (&str, Option<&str>) {
    match path.rsplit_once(SUFFIX_SEPARATOR) {
        Some((base, suffix)) => (base, Some(suffix)),
        None => (path, None),
    }
}

/// A printf-style pattern with exactly one integer conversion.
///
/// Supported conversions are `%d`, `%i` and `%u` with optional `0` and `-`
/// flags and a field width (`%04d`, `%5i`, `%-3d`). `%%` produces a literal
/// percent sign.
///
/// # Example
///
/// ```
/// use framestore::NamePattern;
///
/// let pattern = NamePattern::parse("img_%03d.png")?;
/// assert_eq!(pattern.format(7), "img_007.png");
/// # Ok::<(), framestore::SequenceError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    source: String,
    prefix: String,
    suffix: String,
    width: usize,
    zero_pad: bool,
    left_align: bool,
}

impl NamePattern {
    /// Parse a pattern, rejecting text without exactly one integer conversion.
    pub fn parse(pattern: &str) -> Result<Self, SequenceError> {
        let invalid = |reason: &str| SequenceError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut conversion: Option<(usize, bool, bool)> = None;
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            let target = if conversion.is_some() {
                &mut suffix
            } else {
                &mut prefix
            };
            if c != '%' {
                target.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                target.push('%');
                continue;
            }
            if conversion.is_some() {
                return Err(invalid("more than one conversion"));
            }

            let mut zero_pad = false;
            let mut left_align = false;
            while let Some(&flag) = chars.peek() {
                match flag {
                    '0' => zero_pad = true,
                    '-' => left_align = true,
                    _ => break,
                }
                chars.next();
            }
            let mut width = 0usize;
            while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
                width = width * 10 + digit as usize;
                chars.next();
            }
            match chars.next() {
                Some('d' | 'i' | 'u') => {}
                Some(other) => return Err(invalid(&format!("unsupported conversion %{other}"))),
                None => return Err(invalid("dangling %")),
            }
            conversion = Some((width, zero_pad && !left_align, left_align));
        }

        let (width, zero_pad, left_align) =
            conversion.ok_or_else(|| invalid("no integer conversion"))?;
        Ok(Self {
            source: pattern.to_string(),
            prefix,
            suffix,
            width,
            zero_pad,
            left_align,
        })
    }

    /// Format a frame number into a name.
    pub fn format(&self, frame: i64) -> String {
        let number = if self.zero_pad {
            let digits = frame.unsigned_abs().to_string();
            let sign = if frame < 0 { "-" } else { "" };
            let pad = self.width.saturating_sub(sign.len() + digits.len());
            format!("{sign}{}{digits}", "0".repeat(pad))
        } else if self.left_align {
            format!("{frame:<width$}", width = self.width)
        } else {
            format!("{frame:>width$}", width = self.width)
        };
        format!("{}{number}{}", self.prefix, self.suffix)
    }

    /// The pattern text as given.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Display for NamePattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.source)
    }
}
