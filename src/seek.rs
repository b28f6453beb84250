//! Seek planning for sequential streams.
//!
//! Archives, piped video, and decoded video are all read front to back. Every
//! such backend keeps an ordinal cursor (the position of the next item the
//! stream will yield) and asks [`plan_seek`] how to reach a target ordinal.
//! The plan depends only on whether the stream supports direct byte-offset
//! jumps, so it is decided here without touching any I/O.

/// What a sequential backend must do to position its stream at a target
/// ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekAction {
    /// The stream is already at the target. Nothing moves.
    Stay,
    /// Jump directly to the target's recorded byte offset and restart the
    /// parser there.
    Jump,
    /// Restart the stream from its beginning, then skip `skip` items.
    Rewind {
        /// Number of items to skip after the restart.
        skip: usize,
    },
    /// Skip `skip` items forward from the current position.
    Forward {
        /// Number of items to skip.
        skip: usize,
    },
}

/// Decide how to move from `current` to `target`.
///
/// Seekable streams jump whenever the target differs from the current
/// position. Non-seekable streams can only move forward, so a target behind
/// the cursor restarts the stream from the beginning.
///
/// # Example
///
/// ```
/// use framestore::seek::{SeekAction, plan_seek};
///
/// assert_eq!(plan_seek(false, 2, 5), SeekAction::Rewind { skip: 2 });
/// assert_eq!(plan_seek(false, 5, 2), SeekAction::Forward { skip: 3 });
/// assert_eq!(plan_seek(true, 2, 5), SeekAction::Jump);
/// assert_eq!(plan_seek(true, 4, 4), SeekAction::Stay);
/// ```
pub fn plan_seek(seekable: bool, target: usize, current: usize) -> SeekAction {
    if target == current {
        SeekAction::Stay
    } else if seekable {
        SeekAction::Jump
    } else if target < current {
        SeekAction::Rewind { skip: target }
    } else {
        SeekAction::Forward {
            skip: target - current,
        }
    }
}
