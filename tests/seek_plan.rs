//! Seek planning tests.
//!
//! These exercise the pure planner only; no stream is touched.

use framestore::{SeekAction, plan_seek};

#[test]
fn same_position_stays_put() {
    assert_eq!(plan_seek(true, 3, 3), SeekAction::Stay);
    assert_eq!(plan_seek(false, 3, 3), SeekAction::Stay);
    assert_eq!(plan_seek(false, 0, 0), SeekAction::Stay);
}

#[test]
fn seekable_streams_jump_in_both_directions() {
    assert_eq!(plan_seek(true, 10, 2), SeekAction::Jump);
    assert_eq!(plan_seek(true, 0, 7), SeekAction::Jump);
}

#[test]
fn sequential_streams_scan_forward() {
    assert_eq!(plan_seek(false, 5, 2), SeekAction::Forward { skip: 3 });
    assert_eq!(plan_seek(false, 1, 0), SeekAction::Forward { skip: 1 });
}

#[test]
fn sequential_streams_restart_to_move_back() {
    assert_eq!(plan_seek(false, 2, 5), SeekAction::Rewind { skip: 2 });
    assert_eq!(plan_seek(false, 0, 1), SeekAction::Rewind { skip: 0 });
}
