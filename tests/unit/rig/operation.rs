use super::*;

#[test]
fn consume_is_clamped_to_remaining_sign() {
    let mut v = ConsumableValue::new(10.0);
    assert_eq!(v.consume(4.0), 4.0);
    assert_eq!(v.consume(-3.0), 0.0);
    assert_eq!(v.consume(100.0), 6.0);
    assert!(!v.has_value());

    let mut n = ConsumableValue::new(-5.0);
    assert_eq!(n.consume(-2.0), -2.0);
    assert_eq!(n.remaining(), -3.0);
    assert_eq!(n.consume(1.0), 0.0);
}

#[test]
fn take_empties_the_value() {
    let mut v = ConsumableValue::new(-7.5);
    assert_eq!(v.take(), -7.5);
    assert!(!v.has_value());
}

#[test]
fn yaw_pitch_remaining_tracks_both_axes() {
    let mut op = YawPitchOperation::new(3.0, 0.0);
    assert!(op.has_remaining());
    op.yaw.take();
    assert!(!op.has_remaining());
    assert!(!CameraOperation::YawPitch(op).has_remaining());
}
