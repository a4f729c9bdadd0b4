use super::*;

#[test]
fn setters_flag_changed_and_clear_resets() {
    let mut pose = CameraPose::default();
    assert!(!pose.changed_flags().any());

    pose.set_field_of_view(60.0);
    assert!(pose.changed_flags().field_of_view);
    assert!(!pose.changed_flags().location);
    assert_eq!(pose.field_of_view(), 60.0);

    pose.clear_changed_flags();
    assert!(!pose.changed_flags().any());
    assert_eq!(pose.field_of_view(), 60.0);
}

#[test]
fn override_changed_copies_only_flagged() {
    let mut base = CameraPose::default();
    base.set_location(DVec3::new(1.0, 2.0, 3.0));
    base.clear_changed_flags();

    let mut top = CameraPose::default();
    top.set_field_of_view(45.0);

    base.override_changed(&top);
    assert_eq!(base.location(), DVec3::new(1.0, 2.0, 3.0));
    assert_eq!(base.field_of_view(), 45.0);
}

#[test]
fn lerp_all_blends_every_property() {
    let mut a = CameraPose::default();
    let mut b = CameraPose::default();
    b.set_location(DVec3::new(10.0, 0.0, 0.0));
    b.set_rotation(Rotator::new(0.0, 90.0, 0.0));
    a.lerp_all(&b, 0.5);
    assert!((a.location() - DVec3::new(5.0, 0.0, 0.0)).length() < 1e-9);
    assert!((a.rotation().yaw - 45.0).abs() < 1e-9);
}

#[test]
fn target_follows_aim() {
    let mut pose = CameraPose::default();
    pose.set_location(DVec3::new(0.0, 0.0, 100.0));
    pose.set_rotation(Rotator::new(0.0, 90.0, 0.0));
    pose.set_target_distance(50.0);
    assert!((pose.target() - DVec3::new(0.0, 50.0, 100.0)).length() < 1e-9);
}

#[test]
fn focal_length_drives_field_of_view() {
    let mut pose = CameraPose::default();
    assert_eq!(pose.effective_field_of_view(), 90.0);
    pose.set_focal_length(18.0);
    assert!((pose.effective_field_of_view() - 90.0).abs() < 1e-9);
    pose.set_focal_length(36.0);
    assert!(pose.effective_field_of_view() < 90.0);
}
