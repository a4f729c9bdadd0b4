use super::*;
use crate::context::arena::ContextHandle;
use crate::result::allocation::{AllocationInfo, VariableDefinition};
use crate::rig::node::NodeEvaluatorTree;
use crate::rig::operation::YawPitchOperation;

const LOOK: VariableId = VariableId(40);

fn eval_params() -> NodeEvaluationParams {
    NodeEvaluationParams {
        context: ContextHandle::new(0, 0),
        delta_time: 0.25,
        is_first_frame: false,
        is_isolated: false,
    }
}

fn init(tree: &mut NodeEvaluatorTree, out: &mut EvaluationResult) {
    let params = NodeInitializeParams {
        context: ContextHandle::new(0, 0),
        instance: crate::foundation::ids::RigInstanceId(1),
    };
    tree.initialize(&params, out);
}

fn boom(min_pitch: f64, max_pitch: f64) -> BoomArmNode {
    BoomArmNode {
        pivot_offset: DVec3::new(0.0, 0.0, 100.0),
        boom_offset: DVec3::new(-200.0, 0.0, 0.0),
        min_pitch,
        max_pitch,
        input_variable: Some(LOOK),
        ..BoomArmNode::default()
    }
}

#[test]
fn array_runs_children_in_order() {
    let node = ArrayNode::new(vec![
        Arc::new(FieldOfViewNode { field_of_view: 60.0 }),
        Arc::new(OffsetNode {
            offset: DVec3::new(0.0, 0.0, 5.0),
            space: OffsetSpace::World,
        }),
        Arc::new(FieldOfViewNode { field_of_view: 45.0 }),
    ]);
    let mut tree = NodeEvaluatorTree::build(&node);
    assert_eq!(tree.evaluator_count(), 4);

    let mut out = EvaluationResult::default();
    tree.run(&eval_params(), &mut out);
    assert_eq!(out.pose.field_of_view(), 45.0);
    assert_eq!(out.pose.location(), DVec3::new(0.0, 0.0, 5.0));
}

#[test]
fn camera_space_offset_follows_rotation() {
    let node = OffsetNode {
        offset: DVec3::new(10.0, 0.0, 0.0),
        space: OffsetSpace::Camera,
    };
    let mut tree = NodeEvaluatorTree::build(&node);
    let mut out = EvaluationResult::default();
    out.pose.set_rotation(Rotator::new(0.0, 90.0, 0.0));
    tree.run(&eval_params(), &mut out);
    assert!(out.pose.location().abs_diff_eq(DVec3::new(0.0, 10.0, 0.0), 1e-9));
}

#[test]
fn boom_arm_publishes_pivot_joint() {
    let mut tree = NodeEvaluatorTree::build(&boom(-60.0, 60.0));
    let mut out = EvaluationResult::default();
    out.pose.set_location(DVec3::new(5.0, 0.0, 0.0));
    init(&mut tree, &mut out);
    tree.run(&eval_params(), &mut out);

    let joint = out.joints.find(VariableId::YAW_PITCH).unwrap();
    assert_eq!(joint.transform.location, DVec3::new(5.0, 0.0, 100.0));
    assert!(out.pose.location().abs_diff_eq(DVec3::new(-195.0, 0.0, 100.0), 1e-9));
}

#[test]
fn boom_arm_reads_written_look_input() {
    let info = AllocationInfo::default().with_variable(
        VariableDefinition::new(LOOK, "look", VariableValue::Rotator(Rotator::ZERO)).auto_reset(),
    );
    let mut tree = NodeEvaluatorTree::build(&boom(-60.0, 60.0));
    let mut out = EvaluationResult::new(&info);
    init(&mut tree, &mut out);

    out.variable_table
        .set(LOOK, VariableValue::Rotator(Rotator::new(10.0, 30.0, 0.0)))
        .unwrap();
    tree.run(&eval_params(), &mut out);
    assert!(out.pose.rotation().approx_eq(Rotator::new(10.0, 30.0, 0.0), 1e-9));

    out.on_end_of_frame();
    tree.run(&eval_params(), &mut out);
    assert!(out.pose.rotation().approx_eq(Rotator::new(10.0, 30.0, 0.0), 1e-9));
}

#[test]
fn boom_arm_leaves_pitch_beyond_limit() {
    let mut tree = NodeEvaluatorTree::build(&boom(-20.0, 20.0));
    let mut out = EvaluationResult::default();
    init(&mut tree, &mut out);

    let params = NodeOperationParams {
        context: ContextHandle::new(0, 0),
    };
    let mut op = CameraOperation::YawPitch(YawPitchOperation::new(45.0, 30.0));
    tree.execute_operation(&params, &mut op);
    let CameraOperation::YawPitch(yp) = op;
    assert!(!yp.yaw.has_value());
    assert!((yp.pitch.remaining() - 10.0).abs() < 1e-9);

    tree.run(&eval_params(), &mut out);
    assert!(out.pose.rotation().approx_eq(Rotator::new(20.0, 45.0, 0.0), 1e-9));
}

#[test]
fn shake_replays_after_restore() {
    let node = ShakeNode {
        amplitude: Rotator::new(2.0, 1.0, 0.0),
        frequency_hz: 0.3,
    };
    let mut tree = NodeEvaluatorTree::build(&node);
    tree.run(&eval_params(), &mut EvaluationResult::default());

    let mut w = StateWriter::new();
    tree.serialize_state(&mut w).unwrap();
    let bytes = w.into_bytes();

    let mut first = EvaluationResult::default();
    tree.run(&eval_params(), &mut first);

    let mut r = StateReader::new(&bytes);
    tree.deserialize_state(&mut r).unwrap();
    let mut replay = EvaluationResult::default();
    tree.run(&eval_params(), &mut replay);

    assert_ne!(first.pose.rotation(), Rotator::ZERO);
    assert_eq!(first.pose.rotation(), replay.pose.rotation());
}

#[test]
fn set_variable_ignores_unallocated_slot() {
    let node = SetVariableNode {
        variable: VariableId(99),
        value: VariableValue::Float(1.0),
    };
    let mut tree = NodeEvaluatorTree::build(&node);
    let mut out = EvaluationResult::default();
    tree.run(&eval_params(), &mut out);
    assert!(out.variable_table.is_empty());
}

#[test]
fn lens_leaves_unset_focus_alone() {
    let node = LensNode {
        focal_length: 50.0,
        aperture: 4.0,
        focus_distance: None,
    };
    let mut tree = NodeEvaluatorTree::build(&node);
    let mut out = EvaluationResult::default();
    tree.run(&eval_params(), &mut out);
    assert_eq!(out.pose.focal_length(), 50.0);
    assert_eq!(out.pose.focus_distance(), -1.0);
    assert!(out.pose.changed_flags().aperture);
    assert!(!out.pose.changed_flags().focus_distance);
}
