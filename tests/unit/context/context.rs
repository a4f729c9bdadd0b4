use super::*;
use crate::director::director::DirectorState;
use crate::foundation::ids::VariableId;
use crate::result::allocation::{VariableDefinition, VariableValue};
use crate::rig::asset::{CameraRigAsset, DirectorConfig};
use crate::rig::nodes::FieldOfViewNode;
use serde_json::json;

const HEIGHT: VariableId = VariableId(3);

fn asset(director: Option<DirectorConfig>) -> Arc<CameraAsset> {
    let rig = CameraRigAsset::new("follow", Arc::new(FieldOfViewNode { field_of_view: 60.0 }))
        .with_allocation_info(AllocationInfo::default().with_variable(VariableDefinition::new(
            HEIGHT,
            "height",
            VariableValue::Float(1.7),
        )));
    let mut a = CameraAsset::new("player").with_rig(Arc::new(rig));
    a.director = director;
    Arc::new(a)
}

#[test]
fn second_initialize_is_a_protocol_error() {
    let mut ctx = EvaluationContext::new("player", Some(asset(None)));
    ctx.initialize(ContextOwnerInfo::default()).unwrap();
    assert!(ctx.initial_result().variable_table.contains(HEIGHT));

    ctx.initial_result_mut()
        .variable_table
        .set(HEIGHT, VariableValue::Float(2.0))
        .unwrap();
    let err = ctx.initialize(ContextOwnerInfo::default()).unwrap_err();
    assert!(matches!(err, CamRigError::Protocol(_)));
    assert_eq!(
        ctx.initial_result().variable_table.get(HEIGHT),
        Some(&VariableValue::Float(2.0))
    );
}

#[test]
fn activation_builds_director_once() {
    let registry = DirectorRegistry::with_builtins();
    let mut ctx = EvaluationContext::new(
        "player",
        Some(asset(Some(DirectorConfig::new("single_rig", json!({"rig": "follow"}))))),
    );
    assert!(ctx.activate(&registry).is_err());
    ctx.initialize(ContextOwnerInfo::default()).unwrap();
    ctx.activate(&registry).unwrap();
    assert!(ctx.is_active());
    assert_eq!(ctx.director().unwrap().state(), DirectorState::Activated);
    assert!(ctx.activate(&registry).is_err());

    ctx.deactivate().unwrap();
    assert_eq!(ctx.director().unwrap().state(), DirectorState::Deactivated);
    ctx.activate(&registry).unwrap();
    assert_eq!(ctx.director().unwrap().state(), DirectorState::Activated);
}

#[test]
fn missing_director_still_activates() {
    let registry = DirectorRegistry::with_builtins();
    let mut no_asset = EvaluationContext::new("a", None);
    no_asset.initialize(ContextOwnerInfo::default()).unwrap();
    no_asset.activate(&registry).unwrap();
    assert!(no_asset.is_active());
    assert!(no_asset.director().is_none());

    let mut unknown = EvaluationContext::new(
        "b",
        Some(asset(Some(DirectorConfig::new("nope", json!({}))))),
    );
    unknown.initialize(ContextOwnerInfo::default()).unwrap();
    unknown.activate(&registry).unwrap();
    assert!(unknown.director().is_none());
}

#[test]
fn conditional_results_are_idempotent() {
    let mut ctx = EvaluationContext::new("player", Some(asset(None)));
    ctx.initialize(ContextOwnerInfo::default()).unwrap();
    ctx.get_or_add_conditional_result(ResultCondition::ActiveContext)
        .pose
        .set_field_of_view(50.0);
    let again = ctx.get_or_add_conditional_result(ResultCondition::ActiveContext);
    assert_eq!(again.pose.field_of_view(), 50.0);
    assert!(again.variable_table.contains(HEIGHT));
    assert!(ctx.conditional_result(ResultCondition::ActiveCameraRig).is_none());
}

#[test]
fn end_of_frame_clears_write_flags() {
    let mut ctx = EvaluationContext::new("player", Some(asset(None)));
    ctx.initialize(ContextOwnerInfo::default()).unwrap();
    ctx.initial_result_mut()
        .variable_table
        .set(HEIGHT, VariableValue::Float(1.9))
        .unwrap();
    ctx.get_or_add_conditional_result(ResultCondition::ActiveCameraRig)
        .variable_table
        .set(HEIGHT, VariableValue::Float(1.2))
        .unwrap();

    ctx.on_end_of_frame();
    assert!(!ctx.initial_result().variable_table.was_written_this_frame(HEIGHT));
    assert!(ctx.initial_result().variable_table.is_written(HEIGHT));
    let overlay = ctx.conditional_result(ResultCondition::ActiveCameraRig).unwrap();
    assert!(!overlay.variable_table.was_written_this_frame(HEIGHT));
}

#[test]
fn owner_is_held_weakly() {
    let owner = Arc::new(42_u32);
    let info = ContextOwnerInfo::new(&owner);
    assert!(info.owner().is_some());
    assert!(info.input_controller().is_none());
    drop(owner);
    assert!(info.owner().is_none());
}
