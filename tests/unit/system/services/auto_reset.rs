use super::*;
use crate::result::allocation::{AllocationInfo, VariableDefinition, VariableValue};

const ZOOM: VariableId = VariableId(7);
const OTHER: VariableId = VariableId(8);

fn result() -> EvaluationResult {
    EvaluationResult::new(
        &AllocationInfo::default()
            .with_variable(VariableDefinition::new(ZOOM, "zoom", VariableValue::Float(1.0)))
            .with_variable(VariableDefinition::new(OTHER, "other", VariableValue::Float(0.0))),
    )
}

fn params() -> ServiceUpdateParams {
    ServiceUpdateParams {
        delta_time: 1.0 / 60.0,
        active_context: None,
    }
}

#[test]
fn registrations_are_reference_counted() {
    let mut svc = AutoResetVariableService::new();
    svc.register_variable(ZOOM);
    svc.register_variable(ZOOM);
    assert_eq!(svc.reference_count(ZOOM), 2);

    assert!(svc.unregister_variable(ZOOM));
    assert!(svc.is_registered(ZOOM));
    assert!(svc.unregister_variable(ZOOM));
    assert!(!svc.is_registered(ZOOM));
    assert!(!svc.unregister_variable(ZOOM));
}

#[test]
fn resets_only_registered_variables_not_written_this_frame() {
    let mut svc = AutoResetVariableService::new();
    svc.register_variable(ZOOM);

    let mut r = result();
    r.variable_table.set(ZOOM, VariableValue::Float(3.0)).unwrap();
    r.variable_table.set(OTHER, VariableValue::Float(5.0)).unwrap();

    // Written this frame: kept.
    svc.on_post_update(&params(), &mut r);
    assert_eq!(r.variable_table.get(ZOOM), Some(&VariableValue::Float(3.0)));

    // Next frame, nobody writes it.
    r.reset_frame_flags();
    svc.on_post_update(&params(), &mut r);
    assert_eq!(r.variable_table.get(ZOOM), Some(&VariableValue::Float(1.0)));
    assert!(!r.variable_table.is_written(ZOOM));
    assert_eq!(r.variable_table.get(OTHER), Some(&VariableValue::Float(5.0)));
}

#[test]
fn teardown_forgets_registrations() {
    let mut svc = AutoResetVariableService::new();
    svc.register_variable(ZOOM);
    svc.teardown();
    assert!(!svc.is_registered(ZOOM));
}
