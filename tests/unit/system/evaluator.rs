use super::*;
use crate::context::stack::ContextStackChange;
use crate::director::director::Director;
use crate::director::registry::DirectorFactory;
use crate::director::request::{DirectorRequest, Layer};
use crate::foundation::core::Rotator;
use crate::foundation::ids::{RigId, VariableId};
use crate::result::allocation::{AllocationInfo, VariableDefinition, VariableValue};
use crate::rig::asset::{CameraRigAsset, DirectorConfig};
use crate::rig::nodes::{BoomArmNode, FieldOfViewNode};
use crate::rig::transition::TransitionSpec;
use crate::root::evaluator::{RigEvent, RigEventKind};
use crate::system::services::auto_reset::AutoResetVariableService;
use serde_json::json;

const ZOOM: VariableId = VariableId(3);
const LOOK: VariableId = VariableId(4);

fn fov_rig(name: &str, fov: f64) -> Arc<CameraRigAsset> {
    Arc::new(
        CameraRigAsset::new(name, Arc::new(FieldOfViewNode { field_of_view: fov }))
            .with_enter_transition(TransitionSpec::cut()),
    )
}

fn single_rig_asset(name: &str, fov: f64) -> Arc<CameraAsset> {
    Arc::new(
        CameraAsset::new(name)
            .with_rig(fov_rig("follow", fov))
            .with_director(DirectorConfig::new("single_rig", json!({"rig": "follow"}))),
    )
}

fn system() -> SystemEvaluator {
    SystemEvaluator::default()
}

#[derive(Debug)]
struct BothRigs(Vec<Arc<CameraRigAsset>>);

impl Director for BothRigs {
    fn run(&mut self, run: &mut DirectorRunContext<'_>, out: &mut DirectorEvaluationResult) {
        for rig in &self.0 {
            out.push(DirectorRequest::activate(run.context(), Arc::clone(rig)));
        }
    }
}

#[derive(Debug)]
struct BothRigsFactory;

impl DirectorFactory for BothRigsFactory {
    fn build_director(
        &self,
        asset: &Arc<CameraAsset>,
        _params: &serde_json::Value,
    ) -> CamRigResult<Box<dyn Director>> {
        Ok(Box::new(BothRigs(asset.rigs().to_vec())))
    }
}

#[derive(Debug, Default)]
struct Recorder {
    pre: u32,
    post: u32,
    events: Vec<RigEvent>,
    stack_events: Vec<ContextStackEvent>,
}

impl EvaluationService for Recorder {
    fn on_pre_update(&mut self, _params: &ServiceUpdateParams) {
        self.pre += 1;
    }

    fn on_post_update(&mut self, _params: &ServiceUpdateParams, _result: &mut EvaluationResult) {
        self.post += 1;
    }

    fn on_rig_event(&mut self, event: &RigEvent) {
        self.events.push(*event);
    }

    fn on_context_stack_event(&mut self, event: &ContextStackEvent) {
        self.stack_events.push(*event);
    }
}

#[test]
fn pushed_context_director_drives_the_camera() {
    let mut sys = system();
    let h = sys
        .create_context("player", Some(single_rig_asset("player", 70.0)), ContextOwnerInfo::default())
        .unwrap();
    sys.push_context(h).unwrap();
    assert!(sys.context(h).unwrap().is_active());

    let fov = sys.update(1.0 / 60.0).pose.field_of_view();
    assert_eq!(fov, 70.0);
    let info = sys.root_evaluator().active_camera_rig_info().unwrap();
    assert_eq!(info.context, h);
    assert_eq!(info.rig.name(), "follow");
    assert_eq!(sys.frame(), 1);
}

#[test]
fn pushing_another_context_switches_directors() {
    let mut sys = system();
    let a = sys
        .create_context("a", Some(single_rig_asset("a", 70.0)), ContextOwnerInfo::default())
        .unwrap();
    let b = sys
        .create_context("b", Some(single_rig_asset("b", 30.0)), ContextOwnerInfo::default())
        .unwrap();
    sys.push_context(a).unwrap();
    sys.update(0.1);
    sys.push_context(b).unwrap();
    assert!(!sys.context(a).unwrap().is_active());
    assert!(sys.context(b).unwrap().is_active());

    assert_eq!(sys.update(0.1).pose.field_of_view(), 30.0);
    assert_eq!(sys.active_context(), Some(b));
    assert_eq!(sys.context_stack().len(), 2);
}

#[test]
fn result_is_held_without_an_active_context() {
    let mut sys = system();
    let h = sys
        .create_context("player", Some(single_rig_asset("player", 70.0)), ContextOwnerInfo::default())
        .unwrap();
    sys.push_context(h).unwrap();
    sys.update(0.1);
    let before = sys.result().clone();

    assert_eq!(sys.pop_context(), Some(h));
    assert!(!sys.root_evaluator().has_any_running_camera_rig(h));
    let after = sys.update(0.1).clone();
    assert_eq!(before, after);
}

#[test]
fn write_flags_live_until_end_of_frame() {
    let zoom = AllocationInfo::default().with_variable(VariableDefinition::new(
        ZOOM,
        "zoom",
        VariableValue::Float(1.0),
    ));
    let rig = Arc::new(
        CameraRigAsset::new("follow", Arc::new(FieldOfViewNode { field_of_view: 70.0 }))
            .with_allocation_info(zoom),
    );
    let asset = Arc::new(
        CameraAsset::new("player")
            .with_rig(rig)
            .with_director(DirectorConfig::new("single_rig", json!({"rig": "follow"}))),
    );
    let mut sys = system();
    let h = sys
        .create_context("player", Some(asset), ContextOwnerInfo::default())
        .unwrap();
    sys.push_context(h).unwrap();

    let ctx = sys.context_mut(h).unwrap();
    ctx.initial_result_mut()
        .variable_table
        .set(ZOOM, VariableValue::Float(2.0))
        .unwrap();
    assert!(ctx.initial_result().variable_table.was_written_this_frame(ZOOM));

    sys.update(0.1);
    assert_eq!(
        sys.result().variable_table.get(ZOOM),
        Some(&VariableValue::Float(2.0))
    );
    let initial = &sys.context(h).unwrap().initial_result().variable_table;
    assert!(!initial.was_written_this_frame(ZOOM));
    assert!(initial.is_written(ZOOM));
}

#[test]
fn simultaneous_main_activations_run_one_combined_rig() {
    let mut registry = DirectorRegistry::with_builtins();
    registry.register("both", Arc::new(BothRigsFactory));
    let a = fov_rig("a", 50.0);
    let b = fov_rig("b", 20.0);
    let asset = Arc::new(
        CameraAsset::new("player")
            .with_rig(Arc::clone(&a))
            .with_rig(Arc::clone(&b))
            .with_director(DirectorConfig::new("both", json!(null))),
    );
    let mut sys = SystemEvaluator::new(CameraSystemOpts::default(), registry);
    let h = sys
        .create_context("player", Some(asset), ContextOwnerInfo::default())
        .unwrap();
    sys.push_context(h).unwrap();

    // The last constituent runs last and wins.
    assert_eq!(sys.update(0.1).pose.field_of_view(), 20.0);
    let main = sys.root_evaluator().stack(Layer::Main);
    assert_eq!(main.entries().len(), 1);
    assert_eq!(main.entries()[0].rig().id(), RigId::combined(&[a.id(), b.id()]));

    // Same combination next frame: already on top, nothing new.
    sys.update(0.1);
    assert_eq!(sys.root_evaluator().stack(Layer::Main).entries().len(), 1);
}

#[test]
fn services_see_hooks_and_rig_events() {
    let mut sys = system();
    sys.register_service(Box::new(Recorder::default()));
    let h = sys
        .create_context("player", Some(single_rig_asset("player", 70.0)), ContextOwnerInfo::default())
        .unwrap();
    sys.push_context(h).unwrap();
    sys.update(0.1);
    sys.update(0.1);

    let rec = sys.find_service::<Recorder>().unwrap();
    assert_eq!((rec.pre, rec.post), (2, 2));
    assert_eq!(rec.events.len(), 1);
    assert_eq!(rec.events[0].kind, RigEventKind::Activated);
    assert_eq!(rec.events[0].context, h);

    assert_eq!(sys.remove_service::<Recorder>(), 1);
    assert!(sys.find_service::<Recorder>().is_none());
}

#[test]
fn undrained_stack_events_reach_services_once() {
    let mut sys = system();
    sys.register_service(Box::new(Recorder::default()));
    let h = sys
        .create_context("player", Some(single_rig_asset("player", 70.0)), ContextOwnerInfo::default())
        .unwrap();
    sys.push_context(h).unwrap();
    sys.update(0.1);
    sys.update(0.1);
    assert!(sys.drain_stack_events().is_empty());

    let rec = sys.find_service::<Recorder>().unwrap();
    assert_eq!(rec.stack_events.len(), 1);
    assert_eq!(rec.stack_events[0].change, ContextStackChange::Pushed(h));
    assert_eq!(rec.stack_events[0].previous_top, None);
}

#[test]
fn auto_reset_service_is_reachable_by_type() {
    let mut sys = system();
    sys.register_service(Box::new(AutoResetVariableService::new()));
    sys.find_service_mut::<AutoResetVariableService>()
        .unwrap()
        .register_variable(ZOOM);
    assert!(
        sys.find_service::<AutoResetVariableService>()
            .unwrap()
            .is_registered(ZOOM)
    );
}

#[test]
fn destroying_a_context_stops_its_rigs_and_prunes_the_stack() {
    let mut sys = system();
    let h = sys
        .create_context("player", Some(single_rig_asset("player", 70.0)), ContextOwnerInfo::default())
        .unwrap();
    sys.push_context(h).unwrap();
    sys.update(0.1);
    assert!(sys.root_evaluator().has_any_running_camera_rig(h));

    assert_eq!(sys.destroy_context(h), 1);
    assert!(!sys.root_evaluator().has_any_running_camera_rig(h));
    assert!(sys.context_stack().is_empty());
    assert_eq!(sys.active_context(), None);
}

#[test]
fn priority_queue_runs_the_highest_child() {
    let mut sys = system();
    let queue = Arc::new(
        CameraAsset::new("queue").with_director(DirectorConfig::new("priority_queue", json!(null))),
    );
    let parent = sys
        .create_context("queue", Some(queue), ContextOwnerInfo::default())
        .unwrap();
    let low = sys
        .create_context("low", Some(single_rig_asset("low", 80.0)), ContextOwnerInfo::default())
        .unwrap();
    let high = sys
        .create_context("high", Some(single_rig_asset("high", 40.0)), ContextOwnerInfo::default())
        .unwrap();
    sys.push_context(parent).unwrap();
    sys.add_child_context(low, None).unwrap();
    sys.add_child_context(high, Some(parent)).unwrap();
    sys.context_mut(low).unwrap().set_priority(1);
    sys.context_mut(high).unwrap().set_priority(9);

    assert_eq!(sys.update(0.1).pose.field_of_view(), 40.0);
    assert_eq!(
        sys.root_evaluator().active_camera_rig_info().unwrap().context,
        high
    );

    sys.context_mut(low).unwrap().set_priority(20);
    assert_eq!(sys.update(0.1).pose.field_of_view(), 80.0);
    assert!(!sys.context(high).unwrap().is_active());
}

#[test]
fn priority_queue_releases_the_child_that_lost_the_lead() {
    let mut sys = system();
    let queue = Arc::new(
        CameraAsset::new("queue").with_director(DirectorConfig::new("priority_queue", json!(null))),
    );
    let shaky = Arc::new(
        CameraAsset::new("shaky")
            .with_rig(fov_rig("wobble", 10.0))
            .with_director(DirectorConfig::new(
                "single_rig",
                json!({"rig": "wobble", "layer": "visual"}),
            )),
    );
    let parent = sys
        .create_context("queue", Some(queue), ContextOwnerInfo::default())
        .unwrap();
    let a = sys
        .create_context("a", Some(shaky), ContextOwnerInfo::default())
        .unwrap();
    let b = sys
        .create_context("b", Some(single_rig_asset("b", 40.0)), ContextOwnerInfo::default())
        .unwrap();
    sys.push_context(parent).unwrap();
    sys.add_child_context(a, Some(parent)).unwrap();
    sys.add_child_context(b, Some(parent)).unwrap();
    sys.context_mut(a).unwrap().set_priority(10);
    sys.context_mut(b).unwrap().set_priority(1);

    sys.update(0.1);
    assert!(sys.context(a).unwrap().is_active());
    assert_eq!(sys.root_evaluator().stack(Layer::Visual).entries().len(), 1);

    sys.context_mut(a).unwrap().set_priority(0);
    for _ in 0..3 {
        sys.update(0.1);
    }
    assert!(!sys.context(a).unwrap().is_active());
    assert!(!sys.root_evaluator().has_any_running_camera_rig(a));
    assert!(sys.root_evaluator().stack(Layer::Visual).entries().is_empty());
    assert_eq!(sys.result().pose.field_of_view(), 40.0);
    assert_eq!(
        sys.root_evaluator().active_camera_rig_info().unwrap().context,
        b
    );
}

#[test]
fn one_look_write_turns_the_camera_once() {
    let look = AllocationInfo::default().with_variable(
        VariableDefinition::new(LOOK, "look", VariableValue::Rotator(Rotator::ZERO)).auto_reset(),
    );
    let boom = BoomArmNode {
        input_variable: Some(LOOK),
        ..BoomArmNode::default()
    };
    let rig = Arc::new(
        CameraRigAsset::new("follow", Arc::new(boom))
            .with_allocation_info(look)
            .with_enter_transition(TransitionSpec::cut()),
    );
    let asset = Arc::new(
        CameraAsset::new("player")
            .with_rig(rig)
            .with_director(DirectorConfig::new("single_rig", json!({"rig": "follow"}))),
    );
    let mut sys = system();
    let h = sys
        .create_context("player", Some(asset), ContextOwnerInfo::default())
        .unwrap();
    sys.push_context(h).unwrap();
    assert_eq!(sys.update(0.1).pose.rotation().yaw, 0.0);

    sys.context_mut(h)
        .unwrap()
        .initial_result_mut()
        .variable_table
        .set(LOOK, VariableValue::Rotator(Rotator::new(0.0, 30.0, 0.0)))
        .unwrap();
    let yaws: Vec<f64> = (0..4).map(|_| sys.update(0.1).pose.rotation().yaw).collect();
    assert!(yaws.iter().all(|y| (y - 30.0).abs() < 1e-9), "{yaws:?}");
    assert!(!sys.result().variable_table.is_written(LOOK));
}
