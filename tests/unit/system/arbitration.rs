use super::*;
use crate::context::arena::ContextHandle;
use crate::context::context::EvaluationContext;
use crate::foundation::ids::RigId;
use crate::rig::asset::{CameraAsset, CameraRigAsset};
use crate::rig::nodes::FieldOfViewNode;
use crate::rig::transition::{BlendCurve, TransitionSpec};

fn rig(name: &str) -> Arc<CameraRigAsset> {
    Arc::new(CameraRigAsset::new(
        name,
        Arc::new(FieldOfViewNode { field_of_view: 60.0 }),
    ))
}

fn setup() -> (ContextArena, ContextHandle, Arc<CameraAsset>) {
    let asset = Arc::new(
        CameraAsset::new("player")
            .with_rig(rig("follow"))
            .with_rig(rig("aim"))
            .with_proxy("default", "follow"),
    );
    let mut arena = ContextArena::new();
    let h = arena.insert(EvaluationContext::new("player", Some(Arc::clone(&asset))));
    (arena, h, asset)
}

#[test]
fn proxies_resolve_and_unknown_ones_are_dropped() {
    let (arena, h, asset) = setup();
    let mut cache = CombinedRigCache::new();
    let out = arbitrate(
        &arena,
        &mut cache,
        vec![
            DirectorRequest::activate(h, "default"),
            DirectorRequest::activate(h, "missing").on_layer(Layer::Global),
        ],
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].rig.id(), asset.find_rig("follow").unwrap().id());
}

#[test]
fn requests_of_dead_contexts_are_dropped() {
    let (mut arena, h, asset) = setup();
    let rig = Arc::clone(asset.find_rig("aim").unwrap());
    arena.destroy(h);
    let mut cache = CombinedRigCache::new();
    let out = arbitrate(&arena, &mut cache, vec![DirectorRequest::activate(h, rig)]);
    assert!(out.is_empty());
}

#[test]
fn several_main_activations_collapse_into_one_combined_request() {
    let (arena, h, asset) = setup();
    let follow = Arc::clone(asset.find_rig("follow").unwrap());
    let aim = Arc::clone(asset.find_rig("aim").unwrap());
    let mut cache = CombinedRigCache::new();
    let requests = || {
        vec![
            DirectorRequest::activate(h, Arc::clone(&follow)),
            DirectorRequest::activate(h, Arc::clone(&aim)).forced(),
            DirectorRequest::activate(h, Arc::clone(&aim)).on_layer(Layer::Visual),
        ]
    };

    let out = arbitrate(&arena, &mut cache, requests());
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].layer, Layer::Visual);
    let main = &out[1];
    assert_eq!(main.layer, Layer::Main);
    assert!(main.force);
    assert_eq!(main.rig.id(), RigId::combined(&[follow.id(), aim.id()]));
    assert_eq!(main.rig.constituents().len(), 2);

    let again = arbitrate(&arena, &mut cache, requests());
    assert!(Arc::ptr_eq(&again[1].rig, &main.rig));
    assert_eq!(cache.len(), 1);
}

#[test]
fn activations_come_before_deactivations() {
    let (arena, h, asset) = setup();
    let follow = Arc::clone(asset.find_rig("follow").unwrap());
    let aim = Arc::clone(asset.find_rig("aim").unwrap());
    let mut cache = CombinedRigCache::new();
    let out = arbitrate(
        &arena,
        &mut cache,
        vec![
            DirectorRequest::deactivate(h, follow),
            DirectorRequest::activate(h, aim),
        ],
    );
    let kinds: Vec<_> = out.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![RequestKind::Activate, RequestKind::Deactivate]);
}

#[test]
fn conflicting_transition_overrides_keep_the_first() {
    let (arena, h, asset) = setup();
    let first = TransitionSpec::blend(0.25, BlendCurve::Linear);
    let second = TransitionSpec::blend(2.0, BlendCurve::Linear);
    let mut cache = CombinedRigCache::new();
    let out = arbitrate(
        &arena,
        &mut cache,
        vec![
            DirectorRequest::activate(h, Arc::clone(asset.find_rig("follow").unwrap())),
            DirectorRequest::activate(h, Arc::clone(asset.find_rig("aim").unwrap()))
                .with_transition(first),
            DirectorRequest::activate(h, "default").with_transition(second),
        ],
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].transition_override, Some(first));
    assert_eq!(out[0].rig.constituents().len(), 3);
}

#[test]
fn several_main_deactivations_collapse_into_one_combined_request() {
    let (arena, h, asset) = setup();
    let follow = Arc::clone(asset.find_rig("follow").unwrap());
    let aim = Arc::clone(asset.find_rig("aim").unwrap());
    let mut cache = CombinedRigCache::new();
    let out = arbitrate(
        &arena,
        &mut cache,
        vec![
            DirectorRequest::deactivate(h, Arc::clone(&follow)),
            DirectorRequest::deactivate(h, Arc::clone(&aim)),
        ],
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].kind, RequestKind::Deactivate);
    assert_eq!(out[0].layer, Layer::Main);
    assert_eq!(out[0].rig.id(), RigId::combined(&[follow.id(), aim.id()]));
}

#[test]
fn combined_request_keeps_the_first_context() {
    let (mut arena, first, asset) = setup();
    let second = arena.insert(EvaluationContext::new("guest", Some(Arc::clone(&asset))));
    let follow = Arc::clone(asset.find_rig("follow").unwrap());
    let aim = Arc::clone(asset.find_rig("aim").unwrap());
    let mut cache = CombinedRigCache::new();
    let out = arbitrate(
        &arena,
        &mut cache,
        vec![
            DirectorRequest::activate(first, Arc::clone(&follow)),
            DirectorRequest::activate(second, Arc::clone(&aim)),
        ],
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].context, first);
    assert_eq!(out[0].rig.id(), RigId::combined(&[follow.id(), aim.id()]));
}
